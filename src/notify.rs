//! Desktop notifications via notify-rust.

use notify_rust::Notification;

/// User-facing notices (engine missing, …).
pub trait Notifier: Send + Sync {
    fn notify(&self, summary: &str, body: &str);
}

pub struct DesktopNotifier {
    enabled: bool,
}

impl DesktopNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, summary: &str, body: &str) {
        if !self.enabled {
            return;
        }

        log::debug!("notify: {summary}");

        if let Err(e) = Notification::new()
            .summary(summary)
            .body(body)
            .appname("read4me")
            .timeout(4000)
            .show()
        {
            log::warn!("notify: failed to show notification: {e}");
        }
    }
}

/// Records notices instead of showing them.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingNotifier {
    notices: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn notices(&self) -> Vec<(String, String)> {
        self.notices.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&self, summary: &str, body: &str) {
        self.notices
            .lock()
            .unwrap()
            .push((summary.to_string(), body.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_notifier_shows_nothing() {
        // Must return without touching the notification daemon.
        DesktopNotifier::new(false).notify("title", "body");
    }

    #[test]
    fn recording_notifier_keeps_order() {
        let rec = RecordingNotifier::default();
        rec.notify("a", "1");
        rec.notify("b", "2");
        assert_eq!(
            rec.notices(),
            vec![("a".into(), "1".into()), ("b".into(), "2".into())]
        );
    }
}
