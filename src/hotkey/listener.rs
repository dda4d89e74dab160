//! Dedicated OS-thread hotkey listener using `rdev::listen`.
//!
//! `rdev::listen` is a blocking call that must live on its own OS thread.
//! [`HotkeyDispatcher`] owns that thread and the action callback;
//! unregistering (or dropping it) drops the callback, so further events are
//! ignored and anything the callback owned (a channel sender) is released.
//!
//! # Shutdown caveat
//!
//! `rdev::listen` has **no graceful shutdown API**.  Dropping the callback
//! prevents actions from being dispatched, but the OS thread itself stays
//! blocked in the rdev event loop until the process exits.  rdev holds no
//! resources that need explicit cleanup.

use std::sync::{mpsc as std_mpsc, Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::{HotkeyAction, HotkeyBinding, HotkeyError, HotkeyRouter};

type ActionCallback = Box<dyn Fn(HotkeyAction) + Send>;

/// `rdev::listen` fails fast when the OS refuses the hook; if it is still
/// running after this long, registration succeeded.
const STARTUP_WINDOW: Duration = Duration::from_millis(300);

// ---------------------------------------------------------------------------
// HotkeyDispatcher
// ---------------------------------------------------------------------------

/// Handle to the running global hotkey listener.
pub struct HotkeyDispatcher {
    /// `None` once [`unregister`](Self::unregister) has run.
    callback: Arc<Mutex<Option<ActionCallback>>>,
    /// Kept so the thread is not detached prematurely; never joined because
    /// `rdev::listen` never returns on success.
    _thread: std::thread::JoinHandle<()>,
}

impl HotkeyDispatcher {
    /// Register `bindings` and call `on_action` for every triggered action.
    ///
    /// `on_action` runs on the listener thread and must not block; forward
    /// to a channel with `try_send`.
    ///
    /// # Errors
    ///
    /// * [`HotkeyError::PermissionDenied`] — the OS hook could not be
    ///   installed within the startup window.
    /// * [`HotkeyError::Spawn`] — the listener thread could not be created.
    pub fn start<F>(
        bindings: Vec<HotkeyBinding>,
        debounce: Duration,
        on_action: F,
    ) -> Result<Self, HotkeyError>
    where
        F: Fn(HotkeyAction) + Send + 'static,
    {
        let on_action: ActionCallback = Box::new(on_action);
        let callback = Arc::new(Mutex::new(Some(on_action)));
        let callback_clone = Arc::clone(&callback);
        let (failed_tx, failed_rx) = std_mpsc::channel::<String>();

        let thread = std::thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                let mut router = HotkeyRouter::new(bindings, debounce);

                let result = rdev::listen(move |event| {
                    let Some(action) = router.route(&event.event_type, Instant::now()) else {
                        return;
                    };
                    let callback = callback_clone.lock().unwrap_or_else(PoisonError::into_inner);
                    // Unregistered: drop the action.
                    if let Some(on_action) = callback.as_ref() {
                        log::debug!("hotkey: {action:?}");
                        on_action(action);
                    }
                });

                if let Err(e) = result {
                    log::error!("hotkey-listener: rdev::listen exited with error: {:?}", e);
                    let _ = failed_tx.send(format!("{e:?}"));
                }
            })
            .map_err(|e| HotkeyError::Spawn(e.to_string()))?;

        match failed_rx.recv_timeout(STARTUP_WINDOW) {
            Ok(reason) => Err(HotkeyError::PermissionDenied(reason)),
            Err(std_mpsc::RecvTimeoutError::Disconnected) => Err(HotkeyError::PermissionDenied(
                "listener thread exited".into(),
            )),
            Err(std_mpsc::RecvTimeoutError::Timeout) => {
                log::info!("hotkey: global listener registered");
                Ok(Self {
                    callback,
                    _thread: thread,
                })
            }
        }
    }

    pub fn is_registered(&self) -> bool {
        self.lock_callback().is_some()
    }

    /// Stop dispatching actions and drop the callback.  Idempotent.
    pub fn unregister(&self) {
        if self.lock_callback().take().is_some() {
            log::info!("hotkey: global listener unregistered");
        }
    }

    fn lock_callback(&self) -> std::sync::MutexGuard<'_, Option<ActionCallback>> {
        self.callback.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for HotkeyDispatcher {
    fn drop(&mut self) {
        self.unregister();
    }
}
