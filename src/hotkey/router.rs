//! Turns raw `rdev` key events into [`HotkeyAction`]s.
//!
//! Kept free of any OS hook so the matching rules can be unit-tested.

use std::time::{Duration, Instant};

use super::{HeldModifiers, HotkeyAction, HotkeyBinding};

/// Modifier keys of the copy shortcut `EnigoKeystroke` sends.
#[cfg(target_os = "macos")]
const COPY_MODIFIERS: [rdev::Key; 2] = [rdev::Key::MetaLeft, rdev::Key::MetaRight];
#[cfg(not(target_os = "macos"))]
const COPY_MODIFIERS: [rdev::Key; 2] = [rdev::Key::ControlLeft, rdev::Key::ControlRight];

const COPY_KEY: rdev::Key = rdev::Key::KeyC;

/// How long after a speak trigger the synthetic copy is expected.
const COPY_ECHO_WINDOW: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// ComboTracker
// ---------------------------------------------------------------------------

/// Tracks held modifiers and reports a binding's action when its key is
/// pressed with exactly the binding's modifiers.
///
/// Auto-repeat presses of a held key fire only once.
#[derive(Debug)]
pub struct ComboTracker {
    bindings: Vec<HotkeyBinding>,
    held: HeldModifiers,
    /// Key whose combo fired and has not been released yet.
    latched: Option<rdev::Key>,
}

impl ComboTracker {
    pub fn new(bindings: Vec<HotkeyBinding>) -> Self {
        Self {
            bindings,
            held: HeldModifiers::default(),
            latched: None,
        }
    }

    pub fn on_press(&mut self, key: rdev::Key) -> Option<HotkeyAction> {
        if self.held.update(key, true) || self.latched == Some(key) {
            return None;
        }

        let held = self.held.modifiers();
        let action = self
            .bindings
            .iter()
            .find(|b| b.combo.key == key && b.combo.modifiers == held)?
            .action;
        self.latched = Some(key);
        Some(action)
    }

    pub fn on_release(&mut self, key: rdev::Key) {
        if !self.held.update(key, false) && self.latched == Some(key) {
            self.latched = None;
        }
    }

    pub fn holds(&self, key: rdev::Key) -> bool {
        self.held.is_held(key)
    }
}

// ---------------------------------------------------------------------------
// Debouncer
// ---------------------------------------------------------------------------

/// Rejects triggers closer together than `min_interval`.
#[derive(Debug)]
pub struct Debouncer {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Debouncer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// `true` if a trigger at `now` is accepted.
    pub fn accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}

// ---------------------------------------------------------------------------
// HotkeyRouter
// ---------------------------------------------------------------------------

/// Progress of the synthetic copy shortcut that follows a speak trigger.
///
/// The OS hook reports that shortcut like any other input.  When the user is
/// still holding the copy modifier, its synthetic release would mark the
/// modifier as up while it is physically down; that one release is dropped.
#[derive(Debug)]
struct CopyEcho {
    deadline: Instant,
    key_pressed: bool,
    key_released: bool,
}

/// [`ComboTracker`] plus a [`Debouncer`] on the speak action.
///
/// Stop is never debounced.
#[derive(Debug)]
pub struct HotkeyRouter {
    tracker: ComboTracker,
    speak_debounce: Debouncer,
    copy_echo: Option<CopyEcho>,
}

impl HotkeyRouter {
    pub fn new(bindings: Vec<HotkeyBinding>, debounce: Duration) -> Self {
        Self {
            tracker: ComboTracker::new(bindings),
            speak_debounce: Debouncer::new(debounce),
            copy_echo: None,
        }
    }

    pub fn route(&mut self, event: &rdev::EventType, now: Instant) -> Option<HotkeyAction> {
        if self.swallow_copy_echo(event, now) {
            log::debug!("hotkey: ignoring synthetic copy modifier release");
            return None;
        }

        let action = match event {
            rdev::EventType::KeyPress(key) => self.tracker.on_press(*key)?,
            rdev::EventType::KeyRelease(key) => {
                self.tracker.on_release(*key);
                return None;
            }
            _ => return None,
        };

        if action == HotkeyAction::Speak {
            if !self.speak_debounce.accept(now) {
                log::debug!("hotkey: speak ignored (debounce)");
                return None;
            }
            // A capture follows; only a held copy modifier needs shielding.
            self.copy_echo = COPY_MODIFIERS
                .iter()
                .any(|m| self.tracker.holds(*m))
                .then(|| CopyEcho {
                    deadline: now + COPY_ECHO_WINDOW,
                    key_pressed: false,
                    key_released: false,
                });
        }
        Some(action)
    }

    /// `true` if `event` is the synthetic release of a copy modifier the
    /// user is still holding.
    fn swallow_copy_echo(&mut self, event: &rdev::EventType, now: Instant) -> bool {
        let Some(echo) = self.copy_echo.as_mut() else {
            return false;
        };
        if now > echo.deadline {
            self.copy_echo = None;
            return false;
        }

        match event {
            rdev::EventType::KeyPress(key) if *key == COPY_KEY => echo.key_pressed = true,
            rdev::EventType::KeyRelease(key) if *key == COPY_KEY && echo.key_pressed => {
                echo.key_released = true
            }
            rdev::EventType::KeyPress(key)
                if COPY_MODIFIERS.contains(key) && !self.tracker.holds(*key) =>
            {
                // Released before the copy: press and release pair up.
                self.copy_echo = None;
            }
            rdev::EventType::KeyRelease(key) if COPY_MODIFIERS.contains(key) => {
                if echo.key_released && self.tracker.holds(*key) {
                    self.copy_echo = None;
                    return true;
                }
            }
            _ => {}
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
