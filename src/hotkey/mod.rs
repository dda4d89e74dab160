//! Global hotkeys, backed by `rdev`.
//!
//! # Design
//!
//! `rdev::listen()` is a blocking OS-level call that never returns while the
//! process is alive.  It must run on a **dedicated OS thread**, not inside a
//! tokio task.
//!
//! [`HotkeyDispatcher::start`] spawns that thread, feeds every key event
//! through a [`HotkeyRouter`] (modifier tracking + debounce) and invokes the
//! supplied callback with a [`HotkeyAction`] whenever one of the two fixed
//! combinations is pressed.
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use read4me::hotkey::{parse_combo, HotkeyAction, HotkeyBinding, HotkeyDispatcher};
//!
//! let bindings = vec![
//!     HotkeyBinding::new(parse_combo("Cmd+Shift+S").unwrap(), HotkeyAction::Speak),
//!     HotkeyBinding::new(parse_combo("Cmd+Shift+X").unwrap(), HotkeyAction::Stop),
//! ];
//! let _dispatcher = HotkeyDispatcher::start(bindings, Duration::from_millis(500), |action| {
//!     println!("{action:?}");
//! })
//! .expect("hotkeys unavailable");
//! ```

pub mod listener;
pub mod router;

pub use listener::HotkeyDispatcher;
pub use router::{ComboTracker, Debouncer, HotkeyRouter};

use thiserror::Error;

// ---------------------------------------------------------------------------
// HotkeyAction / HotkeyError
// ---------------------------------------------------------------------------

/// What a global hotkey asks the pipeline to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    /// Capture the current selection and speak it.
    Speak,
    /// Stop any speech.
    Stop,
}

#[derive(Debug, Error)]
pub enum HotkeyError {
    /// The OS refused the global keyboard hook (Accessibility / Input
    /// Monitoring permission missing, no X server, …).
    #[error("global hotkeys unavailable: {0}")]
    PermissionDenied(String),

    #[error("cannot spawn hotkey listener thread: {0}")]
    Spawn(String),
}

// ---------------------------------------------------------------------------
// Modifiers / HotkeyCombo / HotkeyBinding
// ---------------------------------------------------------------------------

/// Modifier set a combination requires.  Left and right variants are not
/// told apart here; see [`HeldModifiers`] for the physical key state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Command on macOS, Super / Windows key elsewhere.
    pub cmd: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

/// Physically held modifier keys, one flag per key so that releasing one
/// of two held Shift keys still leaves Shift held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeldModifiers {
    /// Indexed `[left, right]`.
    meta: [bool; 2],
    control: [bool; 2],
    /// `[Alt, AltGr]`.
    alt: [bool; 2],
    shift: [bool; 2],
}

impl HeldModifiers {
    fn slot(&mut self, key: rdev::Key) -> Option<&mut bool> {
        let slot = match key {
            rdev::Key::MetaLeft => &mut self.meta[0],
            rdev::Key::MetaRight => &mut self.meta[1],
            rdev::Key::ControlLeft => &mut self.control[0],
            rdev::Key::ControlRight => &mut self.control[1],
            rdev::Key::Alt => &mut self.alt[0],
            rdev::Key::AltGr => &mut self.alt[1],
            rdev::Key::ShiftLeft => &mut self.shift[0],
            rdev::Key::ShiftRight => &mut self.shift[1],
            _ => return None,
        };
        Some(slot)
    }

    /// Apply a press (`pressed = true`) or release of `key`.
    ///
    /// Returns `false` when `key` is not a modifier.
    pub fn update(&mut self, key: rdev::Key, pressed: bool) -> bool {
        match self.slot(key) {
            Some(slot) => {
                *slot = pressed;
                true
            }
            None => false,
        }
    }

    /// `true` if modifier `key` itself is down.
    pub fn is_held(&self, key: rdev::Key) -> bool {
        let mut copy = *self;
        copy.slot(key).is_some_and(|held| *held)
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            cmd: self.meta.contains(&true),
            ctrl: self.control.contains(&true),
            alt: self.alt.contains(&true),
            shift: self.shift.contains(&true),
        }
    }
}

/// A modifier set plus one non-modifier key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotkeyCombo {
    pub modifiers: Modifiers,
    pub key: rdev::Key,
}

/// Immutable combo → action mapping, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotkeyBinding {
    pub combo: HotkeyCombo,
    pub action: HotkeyAction,
}

impl HotkeyBinding {
    pub fn new(combo: HotkeyCombo, action: HotkeyAction) -> Self {
        Self { combo, action }
    }
}

// ---------------------------------------------------------------------------
// parse_combo
// ---------------------------------------------------------------------------

/// Parse a combination such as `"Cmd+Shift+S"` into a [`HotkeyCombo`].
///
/// Modifier names are case-insensitive: `Cmd`/`Command`/`Meta`/`Super`/`Win`,
/// `Ctrl`/`Control`, `Alt`/`Option`/`Opt`, `Shift`.  Exactly one
/// non-modifier key (see [`parse_key`]) must be present.
///
/// ```
/// use read4me::hotkey::parse_combo;
///
/// let combo = parse_combo("Cmd+Shift+S").unwrap();
/// assert!(combo.modifiers.cmd && combo.modifiers.shift);
/// assert_eq!(combo.key, rdev::Key::KeyS);
/// assert!(parse_combo("Cmd+Shift").is_none());
/// ```
pub fn parse_combo(spec: &str) -> Option<HotkeyCombo> {
    let mut modifiers = Modifiers::default();
    let mut key = None;

    for token in spec.split('+').map(str::trim) {
        match token.to_ascii_lowercase().as_str() {
            "cmd" | "command" | "meta" | "super" | "win" => modifiers.cmd = true,
            "ctrl" | "control" => modifiers.ctrl = true,
            "alt" | "option" | "opt" => modifiers.alt = true,
            "shift" => modifiers.shift = true,
            _ => {
                if key.is_some() {
                    return None;
                }
                key = Some(parse_key(token)?);
            }
        }
    }

    key.map(|key| HotkeyCombo { modifiers, key })
}

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Parse a key name from a config string into an [`rdev::Key`].
///
/// Supports F1–F12, common named keys, digits, and single uppercase or
/// lowercase ASCII letters.  Returns `None` for unrecognised names.
///
/// ```
/// use read4me::hotkey::parse_key;
///
/// assert_eq!(parse_key("F9"),      Some(rdev::Key::F9));
/// assert_eq!(parse_key("Escape"),  Some(rdev::Key::Escape));
/// assert_eq!(parse_key("s"),       Some(rdev::Key::KeyS));
/// assert_eq!(parse_key("xyz"),     None);
/// ```
pub fn parse_key(key_str: &str) -> Option<rdev::Key> {
    match key_str {
        // Function keys
        "F1" => Some(rdev::Key::F1),
        "F2" => Some(rdev::Key::F2),
        "F3" => Some(rdev::Key::F3),
        "F4" => Some(rdev::Key::F4),
        "F5" => Some(rdev::Key::F5),
        "F6" => Some(rdev::Key::F6),
        "F7" => Some(rdev::Key::F7),
        "F8" => Some(rdev::Key::F8),
        "F9" => Some(rdev::Key::F9),
        "F10" => Some(rdev::Key::F10),
        "F11" => Some(rdev::Key::F11),
        "F12" => Some(rdev::Key::F12),

        // Navigation / control
        "Escape" | "Esc" => Some(rdev::Key::Escape),
        "Space" => Some(rdev::Key::Space),
        "Return" | "Enter" => Some(rdev::Key::Return),
        "Tab" => Some(rdev::Key::Tab),
        "Backspace" => Some(rdev::Key::Backspace),
        "Delete" | "Del" => Some(rdev::Key::Delete),
        "Home" => Some(rdev::Key::Home),
        "End" => Some(rdev::Key::End),
        "PageUp" => Some(rdev::Key::PageUp),
        "PageDown" => Some(rdev::Key::PageDown),
        "Up" => Some(rdev::Key::UpArrow),
        "Down" => Some(rdev::Key::DownArrow),
        "Left" => Some(rdev::Key::LeftArrow),
        "Right" => Some(rdev::Key::RightArrow),

        // Digits
        "0" => Some(rdev::Key::Num0),
        "1" => Some(rdev::Key::Num1),
        "2" => Some(rdev::Key::Num2),
        "3" => Some(rdev::Key::Num3),
        "4" => Some(rdev::Key::Num4),
        "5" => Some(rdev::Key::Num5),
        "6" => Some(rdev::Key::Num6),
        "7" => Some(rdev::Key::Num7),
        "8" => Some(rdev::Key::Num8),
        "9" => Some(rdev::Key::Num9),

        // Letter keys (case-insensitive)
        "A" | "a" => Some(rdev::Key::KeyA),
        "B" | "b" => Some(rdev::Key::KeyB),
        "C" | "c" => Some(rdev::Key::KeyC),
        "D" | "d" => Some(rdev::Key::KeyD),
        "E" | "e" => Some(rdev::Key::KeyE),
        "F" | "f" => Some(rdev::Key::KeyF),
        "G" | "g" => Some(rdev::Key::KeyG),
        "H" | "h" => Some(rdev::Key::KeyH),
        "I" | "i" => Some(rdev::Key::KeyI),
        "J" | "j" => Some(rdev::Key::KeyJ),
        "K" | "k" => Some(rdev::Key::KeyK),
        "L" | "l" => Some(rdev::Key::KeyL),
        "M" | "m" => Some(rdev::Key::KeyM),
        "N" | "n" => Some(rdev::Key::KeyN),
        "O" | "o" => Some(rdev::Key::KeyO),
        "P" | "p" => Some(rdev::Key::KeyP),
        "Q" | "q" => Some(rdev::Key::KeyQ),
        "R" | "r" => Some(rdev::Key::KeyR),
        "S" | "s" => Some(rdev::Key::KeyS),
        "T" | "t" => Some(rdev::Key::KeyT),
        "U" | "u" => Some(rdev::Key::KeyU),
        "V" | "v" => Some(rdev::Key::KeyV),
        "W" | "w" => Some(rdev::Key::KeyW),
        "X" | "x" => Some(rdev::Key::KeyX),
        "Y" | "y" => Some(rdev::Key::KeyY),
        "Z" | "z" => Some(rdev::Key::KeyZ),

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_combos() {
        let speak = parse_combo("Cmd+Shift+S").unwrap();
        assert_eq!(
            speak.modifiers,
            Modifiers {
                cmd: true,
                shift: true,
                ..Modifiers::default()
            }
        );
        assert_eq!(speak.key, rdev::Key::KeyS);

        let stop = parse_combo("Cmd+Shift+X").unwrap();
        assert_eq!(stop.key, rdev::Key::KeyX);
        assert_ne!(speak, stop);
    }

    #[test]
    fn modifier_aliases_and_order_do_not_matter() {
        assert_eq!(parse_combo("shift + command + s"), parse_combo("Cmd+Shift+S"));
        assert_eq!(parse_combo("Super+Shift+S"), parse_combo("Meta+Shift+s"));

        let combo = parse_combo("Control+Option+F5").unwrap();
        assert!(combo.modifiers.ctrl && combo.modifiers.alt);
        assert!(!combo.modifiers.cmd && !combo.modifiers.shift);
        assert_eq!(combo.key, rdev::Key::F5);
    }

    #[test]
    fn rejects_missing_extra_or_unknown_keys() {
        assert_eq!(parse_combo("Cmd+Shift"), None);
        assert_eq!(parse_combo("Cmd+S+X"), None);
        assert_eq!(parse_combo("Cmd+Banana"), None);
        assert_eq!(parse_combo(""), None);
    }

    #[test]
    fn modifiers_track_presses_and_releases() {
        let mut held = HeldModifiers::default();
        assert!(held.update(rdev::Key::MetaLeft, true));
        assert!(held.update(rdev::Key::ShiftRight, true));
        assert!(!held.update(rdev::Key::KeyS, true));
        let mods = held.modifiers();
        assert!(mods.cmd && mods.shift && !mods.ctrl);

        held.update(rdev::Key::MetaLeft, false);
        let mods = held.modifiers();
        assert!(!mods.cmd && mods.shift);
    }

    #[test]
    fn left_and_right_modifiers_are_tracked_apart() {
        let mut held = HeldModifiers::default();
        held.update(rdev::Key::ShiftLeft, true);
        held.update(rdev::Key::ShiftRight, true);

        held.update(rdev::Key::ShiftLeft, false);
        assert!(held.modifiers().shift);
        assert!(held.is_held(rdev::Key::ShiftRight));
        assert!(!held.is_held(rdev::Key::ShiftLeft));

        held.update(rdev::Key::ShiftRight, false);
        assert!(!held.modifiers().shift);
        assert!(!held.is_held(rdev::Key::KeyS));
    }

    #[test]
    fn parse_letter_keys_case_insensitive() {
        assert_eq!(parse_key("A"), Some(rdev::Key::KeyA));
        assert_eq!(parse_key("a"), Some(rdev::Key::KeyA));
        assert_eq!(parse_key("x"), Some(rdev::Key::KeyX));
    }

    #[test]
    fn parse_unknown_key_returns_none() {
        assert_eq!(parse_key("xyz"), None);
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("Ctrl+V"), None);
    }
}
