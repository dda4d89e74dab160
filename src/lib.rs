//! read4me — speak the current text selection of any application.
//!
//! A global hotkey captures the foreground application's selection through
//! the clipboard (restoring whatever the user had copied) and speaks it with
//! an offline text-to-speech process.  A second hotkey stops speech.

pub mod capture;
pub mod config;
pub mod hotkey;
pub mod notify;
pub mod pipeline;
pub mod speech;
