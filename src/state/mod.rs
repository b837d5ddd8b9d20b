//! State Management Module
//!
//! Session state (function, domain, pending redraw) and persisted user
//! preferences.

pub mod preferences;
pub mod session;

pub use preferences::{PreferenceStore, Theme, DARK_MODE_KEY};
pub use session::Session;
