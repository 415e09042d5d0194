//! dropterm-ui: toolkit-neutral input layer
//!
//! Keys, modifiers and actions shared by the application logic and the
//! GTK frontend, so shortcut handling never depends on a widget toolkit.

pub mod events;

pub use events::*;
