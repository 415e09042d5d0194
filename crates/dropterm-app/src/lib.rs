//! dropterm-app: Application logic for dropterm
//!
//! This crate contains the application logic that is independent of the UI,
//! including configuration, the layout store, the split-pane model and its
//! persistence, window placement, the show/hide policy and shortcuts.

pub mod animation;
pub mod config;
pub mod geometry;
pub mod layout;
pub mod pane;
pub mod process;
pub mod resources;
pub mod session;
pub mod shortcuts;
pub mod store;
pub mod theme;
pub mod visibility;

pub use animation::{SlideAnimation, SlideDirection};
pub use config::{load_config, save_config, Config};
pub use geometry::{Placement, Rect};
pub use layout::{load_window, save_window, TabLayout, WindowLayout};
pub use pane::{Axis, PaneLeaf, PaneRecord, PaneTree, SplitPosition};
pub use session::{AfterClose, PageList};
pub use shortcuts::ShortcutManager;
pub use store::ConfigStore;
pub use visibility::{InhibitGuard, LoseFocusInhibitor, VisibilityCommand, VisibilityPolicy};
