//! Show/hide policy for the drop-down window
//!
//! Decides what a focus loss or a toggle request should do, given the
//! window's state. The frontend executes the returned command.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::config::WindowConfig;

/// What the frontend should do with the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityCommand {
    Nothing,
    Show { animate: bool },
    Hide { animate: bool },
}

/// Suppresses hide-on-focus-loss while something (a dialog, a popup menu)
/// temporarily takes focus. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct LoseFocusInhibitor {
    holders: Rc<Cell<u32>>,
}

impl LoseFocusInhibitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inhibit until the returned guard is dropped
    pub fn inhibit(&self) -> InhibitGuard {
        self.holders.set(self.holders.get() + 1);
        InhibitGuard {
            holders: Rc::clone(&self.holders),
        }
    }

    pub fn is_inhibited(&self) -> bool {
        self.holders.get() > 0
    }
}

/// Releases its inhibition when dropped
#[derive(Debug)]
#[must_use = "the inhibition ends when the guard is dropped"]
pub struct InhibitGuard {
    holders: Rc<Cell<u32>>,
}

impl Drop for InhibitGuard {
    fn drop(&mut self) {
        self.holders.set(self.holders.get().saturating_sub(1));
    }
}

/// Per-window visibility state
#[derive(Debug, Default)]
pub struct VisibilityPolicy {
    animating: bool,
    /// Time of the last focus-loss hide, in milliseconds
    losefocus_time: Option<u64>,
    /// Toggles arriving within this window after a focus-loss hide are
    /// treated as the cause of that focus loss
    toggle_grace: Duration,
    inhibitor: LoseFocusInhibitor,
}

impl VisibilityPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_toggle_grace(mut self, grace: Duration) -> Self {
        self.toggle_grace = grace;
        self
    }

    pub fn inhibitor(&self) -> &LoseFocusInhibitor {
        &self.inhibitor
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn set_animating(&mut self, animating: bool) {
        self.animating = animating;
    }

    /// The window lost focus at `now` (milliseconds)
    pub fn on_focus_lost(
        &mut self,
        visible: bool,
        now: u64,
        config: &WindowConfig,
    ) -> VisibilityCommand {
        if self.animating || self.inhibitor.is_inhibited() || !config.hide_on_losefocus {
            return VisibilityCommand::Nothing;
        }
        if !visible {
            return VisibilityCommand::Nothing;
        }
        self.losefocus_time = Some(now);
        VisibilityCommand::Hide {
            animate: config.use_animation,
        }
    }

    /// A show/hide toggle arrived with timestamp `event_time` (milliseconds)
    pub fn show_hide(
        &self,
        visible: bool,
        event_time: u64,
        config: &WindowConfig,
    ) -> VisibilityCommand {
        if self.animating {
            return VisibilityCommand::Nothing;
        }
        if let Some(lost) = self.losefocus_time {
            let grace = self.toggle_grace.as_millis() as u64;
            if lost.saturating_add(grace) >= event_time {
                return VisibilityCommand::Nothing;
            }
        }
        let animate = config.use_animation;
        if visible {
            VisibilityCommand::Hide { animate }
        } else {
            VisibilityCommand::Show { animate }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WindowConfig {
        WindowConfig::default()
    }

    #[test]
    fn test_focus_loss_hides_visible_window() {
        let mut policy = VisibilityPolicy::new();
        assert_eq!(
            policy.on_focus_lost(true, 100, &config()),
            VisibilityCommand::Hide { animate: true }
        );
        assert_eq!(
            policy.on_focus_lost(false, 200, &config()),
            VisibilityCommand::Nothing
        );
    }

    #[test]
    fn test_focus_loss_respects_setting() {
        let mut policy = VisibilityPolicy::new();
        let cfg = WindowConfig {
            hide_on_losefocus: false,
            ..config()
        };
        assert_eq!(policy.on_focus_lost(true, 100, &cfg), VisibilityCommand::Nothing);
    }

    #[test]
    fn test_focus_loss_ignored_while_animating() {
        let mut policy = VisibilityPolicy::new();
        policy.set_animating(true);
        assert_eq!(
            policy.on_focus_lost(true, 100, &config()),
            VisibilityCommand::Nothing
        );
        assert_eq!(policy.show_hide(true, 200, &config()), VisibilityCommand::Nothing);
    }

    #[test]
    fn test_inhibitor_guard_scopes() {
        let mut policy = VisibilityPolicy::new();
        let inhibitor = policy.inhibitor().clone();
        {
            let _outer = inhibitor.inhibit();
            let inner = inhibitor.inhibit();
            drop(inner);
            assert!(inhibitor.is_inhibited());
            assert_eq!(
                policy.on_focus_lost(true, 100, &config()),
                VisibilityCommand::Nothing
            );
        }
        assert!(!inhibitor.is_inhibited());
        assert!(matches!(
            policy.on_focus_lost(true, 100, &config()),
            VisibilityCommand::Hide { .. }
        ));
    }

    #[test]
    fn test_toggle_caused_by_focus_loss_is_ignored() {
        let mut policy = VisibilityPolicy::new();
        policy.on_focus_lost(true, 500, &config());
        // The toggle key press predates the focus loss
        assert_eq!(policy.show_hide(false, 480, &config()), VisibilityCommand::Nothing);
        assert_eq!(policy.show_hide(false, 500, &config()), VisibilityCommand::Nothing);
        assert_eq!(
            policy.show_hide(false, 501, &config()),
            VisibilityCommand::Show { animate: true }
        );
    }

    #[test]
    fn test_toggle_grace() {
        let mut policy = VisibilityPolicy::new().with_toggle_grace(Duration::from_millis(300));
        policy.on_focus_lost(true, 1000, &config());
        assert_eq!(policy.show_hide(false, 1200, &config()), VisibilityCommand::Nothing);
        assert!(matches!(
            policy.show_hide(false, 1400, &config()),
            VisibilityCommand::Show { .. }
        ));
    }

    #[test]
    fn test_toggle_without_animation() {
        let policy = VisibilityPolicy::new();
        let cfg = WindowConfig {
            use_animation: false,
            ..config()
        };
        assert_eq!(
            policy.show_hide(true, 10, &cfg),
            VisibilityCommand::Hide { animate: false }
        );
        assert_eq!(
            policy.show_hide(false, 10, &cfg),
            VisibilityCommand::Show { animate: false }
        );
    }
}
