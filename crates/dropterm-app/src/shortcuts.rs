//! Keyboard shortcut management
//!
//! Handles parsing, matching, and managing keyboard shortcuts written as
//! accelerator strings such as `<Control><Shift>n`.

use std::collections::HashMap;

use thiserror::Error;

use dropterm_ui::events::{Action, Direction, KeyCode, Modifiers, Shortcut};

use crate::config::ShortcutsConfig;

/// Shortcut parsing errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShortcutError {
    #[error("Empty shortcut")]
    Empty,

    #[error("Unknown modifier: {0}")]
    UnknownModifier(String),

    #[error("Unknown key: {0}")]
    UnknownKey(String),
}

/// Manages keyboard shortcuts
#[derive(Clone)]
pub struct ShortcutManager {
    /// Map from shortcut to action
    shortcuts: HashMap<Shortcut, Action>,
    /// Map from action to shortcut (for display)
    actions: HashMap<Action, Shortcut>,
}

impl ShortcutManager {
    /// Create a new shortcut manager with default shortcuts
    pub fn new() -> Self {
        Self::from_config(&ShortcutsConfig::default())
    }

    /// Load shortcuts from configuration
    pub fn from_config(config: &ShortcutsConfig) -> Self {
        let mut manager = Self {
            shortcuts: HashMap::new(),
            actions: HashMap::new(),
        };

        manager.bind_str(&config.toggle_scrollbars, Action::ToggleScrollbars);
        manager.bind_str(&config.move_up, Action::MoveFocus(Direction::Up));
        manager.bind_str(&config.move_down, Action::MoveFocus(Direction::Down));
        manager.bind_str(&config.move_left, Action::MoveFocus(Direction::Left));
        manager.bind_str(&config.move_right, Action::MoveFocus(Direction::Right));
        manager.bind_str(&config.move_left_screen, Action::MoveScreen(Direction::Left));
        manager.bind_str(&config.move_right_screen, Action::MoveScreen(Direction::Right));
        manager.bind_str(&config.quit, Action::Quit);
        manager.bind_str(&config.select_all, Action::SelectAll);
        manager.bind_str(&config.copy, Action::Copy);
        manager.bind_str(&config.paste, Action::Paste);
        manager.bind_str(&config.split_v, Action::SplitVertical);
        manager.bind_str(&config.split_h, Action::SplitHorizontal);
        manager.bind_str(&config.close_node, Action::CloseNode);
        manager.bind_str(&config.fullscreen, Action::ToggleFullscreen);
        manager.bind_str(&config.new_page, Action::NewPage);
        manager.bind_str(&config.rename_page, Action::RenamePage);
        manager.bind_str(&config.close_page, Action::ClosePage);
        manager.bind_str(&config.next_page, Action::NextPage);
        manager.bind_str(&config.prev_page, Action::PrevPage);
        manager.bind_str(&config.move_page_left, Action::MovePageLeft);
        manager.bind_str(&config.move_page_right, Action::MovePageRight);

        manager
    }

    /// Bind a shortcut to an action
    pub fn bind(&mut self, shortcut: Shortcut, action: Action) {
        // Remove old binding for this action
        if let Some(old_shortcut) = self.actions.remove(&action) {
            self.shortcuts.remove(&old_shortcut);
        }

        // Remove old action for this shortcut
        if let Some(old_action) = self.shortcuts.remove(&shortcut) {
            self.actions.remove(&old_action);
        }

        self.shortcuts.insert(shortcut.clone(), action);
        self.actions.insert(action, shortcut);
    }

    /// Bind a shortcut from an accelerator string. Invalid strings are
    /// logged and leave the action unbound.
    pub fn bind_str(&mut self, shortcut_str: &str, action: Action) {
        match parse_shortcut(shortcut_str) {
            Ok(shortcut) => self.bind(shortcut, action),
            Err(e) => log::warn!("Ignoring shortcut '{}' for {:?}: {}", shortcut_str, action, e),
        }
    }

    /// Get the shortcut for an action
    pub fn get_shortcut(&self, action: &Action) -> Option<&Shortcut> {
        self.actions.get(action)
    }

    /// Get shortcut string for display
    pub fn shortcut_string(&self, action: &Action) -> Option<String> {
        self.actions.get(action).map(format_shortcut)
    }

    /// `label` followed by the action's accelerator, for tooltips
    pub fn tooltip(&self, label: &str, action: &Action) -> String {
        match self.shortcut_string(action) {
            Some(accel) => format!("{} ({})", label, accel),
            None => label.to_string(),
        }
    }

    /// Try to match a key press and return the action. Modifiers must
    /// match exactly.
    pub fn match_event(&self, key: KeyCode, modifiers: Modifiers) -> Option<Action> {
        let shortcut = Shortcut::new(key, modifiers);
        self.shortcuts.get(&shortcut).copied()
    }
}

impl Default for ShortcutManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an accelerator like `<Control><Shift>n` or `F11`
pub fn parse_shortcut(s: &str) -> Result<Shortcut, ShortcutError> {
    let mut rest = s.trim();
    if rest.is_empty() {
        return Err(ShortcutError::Empty);
    }

    let mut modifiers = Modifiers::empty();
    while let Some(stripped) = rest.strip_prefix('<') {
        let Some(end) = stripped.find('>') else {
            return Err(ShortcutError::UnknownModifier(rest.to_string()));
        };
        let name = &stripped[..end];
        match name.to_ascii_lowercase().as_str() {
            "control" | "ctrl" | "primary" => modifiers.insert(Modifiers::CTRL),
            "shift" => modifiers.insert(Modifiers::SHIFT),
            "alt" | "mod1" => modifiers.insert(Modifiers::ALT),
            "super" | "meta" => modifiers.insert(Modifiers::SUPER),
            _ => return Err(ShortcutError::UnknownModifier(name.to_string())),
        }
        rest = &stripped[end + 1..];
    }

    if rest.is_empty() {
        return Err(ShortcutError::Empty);
    }
    let key = parse_key(rest).ok_or_else(|| ShortcutError::UnknownKey(rest.to_string()))?;
    Ok(Shortcut::new(key, modifiers))
}

/// Parse a key name, accepting GDK keyval names case-insensitively and a
/// few common spellings
fn parse_key(s: &str) -> Option<KeyCode> {
    let alias = match s.to_ascii_lowercase().as_str() {
        "pageup" | "prior" => Some(KeyCode::PageUp),
        "pagedown" | "next" => Some(KeyCode::PageDown),
        "del" => Some(KeyCode::Delete),
        "enter" => Some(KeyCode::Enter),
        "iso_left_tab" => Some(KeyCode::Tab),
        "esc" => Some(KeyCode::Escape),
        _ => None,
    };
    alias.or_else(|| KeyCode::from_name(s))
}

/// Format a shortcut as an accelerator string
pub fn format_shortcut(shortcut: &Shortcut) -> String {
    let mut out = String::new();

    if shortcut.modifiers.contains(Modifiers::CTRL) {
        out.push_str("<Control>");
    }
    if shortcut.modifiers.contains(Modifiers::ALT) {
        out.push_str("<Alt>");
    }
    if shortcut.modifiers.contains(Modifiers::SHIFT) {
        out.push_str("<Shift>");
    }
    if shortcut.modifiers.contains(Modifiers::SUPER) {
        out.push_str("<Super>");
    }

    out.push_str(shortcut.key.name());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shortcut() {
        let shortcut = parse_shortcut("<Control><Shift>n").unwrap();
        assert_eq!(shortcut.key, KeyCode::N);
        assert_eq!(shortcut.modifiers, Modifiers::CTRL | Modifiers::SHIFT);

        let bare = parse_shortcut("F11").unwrap();
        assert_eq!(bare.key, KeyCode::F11);
        assert!(bare.modifiers.is_empty());

        let named = parse_shortcut("<Control>Page_Down").unwrap();
        assert_eq!(named.key, KeyCode::PageDown);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_shortcut(""), Err(ShortcutError::Empty));
        assert_eq!(parse_shortcut("<Control>"), Err(ShortcutError::Empty));
        assert_eq!(
            parse_shortcut("<Hyper>n"),
            Err(ShortcutError::UnknownModifier("Hyper".into()))
        );
        assert_eq!(
            parse_shortcut("<Control>nosuchkey"),
            Err(ShortcutError::UnknownKey("nosuchkey".into()))
        );
        assert!(parse_shortcut("<Control").is_err());
    }

    #[test]
    fn test_format_shortcut() {
        let shortcut = Shortcut::ctrl_shift(KeyCode::T);
        assert_eq!(format_shortcut(&shortcut), "<Control><Shift>t");
        let page = Shortcut::ctrl(KeyCode::PageUp);
        assert_eq!(format_shortcut(&page), "<Control>Page_Up");
        assert_eq!(parse_shortcut(&format_shortcut(&page)).unwrap(), page);
    }

    #[test]
    fn test_exact_modifiers_required() {
        let mut manager = ShortcutManager::new();
        manager.bind_str("<Control><Shift>n", Action::NewPage);

        assert_eq!(
            manager.match_event(KeyCode::N, Modifiers::CTRL | Modifiers::SHIFT),
            Some(Action::NewPage)
        );
        assert_eq!(manager.match_event(KeyCode::N, Modifiers::CTRL), None);
        assert_eq!(manager.match_event(KeyCode::N, Modifiers::SHIFT), None);
        assert_eq!(
            manager.match_event(
                KeyCode::N,
                Modifiers::CTRL | Modifiers::SHIFT | Modifiers::SUPER
            ),
            None
        );
        assert_eq!(
            manager.match_event(KeyCode::M, Modifiers::CTRL | Modifiers::SHIFT),
            None
        );
    }

    #[test]
    fn test_default_bindings() {
        let manager = ShortcutManager::new();
        assert_eq!(manager.match_event(KeyCode::F11, Modifiers::empty()), Some(Action::ToggleFullscreen));
        assert_eq!(
            manager.match_event(KeyCode::Left, Modifiers::ALT),
            Some(Action::MoveFocus(Direction::Left))
        );
        assert_eq!(
            manager.shortcut_string(&Action::NewPage).as_deref(),
            Some("<Control><Shift>t")
        );
    }

    #[test]
    fn test_tooltip() {
        let mut manager = ShortcutManager::new();
        manager.bind_str("<Control><Shift>t", Action::NewPage);
        assert_eq!(
            manager.tooltip("New tab", &Action::NewPage),
            "New tab (<Control><Shift>t)"
        );
    }

    #[test]
    fn test_rebinding_replaces_old_shortcut() {
        let mut manager = ShortcutManager::new();
        manager.bind_str("<Alt>q", Action::Quit);
        assert_eq!(
            manager.match_event(KeyCode::Q, Modifiers::CTRL | Modifiers::SHIFT),
            None
        );
        assert_eq!(manager.match_event(KeyCode::Q, Modifiers::ALT), Some(Action::Quit));
        assert_eq!(
            manager.get_shortcut(&Action::Quit),
            Some(&Shortcut::new(KeyCode::Q, Modifiers::ALT))
        );
    }

    #[test]
    fn test_invalid_config_entry_leaves_action_unbound() {
        let config = ShortcutsConfig {
            quit: "<Bogus>q".into(),
            ..Default::default()
        };
        let manager = ShortcutManager::from_config(&config);
        assert!(manager.get_shortcut(&Action::Quit).is_none());
        assert!(manager.get_shortcut(&Action::NewPage).is_some());
        assert_eq!(manager.tooltip("Quit", &Action::Quit), "Quit");
    }
}
