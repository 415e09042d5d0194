//! Configuration management
//!
//! Handles loading, saving, and managing the typed settings file.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoConfigDir,
}

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Window behaviour
    pub window: WindowConfig,
    /// Terminal settings
    pub terminal: TerminalConfig,
    /// Shortcut bindings
    pub shortcuts: ShortcutsConfig,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Start with every window hidden
    pub hide_on_start: bool,
    /// Ask before quitting
    pub prompt_on_quit: bool,
    /// Open a fresh tab instead of closing the window when the last tab closes
    pub spawn_term_on_last_close: bool,
    /// Keep the window out of the taskbar
    pub hide_from_taskbar: bool,
    /// Width of the divider between split panes, in pixels
    pub separator_size: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            hide_on_start: false,
            prompt_on_quit: true,
            spawn_term_on_last_close: true,
            hide_from_taskbar: true,
            separator_size: 2,
        }
    }
}

/// Window behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Hide the window when it loses focus
    pub hide_on_losefocus: bool,
    /// Slide the window in and out
    pub use_animation: bool,
    /// Number of resize steps in a slide
    pub animation_step_count: u32,
    /// Delay between slide steps, in milliseconds
    pub animation_step_time: u64,
    /// Keep the window above others
    pub always_on_top: bool,
    /// Show window decorations
    pub use_border: bool,
    /// Default width as a percentage of the work area
    pub width_percent: u32,
    /// Default height as a percentage of the work area
    pub height_percent: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            hide_on_losefocus: true,
            use_animation: true,
            animation_step_count: 20,
            animation_step_time: 20,
            always_on_top: true,
            use_border: false,
            width_percent: 100,
            height_percent: 50,
        }
    }
}

/// Terminal settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerminalConfig {
    /// Background colour, also used for the scrollbar trough
    pub color_background: String,
    /// Show a scrollbar next to each terminal
    pub show_scrollbar: bool,
    /// Program to run in new terminals (None = $SHELL)
    pub program: Option<String>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            color_background: "#000000".into(),
            show_scrollbar: true,
            program: None,
        }
    }
}

impl TerminalConfig {
    /// The program new terminals run when none is stored for them
    pub fn default_program(&self) -> String {
        self.program
            .clone()
            .or_else(|| std::env::var("SHELL").ok())
            .unwrap_or_else(|| "/bin/sh".into())
    }
}

/// Keyboard shortcuts configuration, in `<Modifier>key` accelerator form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShortcutsConfig {
    pub toggle_scrollbars: String,
    pub move_up: String,
    pub move_down: String,
    pub move_left: String,
    pub move_right: String,
    pub move_left_screen: String,
    pub move_right_screen: String,
    pub quit: String,
    pub select_all: String,
    pub copy: String,
    pub paste: String,
    /// Split with the new pane beside the current one
    pub split_v: String,
    /// Split with the new pane below the current one
    pub split_h: String,
    pub close_node: String,
    pub fullscreen: String,
    pub new_page: String,
    pub rename_page: String,
    pub close_page: String,
    pub next_page: String,
    pub prev_page: String,
    pub move_page_left: String,
    pub move_page_right: String,
}

impl Default for ShortcutsConfig {
    fn default() -> Self {
        Self {
            toggle_scrollbars: "<Control><Shift>s".into(),
            move_up: "<Alt>Up".into(),
            move_down: "<Alt>Down".into(),
            move_left: "<Alt>Left".into(),
            move_right: "<Alt>Right".into(),
            move_left_screen: "<Control><Shift>Left".into(),
            move_right_screen: "<Control><Shift>Right".into(),
            quit: "<Control><Shift>q".into(),
            select_all: "<Control><Shift>a".into(),
            copy: "<Control><Shift>c".into(),
            paste: "<Control><Shift>v".into(),
            split_v: "<Control><Shift>e".into(),
            split_h: "<Control><Shift>o".into(),
            close_node: "<Control><Shift>w".into(),
            fullscreen: "F11".into(),
            new_page: "<Control><Shift>t".into(),
            rename_page: "F2".into(),
            close_page: "<Control><Shift>x".into(),
            next_page: "<Control>Page_Down".into(),
            prev_page: "<Control>Page_Up".into(),
            move_page_left: "<Control><Shift>Page_Up".into(),
            move_page_right: "<Control><Shift>Page_Down".into(),
        }
    }
}

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "dropterm", "dropterm").map(|p| p.config_dir().to_path_buf())
}

/// Get the config file path
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Get the layout store path
pub fn layout_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("layout.toml"))
}

/// Load configuration from the default location
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    load_config_from(&path)
}

/// Load configuration from a file, returning defaults when it does not exist
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to the default location
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_config_to(config, &path)
}

/// Save configuration to a file
pub fn save_config_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    write_private(path, &content)
}

/// Write a file readable only by its owner, creating parent directories
pub(crate) fn write_private(path: &Path, content: &str) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        let _ = std::fs::set_permissions(path, perms);
    }

    Ok(())
}
