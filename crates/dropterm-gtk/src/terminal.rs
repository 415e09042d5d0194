//! Terminal pane widget using VTE

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{EventControllerFocus, PolicyType, ScrolledWindow};
use vte4::prelude::*;

use dropterm_app::config::TerminalConfig;
use dropterm_app::pane::PaneLeaf;
use dropterm_app::process::process_cwd;

/// Callback type for terminal events
type EventCallback = Rc<RefCell<Option<Box<dyn Fn()>>>>;

/// One pane: a VTE terminal inside a scrolled window
pub struct PaneTerminal {
    id: u32,
    scrolled: ScrolledWindow,
    terminal: vte4::Terminal,
    /// Program as configured for this pane (None = default shell)
    program: Option<String>,
    /// Directory the process was started in
    initial_cwd: Option<PathBuf>,
    pid: Rc<Cell<Option<i32>>>,
    on_exit: EventCallback,
    on_focus: EventCallback,
}

impl PaneTerminal {
    /// Create the widget for `leaf` and start its process
    pub fn new(leaf: &PaneLeaf, config: &TerminalConfig) -> Self {
        let terminal = vte4::Terminal::new();
        terminal.set_hexpand(true);
        terminal.set_vexpand(true);
        terminal.set_scroll_on_keystroke(true);

        match gdk4::RGBA::parse(config.color_background.as_str()) {
            Ok(rgba) => terminal.set_color_background(&rgba),
            Err(_) => log::warn!("Invalid background color '{}'", config.color_background),
        }

        let scrolled = ScrolledWindow::builder()
            .child(&terminal)
            .hexpand(true)
            .vexpand(true)
            .build();
        scrolled.set_widget_name(&format!("pane-{}", leaf.id));

        let pane = Self {
            id: leaf.id,
            scrolled,
            terminal,
            program: leaf.program.clone(),
            initial_cwd: leaf.cwd.clone(),
            pid: Rc::new(Cell::new(None)),
            on_exit: Rc::new(RefCell::new(None)),
            on_focus: Rc::new(RefCell::new(None)),
        };
        pane.set_scrollbar(config.show_scrollbar);
        pane.setup_signals();
        pane.spawn(&config.default_program());
        pane
    }

    /// Get the widget for adding to containers
    pub fn widget(&self) -> &ScrolledWindow {
        &self.scrolled
    }

    /// Set callback for when the terminal process exits
    pub fn set_on_exit<F: Fn() + 'static>(&self, callback: F) {
        *self.on_exit.borrow_mut() = Some(Box::new(callback));
    }

    /// Set callback for when the terminal gains keyboard focus
    pub fn set_on_focus<F: Fn() + 'static>(&self, callback: F) {
        *self.on_focus.borrow_mut() = Some(Box::new(callback));
    }

    fn setup_signals(&self) {
        let on_exit = Rc::clone(&self.on_exit);
        let pid = Rc::clone(&self.pid);
        let id = self.id;
        self.terminal.connect_child_exited(move |_, status| {
            log::debug!("Pane {} process exited with status {}", id, status);
            pid.set(None);
            if let Some(ref callback) = *on_exit.borrow() {
                callback();
            }
        });

        let focus = EventControllerFocus::new();
        let on_focus = Rc::clone(&self.on_focus);
        focus.connect_enter(move |_| {
            if let Some(ref callback) = *on_focus.borrow() {
                callback();
            }
        });
        self.terminal.add_controller(focus);
    }

    fn spawn(&self, default_program: &str) {
        let command = self.program.as_deref().unwrap_or(default_program);
        let args = match command_argv(command) {
            Ok(args) => args,
            Err(e) => {
                log::error!("Pane {} cannot run '{}': {}", self.id, command, e);
                return;
            }
        };
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let cwd = self
            .initial_cwd
            .as_ref()
            .filter(|p| p.is_dir())
            .and_then(|p| p.to_str());

        let pid = Rc::clone(&self.pid);
        let id = self.id;
        let command = command.to_string();
        self.terminal.spawn_async(
            vte4::PtyFlags::DEFAULT,
            cwd,
            &argv,
            &[],
            glib::SpawnFlags::SEARCH_PATH,
            || {},
            -1,
            None::<&gio::Cancellable>,
            move |result| match result {
                Ok(child) => {
                    log::debug!("Pane {} started '{}' as pid {}", id, command, child.0);
                    pid.set(Some(child.0));
                }
                Err(e) => log::error!("Failed to start '{}' in pane {}: {}", command, id, e),
            },
        );
    }

    /// Give keyboard focus to the terminal
    pub fn grab_focus(&self) {
        self.terminal.grab_focus();
    }

    pub fn copy(&self) {
        self.terminal.copy_clipboard_format(vte4::Format::Text);
    }

    pub fn paste(&self) {
        self.terminal.paste_clipboard();
    }

    pub fn select_all(&self) {
        self.terminal.select_all();
    }

    pub fn set_scrollbar(&self, visible: bool) {
        let policy = if visible {
            PolicyType::Automatic
        } else {
            PolicyType::External
        };
        self.scrolled.set_policy(PolicyType::Never, policy);
    }

    /// Working directory of the running process, or the one it started in
    pub fn cwd(&self) -> Option<PathBuf> {
        self.pid
            .get()
            .and_then(process_cwd)
            .or_else(|| self.initial_cwd.clone())
    }

    /// Current state as a layout leaf
    pub fn leaf(&self) -> PaneLeaf {
        PaneLeaf {
            id: self.id,
            program: self.program.clone(),
            cwd: self.cwd(),
        }
    }

    /// Hang up the child process
    pub fn terminate(&self) {
        if let Some(pid) = self.pid.take() {
            hangup(pid);
        }
    }
}

/// Split a command line with shell quoting rules
fn command_argv(command: &str) -> Result<Vec<String>, glib::Error> {
    let args = glib::shell_parse_argv(command)?;
    Ok(args
        .into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect())
}

#[cfg(unix)]
fn hangup(pid: i32) {
    // SAFETY: plain signal delivery to a child we spawned
    let rc = unsafe { libc::kill(pid, libc::SIGHUP) };
    if rc != 0 {
        log::debug!("kill({}) failed: {}", pid, std::io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn hangup(_pid: i32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_argv_quoting() {
        assert_eq!(
            command_argv("sh -c 'echo \"two words\"'").unwrap(),
            vec!["sh", "-c", "echo \"two words\""]
        );
        assert_eq!(
            command_argv("ls /tmp/with\\ space").unwrap(),
            vec!["ls", "/tmp/with space"]
        );
    }

    #[test]
    fn test_command_argv_rejects_bad_lines() {
        assert!(command_argv("").is_err());
        assert!(command_argv("   ").is_err());
        assert!(command_argv("echo 'unterminated").is_err());
    }
}
