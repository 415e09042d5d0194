//! Application setup and management

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use gdk4 as gdk;
use gtk4::prelude::*;
use gtk4::{Application, CssProvider};

use dropterm_app::config::{load_config, Config};
use dropterm_app::geometry::{default_window_rect, Rect};
use dropterm_app::layout::{self, WindowLayout};
use dropterm_app::shortcuts::ShortcutManager;
use dropterm_app::store::ConfigStore;
use dropterm_app::theme::window_css;

use crate::dialogs;
use crate::window::{monitor_rects, now_ms, DropWindow, Shared};

/// Work area assumed when no monitor is reported
const FALLBACK_SCREEN: Rect = Rect::new(0, 0, 1280, 720);

/// How the first window starts, from the command line
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub fullscreen: bool,
    pub hidden: bool,
    pub working_directory: Option<PathBuf>,
    pub execute: Option<String>,
}

/// All drop-down windows of the process
pub struct DropApp {
    app: Application,
    shared: Rc<Shared>,
    windows: RefCell<Vec<Rc<DropWindow>>>,
    _hold: gio::ApplicationHoldGuard,
}

impl DropApp {
    /// Load configuration and stored layout and create one window per screen
    pub fn build(app: &Application, ui_file: PathBuf, options: &StartupOptions) -> Rc<Self> {
        let config = load_config().unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        });
        let store = ConfigStore::load().unwrap_or_else(|e| {
            log::warn!("Failed to load layout, starting fresh: {}", e);
            ConfigStore::new()
        });

        apply_css(&config);

        let shared = Rc::new(Shared {
            shortcuts: ShortcutManager::from_config(&config.shortcuts),
            config,
            store: RefCell::new(store),
            ui_file,
        });

        let drop_app = Rc::new(Self {
            app: app.clone(),
            shared,
            windows: RefCell::new(Vec::new()),
            // Windows may all be hidden; keep running regardless
            _hold: app.hold(),
        });

        let mut screens = layout::screens(&drop_app.shared.store.borrow());
        if screens.is_empty() {
            screens.push(0);
        }
        let rects: Vec<Rect> = monitor_rects().into_iter().map(|(_, r)| r).collect();

        for screen in screens {
            let workarea = rects
                .get(screen as usize)
                .or_else(|| rects.first())
                .copied()
                .unwrap_or(FALLBACK_SCREEN);
            let window_config = &drop_app.shared.config.window;
            let default = default_window_rect(
                workarea,
                window_config.width_percent,
                window_config.height_percent,
            );
            let layout = layout::load_window(&drop_app.shared.store.borrow(), screen, default);
            drop_app.add_window(layout);
        }

        let first = drop_app.windows.borrow().first().cloned();
        if let Some(window) = first {
            if options.execute.is_some() || options.working_directory.is_some() {
                window.new_page(options.execute.clone(), options.working_directory.clone());
            }
        }

        let hidden = options.hidden || drop_app.shared.config.general.hide_on_start;
        if hidden {
            log::info!("Starting hidden");
        } else {
            for window in drop_app.windows.borrow().iter() {
                window.show_initial(options.fullscreen);
            }
        }

        drop_app
    }

    fn add_window(self: &Rc<Self>, layout: WindowLayout) {
        let screen = layout.screen_id;
        let window = match DropWindow::new(&self.app, Rc::clone(&self.shared), layout) {
            Ok(window) => window,
            Err(e) => {
                log::error!("Cannot create window for screen {}: {}", screen, e);
                std::process::exit(1);
            }
        };

        let weak = Rc::downgrade(self);
        window.set_on_quit(move || {
            if let Some(this) = weak.upgrade() {
                this.quit(screen);
            }
        });

        let weak = Rc::downgrade(self);
        window.set_on_closed(move || {
            if let Some(this) = weak.upgrade() {
                this.window_closed(screen);
            }
        });

        self.windows.borrow_mut().push(window);
    }

    /// Show or hide every window
    pub fn toggle(&self) {
        let now = now_ms();
        let windows: Vec<Rc<DropWindow>> = self.windows.borrow().clone();
        for window in &windows {
            window.toggle(now);
        }
    }

    fn window_for(&self, screen: u32) -> Option<Rc<DropWindow>> {
        self.windows
            .borrow()
            .iter()
            .find(|w| w.screen_id() == screen)
            .cloned()
    }

    /// Quit requested from the window of `screen`
    fn quit(self: &Rc<Self>, screen: u32) {
        if !self.shared.config.general.prompt_on_quit {
            self.save_and_quit();
            return;
        }
        let Some(window) = self.window_for(screen) else {
            return;
        };
        let weak = Rc::downgrade(self);
        dialogs::show_quit_dialog(window.window(), window.inhibit_hide(), move || {
            if let Some(this) = weak.upgrade() {
                this.save_and_quit();
            }
        });
    }

    /// Persist every window's layout, end all processes and exit
    fn save_and_quit(&self) {
        let windows: Vec<Rc<DropWindow>> = self.windows.borrow().clone();
        {
            let mut store = self.shared.store.borrow_mut();
            for window in &windows {
                let mut layout = window.snapshot();
                layout::save_window(&mut store, &mut layout, true);
            }
            if let Err(e) = store.save() {
                log::error!("Failed to save layout: {}", e);
            }
        }
        for window in &windows {
            window.terminate_all();
        }
        log::info!("Quitting");
        self.app.quit();
    }

    /// The last tab of a window closed: forget its layout and drop it
    fn window_closed(&self, screen: u32) {
        let removed = {
            let mut windows = self.windows.borrow_mut();
            windows
                .iter()
                .position(|w| w.screen_id() == screen)
                .map(|i| windows.remove(i))
        };
        let Some(window) = removed else { return };

        {
            let mut store = self.shared.store.borrow_mut();
            let mut forgotten = WindowLayout::new(screen, Rect::default());
            layout::save_window(&mut store, &mut forgotten, false);
            if let Err(e) = store.save() {
                log::error!("Failed to save layout: {}", e);
            }
        }
        window.window().destroy();
        log::info!("Closed window of screen {}", screen);

        if self.windows.borrow().is_empty() {
            self.app.quit();
        }
    }
}

/// Install the window stylesheet on the default display
fn apply_css(config: &Config) {
    let provider = CssProvider::new();
    provider.load_from_data(&window_css(
        &config.terminal.color_background,
        config.general.separator_size,
    ));

    if let Some(display) = gdk::Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}
