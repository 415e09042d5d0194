//! Drop-down window implementation

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gdk4 as gdk;
use gtk4::prelude::*;
use gtk4::{
    Application, ApplicationWindow, Box as GtkBox, Builder, EventControllerKey, Notebook,
    PropagationPhase, Widget,
};

use dropterm_app::animation::{SlideAnimation, SlideDirection};
use dropterm_app::config::Config;
use dropterm_app::geometry::{
    adjacent_monitor, locate_window, place_window, transfer_to_monitor, Rect,
};
use dropterm_app::layout::{TabLayout, WindowLayout};
use dropterm_app::pane::{Axis, PaneLeaf, PaneTree};
use dropterm_app::resources::ResourceError;
use dropterm_app::session::{AfterClose, PageList};
use dropterm_app::shortcuts::ShortcutManager;
use dropterm_app::store::ConfigStore;
use dropterm_app::visibility::{InhibitGuard, VisibilityCommand, VisibilityPolicy};
use dropterm_ui::events::{Action, Direction, KeyCode, Modifiers};

use crate::dialogs;
use crate::panes::PaneHost;
use crate::tab_bar::TabBar;

/// Toggle requests this soon after a focus-loss hide are taken as its cause
const TOGGLE_GRACE: Duration = Duration::from_millis(300);

/// State shared by all windows of the application
pub struct Shared {
    pub config: Config,
    pub shortcuts: ShortcutManager,
    pub store: RefCell<ConfigStore>,
    pub ui_file: PathBuf,
}

/// Callback type for window events
type WindowCallback = Rc<RefCell<Option<Box<dyn Fn()>>>>;

/// One drop-down window
pub struct DropWindow {
    window: ApplicationWindow,
    notebook: Notebook,
    tab_bar: TabBar,
    shared: Rc<Shared>,
    pages: RefCell<PageList<Rc<PaneHost>>>,
    policy: RefCell<VisibilityPolicy>,
    /// Geometry and flags; `tabs` is only filled by [`DropWindow::snapshot`]
    layout: RefCell<WindowLayout>,
    monitor: Cell<usize>,
    show_scrollbar: Cell<bool>,
    on_quit: WindowCallback,
    on_closed: WindowCallback,
}

impl DropWindow {
    /// Create a window from the UI file and restore `layout` into it
    pub fn new(
        app: &Application,
        shared: Rc<Shared>,
        layout: WindowLayout,
    ) -> Result<Rc<Self>, ResourceError> {
        let builder = Builder::new();
        let missing = |what: &str| ResourceError::Missing {
            name: what.to_string(),
            searched: shared.ui_file.display().to_string(),
        };
        if let Err(e) = builder.add_from_file(&shared.ui_file) {
            log::error!("Failed to load {}: {}", shared.ui_file.display(), e);
            return Err(missing("main.ui"));
        }
        let window: ApplicationWindow = builder
            .object("window")
            .ok_or_else(|| missing("window object in main.ui"))?;
        let notebook: Notebook = builder
            .object("notebook")
            .ok_or_else(|| missing("notebook object in main.ui"))?;
        let tab_bar_box: GtkBox = builder
            .object("tab-bar-box")
            .ok_or_else(|| missing("tab-bar-box object in main.ui"))?;

        window.set_application(Some(app));
        if shared.config.window.use_border {
            window.set_decorated(true);
            window.add_css_class("bordered");
        }
        if shared.config.window.always_on_top || shared.config.general.hide_from_taskbar {
            // GTK4 has no stacking or taskbar hints
            log::debug!("Keep-above and taskbar hints are left to the window manager");
        }

        let policy = VisibilityPolicy::new().with_toggle_grace(TOGGLE_GRACE);
        let tab_bar = TabBar::new(policy.inhibitor().clone());
        tab_bar_box.append(tab_bar.widget());
        tab_bar.set_new_tab_tooltip(&shared.shortcuts.tooltip("New tab", &Action::NewPage));

        let show_scrollbar = shared.config.terminal.show_scrollbar;
        let tabs = layout.tabs.clone();
        let active_tab = layout.active_tab;

        let drop_window = Rc::new(Self {
            window,
            notebook,
            tab_bar,
            shared,
            pages: RefCell::new(PageList::new()),
            policy: RefCell::new(policy),
            layout: RefCell::new(layout),
            monitor: Cell::new(0),
            show_scrollbar: Cell::new(show_scrollbar),
            on_quit: Rc::new(RefCell::new(None)),
            on_closed: Rc::new(RefCell::new(None)),
        });

        drop_window.place_on_monitor();
        drop_window.watch_monitors();
        drop_window.setup_key_handler();
        drop_window.setup_window_signals();
        drop_window.setup_tab_bar_callbacks();

        for tab in &tabs {
            drop_window.add_page(Some(tab.name.clone()), tab);
        }
        drop_window.pages.borrow_mut().switch_to(active_tab);
        drop_window.sync_active();
        drop_window.update_tab_bar();

        Ok(drop_window)
    }

    pub fn screen_id(&self) -> u32 {
        self.layout.borrow().screen_id
    }

    pub fn window(&self) -> &ApplicationWindow {
        &self.window
    }

    /// Set callback for the quit action
    pub fn set_on_quit<F: Fn() + 'static>(&self, callback: F) {
        *self.on_quit.borrow_mut() = Some(Box::new(callback));
    }

    /// Set callback for when the window closed itself (last tab gone)
    pub fn set_on_closed<F: Fn() + 'static>(&self, callback: F) {
        *self.on_closed.borrow_mut() = Some(Box::new(callback));
    }

    /// Keep the window up until the guard is dropped
    pub fn inhibit_hide(&self) -> InhibitGuard {
        self.policy.borrow().inhibitor().inhibit()
    }

    /// Choose the monitor holding the stored geometry and place the window on it
    fn place_on_monitor(&self) {
        let rects: Vec<Rect> = monitor_rects().into_iter().map(|(_, r)| r).collect();

        let geometry = {
            let mut layout = self.layout.borrow_mut();
            let fallback = layout.screen_id as usize;
            let Some(located) = locate_window(layout.geometry, &rects, fallback) else {
                log::warn!("No monitors reported, keeping stored geometry");
                return;
            };
            if located.moved {
                log::info!("Stored geometry is off-screen, moving window to the primary monitor");
            }
            self.monitor.set(located.monitor);
            let screen = rects[located.monitor];
            layout.geometry = place_window(screen, located.geometry, layout.placement);
            layout.geometry
        };

        // The compositor owns the position; only the size can be applied
        self.window.set_default_size(geometry.width, geometry.height);
    }

    /// Re-check placement whenever monitors are plugged in or removed
    fn watch_monitors(self: &Rc<Self>) {
        let Some(display) = gdk::Display::default() else {
            return;
        };
        let weak = Rc::downgrade(self);
        display
            .monitors()
            .connect_items_changed(move |_, _, removed, added| {
                log::debug!("Monitors changed: {} removed, {} added", removed, added);
                if let Some(this) = weak.upgrade() {
                    this.monitors_changed();
                }
            });
    }

    fn monitors_changed(&self) {
        let monitors = monitor_rects();
        let rects: Vec<Rect> = monitors.iter().map(|(_, r)| *r).collect();

        let moved = {
            let mut layout = self.layout.borrow_mut();
            let Some(located) = locate_window(layout.geometry, &rects, self.monitor.get()) else {
                return;
            };
            self.monitor.set(located.monitor);
            if located.moved {
                let screen = rects[located.monitor];
                layout.geometry = place_window(screen, located.geometry, layout.placement);
                Some(layout.geometry)
            } else {
                None
            }
        };

        if let Some(geometry) = moved {
            log::info!(
                "Window of screen {} lost its monitor, moved to {:?}",
                self.screen_id(),
                geometry
            );
            if !self.policy.borrow().is_animating() {
                self.window.set_default_size(geometry.width, geometry.height);
            }
        }
        if self.window.is_fullscreen() {
            if let Some((monitor, _)) = monitors.get(self.monitor.get()) {
                self.window.fullscreen_on_monitor(monitor);
            }
        }
    }

    /// Set up keyboard event handler
    fn setup_key_handler(self: &Rc<Self>) {
        let key_controller = EventControllerKey::new();
        // Shortcuts take precedence over the terminal
        key_controller.set_propagation_phase(PropagationPhase::Capture);

        let weak = Rc::downgrade(self);
        key_controller.connect_key_pressed(move |_, keyval, _keycode, state| {
            let Some(this) = weak.upgrade() else {
                return glib::Propagation::Proceed;
            };
            let modifiers = gtk_modifiers_to_modifiers(state);
            if let Some(key) = keyval_to_keycode(keyval) {
                if let Some(action) = this.shared.shortcuts.match_event(key, modifiers) {
                    this.perform(action);
                    return glib::Propagation::Stop;
                }
            }
            // Pass to terminal
            glib::Propagation::Proceed
        });

        self.window.add_controller(key_controller);
    }

    fn setup_window_signals(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.window.connect_is_active_notify(move |window| {
            if window.is_active() {
                return;
            }
            if let Some(this) = weak.upgrade() {
                let command = this.policy.borrow_mut().on_focus_lost(
                    window.is_visible(),
                    now_ms(),
                    &this.shared.config.window,
                );
                this.execute(command);
            }
        });

        let weak = Rc::downgrade(self);
        self.window
            .connect_notify_local(Some("fullscreened"), move |window, _| {
                if let Some(this) = weak.upgrade() {
                    this.layout.borrow_mut().fullscreen = window.is_fullscreen();
                    this.update_tab_bar();
                }
            });

        for property in ["default-width", "default-height"] {
            let weak = Rc::downgrade(self);
            self.window
                .connect_notify_local(Some(property), move |window, _| {
                    if let Some(this) = weak.upgrade() {
                        this.track_size(window);
                    }
                });
        }

        let weak = Rc::downgrade(self);
        self.window.connect_close_request(move |_| {
            if let Some(this) = weak.upgrade() {
                this.request_quit();
            }
            glib::Propagation::Stop
        });
    }

    /// Remember a user resize of the visible, settled window
    fn track_size(&self, window: &ApplicationWindow) {
        if !window.is_visible() || window.is_fullscreen() || self.policy.borrow().is_animating() {
            return;
        }
        let (width, height) = window.default_size();
        if width > 0 && height > 0 {
            let mut layout = self.layout.borrow_mut();
            layout.geometry.width = width;
            layout.geometry.height = height;
        }
    }

    /// Set up tab bar callbacks
    fn setup_tab_bar_callbacks(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.tab_bar.set_on_new_tab(move || {
            if let Some(this) = weak.upgrade() {
                this.new_page(None, None);
            }
        });

        let weak = Rc::downgrade(self);
        self.tab_bar.set_on_click(move |id| {
            if let Some(this) = weak.upgrade() {
                let index = this.pages.borrow().find(id);
                if let Some(index) = index {
                    this.pages.borrow_mut().switch_to(index);
                    this.sync_active();
                }
            }
        });

        let weak = Rc::downgrade(self);
        self.tab_bar.set_on_close(move |id| {
            if let Some(this) = weak.upgrade() {
                this.close_page(id);
            }
        });

        let weak = Rc::downgrade(self);
        self.tab_bar.set_on_rename(move |id| {
            if let Some(this) = weak.upgrade() {
                this.rename_page(id);
            }
        });
    }

    /// Run a shortcut action
    fn perform(self: &Rc<Self>, action: Action) {
        log::debug!("Action {:?}", action);
        match action {
            Action::NewPage => {
                self.new_page(None, None);
            }
            Action::RenamePage => {
                if let Some(id) = self.active_page_id() {
                    self.rename_page(id);
                }
            }
            Action::ClosePage => {
                if let Some(id) = self.active_page_id() {
                    self.close_page(id);
                }
            }
            Action::NextPage => {
                self.pages.borrow_mut().next();
                self.sync_active();
            }
            Action::PrevPage => {
                self.pages.borrow_mut().prev();
                self.sync_active();
            }
            Action::MovePageLeft => {
                let moved = self.pages.borrow_mut().move_active_left();
                if moved {
                    self.sync_order();
                }
            }
            Action::MovePageRight => {
                let moved = self.pages.borrow_mut().move_active_right();
                if moved {
                    self.sync_order();
                }
            }
            // Side by side
            Action::SplitVertical => {
                if let Some(host) = self.active_host() {
                    host.split(Axis::Horizontal);
                }
            }
            // Stacked
            Action::SplitHorizontal => {
                if let Some(host) = self.active_host() {
                    host.split(Axis::Vertical);
                }
            }
            Action::CloseNode => {
                if let Some(host) = self.active_host() {
                    host.close_focused();
                }
            }
            Action::MoveFocus(direction) => {
                if let Some(host) = self.active_host() {
                    host.move_focus(direction);
                }
            }
            Action::MoveScreen(direction) => self.move_to_adjacent_monitor(direction),
            Action::ToggleFullscreen => self.toggle_fullscreen(),
            Action::Quit => self.request_quit(),
            Action::Copy => {
                if let Some(host) = self.active_host() {
                    host.copy();
                }
            }
            Action::Paste => {
                if let Some(host) = self.active_host() {
                    host.paste();
                }
            }
            Action::SelectAll => {
                if let Some(host) = self.active_host() {
                    host.select_all();
                }
            }
            Action::ToggleScrollbars => {
                let visible = !self.show_scrollbar.get();
                self.show_scrollbar.set(visible);
                for page in self.pages.borrow().iter() {
                    page.content.set_scrollbars(visible);
                }
            }
        }
    }

    fn request_quit(&self) {
        if let Some(ref callback) = *self.on_quit.borrow() {
            callback();
        }
    }

    fn active_host(&self) -> Option<Rc<PaneHost>> {
        self.pages.borrow().active().map(|p| Rc::clone(&p.content))
    }

    fn active_page_id(&self) -> Option<u64> {
        self.pages.borrow().active().map(|p| p.id)
    }

    /// Open a new page with a single terminal
    pub fn new_page(self: &Rc<Self>, program: Option<String>, cwd: Option<PathBuf>) -> u64 {
        let name = self.pages.borrow().next_default_name();
        let leaf = PaneLeaf {
            id: 0,
            program,
            cwd,
        };
        let tab = TabLayout::with_tree(name.clone(), PaneTree::leaf(leaf));
        let id = self.add_page(Some(name), &tab);
        self.sync_active();
        id
    }

    fn add_page(self: &Rc<Self>, name: Option<String>, tab: &TabLayout) -> u64 {
        let host = PaneHost::new(tab, &self.shared.config.terminal);
        host.set_scrollbars(self.show_scrollbar.get());

        let added = {
            let mut pages = self.pages.borrow_mut();
            let index = pages.add(name, Rc::clone(&host));
            pages.get(index).map(|p| (p.id, p.name.clone()))
        };
        let Some((id, name)) = added else {
            return 0;
        };

        self.notebook.append_page(host.widget(), None::<&Widget>);
        self.tab_bar.add_tab(id, &name);

        let weak = Rc::downgrade(self);
        host.set_on_empty(move || {
            if let Some(this) = weak.upgrade() {
                this.close_page(id);
            }
        });

        log::debug!("Opened page {} '{}'", id, name);
        id
    }

    /// Close a page and all of its panes
    pub fn close_page(self: &Rc<Self>, id: u64) {
        let closed = {
            let mut pages = self.pages.borrow_mut();
            pages.find(id).and_then(|index| pages.close(index))
        };
        let Some(page) = closed else { return };

        page.content.terminate_all();
        if let Some(num) = self.notebook.page_num(page.content.widget()) {
            self.notebook.remove_page(Some(num));
        }
        self.tab_bar.remove_tab(id);
        log::debug!("Closed page {} '{}'", id, page.name);

        let after = self
            .pages
            .borrow()
            .after_close(self.shared.config.general.spawn_term_on_last_close);
        match after {
            AfterClose::Nothing => self.sync_active(),
            AfterClose::SpawnPage => {
                self.new_page(None, None);
            }
            AfterClose::CloseWindow => {
                if let Some(ref callback) = *self.on_closed.borrow() {
                    callback();
                }
            }
        }
    }

    fn rename_page(self: &Rc<Self>, id: u64) {
        let current = {
            let pages = self.pages.borrow();
            pages.find(id).and_then(|i| pages.get(i)).map(|p| p.name.clone())
        };
        let Some(current) = current else { return };

        let weak: Weak<Self> = Rc::downgrade(self);
        dialogs::show_rename_dialog(&self.window, &current, self.inhibit_hide(), move |name| {
            let Some(this) = weak.upgrade() else { return };
            let renamed = {
                let mut pages = this.pages.borrow_mut();
                match pages.find(id) {
                    Some(index) if pages.rename(index, &name) => {
                        pages.get(index).map(|p| p.name.clone())
                    }
                    _ => None,
                }
            };
            if let Some(name) = renamed {
                this.tab_bar.set_title(id, &name);
            }
        });
    }

    /// Show the active page and focus its pane
    fn sync_active(&self) {
        let active = {
            let pages = self.pages.borrow();
            pages
                .active()
                .map(|p| (pages.active_index(), p.id, Rc::clone(&p.content)))
        };
        if let Some((index, id, host)) = active {
            self.notebook.set_current_page(Some(index as u32));
            self.tab_bar.set_active(id);
            host.focus_current();
        }
    }

    /// Make notebook and tab bar follow the page order
    fn sync_order(&self) {
        let order: Vec<(u64, Rc<PaneHost>)> = self
            .pages
            .borrow()
            .iter()
            .map(|p| (p.id, Rc::clone(&p.content)))
            .collect();
        for (index, (_, host)) in order.iter().enumerate() {
            self.notebook.reorder_child(host.widget(), Some(index as u32));
        }
        let ids: Vec<u64> = order.iter().map(|(id, _)| *id).collect();
        self.tab_bar.set_order(&ids);
        self.sync_active();
    }

    fn update_tab_bar(&self) {
        let layout = self.layout.borrow();
        let hidden =
            layout.hide_tab_bar || (layout.fullscreen && layout.hide_tab_bar_fullscreen);
        self.tab_bar.set_visible(!hidden);
    }

    /// Toggle request from a second launch
    pub fn toggle(self: &Rc<Self>, event_time: u64) {
        let command = self.policy.borrow().show_hide(
            self.window.is_visible(),
            event_time,
            &self.shared.config.window,
        );
        self.execute(command);
    }

    /// Show without animation, optionally fullscreen
    pub fn show_initial(self: &Rc<Self>, fullscreen: bool) {
        if fullscreen {
            self.layout.borrow_mut().fullscreen = true;
        }
        self.execute(VisibilityCommand::Show { animate: false });
    }

    fn execute(self: &Rc<Self>, command: VisibilityCommand) {
        match command {
            VisibilityCommand::Nothing => {}
            VisibilityCommand::Show { animate } => self.show(animate),
            VisibilityCommand::Hide { animate } => self.hide(animate),
        }
    }

    fn show(self: &Rc<Self>, animate: bool) {
        let (geometry, fullscreen) = {
            let layout = self.layout.borrow();
            (layout.geometry, layout.fullscreen)
        };
        log::debug!("Showing window of screen {}", self.screen_id());

        if fullscreen {
            self.window.present();
            if let Some(monitor) = self.current_monitor() {
                self.window.fullscreen_on_monitor(&monitor);
            }
            self.sync_active();
            return;
        }

        if animate {
            self.window.set_default_size(geometry.width, 1);
            self.window.present();
            self.policy.borrow_mut().set_animating(true);
            let animation = SlideAnimation::from_config(
                SlideDirection::Down,
                geometry.height,
                &self.shared.config.window,
            );
            self.animate_step(animation, geometry.width);
        } else {
            self.window
                .set_default_size(geometry.width, geometry.height);
            self.window.present();
            self.sync_active();
        }
    }

    fn hide(self: &Rc<Self>, animate: bool) {
        let (geometry, fullscreen) = {
            let layout = self.layout.borrow();
            (layout.geometry, layout.fullscreen)
        };
        log::debug!("Hiding window of screen {}", self.screen_id());

        if animate && !fullscreen {
            self.policy.borrow_mut().set_animating(true);
            let animation = SlideAnimation::from_config(
                SlideDirection::Up,
                geometry.height,
                &self.shared.config.window,
            );
            self.animate_step(animation, geometry.width);
        } else {
            self.window.set_visible(false);
        }
    }

    /// One resize step; reschedules itself until the sequence ends
    fn animate_step(self: &Rc<Self>, mut animation: SlideAnimation, width: i32) {
        match animation.next() {
            Some(height) => {
                self.window.set_default_size(width, height.max(1));
                let delay = animation.step_delay();
                let this = Rc::clone(self);
                glib::timeout_add_local_once(delay, move || this.animate_step(animation, width));
            }
            None => self.finish_animation(animation.direction()),
        }
    }

    fn finish_animation(&self, direction: SlideDirection) {
        self.policy.borrow_mut().set_animating(false);
        match direction {
            SlideDirection::Down => self.sync_active(),
            SlideDirection::Up => {
                self.window.set_visible(false);
                let geometry = self.layout.borrow().geometry;
                self.window
                    .set_default_size(geometry.width, geometry.height);
            }
        }
    }

    fn current_monitor(&self) -> Option<gdk::Monitor> {
        let monitors = monitor_rects();
        let index = self.monitor.get().min(monitors.len().saturating_sub(1));
        monitors.into_iter().nth(index).map(|(m, _)| m)
    }

    fn toggle_fullscreen(&self) {
        if self.window.is_fullscreen() {
            self.window.unfullscreen();
        } else if let Some(monitor) = self.current_monitor() {
            self.window.fullscreen_on_monitor(&monitor);
        } else {
            self.window.fullscreen();
        }
    }

    /// Move to the monitor left or right of the current one
    fn move_to_adjacent_monitor(&self, direction: Direction) {
        let monitors = monitor_rects();
        let rects: Vec<Rect> = monitors.iter().map(|(_, r)| *r).collect();
        let current = self.monitor.get().min(rects.len().saturating_sub(1));
        let Some(target) = adjacent_monitor(&rects, current, direction) else {
            return;
        };

        let geometry = {
            let mut layout = self.layout.borrow_mut();
            let moved = transfer_to_monitor(layout.geometry, rects[current], rects[target]);
            layout.geometry = place_window(rects[target], moved, layout.placement);
            layout.geometry
        };
        self.monitor.set(target);
        log::info!("Moved window to monitor {} at {:?}", target, geometry);

        self.window
            .set_default_size(geometry.width, geometry.height);
        if self.window.is_fullscreen() {
            self.window.fullscreen_on_monitor(&monitors[target].0);
        }
    }

    /// Current layout with every page's pane tree
    pub fn snapshot(&self) -> WindowLayout {
        let mut layout = self.layout.borrow().clone();
        let pages = self.pages.borrow();
        layout.tabs = pages
            .iter()
            .map(|page| TabLayout {
                name: page.name.clone(),
                tree: page.content.snapshot(),
                next_id: page.content.next_id(),
            })
            .collect();
        layout.active_tab = pages.active_index();
        layout
    }

    /// Hang up every process in this window
    pub fn terminate_all(&self) {
        for page in self.pages.borrow().iter() {
            page.content.terminate_all();
        }
    }
}

/// Monotonic clock in milliseconds, the time base of the visibility policy
pub fn now_ms() -> u64 {
    (glib::monotonic_time() / 1000).max(0) as u64
}

/// Connected monitors and their geometry
pub fn monitor_rects() -> Vec<(gdk::Monitor, Rect)> {
    let Some(display) = gdk::Display::default() else {
        return Vec::new();
    };
    let list = display.monitors();
    (0..list.n_items())
        .filter_map(|i| list.item(i))
        .filter_map(|obj| obj.downcast::<gdk::Monitor>().ok())
        .map(|monitor| {
            let g = monitor.geometry();
            let rect = Rect::new(g.x(), g.y(), g.width(), g.height());
            (monitor, rect)
        })
        .collect()
}

/// Convert GTK modifier state to our Modifiers
fn gtk_modifiers_to_modifiers(state: gdk::ModifierType) -> Modifiers {
    let mut modifiers = Modifiers::empty();

    if state.contains(gdk::ModifierType::CONTROL_MASK) {
        modifiers.insert(Modifiers::CTRL);
    }
    if state.contains(gdk::ModifierType::SHIFT_MASK) {
        modifiers.insert(Modifiers::SHIFT);
    }
    if state.contains(gdk::ModifierType::ALT_MASK) {
        modifiers.insert(Modifiers::ALT);
    }
    if state.contains(gdk::ModifierType::SUPER_MASK) {
        modifiers.insert(Modifiers::SUPER);
    }

    modifiers
}

/// Convert GDK keyval to our KeyCode by its keyval name
fn keyval_to_keycode(keyval: gdk::Key) -> Option<KeyCode> {
    let name = keyval.to_lower().name()?;
    let name = match name.as_str() {
        "KP_Enter" => "Return",
        "ISO_Left_Tab" => "Tab",
        // Shifted punctuation reports its own keyval
        "underscore" => "minus",
        "less" => "comma",
        "greater" => "period",
        "question" => "slash",
        "bar" => "backslash",
        "colon" => "semicolon",
        "quotedbl" => "apostrophe",
        "braceleft" => "bracketleft",
        "braceright" => "bracketright",
        "asciitilde" => "grave",
        other => other,
    };
    KeyCode::from_name(name)
}
