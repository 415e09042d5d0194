//! Custom tab bar widget

use std::cell::RefCell;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{Box as GtkBox, Button, GestureClick, Label, Orientation, Popover, Widget};

use dropterm_app::visibility::{InhibitGuard, LoseFocusInhibitor};

/// Callback type for tab bar events
type TabCallback = Rc<RefCell<Option<Box<dyn Fn()>>>>;
/// Callback type for per-tab events, receiving the tab id
type TabIdCallback = Rc<RefCell<Option<Box<dyn Fn(u64)>>>>;

/// Tab bar widget
#[derive(Clone)]
pub struct TabBar {
    container: GtkBox,
    tabs_box: GtkBox,
    new_tab_button: Button,
    tabs: Rc<RefCell<Vec<TabInfo>>>,
    inhibitor: LoseFocusInhibitor,
    /// Held while a context menu is open
    menu_guard: Rc<RefCell<Option<InhibitGuard>>>,
    on_new_tab: TabCallback,
    on_click: TabIdCallback,
    on_close: TabIdCallback,
    on_rename: TabIdCallback,
}

struct TabInfo {
    id: u64,
    button: Button,
    label: Label,
}

impl TabBar {
    /// Create a new tab bar
    pub fn new(inhibitor: LoseFocusInhibitor) -> Self {
        let container = GtkBox::builder()
            .orientation(Orientation::Horizontal)
            .spacing(0)
            .build();
        container.add_css_class("dropterm-tab-bar");

        let tabs_box = GtkBox::builder()
            .orientation(Orientation::Horizontal)
            .spacing(2)
            .hexpand(true)
            .build();

        let new_tab_button = Button::builder().label("+").focusable(false).build();
        new_tab_button.add_css_class("new-tab-button");

        container.append(&tabs_box);
        container.append(&new_tab_button);

        let tab_bar = Self {
            container,
            tabs_box,
            new_tab_button: new_tab_button.clone(),
            tabs: Rc::new(RefCell::new(Vec::new())),
            inhibitor,
            menu_guard: Rc::new(RefCell::new(None)),
            on_new_tab: Rc::new(RefCell::new(None)),
            on_click: Rc::new(RefCell::new(None)),
            on_close: Rc::new(RefCell::new(None)),
            on_rename: Rc::new(RefCell::new(None)),
        };

        // Set up new tab button click
        let on_new_tab = Rc::clone(&tab_bar.on_new_tab);
        new_tab_button.connect_clicked(move |_| {
            if let Some(ref callback) = *on_new_tab.borrow() {
                callback();
            }
        });

        tab_bar
    }

    /// Get the widget
    pub fn widget(&self) -> &GtkBox {
        &self.container
    }

    pub fn set_new_tab_tooltip(&self, text: &str) {
        self.new_tab_button.set_tooltip_text(Some(text));
    }

    /// Add a new tab at the end
    pub fn add_tab(&self, id: u64, title: &str) {
        let label = Label::new(Some(title));
        let button = Button::builder().child(&label).focusable(false).build();

        let on_click = Rc::clone(&self.on_click);
        button.connect_clicked(move |_| {
            if let Some(ref callback) = *on_click.borrow() {
                callback(id);
            }
        });

        // Double click renames
        let double_click = GestureClick::builder().button(1).build();
        let on_rename = Rc::clone(&self.on_rename);
        double_click.connect_pressed(move |_, n_press, _, _| {
            if n_press == 2 {
                if let Some(ref callback) = *on_rename.borrow() {
                    callback(id);
                }
            }
        });
        button.add_controller(double_click);

        let right_click = GestureClick::builder().button(3).build();
        let this = self.clone();
        let anchor = button.clone();
        right_click.connect_pressed(move |_, _, _, _| {
            this.show_context_menu(id, &anchor);
        });
        button.add_controller(right_click);

        self.tabs_box.append(&button);
        self.tabs.borrow_mut().push(TabInfo { id, button, label });
    }

    fn show_context_menu(&self, id: u64, anchor: &Button) {
        let menu_box = GtkBox::new(Orientation::Vertical, 0);
        let rename = Button::builder().label("Rename").has_frame(false).build();
        let close = Button::builder().label("Close").has_frame(false).build();
        menu_box.append(&rename);
        menu_box.append(&close);

        let popover = Popover::builder().child(&menu_box).has_arrow(false).build();
        popover.set_parent(anchor);

        let on_rename = Rc::clone(&self.on_rename);
        let popover_ref = popover.clone();
        rename.connect_clicked(move |_| {
            popover_ref.popdown();
            if let Some(ref callback) = *on_rename.borrow() {
                callback(id);
            }
        });

        let on_close = Rc::clone(&self.on_close);
        let popover_ref = popover.clone();
        close.connect_clicked(move |_| {
            popover_ref.popdown();
            if let Some(ref callback) = *on_close.borrow() {
                callback(id);
            }
        });

        let menu_guard = Rc::clone(&self.menu_guard);
        popover.connect_closed(move |popover| {
            menu_guard.borrow_mut().take();
            let popover = popover.clone();
            glib::idle_add_local_once(move || popover.unparent());
        });

        *self.menu_guard.borrow_mut() = Some(self.inhibitor.inhibit());
        popover.popup();
    }

    /// Remove a tab
    pub fn remove_tab(&self, id: u64) {
        let mut tabs = self.tabs.borrow_mut();
        if let Some(idx) = tabs.iter().position(|t| t.id == id) {
            let tab = tabs.remove(idx);
            self.tabs_box.remove(&tab.button);
        }
    }

    /// Set the active tab
    pub fn set_active(&self, id: u64) {
        for tab in self.tabs.borrow().iter() {
            if tab.id == id {
                tab.button.add_css_class("active");
            } else {
                tab.button.remove_css_class("active");
            }
        }
    }

    /// Update tab title
    pub fn set_title(&self, id: u64, title: &str) {
        for tab in self.tabs.borrow().iter() {
            if tab.id == id {
                tab.label.set_text(title);
                break;
            }
        }
    }

    /// Reorder buttons to match `order` (tab ids, left to right)
    pub fn set_order(&self, order: &[u64]) {
        let mut tabs = self.tabs.borrow_mut();
        tabs.sort_by_key(|t| order.iter().position(|id| *id == t.id).unwrap_or(usize::MAX));
        let mut previous: Option<Widget> = None;
        for tab in tabs.iter() {
            self.tabs_box.reorder_child_after(&tab.button, previous.as_ref());
            previous = Some(tab.button.clone().upcast());
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.container.set_visible(visible);
    }

    /// Set callback for new tab button
    pub fn set_on_new_tab<F: Fn() + 'static>(&self, callback: F) {
        *self.on_new_tab.borrow_mut() = Some(Box::new(callback));
    }

    /// Set callback for tab click
    pub fn set_on_click<F: Fn(u64) + 'static>(&self, callback: F) {
        *self.on_click.borrow_mut() = Some(Box::new(callback));
    }

    /// Set callback for the close menu entry
    pub fn set_on_close<F: Fn(u64) + 'static>(&self, callback: F) {
        *self.on_close.borrow_mut() = Some(Box::new(callback));
    }

    /// Set callback for rename requests
    pub fn set_on_rename<F: Fn(u64) + 'static>(&self, callback: F) {
        *self.on_rename.borrow_mut() = Some(Box::new(callback));
    }
}
