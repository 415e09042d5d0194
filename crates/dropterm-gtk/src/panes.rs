//! Split pane container for one tab
//!
//! The layout lives in a [`PaneTree`]; the GTK widgets are rebuilt from it
//! whenever its shape changes. Terminal widgets survive rebuilds, only the
//! `Paned` scaffolding between them is recreated.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use gtk4::prelude::*;
use gtk4::{Box as GtkBox, Orientation, Paned, Widget};

use dropterm_app::config::TerminalConfig;
use dropterm_app::layout::TabLayout;
use dropterm_app::pane::{Axis, PaneLeaf, PaneTree, SplitPosition};
use dropterm_ui::events::Direction;

use crate::terminal::PaneTerminal;

/// Callback type for pane container events
type EventCallback = Rc<RefCell<Option<Box<dyn Fn()>>>>;

/// All panes of one tab
pub struct PaneHost {
    container: GtkBox,
    tree: RefCell<PaneTree>,
    terminals: RefCell<HashMap<u32, PaneTerminal>>,
    focused: Cell<u32>,
    next_id: Cell<u32>,
    config: TerminalConfig,
    show_scrollbar: Cell<bool>,
    /// Fired when the last pane closes
    on_empty: EventCallback,
}

impl PaneHost {
    /// Create the panes described by `layout` and start their processes
    pub fn new(layout: &TabLayout, config: &TerminalConfig) -> Rc<Self> {
        let container = GtkBox::new(Orientation::Vertical, 0);
        container.set_hexpand(true);
        container.set_vexpand(true);

        let host = Rc::new(Self {
            container,
            tree: RefCell::new(layout.tree.clone()),
            terminals: RefCell::new(HashMap::new()),
            focused: Cell::new(layout.tree.first_leaf().id),
            next_id: Cell::new(layout.next_id.max(layout.tree.max_id() + 1)),
            config: config.clone(),
            show_scrollbar: Cell::new(config.show_scrollbar),
            on_empty: Rc::new(RefCell::new(None)),
        });

        let leaves: Vec<PaneLeaf> = host.tree.borrow().leaves().into_iter().cloned().collect();
        for leaf in &leaves {
            host.add_terminal(leaf);
        }
        host.render();
        host
    }

    /// Get the widget for adding to containers
    pub fn widget(&self) -> &GtkBox {
        &self.container
    }

    /// Set callback for when the last pane has gone
    pub fn set_on_empty<F: Fn() + 'static>(&self, callback: F) {
        *self.on_empty.borrow_mut() = Some(Box::new(callback));
    }

    fn add_terminal(self: &Rc<Self>, leaf: &PaneLeaf) {
        let terminal = PaneTerminal::new(leaf, &self.config);
        terminal.set_scrollbar(self.show_scrollbar.get());
        let id = leaf.id;

        let weak: Weak<Self> = Rc::downgrade(self);
        terminal.set_on_focus(move || {
            if let Some(host) = weak.upgrade() {
                host.focused.set(id);
            }
        });

        // Closing rebuilds widgets, so leave the signal handler first
        let weak: Weak<Self> = Rc::downgrade(self);
        terminal.set_on_exit(move || {
            let weak = weak.clone();
            glib::idle_add_local_once(move || {
                if let Some(host) = weak.upgrade() {
                    host.close(id);
                }
            });
        });

        self.terminals.borrow_mut().insert(id, terminal);
    }

    /// Recreate the widget hierarchy from the tree
    fn render(&self) {
        if let Some(old) = self.container.first_child() {
            detach(&old);
            self.container.remove(&old);
        }
        let tree = self.tree.borrow();
        let terminals = self.terminals.borrow();
        if let Some(widget) = build(&tree, &terminals) {
            self.container.append(&widget);
        }
    }

    /// Copy divider positions from the widgets back into the tree
    fn sync_positions(&self) {
        if let Some(root) = self.container.first_child() {
            read_positions(&mut self.tree.borrow_mut(), &root);
        }
    }

    /// Split the focused pane. The new pane starts in the focused pane's
    /// working directory and receives focus.
    pub fn split(self: &Rc<Self>, axis: Axis) {
        let target = self.focused.get();
        let cwd = self.terminals.borrow().get(&target).and_then(|t| t.cwd());

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let leaf = PaneLeaf {
            id,
            program: None,
            cwd,
        };

        self.sync_positions();
        let placed = self
            .tree
            .borrow_mut()
            .split(target, axis, SplitPosition::CENTER, leaf.clone());
        if !placed {
            log::warn!("Cannot split pane {}: not in this tab", target);
            return;
        }
        self.add_terminal(&leaf);
        self.render();
        self.focus(id);
        log::debug!("Split pane {} ({}), new pane {}", target, axis, id);
    }

    /// Close the focused pane
    pub fn close_focused(&self) {
        self.close(self.focused.get());
    }

    /// Close one pane. Closing the last pane fires the empty callback.
    pub fn close(&self, id: u32) {
        if !self.terminals.borrow().contains_key(&id) {
            return;
        }
        if self.tree.borrow().leaf_count() <= 1 {
            self.terminate_all();
            if let Some(ref callback) = *self.on_empty.borrow() {
                callback();
            }
            return;
        }

        self.sync_positions();
        self.tree.borrow_mut().remove(id);
        if let Some(terminal) = self.terminals.borrow_mut().remove(&id) {
            terminal.terminate();
        }
        self.render();

        if self.focused.get() == id {
            let next = self.tree.borrow().first_leaf().id;
            self.focus(next);
        }
    }

    /// Move focus to the neighbouring pane
    pub fn move_focus(&self, direction: Direction) {
        let target = self.tree.borrow().neighbor(self.focused.get(), direction);
        if let Some(id) = target {
            self.focus(id);
        }
    }

    /// Focus a pane by id
    pub fn focus(&self, id: u32) {
        if let Some(terminal) = self.terminals.borrow().get(&id) {
            self.focused.set(id);
            terminal.grab_focus();
        }
    }

    /// Focus whichever pane last had focus
    pub fn focus_current(&self) {
        self.focus(self.focused.get());
    }

    pub fn copy(&self) {
        if let Some(t) = self.terminals.borrow().get(&self.focused.get()) {
            t.copy();
        }
    }

    pub fn paste(&self) {
        if let Some(t) = self.terminals.borrow().get(&self.focused.get()) {
            t.paste();
        }
    }

    pub fn select_all(&self) {
        if let Some(t) = self.terminals.borrow().get(&self.focused.get()) {
            t.select_all();
        }
    }

    pub fn set_scrollbars(&self, visible: bool) {
        self.show_scrollbar.set(visible);
        for terminal in self.terminals.borrow().values() {
            terminal.set_scrollbar(visible);
        }
    }

    /// Current layout with live divider positions and working directories
    pub fn snapshot(&self) -> PaneTree {
        self.sync_positions();
        let terminals = self.terminals.borrow();
        let mut tree = self.tree.borrow().clone();
        refresh_leaves(&mut tree, &terminals);
        tree
    }

    pub fn next_id(&self) -> u32 {
        self.next_id.get()
    }

    /// Hang up every process of this tab
    pub fn terminate_all(&self) {
        for terminal in self.terminals.borrow().values() {
            terminal.terminate();
        }
    }
}

fn orientation(axis: Axis) -> Orientation {
    match axis {
        Axis::Horizontal => Orientation::Horizontal,
        Axis::Vertical => Orientation::Vertical,
    }
}

fn build(tree: &PaneTree, terminals: &HashMap<u32, PaneTerminal>) -> Option<Widget> {
    match tree {
        PaneTree::Leaf(leaf) => terminals
            .get(&leaf.id)
            .map(|t| t.widget().clone().upcast::<Widget>()),
        PaneTree::Split {
            axis,
            position,
            first,
            second,
        } => {
            let paned = Paned::new(orientation(*axis));
            paned.set_hexpand(true);
            paned.set_vexpand(true);
            paned.set_shrink_start_child(false);
            paned.set_shrink_end_child(false);
            paned.set_start_child(build(first, terminals).as_ref());
            paned.set_end_child(build(second, terminals).as_ref());

            // The divider can only be placed once the paned has a size
            let position = *position;
            let placed = Cell::new(false);
            paned.connect_notify_local(Some("max-position"), move |paned, _| {
                let max = paned.max_position();
                if !placed.get() && max > 0 {
                    placed.set(true);
                    paned.set_position(position.to_pixels(max));
                }
            });
            Some(paned.upcast())
        }
    }
}

/// Unparent everything below `widget` so terminals can be re-attached
fn detach(widget: &Widget) {
    if let Some(paned) = widget.downcast_ref::<Paned>() {
        if let Some(child) = paned.start_child() {
            detach(&child);
        }
        if let Some(child) = paned.end_child() {
            detach(&child);
        }
        paned.set_start_child(None::<&Widget>);
        paned.set_end_child(None::<&Widget>);
    }
}

fn read_positions(tree: &mut PaneTree, widget: &Widget) {
    let PaneTree::Split {
        position,
        first,
        second,
        ..
    } = tree
    else {
        return;
    };
    let Some(paned) = widget.downcast_ref::<Paned>() else {
        return;
    };
    // An unallocated paned keeps its last known position
    let max = paned.max_position();
    if max > 0 {
        *position = SplitPosition::from_pixels(paned.position(), max);
    }
    if let Some(child) = paned.start_child() {
        read_positions(first, &child);
    }
    if let Some(child) = paned.end_child() {
        read_positions(second, &child);
    }
}

fn refresh_leaves(tree: &mut PaneTree, terminals: &HashMap<u32, PaneTerminal>) {
    match tree {
        PaneTree::Leaf(leaf) => {
            if let Some(terminal) = terminals.get(&leaf.id) {
                *leaf = terminal.leaf();
            }
        }
        PaneTree::Split { first, second, .. } => {
            refresh_leaves(first, terminals);
            refresh_leaves(second, terminals);
        }
    }
}
