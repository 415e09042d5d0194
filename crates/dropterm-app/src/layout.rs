//! Window/tab/pane layout persistence
//!
//! A window's layout is spread across store sections:
//!
//! - `layout-Screen-<screen>`: geometry and window flags
//! - `layout-Tabs-<screen>-<tab>`: tab name, optional `disabled`
//! - `layout-Child-<screen>-<tab>-<child>`: one flattened pane record
//!
//! Section names are matched by their parsed numeric fields so that screen 1
//! never picks up the sections of screen 10.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::{Placement, Rect};
use crate::pane::{Axis, PaneLeaf, PaneRecord, PaneTree};
use crate::session::default_page_name;
use crate::store::ConfigStore;

const PREFIX: &str = "layout-";

/// Layout decoding errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Not a layout section: {0}")]
    InvalidSection(String),

    #[error("Section {section} has no valid '{field}'")]
    MissingField { section: String, field: &'static str },
}

/// Parsed layout section name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SectionKey {
    Screen { screen: u32 },
    Tabs { screen: u32, tab: u32 },
    Child { screen: u32, tab: u32, child: u32 },
}

impl SectionKey {
    pub fn parse(name: &str) -> Result<Self, LayoutError> {
        let invalid = || LayoutError::InvalidSection(name.to_string());
        let rest = name.strip_prefix(PREFIX).ok_or_else(invalid)?;
        let mut parts = rest.split('-');
        let kind = parts.next().ok_or_else(invalid)?;
        let numbers: Vec<u32> = parts
            .map(|p| p.parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;

        match (kind, numbers.as_slice()) {
            ("Screen", [screen]) => Ok(SectionKey::Screen { screen: *screen }),
            ("Tabs", [screen, tab]) => Ok(SectionKey::Tabs {
                screen: *screen,
                tab: *tab,
            }),
            ("Child", [screen, tab, child]) => Ok(SectionKey::Child {
                screen: *screen,
                tab: *tab,
                child: *child,
            }),
            _ => Err(invalid()),
        }
    }

    pub fn screen(&self) -> u32 {
        match *self {
            SectionKey::Screen { screen }
            | SectionKey::Tabs { screen, .. }
            | SectionKey::Child { screen, .. } => screen,
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKey::Screen { screen } => write!(f, "{}Screen-{}", PREFIX, screen),
            SectionKey::Tabs { screen, tab } => write!(f, "{}Tabs-{}-{}", PREFIX, screen, tab),
            SectionKey::Child { screen, tab, child } => {
                write!(f, "{}Child-{}-{}-{}", PREFIX, screen, tab, child)
            }
        }
    }
}

/// One tab's persisted state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLayout {
    pub name: String,
    pub tree: PaneTree,
    /// Next free pane id
    pub next_id: u32,
}

impl TabLayout {
    /// Tab with a single default terminal
    pub fn new(name: String) -> Self {
        Self::with_tree(name, PaneTree::leaf(PaneLeaf::new(0)))
    }

    pub fn with_tree(name: String, tree: PaneTree) -> Self {
        let next_id = tree.max_id() + 1;
        Self {
            name,
            tree,
            next_id,
        }
    }
}

/// One window's persisted state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowLayout {
    pub screen_id: u32,
    pub geometry: Rect,
    pub fullscreen: bool,
    pub placement: Placement,
    pub hide_tab_bar: bool,
    pub hide_tab_bar_fullscreen: bool,
    pub tabs: Vec<TabLayout>,
    pub active_tab: usize,
}

impl WindowLayout {
    /// Window with one default tab
    pub fn new(screen_id: u32, geometry: Rect) -> Self {
        Self {
            screen_id,
            geometry,
            fullscreen: false,
            placement: Placement::default(),
            hide_tab_bar: false,
            hide_tab_bar_fullscreen: false,
            tabs: vec![TabLayout::new(default_page_name(0))],
            active_tab: 0,
        }
    }
}

/// Layout sections present in the store, parsed
fn keys(store: &ConfigStore) -> Vec<(String, SectionKey)> {
    store
        .sections()
        .into_iter()
        .filter(|name| name.starts_with(PREFIX))
        .filter_map(|name| match SectionKey::parse(&name) {
            Ok(key) => Some((name, key)),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        })
        .collect()
}

/// Tab indices of `screen` marked disabled
fn disabled_tabs(store: &ConfigStore, screen: u32) -> BTreeSet<u32> {
    keys(store)
        .into_iter()
        .filter_map(|(name, key)| match key {
            SectionKey::Tabs { screen: s, tab } if s == screen => {
                store.get_bool(&name, "disabled").unwrap_or(false).then_some(tab)
            }
            _ => None,
        })
        .collect()
}

/// Screen ids that have any layout stored, ascending
pub fn screens(store: &ConfigStore) -> Vec<u32> {
    keys(store)
        .into_iter()
        .map(|(_, key)| key.screen())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Write `window` into the store.
///
/// With `keep` false the window's sections are removed instead. Disabled tab
/// sections and their pane records are never touched when keeping.
pub fn save_window(store: &mut ConfigStore, window: &mut WindowLayout, keep: bool) {
    let screen = window.screen_id;
    let disabled = disabled_tabs(store, screen);

    for (name, key) in keys(store) {
        let remove = match key {
            SectionKey::Screen { screen: s } => s == screen && !keep,
            SectionKey::Tabs { screen: s, tab } | SectionKey::Child { screen: s, tab, .. } => {
                s == screen && (!keep || !disabled.contains(&tab))
            }
        };
        if remove {
            store.remove_section(&name);
        }
    }

    if !keep {
        log::debug!("Forgot layout of screen {}", screen);
        return;
    }

    let section = SectionKey::Screen { screen }.to_string();
    let g = window.geometry;
    store.set_int(&section, "width", g.width as i64);
    store.set_int(&section, "height", g.height as i64);
    store.set_int(&section, "posx", g.x as i64);
    store.set_int(&section, "posy", g.y as i64);
    store.set_bool(&section, "fullscreen", window.fullscreen);
    store.set_int(&section, "active-tab", window.active_tab as i64);
    if let Some(v) = window.placement.vertical {
        store.set_int(&section, "vertical-position", v as i64);
    }
    if let Some(h) = window.placement.horizontal {
        store.set_int(&section, "horizontal-position", h as i64);
    }
    store.set_bool(&section, "hide-tab-bar", window.hide_tab_bar);
    store.set_bool(&section, "hide-tab-bar-fullscreen", window.hide_tab_bar_fullscreen);

    let mut slots = (0u32..).filter(|t| !disabled.contains(t));
    for tab in &mut window.tabs {
        let Some(index) = slots.next() else { break };
        let tab_section = SectionKey::Tabs { screen, tab: index }.to_string();
        store.set_str(&tab_section, "name", &tab.name);

        for (child, record) in tab.tree.flatten().into_iter().enumerate() {
            let child_section = SectionKey::Child {
                screen,
                tab: index,
                child: child as u32,
            }
            .to_string();
            write_record(store, &child_section, &record);
        }
    }
    log::debug!(
        "Saved layout of screen {} ({} tabs)",
        screen,
        window.tabs.len()
    );
}

fn write_record(store: &mut ConfigStore, section: &str, record: &PaneRecord) {
    store.set_int(section, "id", record.id as i64);
    store.set_int(section, "parent", record.parent as i64);
    store.set_str(section, "axis", &record.axis.to_string());
    store.set_int(section, "pos", record.position as i64);
    store.set_str(section, "prog", record.program.as_deref().unwrap_or(""));
    let pwd = record
        .cwd
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    store.set_str(section, "pwd", &pwd);
}

/// Decode one `layout-Child-*` section
pub fn read_record(store: &ConfigStore, section: &str) -> Result<PaneRecord, LayoutError> {
    let missing = |field| LayoutError::MissingField {
        section: section.to_string(),
        field,
    };
    let id = store
        .get_int(section, "id")
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| missing("id"))?;
    let parent = store
        .get_int(section, "parent")
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| missing("parent"))?;
    let axis = store
        .get_str(section, "axis")
        .and_then(Axis::parse)
        .ok_or_else(|| missing("axis"))?;
    let position = store
        .get_int(section, "pos")
        .map(|p| p.clamp(-1, i32::MAX as i64) as i32)
        .unwrap_or(-1);
    let (program, cwd) = read_process(store, section);

    Ok(PaneRecord {
        id,
        parent,
        axis,
        position,
        program,
        cwd,
    })
}

/// Program and working directory of a child section; empty means unset
fn read_process(store: &ConfigStore, section: &str) -> (Option<String>, Option<PathBuf>) {
    let program = store
        .get_str(section, "prog")
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let cwd = store
        .get_str(section, "pwd")
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);
    (program, cwd)
}

/// Root leaf of a tab from its child 0 section. Only the process fields
/// matter: the root is always id 0 and has no parent or split.
fn read_root(store: &ConfigStore, section: &str) -> PaneLeaf {
    let (program, cwd) = read_process(store, section);
    PaneLeaf {
        id: 0,
        program,
        cwd,
    }
}

/// Read the layout of `screen_id`. Missing values fall back to
/// `default_geometry` and a single default tab.
pub fn load_window(store: &ConfigStore, screen_id: u32, default_geometry: Rect) -> WindowLayout {
    let mut window = WindowLayout::new(screen_id, default_geometry);
    let section = SectionKey::Screen { screen: screen_id }.to_string();

    let int = |key: &str, fallback: i32| {
        store
            .get_int(&section, key)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(fallback)
    };
    window.geometry = Rect::new(
        int("posx", default_geometry.x),
        int("posy", default_geometry.y),
        int("width", default_geometry.width),
        int("height", default_geometry.height),
    );
    if window.geometry.width <= 0 || window.geometry.height <= 0 {
        window.geometry = default_geometry;
    }
    window.fullscreen = store.get_bool(&section, "fullscreen").unwrap_or(false);
    let percent = |key: &str| {
        store
            .get_int(&section, key)
            .and_then(|v| u32::try_from(v).ok())
    };
    window.placement = Placement {
        vertical: percent("vertical-position"),
        horizontal: percent("horizontal-position"),
    };
    window.hide_tab_bar = store.get_bool(&section, "hide-tab-bar").unwrap_or(false);
    window.hide_tab_bar_fullscreen = store
        .get_bool(&section, "hide-tab-bar-fullscreen")
        .unwrap_or(false);

    let all = keys(store);
    let mut tab_indices: Vec<(u32, String)> = all
        .iter()
        .filter_map(|(name, key)| match *key {
            SectionKey::Tabs { screen, tab } if screen == screen_id => {
                Some((tab, name.clone()))
            }
            _ => None,
        })
        .filter(|(_, name)| !store.get_bool(name, "disabled").unwrap_or(false))
        .collect();
    tab_indices.sort();

    let mut tabs = Vec::new();
    for (tab, tab_section) in tab_indices {
        let name = store
            .get_str(&tab_section, "name")
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_page_name(tabs.len()));

        let mut children: Vec<(u32, &str)> = all
            .iter()
            .filter_map(|(child_section, key)| match *key {
                SectionKey::Child {
                    screen,
                    tab: t,
                    child,
                } if screen == screen_id && t == tab => Some((child, child_section.as_str())),
                _ => None,
            })
            .collect();
        children.sort();

        let mut root = None;
        let mut records = Vec::new();
        for (child, child_section) in children {
            if child == 0 {
                root = Some(read_root(store, child_section));
                continue;
            }
            match read_record(store, child_section) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("{}", e),
            }
        }
        let root = root.unwrap_or_else(|| {
            log::warn!(
                "Tab '{}' of screen {} has no root pane, using a default one",
                name,
                screen_id
            );
            PaneLeaf::new(0)
        });

        let (tree, dropped) = PaneTree::with_root(root, &records);
        if !dropped.is_empty() {
            log::warn!(
                "Tab '{}' of screen {} restored without {} pane(s)",
                name,
                screen_id,
                dropped.len()
            );
        }
        tabs.push(TabLayout::with_tree(name, tree));
    }

    if !tabs.is_empty() {
        window.tabs = tabs;
    }
    let active = store
        .get_int(&section, "active-tab")
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(0);
    window.active_tab = active.min(window.tabs.len() - 1);
    window
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pane::SplitPosition;

    fn leaf(id: u32, prog: &str) -> PaneLeaf {
        PaneLeaf {
            id,
            program: Some(prog.to_string()),
            cwd: Some(PathBuf::from(format!("/work/{}", id))),
        }
    }

    fn sample_window(screen_id: u32) -> WindowLayout {
        let mut tree = PaneTree::leaf(leaf(0, "bash"));
        tree.split(0, Axis::Horizontal, SplitPosition::from_percent(30.0), leaf(1, "htop"));
        tree.split(1, Axis::Vertical, SplitPosition::CENTER, leaf(2, "vim"));

        let mut window = WindowLayout::new(screen_id, Rect::new(10, 20, 1000, 400));
        window.tabs = vec![
            TabLayout::with_tree("Work".into(), tree),
            TabLayout::new("Terminal 2".into()),
        ];
        window.active_tab = 1;
        window.fullscreen = true;
        window
    }

    #[test]
    fn test_section_key_parse() {
        assert_eq!(
            SectionKey::parse("layout-Child-1-2-10"),
            Ok(SectionKey::Child {
                screen: 1,
                tab: 2,
                child: 10
            })
        );
        assert_eq!(
            SectionKey::parse("layout-Tabs-0-3"),
            Ok(SectionKey::Tabs { screen: 0, tab: 3 })
        );
        assert!(SectionKey::parse("layout-Tabs-0").is_err());
        assert!(SectionKey::parse("layout-Child-a-0-0").is_err());
        assert!(SectionKey::parse("general").is_err());

        let key = SectionKey::Child {
            screen: 4,
            tab: 0,
            child: 7,
        };
        assert_eq!(SectionKey::parse(&key.to_string()), Ok(key));
    }

    #[test]
    fn test_save_writes_expected_sections() {
        let mut store = ConfigStore::new();
        let mut window = sample_window(0);
        save_window(&mut store, &mut window, true);

        assert_eq!(store.get_int("layout-Screen-0", "width"), Some(1000));
        assert_eq!(store.get_bool("layout-Screen-0", "fullscreen"), Some(true));
        assert_eq!(store.get_str("layout-Tabs-0-0", "name"), Some("Work"));
        assert_eq!(store.get_str("layout-Tabs-0-1", "name"), Some("Terminal 2"));

        assert_eq!(store.get_int("layout-Child-0-0-0", "id"), Some(0));
        assert_eq!(store.get_int("layout-Child-0-0-0", "parent"), Some(0));
        assert_eq!(store.get_int("layout-Child-0-0-0", "pos"), Some(-1));
        assert_eq!(store.get_str("layout-Child-0-0-0", "axis"), Some("v"));
        assert_eq!(store.get_int("layout-Child-0-0-1", "parent"), Some(0));
        assert_eq!(store.get_str("layout-Child-0-0-1", "axis"), Some("h"));
        assert_eq!(store.get_int("layout-Child-0-0-1", "pos"), Some(3000));
        assert_eq!(store.get_str("layout-Child-0-0-2", "prog"), Some("vim"));
        assert!(!store.has_section("layout-Child-0-0-3"));
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut store = ConfigStore::new();
        let mut window = sample_window(0);
        save_window(&mut store, &mut window, true);

        let loaded = load_window(&store, 0, Rect::new(0, 0, 1, 1));
        assert_eq!(loaded, window);
    }

    #[test]
    fn test_resave_removes_stale_children() {
        let mut store = ConfigStore::new();
        let mut window = sample_window(0);
        save_window(&mut store, &mut window, true);

        window.tabs.truncate(1);
        window.tabs[0].tree.remove(2);
        window.active_tab = 0;
        save_window(&mut store, &mut window, true);

        assert!(store.has_section("layout-Child-0-0-1"));
        assert!(!store.has_section("layout-Child-0-0-2"));
        assert!(!store.has_section("layout-Tabs-0-1"));
        assert!(!store.has_section("layout-Child-0-1-0"));
    }

    #[test]
    fn test_disabled_tab_preserved() {
        let mut store = ConfigStore::new();
        store.set_str("layout-Tabs-0-0", "name", "Pinned");
        store.set_bool("layout-Tabs-0-0", "disabled", true);
        store.set_int("layout-Child-0-0-0", "id", 0);

        let mut window = sample_window(0);
        save_window(&mut store, &mut window, true);

        assert_eq!(store.get_str("layout-Tabs-0-0", "name"), Some("Pinned"));
        assert!(store.has_section("layout-Child-0-0-0"));
        assert_eq!(store.get_int("layout-Child-0-0-0", "id"), Some(0));
        assert!(!store.has_section("layout-Child-0-0-1"));
        assert_eq!(store.get_str("layout-Tabs-0-1", "name"), Some("Work"));
        assert_eq!(store.get_str("layout-Tabs-0-2", "name"), Some("Terminal 2"));

        let loaded = load_window(&store, 0, Rect::default());
        let names: Vec<&str> = loaded.tabs.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Work", "Terminal 2"]);
    }

    #[test]
    fn test_forget_window() {
        let mut store = ConfigStore::new();
        save_window(&mut store, &mut sample_window(0), true);
        save_window(&mut store, &mut sample_window(1), true);

        save_window(&mut store, &mut sample_window(0), false);
        assert_eq!(screens(&store), vec![1]);
        assert!(!store.has_section("layout-Screen-0"));
        assert!(store.has_section("layout-Child-1-0-2"));
    }

    #[test]
    fn test_screen_prefix_isolation() {
        let mut store = ConfigStore::new();
        let mut ten = sample_window(10);
        ten.tabs[0].name = "Ten".into();
        save_window(&mut store, &mut ten, true);

        let mut one = WindowLayout::new(1, Rect::new(0, 0, 800, 300));
        one.tabs[0].name = "One".into();
        save_window(&mut store, &mut one, true);

        let loaded = load_window(&store, 1, Rect::default());
        assert_eq!(loaded.tabs.len(), 1);
        assert_eq!(loaded.tabs[0].name, "One");
        assert_eq!(load_window(&store, 10, Rect::default()).tabs[0].name, "Ten");
        assert_eq!(screens(&store), vec![1, 10]);
    }

    #[test]
    fn test_load_empty_store() {
        let store = ConfigStore::new();
        let default = Rect::new(0, 0, 1920, 540);
        let window = load_window(&store, 0, default);
        assert_eq!(window.geometry, default);
        assert_eq!(window.tabs.len(), 1);
        assert_eq!(window.tabs[0].name, "Terminal 1");
        assert_eq!(window.tabs[0].tree.leaf_count(), 1);
        assert_eq!(window.tabs[0].next_id, 1);
    }

    #[test]
    fn test_child_index_sorting_is_numeric() {
        let mut store = ConfigStore::new();
        store.set_str("layout-Tabs-0-0", "name", "Many");
        // A chain of eleven panes, each split off the previous one
        for child in 0..11u32 {
            let section = format!("layout-Child-0-0-{}", child);
            store.set_int(&section, "id", child as i64);
            store.set_int(&section, "parent", child.saturating_sub(1) as i64);
            store.set_str(&section, "axis", "v");
            store.set_int(&section, "pos", if child == 0 { -1 } else { 5000 });
        }
        let window = load_window(&store, 0, Rect::default());
        assert_eq!(window.tabs[0].tree.leaf_count(), 11);
        assert_eq!(window.tabs[0].next_id, 11);
    }

    #[test]
    fn test_orphan_record_dropped() {
        let mut store = ConfigStore::new();
        store.set_str("layout-Tabs-0-0", "name", "Broken");
        for (child, id, parent) in [(0u32, 0i64, 0i64), (1, 1, 7), (2, 2, 0)] {
            let section = format!("layout-Child-0-0-{}", child);
            store.set_int(&section, "id", id);
            store.set_int(&section, "parent", parent);
            store.set_str(&section, "axis", "h");
            store.set_int(&section, "pos", 5000);
        }
        let window = load_window(&store, 0, Rect::default());
        let tree = &window.tabs[0].tree;
        assert_eq!(tree.leaf_count(), 2);
        assert!(tree.contains(2));
        assert!(!tree.contains(1));
    }

    fn write_child(store: &mut ConfigStore, child: u32, id: i64, parent: i64, axis: &str, prog: &str) {
        let section = format!("layout-Child-0-0-{}", child);
        store.set_int(&section, "id", id);
        store.set_int(&section, "parent", parent);
        store.set_str(&section, "axis", axis);
        store.set_int(&section, "pos", 5000);
        store.set_str(&section, "prog", prog);
    }

    fn programs(tree: &PaneTree) -> Vec<(u32, Option<String>)> {
        tree.leaves()
            .into_iter()
            .map(|l| (l.id, l.program.clone()))
            .collect()
    }

    #[test]
    fn test_root_taken_from_child_zero_without_axis() {
        let mut store = ConfigStore::new();
        store.set_str("layout-Tabs-0-0", "name", "t");
        store.set_int("layout-Child-0-0-0", "id", 0);
        store.set_str("layout-Child-0-0-0", "prog", "p0");
        write_child(&mut store, 1, 1, 0, "h", "p1");
        write_child(&mut store, 2, 2, 1, "v", "p2");

        let window = load_window(&store, 0, Rect::default());
        let tree = &window.tabs[0].tree;
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(
            programs(tree),
            vec![
                (0, Some("p0".to_string())),
                (1, Some("p1".to_string())),
                (2, Some("p2".to_string())),
            ]
        );
    }

    #[test]
    fn test_missing_child_zero_uses_default_root() {
        let mut store = ConfigStore::new();
        store.set_str("layout-Tabs-0-0", "name", "t");
        write_child(&mut store, 1, 1, 0, "h", "p1");
        write_child(&mut store, 2, 2, 1, "v", "p2");

        let window = load_window(&store, 0, Rect::default());
        let tree = &window.tabs[0].tree;
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.first_leaf().id, 0);
        assert_eq!(tree.first_leaf().program, None);
        assert_eq!(tree.find(1).and_then(|l| l.program.clone()), Some("p1".into()));
        assert!(tree.contains(2));
    }

    #[test]
    fn test_read_record_errors() {
        let mut store = ConfigStore::new();
        store.set_int("layout-Child-0-0-0", "id", 0);
        store.set_int("layout-Child-0-0-0", "parent", 0);
        store.set_str("layout-Child-0-0-0", "axis", "diagonal");
        assert_eq!(
            read_record(&store, "layout-Child-0-0-0"),
            Err(LayoutError::MissingField {
                section: "layout-Child-0-0-0".into(),
                field: "axis"
            })
        );
        store.set_str("layout-Child-0-0-0", "axis", "h");
        let record = read_record(&store, "layout-Child-0-0-0").unwrap();
        assert_eq!(record.position, -1);
        assert_eq!(record.program, None);
    }
}
