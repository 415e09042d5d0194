//! Split-pane tree model
//!
//! A tab's terminals form a binary tree of splits. The tree is persisted as a
//! flat list of [`PaneRecord`]s: each record names the already-placed leaf it
//! was split off from, so replaying the list in order rebuilds the tree.

use std::fmt;
use std::path::PathBuf;

use dropterm_ui::events::Direction;

/// Split axis
///
/// `Horizontal` lays the two panes out side by side, `Vertical` stacks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// The single-character form used in the layout store
    pub fn as_char(self) -> char {
        match self {
            Axis::Horizontal => 'h',
            Axis::Vertical => 'v',
        }
    }

    /// Parse the stored form; only the first character is significant
    pub fn parse(s: &str) -> Option<Self> {
        match s.chars().next()?.to_ascii_lowercase() {
            'h' => Some(Axis::Horizontal),
            'v' => Some(Axis::Vertical),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Divider position as a fixed-point fraction in `[0, 10000]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SplitPosition(u16);

impl SplitPosition {
    pub const SCALE: u16 = 10_000;
    pub const CENTER: SplitPosition = SplitPosition(5_000);

    /// Clamp a raw stored value into range. Negative values (the root
    /// marker) fall back to the centre.
    pub fn from_stored(raw: i64) -> Self {
        if raw < 0 {
            return Self::CENTER;
        }
        Self(raw.min(Self::SCALE as i64) as u16)
    }

    /// Encode a divider offset relative to the paned's total size
    pub fn from_pixels(offset: i32, size: i32) -> Self {
        if size <= 0 {
            return Self::CENTER;
        }
        let offset = offset.clamp(0, size) as i64;
        Self((offset * Self::SCALE as i64 / size as i64) as u16)
    }

    /// Encode a percentage (0-100)
    pub fn from_percent(percent: f64) -> Self {
        let raw = (percent.clamp(0.0, 100.0) * 100.0).round() as i64;
        Self::from_stored(raw)
    }

    /// Decode into a pixel offset for a paned of the given size
    pub fn to_pixels(self, size: i32) -> i32 {
        (size.max(0) as i64 * self.0 as i64 / Self::SCALE as i64) as i32
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    pub fn fraction(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }
}

impl Default for SplitPosition {
    fn default() -> Self {
        Self::CENTER
    }
}

/// A terminal leaf
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaneLeaf {
    /// Identifier, unique within the tab
    pub id: u32,
    /// Program the terminal runs (None = default shell)
    pub program: Option<String>,
    /// Working directory of the terminal's process
    pub cwd: Option<PathBuf>,
}

impl PaneLeaf {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            program: None,
            cwd: None,
        }
    }
}

/// Binary split tree of terminals
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneTree {
    Leaf(PaneLeaf),
    Split {
        axis: Axis,
        position: SplitPosition,
        first: Box<PaneTree>,
        second: Box<PaneTree>,
    },
}

/// One persisted node of a flattened tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneRecord {
    pub id: u32,
    /// Id of the leaf this one was split off from (0 for the root)
    pub parent: u32,
    pub axis: Axis,
    /// Fixed-point divider position, -1 for the root
    pub position: i32,
    pub program: Option<String>,
    pub cwd: Option<PathBuf>,
}

impl PaneRecord {
    fn root(leaf: &PaneLeaf) -> Self {
        Self {
            id: leaf.id,
            parent: 0,
            axis: Axis::Vertical,
            position: -1,
            program: leaf.program.clone(),
            cwd: leaf.cwd.clone(),
        }
    }

    fn attached(leaf: &PaneLeaf, attach: Attach) -> Self {
        Self {
            id: leaf.id,
            parent: attach.parent,
            axis: attach.axis,
            position: attach.position.raw() as i32,
            program: leaf.program.clone(),
            cwd: leaf.cwd.clone(),
        }
    }

    fn to_leaf(&self) -> PaneLeaf {
        PaneLeaf {
            id: self.id,
            program: self.program.clone(),
            cwd: self.cwd.clone(),
        }
    }
}

/// How a subtree's first leaf hangs off an already-placed leaf
#[derive(Debug, Clone, Copy)]
struct Attach {
    parent: u32,
    axis: Axis,
    position: SplitPosition,
}

/// Axis-aligned rectangle in the unit square
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl UnitRect {
    const FULL: UnitRect = UnitRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    fn right(&self) -> f64 {
        self.x + self.width
    }

    fn bottom(&self) -> f64 {
        self.y + self.height
    }

    fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

const EPSILON: f64 = 1e-9;

impl PaneTree {
    pub fn leaf(leaf: PaneLeaf) -> Self {
        PaneTree::Leaf(leaf)
    }

    /// The leaf reached by always following the first child
    pub fn first_leaf(&self) -> &PaneLeaf {
        match self {
            PaneTree::Leaf(leaf) => leaf,
            PaneTree::Split { first, .. } => first.first_leaf(),
        }
    }

    /// All leaves, depth-first, first child before second
    pub fn leaves(&self) -> Vec<&PaneLeaf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a PaneLeaf>) {
        match self {
            PaneTree::Leaf(leaf) => out.push(leaf),
            PaneTree::Split { first, second, .. } => {
                first.collect_leaves(out);
                second.collect_leaves(out);
            }
        }
    }

    fn for_each_leaf_mut(&mut self, f: &mut impl FnMut(&mut PaneLeaf)) {
        match self {
            PaneTree::Leaf(leaf) => f(leaf),
            PaneTree::Split { first, second, .. } => {
                first.for_each_leaf_mut(f);
                second.for_each_leaf_mut(f);
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            PaneTree::Leaf(_) => 1,
            PaneTree::Split { first, second, .. } => first.leaf_count() + second.leaf_count(),
        }
    }

    pub fn find(&self, id: u32) -> Option<&PaneLeaf> {
        match self {
            PaneTree::Leaf(leaf) if leaf.id == id => Some(leaf),
            PaneTree::Leaf(_) => None,
            PaneTree::Split { first, second, .. } => first.find(id).or_else(|| second.find(id)),
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.find(id).is_some()
    }

    /// Highest leaf id in use
    pub fn max_id(&self) -> u32 {
        self.leaves().iter().map(|l| l.id).max().unwrap_or(0)
    }

    /// Split the leaf `target`, keeping it as the first child and placing
    /// `new_leaf` second. Returns false when `target` is not in the tree.
    pub fn split(
        &mut self,
        target: u32,
        axis: Axis,
        position: SplitPosition,
        new_leaf: PaneLeaf,
    ) -> bool {
        match self {
            PaneTree::Leaf(leaf) if leaf.id == target => {
                let old = std::mem::replace(leaf, PaneLeaf::default());
                *self = PaneTree::Split {
                    axis,
                    position,
                    first: Box::new(PaneTree::Leaf(old)),
                    second: Box::new(PaneTree::Leaf(new_leaf)),
                };
                true
            }
            PaneTree::Leaf(_) => false,
            PaneTree::Split { first, second, .. } => {
                if first.contains(target) {
                    first.split(target, axis, position, new_leaf)
                } else {
                    second.split(target, axis, position, new_leaf)
                }
            }
        }
    }

    /// Remove a leaf, letting its sibling take over the parent split.
    /// The last remaining leaf cannot be removed.
    pub fn remove(&mut self, id: u32) -> Option<PaneLeaf> {
        let PaneTree::Split { first, second, .. } = self else {
            return None;
        };

        let removed_first = matches!(first.as_ref(), PaneTree::Leaf(l) if l.id == id);
        let removed_second = matches!(second.as_ref(), PaneTree::Leaf(l) if l.id == id);

        if removed_first || removed_second {
            let placeholder = PaneTree::Leaf(PaneLeaf::default());
            let (gone, keep) = if removed_first {
                (
                    std::mem::replace(first.as_mut(), placeholder.clone()),
                    std::mem::replace(second.as_mut(), placeholder),
                )
            } else {
                (
                    std::mem::replace(second.as_mut(), placeholder.clone()),
                    std::mem::replace(first.as_mut(), placeholder),
                )
            };
            *self = keep;
            return match gone {
                PaneTree::Leaf(leaf) => Some(leaf),
                PaneTree::Split { .. } => None,
            };
        }

        if first.contains(id) {
            first.remove(id)
        } else {
            second.remove(id)
        }
    }

    /// Make the first leaf the canonical root with id 0.
    ///
    /// A leaf that already held id 0 takes over the root's previous id so
    /// ids stay unique. Returns the previous root id when it changed.
    pub fn normalize_root(&mut self) -> Option<u32> {
        let old = self.first_leaf().id;
        if old == 0 {
            return None;
        }
        let mut seen_first = false;
        self.for_each_leaf_mut(&mut |leaf| {
            if !seen_first {
                seen_first = true;
                leaf.id = 0;
            } else if leaf.id == 0 {
                leaf.id = old;
            }
        });
        Some(old)
    }

    /// Normalize the root, then flatten into records ordered so that every
    /// record's parent appears before it and outer splits of a leaf come
    /// before inner ones.
    pub fn flatten(&mut self) -> Vec<PaneRecord> {
        self.normalize_root();
        let mut records = vec![PaneRecord::root(self.first_leaf())];
        flatten_splits(self, &mut records);
        records
    }

    /// Rebuild a tree from records sorted by child index.
    ///
    /// The first record seeds the root; see [`PaneTree::with_root`].
    pub fn from_records(records: &[PaneRecord]) -> (PaneTree, Vec<PaneRecord>) {
        match records.split_first() {
            Some((root, rest)) => Self::with_root(root.to_leaf(), rest),
            None => (PaneTree::Leaf(PaneLeaf::new(0)), Vec::new()),
        }
    }

    /// Rebuild a tree under `root`, which always becomes id 0.
    ///
    /// A record whose parent is not yet placed, or whose id is already
    /// taken, is logged and dropped; the dropped records are returned
    /// alongside the partial tree.
    pub fn with_root(root: PaneLeaf, rest: &[PaneRecord]) -> (PaneTree, Vec<PaneRecord>) {
        let mut root_leaf = root;
        root_leaf.id = 0;
        let mut tree = PaneTree::Leaf(root_leaf);
        let mut dropped = Vec::new();

        for record in rest {
            if tree.contains(record.id) {
                log::warn!(
                    "Duplicate pane id {} in layout, dropping record",
                    record.id
                );
                dropped.push(record.clone());
                continue;
            }
            let position = SplitPosition::from_stored(record.position as i64);
            if !tree.split(record.parent, record.axis, position, record.to_leaf()) {
                log::warn!(
                    "No parent ({}) found for pane {}, dropping record",
                    record.parent,
                    record.id
                );
                dropped.push(record.clone());
            }
        }

        (tree, dropped)
    }

    /// Leaf rectangles when the tree fills the unit square
    pub fn leaf_rects(&self) -> Vec<(u32, UnitRect)> {
        let mut out = Vec::new();
        self.collect_rects(UnitRect::FULL, &mut out);
        out
    }

    fn collect_rects(&self, area: UnitRect, out: &mut Vec<(u32, UnitRect)>) {
        match self {
            PaneTree::Leaf(leaf) => out.push((leaf.id, area)),
            PaneTree::Split {
                axis,
                position,
                first,
                second,
            } => {
                let f = position.fraction();
                let (a, b) = match axis {
                    Axis::Horizontal => {
                        let w = area.width * f;
                        (
                            UnitRect { width: w, ..area },
                            UnitRect {
                                x: area.x + w,
                                width: area.width - w,
                                ..area
                            },
                        )
                    }
                    Axis::Vertical => {
                        let h = area.height * f;
                        (
                            UnitRect { height: h, ..area },
                            UnitRect {
                                y: area.y + h,
                                height: area.height - h,
                                ..area
                            },
                        )
                    }
                };
                first.collect_rects(a, out);
                second.collect_rects(b, out);
            }
        }
    }

    /// The leaf adjacent to `id` in `direction`, preferring the closest
    /// one and then the one sharing the longest edge.
    pub fn neighbor(&self, id: u32, direction: Direction) -> Option<u32> {
        let rects = self.leaf_rects();
        let (_, current) = rects.iter().find(|(leaf_id, _)| *leaf_id == id)?;
        let (cx, cy) = current.center();

        rects
            .iter()
            .filter(|(leaf_id, _)| *leaf_id != id)
            .filter_map(|(leaf_id, r)| {
                let (ahead, overlap) = match direction {
                    Direction::Left => (
                        r.right() <= current.x + EPSILON,
                        span_overlap(r.y, r.bottom(), current.y, current.bottom()),
                    ),
                    Direction::Right => (
                        r.x >= current.right() - EPSILON,
                        span_overlap(r.y, r.bottom(), current.y, current.bottom()),
                    ),
                    Direction::Up => (
                        r.bottom() <= current.y + EPSILON,
                        span_overlap(r.x, r.right(), current.x, current.right()),
                    ),
                    Direction::Down => (
                        r.y >= current.bottom() - EPSILON,
                        span_overlap(r.x, r.right(), current.x, current.right()),
                    ),
                };
                if !ahead || overlap <= EPSILON {
                    return None;
                }
                let (rx, ry) = r.center();
                let distance = match direction {
                    Direction::Left | Direction::Right => (rx - cx).abs(),
                    Direction::Up | Direction::Down => (ry - cy).abs(),
                };
                Some((*leaf_id, distance, overlap))
            })
            .min_by(|a, b| {
                a.1.total_cmp(&b.1)
                    .then_with(|| b.2.total_cmp(&a.2))
            })
            .map(|(leaf_id, _, _)| leaf_id)
    }
}

fn span_overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    (a1.min(b1) - a0.max(b0)).max(0.0)
}

fn flatten_splits(node: &PaneTree, out: &mut Vec<PaneRecord>) {
    if let PaneTree::Split {
        axis,
        position,
        first,
        second,
    } = node
    {
        let attach = Attach {
            parent: first.first_leaf().id,
            axis: *axis,
            position: *position,
        };
        out.push(PaneRecord::attached(second.first_leaf(), attach));
        flatten_splits(first, out);
        flatten_splits(second, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: u32, program: &str, cwd: &str) -> PaneLeaf {
        PaneLeaf {
            id,
            program: Some(program.to_string()),
            cwd: Some(PathBuf::from(cwd)),
        }
    }

    fn split(axis: Axis, pos: u16, first: PaneTree, second: PaneTree) -> PaneTree {
        PaneTree::Split {
            axis,
            position: SplitPosition::from_stored(pos as i64),
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    /// Structure without ids, for comparing rebuilt trees
    fn shape(tree: &PaneTree) -> String {
        match tree {
            PaneTree::Leaf(l) => format!(
                "{}@{}",
                l.program.as_deref().unwrap_or("-"),
                l.cwd.as_ref().map(|p| p.display().to_string()).unwrap_or_default()
            ),
            PaneTree::Split {
                axis,
                position,
                first,
                second,
            } => format!(
                "{}{}({},{})",
                axis,
                position.raw(),
                shape(first),
                shape(second)
            ),
        }
    }

    #[test]
    fn test_axis_parse() {
        assert_eq!(Axis::parse("h"), Some(Axis::Horizontal));
        assert_eq!(Axis::parse("vertical"), Some(Axis::Vertical));
        assert_eq!(Axis::parse("H"), Some(Axis::Horizontal));
        assert_eq!(Axis::parse(""), None);
        assert_eq!(Axis::parse("x"), None);
    }

    #[test]
    fn test_position_encoding_bounds() {
        assert_eq!(SplitPosition::from_percent(0.0).raw(), 0);
        assert_eq!(SplitPosition::from_percent(100.0).raw(), 10_000);
        assert_eq!(SplitPosition::from_pixels(0, 800).raw(), 0);
        assert_eq!(SplitPosition::from_pixels(800, 800).raw(), 10_000);
        assert_eq!(SplitPosition::from_pixels(400, 800).raw(), 5_000);
        assert_eq!(SplitPosition::from_pixels(10, 0), SplitPosition::CENTER);
        assert_eq!(SplitPosition::from_stored(-1), SplitPosition::CENTER);
        assert_eq!(SplitPosition::from_stored(20_000).raw(), 10_000);
    }

    #[test]
    fn test_position_encoding_monotonic() {
        let mut last = 0;
        for px in 0..=1000 {
            let raw = SplitPosition::from_pixels(px, 1000).raw();
            assert!(raw >= last);
            last = raw;
        }
    }

    #[test]
    fn test_position_decode() {
        let pos = SplitPosition::from_pixels(300, 1200);
        assert_eq!(pos.raw(), 2_500);
        assert_eq!(pos.to_pixels(800), 200);
    }

    #[test]
    fn test_split_and_remove() {
        let mut tree = PaneTree::leaf(PaneLeaf::new(0));
        assert!(tree.split(0, Axis::Horizontal, SplitPosition::CENTER, PaneLeaf::new(1)));
        assert!(tree.split(1, Axis::Vertical, SplitPosition::CENTER, PaneLeaf::new(2)));
        assert!(!tree.split(9, Axis::Vertical, SplitPosition::CENTER, PaneLeaf::new(3)));
        assert_eq!(tree.leaf_count(), 3);

        let removed = tree.remove(1).unwrap();
        assert_eq!(removed.id, 1);
        let ids: Vec<u32> = tree.leaves().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![0, 2]);

        assert!(tree.remove(2).is_some());
        assert!(tree.remove(0).is_none());
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_normalize_root_swaps_ids() {
        let mut tree = split(
            Axis::Horizontal,
            5000,
            PaneTree::leaf(PaneLeaf::new(4)),
            PaneTree::leaf(PaneLeaf::new(0)),
        );
        assert_eq!(tree.normalize_root(), Some(4));
        let ids: Vec<u32> = tree.leaves().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![0, 4]);
        assert_eq!(tree.normalize_root(), None);
    }

    #[test]
    fn test_flatten_root_is_canonical() {
        let mut tree = split(
            Axis::Vertical,
            3000,
            PaneTree::leaf(leaf(7, "htop", "/tmp")),
            PaneTree::leaf(leaf(3, "bash", "/home")),
        );
        let records = tree.flatten();
        assert_eq!(records[0].id, 0);
        assert_eq!(records[0].parent, 0);
        assert_eq!(records[0].position, -1);
        assert_eq!(records[0].axis, Axis::Vertical);
        assert_eq!(records[0].program.as_deref(), Some("htop"));
        assert_eq!(records[1].parent, 0);
        assert_eq!(records[1].position, 3000);
    }

    #[test]
    fn test_flatten_orders_outer_split_first() {
        // h(v(a1, a2), b): b must be split off a1 before a2 is
        let mut tree = split(
            Axis::Horizontal,
            6000,
            split(
                Axis::Vertical,
                2500,
                PaneTree::leaf(leaf(0, "a1", "/a")),
                PaneTree::leaf(leaf(1, "a2", "/a")),
            ),
            PaneTree::leaf(leaf(2, "b", "/b")),
        );
        let records = tree.flatten();
        let ids: Vec<u32> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 2, 1]);
        assert_eq!(records[1].axis, Axis::Horizontal);
        assert_eq!(records[2].axis, Axis::Vertical);
    }

    #[test]
    fn test_round_trip_nested() {
        let before = split(
            Axis::Vertical,
            4200,
            split(
                Axis::Horizontal,
                5000,
                PaneTree::leaf(leaf(0, "vim", "/src")),
                split(
                    Axis::Vertical,
                    7000,
                    PaneTree::leaf(leaf(5, "cargo", "/src")),
                    PaneTree::leaf(leaf(6, "git", "/src")),
                ),
            ),
            split(
                Axis::Horizontal,
                1000,
                PaneTree::leaf(leaf(2, "top", "/")),
                PaneTree::leaf(leaf(9, "bash", "/home")),
            ),
        );

        let mut tree = before.clone();
        let records = tree.flatten();
        let (rebuilt, dropped) = PaneTree::from_records(&records);

        assert!(dropped.is_empty());
        assert_eq!(shape(&rebuilt), shape(&before));
        assert_eq!(rebuilt, tree);
    }

    #[test]
    fn test_round_trip_single_leaf() {
        let mut tree = PaneTree::leaf(leaf(3, "zsh", "/root"));
        let records = tree.flatten();
        assert_eq!(records.len(), 1);
        let (rebuilt, _) = PaneTree::from_records(&records);
        assert_eq!(rebuilt.first_leaf().id, 0);
        assert_eq!(rebuilt.first_leaf().program.as_deref(), Some("zsh"));
    }

    #[test]
    fn test_rebuild_drops_orphans() {
        let records = vec![
            PaneRecord {
                id: 0,
                parent: 0,
                axis: Axis::Vertical,
                position: -1,
                program: None,
                cwd: None,
            },
            PaneRecord {
                id: 2,
                parent: 7,
                axis: Axis::Horizontal,
                position: 5000,
                program: None,
                cwd: None,
            },
            // Child of the dropped record is dropped too
            PaneRecord {
                id: 3,
                parent: 2,
                axis: Axis::Horizontal,
                position: 5000,
                program: None,
                cwd: None,
            },
            PaneRecord {
                id: 4,
                parent: 0,
                axis: Axis::Vertical,
                position: 2000,
                program: None,
                cwd: None,
            },
        ];
        let (tree, dropped) = PaneTree::from_records(&records);
        let ids: Vec<u32> = tree.leaves().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![0, 4]);
        assert_eq!(dropped.len(), 2);
    }

    #[test]
    fn test_rebuild_empty() {
        let (tree, dropped) = PaneTree::from_records(&[]);
        assert_eq!(tree.leaf_count(), 1);
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_neighbor() {
        // +---+---+
        // | 0 | 1 |
        // +---+---+
        // |   2   |
        // +-------+
        let tree = split(
            Axis::Vertical,
            5000,
            split(
                Axis::Horizontal,
                5000,
                PaneTree::leaf(PaneLeaf::new(0)),
                PaneTree::leaf(PaneLeaf::new(1)),
            ),
            PaneTree::leaf(PaneLeaf::new(2)),
        );
        assert_eq!(tree.neighbor(0, Direction::Right), Some(1));
        assert_eq!(tree.neighbor(1, Direction::Left), Some(0));
        assert_eq!(tree.neighbor(0, Direction::Down), Some(2));
        assert_eq!(tree.neighbor(1, Direction::Down), Some(2));
        assert_eq!(tree.neighbor(2, Direction::Up), Some(0));
        assert_eq!(tree.neighbor(0, Direction::Left), None);
        assert_eq!(tree.neighbor(2, Direction::Down), None);
        assert_eq!(tree.neighbor(42, Direction::Down), None);
    }
}
