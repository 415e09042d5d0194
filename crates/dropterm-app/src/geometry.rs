//! Window placement math
//!
//! Pure rectangle arithmetic for placing the drop-down window on a monitor.

use dropterm_ui::events::Direction;

/// Rectangle in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Shrink to fit inside `area` and move inside it
    pub fn clamp_into(&self, area: &Rect) -> Rect {
        let width = self.width.clamp(1, area.width.max(1));
        let height = self.height.clamp(1, area.height.max(1));
        let x = self.x.min(area.right() - width).max(area.x);
        let y = self.y.min(area.bottom() - height).max(area.y);
        Rect::new(x, y, width, height)
    }
}

/// Percentage-based placement on the work area (0-100 per axis)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    pub vertical: Option<u32>,
    pub horizontal: Option<u32>,
}

/// Window size from percentages of the work area, anchored at its origin
pub fn default_window_rect(workarea: Rect, width_percent: u32, height_percent: u32) -> Rect {
    let width = (workarea.width as i64 * width_percent.min(100) as i64 / 100) as i32;
    let height = (workarea.height as i64 * height_percent.min(100) as i64 / 100) as i32;
    Rect::new(workarea.x, workarea.y, width.max(1), height.max(1))
}

/// Position `window` on `screen` according to `placement`.
///
/// Per axis: a percentage above 100 or absent keeps the current coordinate.
/// Otherwise the window is centred on the percentage point, unless half of
/// it would cross the leading edge (pinned there) or the trailing edge
/// (pinned there).
pub fn place_window(screen: Rect, window: Rect, placement: Placement) -> Rect {
    let mut placed = window;
    if let Some(percent) = placement.vertical.filter(|p| *p <= 100) {
        placed.y = place_axis(percent, screen.y, screen.height, window.height);
    }
    if let Some(percent) = placement.horizontal.filter(|p| *p <= 100) {
        placed.x = place_axis(percent, screen.x, screen.width, window.width);
    }
    placed
}

fn place_axis(percent: u32, origin: i32, extent: i32, size: i32) -> i32 {
    let point = percent as i64 * extent as i64 / 100;
    let half = size as i64 / 2;
    let coordinate = if point - half < 0 {
        origin as i64
    } else if point + half > extent as i64 {
        origin as i64 + extent as i64 - size as i64
    } else {
        origin as i64 + point - half
    };
    coordinate as i32
}

/// When `window` lies on no monitor, return it moved into the primary work
/// area. Returns None when it is already visible somewhere.
pub fn ensure_on_screen(window: Rect, monitors: &[Rect], primary_workarea: Rect) -> Option<Rect> {
    if monitors.iter().any(|m| m.intersects(&window)) {
        return None;
    }
    let moved = Rect {
        x: primary_workarea.x,
        y: primary_workarea.y,
        ..window
    };
    Some(moved.clamp_into(&primary_workarea))
}

/// Index of the monitor holding the window's origin, falling back to the
/// first monitor the window overlaps
pub fn monitor_for(window: Rect, monitors: &[Rect]) -> Option<usize> {
    monitors
        .iter()
        .position(|m| m.contains_point(window.x, window.y))
        .or_else(|| monitors.iter().position(|m| m.intersects(&window)))
}

/// Where a window sits on the current set of monitors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub geometry: Rect,
    pub monitor: usize,
    /// The geometry was off-screen and has been moved to the first monitor
    pub moved: bool,
}

/// Find the monitor of `window`, pulling it onto the first monitor when it is
/// visible on none. `fallback` is used when no monitor holds the origin or
/// overlaps the window. Returns None without monitors.
pub fn locate_window(window: Rect, monitors: &[Rect], fallback: usize) -> Option<Located> {
    let primary = *monitors.first()?;
    if let Some(moved) = ensure_on_screen(window, monitors, primary) {
        return Some(Located {
            geometry: moved,
            monitor: 0,
            moved: true,
        });
    }
    let monitor = monitor_for(window, monitors).unwrap_or(fallback.min(monitors.len() - 1));
    Some(Located {
        geometry: window,
        monitor,
        moved: false,
    })
}

/// The monitor left or right of `current`, ordered by x and wrapping around.
/// Vertical directions and single-monitor setups yield None.
pub fn adjacent_monitor(monitors: &[Rect], current: usize, direction: Direction) -> Option<usize> {
    if monitors.len() < 2 || current >= monitors.len() {
        return None;
    }
    let mut order: Vec<usize> = (0..monitors.len()).collect();
    order.sort_by_key(|&i| (monitors[i].x, monitors[i].y));
    let pos = order.iter().position(|&i| i == current)?;
    let next = match direction {
        Direction::Left => (pos + order.len() - 1) % order.len(),
        Direction::Right => (pos + 1) % order.len(),
        Direction::Up | Direction::Down => return None,
    };
    Some(order[next])
}

/// Move `window` from one monitor to another keeping its offset from the
/// monitor origin, then clamp it to the target
pub fn transfer_to_monitor(window: Rect, from: Rect, to: Rect) -> Rect {
    let moved = Rect {
        x: to.x + (window.x - from.x),
        y: to.y + (window.y - from.y),
        ..window
    };
    moved.clamp_into(&to)
}
