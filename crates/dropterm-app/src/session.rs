//! Page (tab) bookkeeping
//!
//! Order, names and the active index of a window's pages. The payload is
//! generic so the frontend can keep its widget handles here while the logic
//! stays testable without a display.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global page ID counter
static PAGE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique page ID
pub fn next_page_id() -> u64 {
    PAGE_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Name given to a new page when the window already holds `count` pages
pub fn default_page_name(count: usize) -> String {
    format!("Terminal {}", count + 1)
}

/// A named page
#[derive(Debug)]
pub struct Page<T> {
    /// Unique page ID
    pub id: u64,
    pub name: String,
    pub content: T,
}

/// What to do after the last page of a window was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterClose {
    /// Pages remain
    Nothing,
    /// Open a fresh page in place of the last one
    SpawnPage,
    /// Close the window
    CloseWindow,
}

/// Ordered pages of one window
#[derive(Debug)]
pub struct PageList<T> {
    pages: Vec<Page<T>>,
    active: usize,
}

impl<T> Default for PageList<T> {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            active: 0,
        }
    }
}

impl<T> PageList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page<T>> {
        self.pages.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Page<T>> {
        self.pages.get(index)
    }

    /// Active page index; meaningless when empty
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Get the active page
    pub fn active(&self) -> Option<&Page<T>> {
        self.pages.get(self.active)
    }

    /// Find page by ID
    pub fn find(&self, id: u64) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id)
    }

    /// Name for the next page added without an explicit one
    pub fn next_default_name(&self) -> String {
        default_page_name(self.pages.len())
    }

    /// Append a page and make it active. Returns its index.
    pub fn add(&mut self, name: Option<String>, content: T) -> usize {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.next_default_name());
        self.pages.push(Page {
            id: next_page_id(),
            name,
            content,
        });
        self.active = self.pages.len() - 1;
        self.active
    }

    /// Rename a page. Blank names are ignored.
    pub fn rename(&mut self, index: usize, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        match self.pages.get_mut(index) {
            Some(page) => {
                page.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Close a page by index. Closing the last page is allowed; ask
    /// [`PageList::after_close`] what should happen next.
    pub fn close(&mut self, index: usize) -> Option<Page<T>> {
        if index >= self.pages.len() {
            return None;
        }

        let page = self.pages.remove(index);

        if self.active >= self.pages.len() {
            self.active = self.pages.len().saturating_sub(1);
        } else if self.active > index {
            self.active -= 1;
        }

        Some(page)
    }

    /// Policy once a page was closed
    pub fn after_close(&self, spawn_on_last_close: bool) -> AfterClose {
        if !self.pages.is_empty() {
            AfterClose::Nothing
        } else if spawn_on_last_close {
            AfterClose::SpawnPage
        } else {
            AfterClose::CloseWindow
        }
    }

    /// Switch to a page by index
    pub fn switch_to(&mut self, index: usize) -> bool {
        if index < self.pages.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    /// Switch to next page, wrapping
    pub fn next(&mut self) {
        if !self.pages.is_empty() {
            self.active = (self.active + 1) % self.pages.len();
        }
    }

    /// Switch to previous page, wrapping
    pub fn prev(&mut self) {
        if !self.pages.is_empty() {
            self.active = if self.active == 0 {
                self.pages.len() - 1
            } else {
                self.active - 1
            };
        }
    }

    /// Move page from one position to another
    pub fn move_page(&mut self, from: usize, to: usize) -> bool {
        if from >= self.pages.len() || to >= self.pages.len() || from == to {
            return false;
        }

        let page = self.pages.remove(from);
        self.pages.insert(to, page);

        // Update active page index
        if self.active == from {
            self.active = to;
        } else if from < self.active && to >= self.active {
            self.active -= 1;
        } else if from > self.active && to <= self.active {
            self.active += 1;
        }
        true
    }

    /// Move the active page one slot left; no wrap
    pub fn move_active_left(&mut self) -> bool {
        self.active > 0 && self.move_page(self.active, self.active - 1)
    }

    /// Move the active page one slot right; no wrap
    pub fn move_active_right(&mut self) -> bool {
        self.move_page(self.active, self.active + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> PageList<&'static str> {
        let mut pages = PageList::new();
        pages.add(None, "a");
        pages.add(None, "b");
        pages.add(Some("Logs".into()), "c");
        pages
    }

    #[test]
    fn test_page_id_generation() {
        let id1 = next_page_id();
        let id2 = next_page_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_default_names() {
        let pages = three();
        let names: Vec<&str> = pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Terminal 1", "Terminal 2", "Logs"]);
        assert_eq!(pages.active_index(), 2);
        assert_eq!(pages.next_default_name(), "Terminal 4");
    }

    #[test]
    fn test_rename_ignores_blank() {
        let mut pages = three();
        assert!(!pages.rename(0, "   "));
        assert!(pages.rename(0, " build "));
        assert_eq!(pages.get(0).unwrap().name, "build");
        assert!(!pages.rename(7, "x"));
    }

    #[test]
    fn test_next_prev_wrap() {
        let mut pages = three();
        pages.next();
        assert_eq!(pages.active_index(), 0);
        pages.prev();
        assert_eq!(pages.active_index(), 2);
        pages.prev();
        assert_eq!(pages.active_index(), 1);
    }

    #[test]
    fn test_move_does_not_wrap() {
        let mut pages = three();
        assert!(!pages.move_active_right());
        assert!(pages.move_active_left());
        assert_eq!(pages.active_index(), 1);
        assert_eq!(pages.active().unwrap().content, "c");
        assert!(pages.move_active_left());
        assert!(!pages.move_active_left());
        let order: Vec<&str> = pages.iter().map(|p| p.content).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_move_page_tracks_active() {
        let mut pages = three();
        pages.switch_to(1);
        assert!(pages.move_page(0, 2));
        assert_eq!(pages.active().unwrap().content, "b");
        assert_eq!(pages.active_index(), 0);
    }

    #[test]
    fn test_close_adjusts_active() {
        let mut pages = three();
        pages.switch_to(2);
        assert_eq!(pages.close(0).unwrap().content, "a");
        assert_eq!(pages.active_index(), 1);
        assert_eq!(pages.active().unwrap().content, "c");
        assert_eq!(pages.close(1).unwrap().content, "c");
        assert_eq!(pages.active().unwrap().content, "b");
        assert!(pages.close(5).is_none());
    }

    #[test]
    fn test_closing_last_page_policy() {
        let mut pages = PageList::new();
        pages.add(None, ());
        assert_eq!(pages.after_close(true), AfterClose::Nothing);
        pages.close(0);
        assert!(pages.is_empty());
        assert!(pages.active().is_none());
        assert_eq!(pages.after_close(true), AfterClose::SpawnPage);
        assert_eq!(pages.after_close(false), AfterClose::CloseWindow);
    }
}
