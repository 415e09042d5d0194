//! Slide animation sequence
//!
//! Showing and hiding resize the window in a fixed number of steps. The
//! frontend pulls one height per timer tick and reschedules itself until the
//! sequence ends, so the main loop is never blocked.

use std::time::Duration;

use crate::config::WindowConfig;

/// Which way the window slides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDirection {
    /// Grow from nothing to full height (show)
    Down,
    /// Shrink from full height to nothing (hide)
    Up,
}

/// Finite sequence of window heights
#[derive(Debug, Clone)]
pub struct SlideAnimation {
    direction: SlideDirection,
    full_height: i32,
    steps: u32,
    next: u32,
    delay: Duration,
}

impl SlideAnimation {
    pub fn new(direction: SlideDirection, full_height: i32, steps: u32, delay: Duration) -> Self {
        let next = match direction {
            SlideDirection::Down => 1,
            SlideDirection::Up => 0,
        };
        Self {
            direction,
            full_height: full_height.max(0),
            steps: steps.max(1),
            next,
            delay,
        }
    }

    /// Build from the window settings
    pub fn from_config(direction: SlideDirection, full_height: i32, config: &WindowConfig) -> Self {
        Self::new(
            direction,
            full_height,
            config.animation_step_count,
            Duration::from_millis(config.animation_step_time),
        )
    }

    pub fn direction(&self) -> SlideDirection {
        self.direction
    }

    /// Delay before the next step
    pub fn step_delay(&self) -> Duration {
        self.delay
    }

    pub fn is_finished(&self) -> bool {
        self.next > self.steps
    }
}

impl Iterator for SlideAnimation {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        if self.is_finished() {
            return None;
        }
        let i = self.next as i64;
        self.next += 1;
        let grown = (self.full_height as i64 * i / self.steps as i64) as i32;
        Some(match self.direction {
            SlideDirection::Down => grown,
            SlideDirection::Up => self.full_height - grown,
        })
    }
}
