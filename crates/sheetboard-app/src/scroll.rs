// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

pub const DEFAULT_ROWS_PER_SECOND: f64 = 1.5;

/// Scroll position for one view, in rows. The renderer reads
/// [`AutoScroll::row_offset`]; only [`AutoScroll::tick`] moves it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScroll {
    pub enabled: bool,
    pub rows_per_second: f64,
    pub paused: bool,
    pub hovered: bool,
    offset: f64,
}

impl Default for AutoScroll {
    fn default() -> Self {
        Self::new(false, DEFAULT_ROWS_PER_SECOND)
    }
}

impl AutoScroll {
    pub const fn new(enabled: bool, rows_per_second: f64) -> Self {
        Self {
            enabled,
            rows_per_second,
            paused: false,
            hovered: false,
            offset: 0.0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.enabled && !self.paused && !self.hovered
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn row_offset(&self) -> usize {
        self.offset.max(0.0).floor() as usize
    }

    pub fn reset(&mut self) {
        self.offset = 0.0;
    }

    /// Advances by `rows_per_second * dt` and wraps to the top once the last
    /// row is in view. Content that fits the viewport stays at the top.
    pub fn tick(&mut self, dt: Duration, content_rows: usize, viewport_rows: usize) {
        let max_offset = content_rows.saturating_sub(viewport_rows);
        if max_offset == 0 {
            self.offset = 0.0;
            return;
        }
        if !self.is_running() {
            return;
        }

        self.offset += self.rows_per_second * dt.as_secs_f64();
        if self.offset >= max_offset as f64 {
            self.offset = 0.0;
        }
    }
}
