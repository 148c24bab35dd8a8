// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::error::SourceError;
use crate::pipeline::{TransformedView, ViewConfig};
use crate::scroll::AutoScroll;
use crate::snapshot::ViewSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    #[default]
    SideBySide,
    Stacked,
}

impl LayoutMode {
    pub const fn toggled(self) -> Self {
        match self {
            Self::SideBySide => Self::Stacked,
            Self::Stacked => Self::SideBySide,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SideBySide => "side-by-side",
            Self::Stacked => "stacked",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub config: ViewConfig,
    pub snapshot: ViewSnapshot,
    pub scroll: AutoScroll,
}

impl ViewState {
    pub fn new(config: ViewConfig, rows_per_second: f64) -> Self {
        Self {
            snapshot: ViewSnapshot::loading(&config),
            scroll: AutoScroll::new(config.auto_scroll, rows_per_second),
            config,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    pub title: String,
    pub views: Vec<ViewState>,
    pub active_view: usize,
    pub layout: LayoutMode,
    pub maximized: bool,
    pub hovered_view: Option<usize>,
    pub refreshing: bool,
    pub last_refresh: Option<PrimitiveDateTime>,
    pub last_error: Option<String>,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardCommand {
    NextView,
    PrevView,
    SelectView(usize),
    ToggleMaximize,
    ToggleLayout,
    TogglePause,
    Hover(Option<usize>),
    RefreshStarted,
    RefreshSkipped,
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    ActiveViewChanged(usize),
    MaximizeChanged(bool),
    LayoutChanged(LayoutMode),
    PauseChanged { view: usize, paused: bool },
    HoverChanged(Option<usize>),
    RefreshStarted,
    RefreshSkipped,
    ViewsUpdated,
    CycleFailed(String),
    StatusUpdated(String),
    StatusCleared,
}

impl BoardState {
    pub fn new(
        title: impl Into<String>,
        views: Vec<ViewConfig>,
        layout: LayoutMode,
        rows_per_second: f64,
    ) -> Self {
        Self {
            title: title.into(),
            views: views
                .into_iter()
                .map(|config| ViewState::new(config, rows_per_second))
                .collect(),
            active_view: 0,
            layout,
            maximized: false,
            hovered_view: None,
            refreshing: false,
            last_refresh: None,
            last_error: None,
            status_line: None,
        }
    }

    pub fn view_configs(&self) -> Vec<ViewConfig> {
        self.views.iter().map(|view| view.config.clone()).collect()
    }

    pub fn snapshots(&self) -> Vec<&ViewSnapshot> {
        self.views.iter().map(|view| &view.snapshot).collect()
    }

    /// Views drawn in the body, in layout order.
    pub fn visible_views(&self) -> Vec<usize> {
        if self.maximized && self.active_view < self.views.len() {
            vec![self.active_view]
        } else {
            (0..self.views.len()).collect()
        }
    }

    pub fn dispatch(&mut self, command: BoardCommand) -> Vec<BoardEvent> {
        match command {
            BoardCommand::NextView => self.rotate_view(1),
            BoardCommand::PrevView => self.rotate_view(-1),
            BoardCommand::SelectView(index) => {
                if index >= self.views.len() || index == self.active_view {
                    return Vec::new();
                }
                self.active_view = index;
                vec![BoardEvent::ActiveViewChanged(index)]
            }
            BoardCommand::ToggleMaximize => {
                self.maximized = !self.maximized;
                let label = if self.maximized {
                    "maximized"
                } else {
                    "restored"
                };
                vec![
                    BoardEvent::MaximizeChanged(self.maximized),
                    self.set_status(label),
                ]
            }
            BoardCommand::ToggleLayout => {
                self.layout = self.layout.toggled();
                vec![
                    BoardEvent::LayoutChanged(self.layout),
                    self.set_status(self.layout.as_str()),
                ]
            }
            BoardCommand::TogglePause => {
                let view = self.active_view;
                let Some(scroll) = self.views.get_mut(view).map(|state| &mut state.scroll) else {
                    return Vec::new();
                };
                scroll.paused = !scroll.paused;
                let paused = scroll.paused;
                let label = if paused { "scroll paused" } else { "scroll resumed" };
                vec![
                    BoardEvent::PauseChanged { view, paused },
                    self.set_status(label),
                ]
            }
            BoardCommand::Hover(hovered) => {
                let hovered = hovered.filter(|index| *index < self.views.len());
                if hovered == self.hovered_view {
                    return Vec::new();
                }
                self.hovered_view = hovered;
                for (index, view) in self.views.iter_mut().enumerate() {
                    view.scroll.hovered = Some(index) == hovered;
                }
                vec![BoardEvent::HoverChanged(hovered)]
            }
            BoardCommand::RefreshStarted => {
                self.refreshing = true;
                vec![BoardEvent::RefreshStarted]
            }
            BoardCommand::RefreshSkipped => {
                vec![
                    BoardEvent::RefreshSkipped,
                    self.set_status("refresh already in flight"),
                ]
            }
            BoardCommand::ClearStatus => {
                self.status_line = None;
                vec![BoardEvent::StatusCleared]
            }
        }
    }

    /// Replaces every view's snapshot with the outcome of one cycle. A failed
    /// cycle shows the error in every view instead of partial data.
    pub fn apply_cycle(
        &mut self,
        outcome: Result<Vec<TransformedView>, SourceError>,
        finished_at: PrimitiveDateTime,
    ) -> Vec<BoardEvent> {
        self.refreshing = false;
        self.last_refresh = Some(finished_at);
        match outcome {
            Ok(transformed) => {
                for (view, data) in self.views.iter_mut().zip(&transformed) {
                    view.snapshot = ViewSnapshot::from_view(&view.config, data);
                }
                self.last_error = None;
                vec![BoardEvent::ViewsUpdated]
            }
            Err(error) => {
                let message = error.to_string();
                for view in &mut self.views {
                    view.snapshot = ViewSnapshot::failed(&view.snapshot, &message);
                    view.scroll.reset();
                }
                self.last_error = Some(message.clone());
                vec![BoardEvent::CycleFailed(message)]
            }
        }
    }

    /// `viewport_rows(index)` is the number of body rows the renderer can
    /// show for that view. Views not on screen do not move.
    pub fn tick_scroll(&mut self, dt: Duration, viewport_rows: impl Fn(usize) -> usize) {
        for index in self.visible_views() {
            let view = &mut self.views[index];
            let content_rows = view.snapshot.row_count();
            view.scroll.tick(dt, content_rows, viewport_rows(index));
        }
    }

    fn rotate_view(&mut self, delta: isize) -> Vec<BoardEvent> {
        if self.views.is_empty() {
            return Vec::new();
        }
        let len = self.views.len() as isize;
        let next = (self.active_view as isize + delta).rem_euclid(len) as usize;
        self.active_view = next;
        vec![BoardEvent::ActiveViewChanged(next)]
    }

    fn set_status(&mut self, message: &str) -> BoardEvent {
        self.status_line = Some(message.to_owned());
        BoardEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardCommand, BoardEvent, BoardState, LayoutMode};
    use crate::error::SourceError;
    use crate::model::{CellValue, Column, Table};
    use crate::pipeline::{ViewConfig, transform};
    use crate::snapshot::{COUNT_PLACEHOLDER, ViewBody};
    use anyhow::Result;
    use std::time::Duration;
    use time::macros::datetime;

    fn board() -> BoardState {
        BoardState::new(
            "Shop Board",
            vec![
                ViewConfig::action_items("New Parts", "1"),
                ViewConfig::feed("Live Notes", "2"),
            ],
            LayoutMode::SideBySide,
            1.0,
        )
    }

    fn notes_table(count: usize) -> Result<Table> {
        Ok(Table::new(
            vec![Column::new("Timestamp"), Column::new("Note")],
            (0..count)
                .map(|index| vec![CellValue::Number(46_000.0 + index as f64), CellValue::Empty])
                .collect(),
        )?)
    }

    #[test]
    fn view_rotation_wraps() {
        let mut state = board();
        assert_eq!(
            state.dispatch(BoardCommand::PrevView),
            vec![BoardEvent::ActiveViewChanged(1)]
        );
        assert_eq!(
            state.dispatch(BoardCommand::NextView),
            vec![BoardEvent::ActiveViewChanged(0)]
        );
    }

    #[test]
    fn select_ignores_unknown_and_current_views() {
        let mut state = board();
        assert!(state.dispatch(BoardCommand::SelectView(0)).is_empty());
        assert!(state.dispatch(BoardCommand::SelectView(5)).is_empty());
        assert_eq!(
            state.dispatch(BoardCommand::SelectView(1)),
            vec![BoardEvent::ActiveViewChanged(1)]
        );
    }

    #[test]
    fn maximize_shows_only_the_active_view() {
        let mut state = board();
        assert_eq!(state.visible_views(), vec![0, 1]);
        state.dispatch(BoardCommand::SelectView(1));
        let events = state.dispatch(BoardCommand::ToggleMaximize);
        assert_eq!(events[0], BoardEvent::MaximizeChanged(true));
        assert_eq!(state.visible_views(), vec![1]);
    }

    #[test]
    fn layout_toggle_round_trips() {
        let mut state = board();
        state.dispatch(BoardCommand::ToggleLayout);
        assert_eq!(state.layout, LayoutMode::Stacked);
        assert_eq!(state.status_line.as_deref(), Some("stacked"));
        state.dispatch(BoardCommand::ToggleLayout);
        assert_eq!(state.layout, LayoutMode::SideBySide);
    }

    #[test]
    fn hover_marks_exactly_one_view() {
        let mut state = board();
        assert_eq!(
            state.dispatch(BoardCommand::Hover(Some(1))),
            vec![BoardEvent::HoverChanged(Some(1))]
        );
        assert!(!state.views[0].scroll.hovered);
        assert!(state.views[1].scroll.hovered);
        assert!(state.dispatch(BoardCommand::Hover(Some(1))).is_empty());

        state.dispatch(BoardCommand::Hover(None));
        assert!(state.views.iter().all(|view| !view.scroll.hovered));
    }

    #[test]
    fn pause_applies_to_the_active_view() {
        let mut state = board();
        state.dispatch(BoardCommand::SelectView(1));
        let events = state.dispatch(BoardCommand::TogglePause);
        assert_eq!(
            events[0],
            BoardEvent::PauseChanged {
                view: 1,
                paused: true
            }
        );
        assert!(state.views[1].scroll.paused);
        assert!(!state.views[0].scroll.paused);
    }

    #[test]
    fn successful_cycle_replaces_snapshots() -> Result<()> {
        let mut state = board();
        let configs = state.view_configs();
        let table = notes_table(3)?;
        let transformed = configs
            .iter()
            .map(|config| transform(&table, config, 0))
            .collect();

        state.dispatch(BoardCommand::RefreshStarted);
        assert!(state.refreshing);
        let events = state.apply_cycle(Ok(transformed), datetime!(2026-10-14 9:00));
        assert_eq!(events, vec![BoardEvent::ViewsUpdated]);
        assert!(!state.refreshing);
        assert_eq!(state.views[0].snapshot.count_text, "3 items");
        assert_eq!(state.views[1].snapshot.count_text, "3 notes");
        Ok(())
    }

    #[test]
    fn failed_cycle_shows_error_in_every_view() {
        let mut state = board();
        let error = SourceError::format("2", "no JSON object found");
        let events = state.apply_cycle(Err(error.clone()), datetime!(2026-10-14 9:00));

        assert_eq!(events, vec![BoardEvent::CycleFailed(error.to_string())]);
        for view in &state.views {
            assert_eq!(view.snapshot.count_text, COUNT_PLACEHOLDER);
            assert_eq!(
                view.snapshot.body,
                ViewBody::Error(format!("⚠ {error}"))
            );
        }
        assert_eq!(state.last_error, Some(error.to_string()));
    }

    #[test]
    fn scroll_ticks_only_visible_auto_scroll_views() -> Result<()> {
        let mut state = board();
        let configs = state.view_configs();
        let table = notes_table(20)?;
        let transformed = configs
            .iter()
            .map(|config| transform(&table, config, 0))
            .collect();
        state.apply_cycle(Ok(transformed), datetime!(2026-10-14 9:00));

        state.tick_scroll(Duration::from_secs(3), |_| 5);
        assert_eq!(state.views[0].scroll.row_offset(), 0);
        assert_eq!(state.views[1].scroll.row_offset(), 3);

        state.dispatch(BoardCommand::ToggleMaximize);
        state.tick_scroll(Duration::from_secs(3), |_| 5);
        assert_eq!(state.views[1].scroll.row_offset(), 3);
        Ok(())
    }
}
