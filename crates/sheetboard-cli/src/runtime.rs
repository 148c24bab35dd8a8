// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use sheetboard_app::dates::{local_now, today_millis};
use sheetboard_app::{BoardState, SourceError, TableSource, TransformedView, ViewConfig};
use sheetboard_tui::{BoardRuntime, InternalEvent, RefreshRequest};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::warn;

pub type SharedSource = Arc<dyn TableSource + Send>;

pub struct SourceRuntime {
    source: SharedSource,
}

impl SourceRuntime {
    pub fn new(source: SharedSource) -> Self {
        Self { source }
    }
}

impl BoardRuntime for SourceRuntime {
    fn run_refresh(
        &mut self,
        views: &[ViewConfig],
        today: i64,
    ) -> Result<Vec<TransformedView>, SourceError> {
        sheetboard_app::run_refresh_cycle(self.source.as_ref(), views, today)
    }

    fn spawn_refresh(&mut self, request: RefreshRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let source = Arc::clone(&self.source);
        thread::Builder::new()
            .name("sheetboard-refresh".to_owned())
            .spawn(move || {
                let RefreshRequest {
                    views,
                    today,
                    ticket,
                } = request;
                let outcome = sheetboard_app::run_refresh_cycle(source.as_ref(), &views, today);
                drop(ticket);
                let event = InternalEvent::RefreshFinished {
                    outcome,
                    finished_at: local_now(),
                };
                if tx.send(event).is_err() {
                    warn!("dashboard closed before refresh finished");
                }
            })
            .context("spawn refresh thread")?;
        Ok(())
    }
}

/// Runs a single cycle and renders every view as plain text. A failed cycle
/// still renders; `state.last_error` carries the failure.
pub fn dump<R: BoardRuntime>(state: &mut BoardState, runtime: &mut R) -> String {
    let now = runtime.now();
    let outcome = runtime.run_refresh(&state.view_configs(), today_millis(now));
    state.apply_cycle(outcome, now);
    sheetboard_tui::dump_text(state)
}

#[cfg(test)]
mod tests {
    use super::{SourceRuntime, dump};
    use anyhow::Result;
    use sheetboard_app::{BoardState, LayoutMode, SourceError, ViewBody};
    use sheetboard_testkit::{FixtureSource, NOTES_TABLE_ID, demo_views, reference_today};
    use sheetboard_tui::{BoardRuntime, InternalEvent, RefreshRequest};
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::time::Duration;

    fn demo_state() -> BoardState {
        BoardState::new("Shop Board", demo_views(), LayoutMode::SideBySide, 1.5)
    }

    #[test]
    fn dump_renders_every_demo_view() {
        let source = FixtureSource::demo(7, reference_today());
        let mut runtime = SourceRuntime::new(Arc::new(source));
        let mut state = demo_state();

        let text = dump(&mut state, &mut runtime);
        assert!(text.contains("New Parts"));
        assert!(text.contains("Live Notes"));
        assert!(text.contains("40 notes"));
        assert!(state.last_error.is_none());
        assert!(state.last_refresh.is_some());
    }

    #[test]
    fn dump_marks_every_view_when_any_table_fails() {
        let source = FixtureSource::demo(7, reference_today())
            .with_failure(SourceError::fetch(NOTES_TABLE_ID, "connection reset"));
        let mut runtime = SourceRuntime::new(Arc::new(source));
        let mut state = demo_state();

        let text = dump(&mut state, &mut runtime);
        assert_eq!(text.matches("⚠").count(), 2);
        assert!(text.contains("connection reset"));
        assert!(
            state
                .last_error
                .as_deref()
                .is_some_and(|error| error.contains(NOTES_TABLE_ID))
        );
        for view in &state.views {
            assert!(matches!(view.snapshot.body, ViewBody::Error(_)));
        }
    }

    #[test]
    fn spawned_refresh_reports_back_and_releases_guard() -> Result<()> {
        let source = FixtureSource::demo(3, reference_today());
        let mut runtime = SourceRuntime::new(Arc::new(source));
        let guard = sheetboard_app::RefreshGuard::default();
        let ticket = guard
            .try_begin()
            .ok_or_else(|| anyhow::anyhow!("guard should be idle"))?;
        let (tx, rx) = mpsc::channel();

        runtime.spawn_refresh(
            RefreshRequest {
                views: demo_views(),
                today: 0,
                ticket,
            },
            tx,
        )?;

        let event = rx.recv_timeout(Duration::from_secs(5))?;
        match event {
            InternalEvent::RefreshFinished { outcome, .. } => {
                assert_eq!(outcome?.len(), 2);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(!guard.is_in_flight());
        Ok(())
    }
}
