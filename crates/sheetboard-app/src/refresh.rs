// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::model::Table;
use crate::pipeline::{TransformedView, ViewConfig, transform};

/// Turns a table id into a parsed table. Implementations are shared across
/// the fetch workers of one cycle.
pub trait TableSource: Sync {
    fn fetch_table(&self, table_id: &str) -> Result<Table, SourceError>;
}

impl<T: TableSource + ?Sized> TableSource for Box<T> {
    fn fetch_table(&self, table_id: &str) -> Result<Table, SourceError> {
        (**self).fetch_table(table_id)
    }
}

impl<T: TableSource + Send + ?Sized> TableSource for Arc<T> {
    fn fetch_table(&self, table_id: &str) -> Result<Table, SourceError> {
        (**self).fetch_table(table_id)
    }
}

/// Fetches every distinct table id concurrently and waits for all of them.
/// The first failure in `table_ids` order is returned.
pub fn fetch_tables<S: TableSource + ?Sized>(
    source: &S,
    table_ids: &[&str],
) -> Result<Vec<Table>, SourceError> {
    let mut distinct: Vec<&str> = Vec::new();
    for table_id in table_ids {
        if !distinct.contains(table_id) {
            distinct.push(*table_id);
        }
    }

    let fetched = thread::scope(|scope| {
        let handles = distinct
            .iter()
            .map(|table_id| {
                let table_id = *table_id;
                let handle = scope.spawn(move || {
                    let started = Instant::now();
                    let result = source.fetch_table(table_id);
                    match &result {
                        Ok(table) => debug!(
                            table_id,
                            rows = table.row_count(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "fetched table"
                        ),
                        Err(error) => debug!(table_id, kind = error.kind(), "table fetch failed"),
                    }
                    result
                });
                (table_id, handle)
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|(table_id, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(SourceError::fetch(table_id, "fetch worker panicked")))
            })
            .collect::<Vec<_>>()
    });

    let mut tables = Vec::with_capacity(table_ids.len());
    for table_id in table_ids {
        let position = distinct
            .iter()
            .position(|candidate| candidate == table_id)
            .unwrap_or_default();
        match &fetched[position] {
            Ok(table) => tables.push(table.clone()),
            Err(error) => return Err(error.clone()),
        }
    }
    Ok(tables)
}

/// One refresh: fetch all tables, then transform every view. Any fetch
/// failure fails the cycle for every view.
pub fn run_refresh_cycle<S: TableSource + ?Sized>(
    source: &S,
    views: &[ViewConfig],
    today: i64,
) -> Result<Vec<TransformedView>, SourceError> {
    let started = Instant::now();
    let table_ids = views
        .iter()
        .map(|view| view.table_id.as_str())
        .collect::<Vec<_>>();

    let tables = fetch_tables(source, &table_ids).inspect_err(|error| {
        warn!(kind = error.kind(), table_id = error.table_id(), %error, "refresh cycle failed");
    })?;

    let transformed = views
        .iter()
        .zip(&tables)
        .map(|(view, table)| transform(table, view, today))
        .collect::<Vec<_>>();

    info!(
        views = transformed.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "refresh cycle completed"
    );
    Ok(transformed)
}

/// Allows one refresh at a time. A second [`RefreshGuard::try_begin`] while a
/// ticket is alive returns `None`; the caller skips that cycle.
#[derive(Debug, Clone, Default)]
pub struct RefreshGuard {
    in_flight: Arc<AtomicBool>,
}

impl RefreshGuard {
    pub fn try_begin(&self) -> Option<RefreshTicket> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshTicket {
                in_flight: Arc::clone(&self.in_flight),
            })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct RefreshTicket {
    in_flight: Arc<AtomicBool>,
}

impl Drop for RefreshTicket {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::{RefreshGuard, TableSource, fetch_tables, run_refresh_cycle};
    use crate::error::SourceError;
    use crate::model::{CellValue, Column, Table};
    use crate::pipeline::ViewConfig;
    use anyhow::Result;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::thread;

    #[derive(Default)]
    struct MapSource {
        tables: BTreeMap<String, Result<Table, SourceError>>,
        calls: Mutex<Vec<String>>,
    }

    impl MapSource {
        fn with(mut self, table_id: &str, result: Result<Table, SourceError>) -> Self {
            self.tables.insert(table_id.to_owned(), result);
            self
        }

        fn calls(&self) -> Vec<String> {
            let mut calls = self.calls.lock().expect("calls lock").clone();
            calls.sort();
            calls
        }
    }

    impl TableSource for MapSource {
        fn fetch_table(&self, table_id: &str) -> Result<Table, SourceError> {
            self.calls
                .lock()
                .expect("calls lock")
                .push(table_id.to_owned());
            self.tables
                .get(table_id)
                .cloned()
                .unwrap_or_else(|| Err(SourceError::fetch(table_id, "unknown table")))
        }
    }

    fn status_table(statuses: &[&str]) -> Result<Table> {
        Ok(Table::new(
            vec![Column::new("Timestamp"), Column::new("Status")],
            statuses
                .iter()
                .map(|status| vec![CellValue::Empty, CellValue::Text((*status).to_owned())])
                .collect(),
        )?)
    }

    #[test]
    fn cycle_transforms_every_view() -> Result<()> {
        let source = MapSource::default()
            .with("1", Ok(status_table(&["OPEN", "DONE"])?))
            .with("2", Ok(status_table(&["HOLD"])?));
        let views = vec![
            ViewConfig::action_items("New Parts", "1"),
            ViewConfig::feed("Live Notes", "2"),
        ];

        let transformed = run_refresh_cycle(&source, &views, 0)?;
        assert_eq!(transformed.len(), 2);
        assert_eq!(transformed[0].rows.len(), 1);
        assert_eq!(transformed[0].hidden_count, 1);
        assert_eq!(transformed[1].rows.len(), 1);
        Ok(())
    }

    #[test]
    fn one_failed_table_fails_the_cycle() -> Result<()> {
        let source = MapSource::default()
            .with("1", Ok(status_table(&["OPEN"])?))
            .with("2", Err(SourceError::format("2", "no braces")));
        let views = vec![
            ViewConfig::action_items("New Parts", "1"),
            ViewConfig::feed("Live Notes", "2"),
        ];

        let error = run_refresh_cycle(&source, &views, 0).expect_err("cycle should fail");
        assert_eq!(error, SourceError::format("2", "no braces"));
        assert_eq!(source.calls(), vec!["1", "2"]);
        Ok(())
    }

    #[test]
    fn shared_table_ids_are_fetched_once() -> Result<()> {
        let source = MapSource::default().with("7", Ok(status_table(&["OPEN"])?));
        let tables = fetch_tables(&source, &["7", "7"])?;
        assert_eq!(tables.len(), 2);
        assert_eq!(source.calls(), vec!["7"]);
        Ok(())
    }

    #[test]
    fn guard_skips_while_a_ticket_is_held() {
        let guard = RefreshGuard::default();
        let ticket = guard.try_begin().expect("first refresh should start");
        assert!(guard.is_in_flight());
        assert!(guard.try_begin().is_none());

        let worker_guard = guard.clone();
        thread::spawn(move || drop(ticket))
            .join()
            .expect("worker should finish");
        assert!(!worker_guard.is_in_flight());
        assert!(guard.try_begin().is_some());
    }
}
