// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use sheetboard_app::dates::today_millis;
use sheetboard_app::{
    BoardEvent, BoardState, LayoutMode, SortField, SortTerm, SourceError, Urgency, ViewBody,
    ViewConfig, ViewSnapshot, run_refresh_cycle, transform,
};
use sheetboard_testkit::{
    BoardFaker, FixtureSource, NOTES_TABLE_ID, PARTS_TABLE_ID, demo_views, reference_today,
};

#[test]
fn generated_parts_never_show_done_rows() -> Result<()> {
    let today = reference_today();
    let table = BoardFaker::new(11).parts_table(120, today)?;
    let config = ViewConfig::action_items("New Parts", PARTS_TABLE_ID);
    let view = transform(&table, &config, today_millis(today));

    let status_index = view
        .role_map
        .index_of("STATUS")
        .ok_or_else(|| anyhow::anyhow!("parts table should have a status column"))?;
    assert!(view.hidden_count > 0);
    assert_eq!(view.rows.len() + view.hidden_count, table.row_count());
    for row in &view.rows {
        assert_ne!(row.row.cell(status_index).normalized(), "DONE");
    }
    Ok(())
}

#[test]
fn generated_parts_follow_status_then_due_then_timestamp() -> Result<()> {
    let today = reference_today();
    let table = BoardFaker::new(5).parts_table(200, today)?;
    let config = ViewConfig::action_items("New Parts", PARTS_TABLE_ID);
    let view = transform(&table, &config, today_millis(today));

    for pair in view.rows.windows(2) {
        let (left, right) = (&pair[0].class, &pair[1].class);
        assert!(left.status_rank <= right.status_rank);
        if left.status_rank != right.status_rank {
            continue;
        }
        match (left.due, right.due) {
            (Some(left_due), Some(right_due)) => {
                assert!(left_due <= right_due);
                if left_due == right_due {
                    assert!(left.timestamp <= right.timestamp);
                }
            }
            (None, Some(_)) => panic!("rows without a due date must sort last"),
            _ => {}
        }
    }
    Ok(())
}

#[test]
fn urgency_tracks_due_dates_in_generated_rows() -> Result<()> {
    let today = reference_today();
    let today_ms = today_millis(today);
    let table = BoardFaker::new(23).parts_table(150, today)?;
    let config = ViewConfig::action_items("New Parts", PARTS_TABLE_ID);
    let view = transform(&table, &config, today_ms);

    let mut saw_red = false;
    for row in &view.rows {
        match row.class.due {
            Some(due) => {
                let expected = config.urgency.classify_due(Some(due), today_ms);
                assert_eq!(row.class.urgency, expected);
                saw_red |= expected == Urgency::Red;
            }
            None => assert_eq!(row.class.urgency, Urgency::Clear),
        }
    }
    assert!(saw_red);
    Ok(())
}

#[test]
fn feed_view_lists_newest_notes_first() -> Result<()> {
    let today = reference_today();
    let table = BoardFaker::new(9).notes_table(60, today)?;
    let config = ViewConfig::feed("Live Notes", NOTES_TABLE_ID);
    let view = transform(&table, &config, today_millis(today));

    assert_eq!(view.rows.len(), 60);
    assert_eq!(view.hidden_count, 0);
    for pair in view.rows.windows(2) {
        assert!(pair[0].class.timestamp >= pair[1].class.timestamp);
    }
    Ok(())
}

#[test]
fn sorting_by_a_named_column_orders_customers() -> Result<()> {
    let today = reference_today();
    let table = BoardFaker::new(31).parts_table(80, today)?;
    let mut config = ViewConfig::action_items("By Customer", PARTS_TABLE_ID);
    config.sort = vec![SortTerm::asc(SortField::Column("CUSTOMER".to_owned()))];
    let view = transform(&table, &config, today_millis(today));

    let customer = view
        .role_map
        .index_of("CUSTOMER")
        .ok_or_else(|| anyhow::anyhow!("parts table should have a customer column"))?;
    let names = view
        .rows
        .iter()
        .map(|row| row.row.cell(customer).normalized())
        .collect::<Vec<_>>();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    Ok(())
}

#[test]
fn snapshots_show_only_configured_columns() -> Result<()> {
    let today = reference_today();
    let table = BoardFaker::new(2).parts_table(30, today)?;
    let mut config = ViewConfig::action_items("New Parts", PARTS_TABLE_ID);
    config.visible_columns = vec![1, 2, 7];
    let view = transform(&table, &config, today_millis(today));
    let snapshot = ViewSnapshot::from_view(&config, &view);

    assert_eq!(snapshot.headers, vec!["Job", "Customer", "Needed By"]);
    assert_eq!(snapshot.count_text, format!("{} items", view.rows.len()));
    let ViewBody::Rows(rows) = &snapshot.body else {
        panic!("expected rows, got {:?}", snapshot.body);
    };
    for row in rows {
        assert_eq!(row.cells.len(), 3);
        assert!(row.cells[0].starts_with("J-"));
        assert!(!row.cells[2].contains(':'), "due dates render without time");
    }
    Ok(())
}

#[test]
fn refresh_cycle_over_fixtures_updates_the_board() -> Result<()> {
    let today = reference_today();
    let source = FixtureSource::demo(17, today);
    let mut state = BoardState::new("Shop Board", demo_views(), LayoutMode::SideBySide, 1.5);

    let outcome = run_refresh_cycle(&source, &state.view_configs(), today_millis(today));
    let events = state.apply_cycle(outcome, today);

    assert_eq!(events, vec![BoardEvent::ViewsUpdated]);
    assert_eq!(state.views[1].snapshot.count_text, "40 notes");
    assert!(matches!(state.views[0].snapshot.body, ViewBody::Rows(_)));
    Ok(())
}

#[test]
fn one_failing_table_fails_every_view_and_keeps_headers() -> Result<()> {
    let today = reference_today();
    let mut state = BoardState::new("Shop Board", demo_views(), LayoutMode::SideBySide, 1.5);

    let healthy = FixtureSource::demo(17, today);
    let outcome = run_refresh_cycle(&healthy, &state.view_configs(), today_millis(today));
    state.apply_cycle(outcome, today);
    let headers = state.views[0].snapshot.headers.clone();

    let failing = FixtureSource::demo(17, today)
        .with_failure(SourceError::format(PARTS_TABLE_ID, "unexpected HTML login page"));
    let outcome = run_refresh_cycle(&failing, &state.view_configs(), today_millis(today));
    let events = state.apply_cycle(outcome, today);

    assert!(matches!(events.as_slice(), [BoardEvent::CycleFailed(_)]));
    assert_eq!(state.views[0].snapshot.headers, headers);
    for view in &state.views {
        assert_eq!(view.snapshot.count_text, "—");
        let ViewBody::Error(message) = &view.snapshot.body else {
            panic!("expected an error body, got {:?}", view.snapshot.body);
        };
        assert!(message.starts_with("⚠"));
        assert!(message.contains("unexpected HTML login page"));
    }
    Ok(())
}
