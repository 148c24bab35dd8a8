// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::classify::Urgency;
use crate::format::{ColumnFormat, format_cell};
use crate::pipeline::{TransformedView, ViewConfig};

pub const COUNT_PLACEHOLDER: &str = "—";
pub const ERROR_MARK: &str = "⚠";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowEmphasis {
    pub hot: bool,
    pub sample: bool,
    pub hold: bool,
    pub urgency: Option<Urgency>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow {
    pub cells: Vec<String>,
    pub emphasis: RowEmphasis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewBody {
    Loading,
    Rows(Vec<SnapshotRow>),
    Error(String),
}

/// What a renderer needs for one view; no reference back into board state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub name: String,
    pub headers: Vec<String>,
    pub body: ViewBody,
    pub count_text: String,
}

impl ViewSnapshot {
    pub fn loading(config: &ViewConfig) -> Self {
        Self {
            name: config.name.clone(),
            headers: Vec::new(),
            body: ViewBody::Loading,
            count_text: COUNT_PLACEHOLDER.to_owned(),
        }
    }

    pub fn from_view(config: &ViewConfig, view: &TransformedView) -> Self {
        let formats = view
            .visible_columns
            .iter()
            .map(|index| {
                view.columns
                    .get(*index)
                    .map_or(ColumnFormat::Raw, |column| {
                        ColumnFormat::for_label(&column.label, &config.roles)
                    })
            })
            .collect::<Vec<_>>();

        let headers = view
            .visible_columns
            .iter()
            .map(|index| {
                view.columns
                    .get(*index)
                    .map(|column| column.label.clone())
                    .unwrap_or_default()
            })
            .collect();

        let rows = view
            .rows
            .iter()
            .map(|row| SnapshotRow {
                cells: view
                    .visible_columns
                    .iter()
                    .zip(&formats)
                    .map(|(index, format)| format_cell(row.row.cell(*index), *format))
                    .collect(),
                emphasis: RowEmphasis {
                    hot: row.class.is_hot,
                    sample: row.class.is_sample,
                    hold: row.class.is_hold,
                    urgency: match row.class.urgency {
                        Urgency::Clear => None,
                        urgency => Some(urgency),
                    },
                },
            })
            .collect::<Vec<_>>();

        Self {
            name: config.name.clone(),
            headers,
            count_text: format!("{} {}", rows.len(), config.count_label),
            body: ViewBody::Rows(rows),
        }
    }

    /// Keeps the previous headers; the body becomes a single message row.
    pub fn failed(previous: &Self, message: &str) -> Self {
        Self {
            name: previous.name.clone(),
            headers: previous.headers.clone(),
            body: ViewBody::Error(format!("{ERROR_MARK} {message}")),
            count_text: COUNT_PLACEHOLDER.to_owned(),
        }
    }

    pub fn row_count(&self) -> usize {
        match &self.body {
            ViewBody::Rows(rows) => rows.len(),
            ViewBody::Loading | ViewBody::Error(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{COUNT_PLACEHOLDER, RowEmphasis, ViewBody, ViewSnapshot};
    use crate::classify::Urgency;
    use crate::dates::to_millis;
    use crate::model::{CellValue, Column, Table};
    use crate::pipeline::{ViewConfig, transform};
    use anyhow::Result;
    use time::macros::datetime;

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_owned())
    }

    fn parts_table() -> Result<Table> {
        Ok(Table::new(
            vec![
                Column::new("Timestamp"),
                Column::new("Samples"),
                Column::new("Priority"),
                Column::new("Status"),
                Column::new("Needed By"),
            ],
            vec![
                vec![
                    CellValue::from_text("Date(2026,9,1,8,15,0)"),
                    text("YES"),
                    text("HOT"),
                    text("OPEN"),
                    CellValue::from_text("Date(2026,9,15,9,0,0)"),
                ],
                vec![
                    CellValue::from_text("Date(2026,9,2,8,15,0)"),
                    text("no"),
                    text("LOW"),
                    text("HOLD"),
                    CellValue::Empty,
                ],
                vec![
                    CellValue::from_text("Date(2026,9,3,8,15,0)"),
                    text("no"),
                    text("LOW"),
                    text("DONE"),
                    CellValue::Empty,
                ],
            ],
        )?)
    }

    #[test]
    fn snapshot_formats_cells_and_flags_rows() -> Result<()> {
        let config = ViewConfig::action_items("New Parts", "1");
        let today = to_millis(datetime!(2026-10-14 0:00));
        let view = transform(&parts_table()?, &config, today);
        let snapshot = ViewSnapshot::from_view(&config, &view);

        assert_eq!(
            snapshot.headers,
            vec!["Timestamp", "Samples", "Priority", "Status", "Needed By"]
        );
        assert_eq!(snapshot.count_text, "2 items");

        let ViewBody::Rows(rows) = &snapshot.body else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].cells[0], "10/1/2026, 8:15:00 AM");
        assert_eq!(rows[0].cells[4], "10/15/2026");
        assert_eq!(
            rows[0].emphasis,
            RowEmphasis {
                hot: true,
                sample: true,
                hold: false,
                urgency: Some(Urgency::Red),
            }
        );
        assert!(rows[1].emphasis.hold);
        assert_eq!(rows[1].cells[4], "");
        assert_eq!(rows[1].emphasis.urgency, None);
        Ok(())
    }

    #[test]
    fn out_of_range_visible_columns_render_empty() -> Result<()> {
        let config = ViewConfig {
            visible_columns: vec![3, 12],
            ..ViewConfig::action_items("New Parts", "1")
        };
        let view = transform(&parts_table()?, &config, 0);
        let snapshot = ViewSnapshot::from_view(&config, &view);
        assert_eq!(snapshot.headers, vec!["Status".to_owned(), String::new()]);
        let ViewBody::Rows(rows) = &snapshot.body else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].cells, vec!["OPEN".to_owned(), String::new()]);
        Ok(())
    }

    #[test]
    fn failed_snapshot_shows_one_message_and_placeholder_count() -> Result<()> {
        let config = ViewConfig::feed("Live Notes", "2");
        let view = transform(&parts_table()?, &config, 0);
        let previous = ViewSnapshot::from_view(&config, &view);

        let failed = ViewSnapshot::failed(&previous, "fetch failed");
        assert_eq!(failed.headers, previous.headers);
        assert_eq!(failed.body, ViewBody::Error("⚠ fetch failed".to_owned()));
        assert_eq!(failed.count_text, COUNT_PLACEHOLDER);
        assert_eq!(failed.row_count(), 1);
        Ok(())
    }
}
