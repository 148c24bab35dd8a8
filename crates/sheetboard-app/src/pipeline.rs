// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::classify::{RowClass, UrgencyWindow, classify_row, status_value};
use crate::model::{CellValue, Column, Row, Table, normalize};
use crate::roles::{ResolvedRoles, RoleLabels, RoleMap, resolve_columns};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortField {
    Status,
    Priority,
    Due,
    Timestamp,
    Column(String),
}

impl SortField {
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if let Some(label) = trimmed.strip_prefix("column:") {
            let label = normalize(label);
            return (!label.is_empty()).then_some(Self::Column(label));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "status" => Some(Self::Status),
            "priority" => Some(Self::Priority),
            "due" | "needed_by" => Some(Self::Due),
            "timestamp" => Some(Self::Timestamp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortTerm {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortTerm {
    pub const fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub const fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

/// Status, then earliest due date, then oldest request.
pub fn action_sort() -> Vec<SortTerm> {
    vec![
        SortTerm::asc(SortField::Status),
        SortTerm::asc(SortField::Due),
        SortTerm::asc(SortField::Timestamp),
    ]
}

/// Hot first, then status, then oldest request.
pub fn priority_first_sort() -> Vec<SortTerm> {
    vec![
        SortTerm::asc(SortField::Priority),
        SortTerm::asc(SortField::Status),
        SortTerm::asc(SortField::Timestamp),
    ]
}

pub fn feed_sort() -> Vec<SortTerm> {
    vec![SortTerm::desc(SortField::Timestamp)]
}

pub fn default_hidden_statuses() -> BTreeSet<String> {
    BTreeSet::from(["DONE".to_owned()])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub name: String,
    pub table_id: String,
    pub count_label: String,
    /// Column positions to show, in order. Empty shows every column.
    pub visible_columns: Vec<usize>,
    pub sort: Vec<SortTerm>,
    pub hide_statuses: BTreeSet<String>,
    pub urgency: UrgencyWindow,
    pub roles: RoleLabels,
    pub auto_scroll: bool,
}

impl ViewConfig {
    pub fn action_items(name: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_id: table_id.into(),
            count_label: "items".to_owned(),
            visible_columns: Vec::new(),
            sort: action_sort(),
            hide_statuses: default_hidden_statuses(),
            urgency: UrgencyWindow::WEEK,
            roles: RoleLabels::default(),
            auto_scroll: false,
        }
    }

    pub fn feed(name: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            count_label: "notes".to_owned(),
            sort: feed_sort(),
            auto_scroll: true,
            ..Self::action_items(name, table_id)
        }
    }

    pub fn hides_status(&self, normalized_status: &str) -> bool {
        self.hide_statuses.contains(normalized_status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub source_index: usize,
    pub row: Row,
    pub class: RowClass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformedView {
    pub columns: Vec<Column>,
    pub visible_columns: Vec<usize>,
    pub role_map: RoleMap,
    pub roles: ResolvedRoles,
    pub rows: Vec<ClassifiedRow>,
    pub hidden_count: usize,
}

pub fn transform(table: &Table, config: &ViewConfig, today: i64) -> TransformedView {
    let role_map = resolve_columns(table.columns());
    let roles = role_map.roles(&config.roles);

    let mut rows = Vec::with_capacity(table.row_count());
    let mut hidden_count = 0;
    for (source_index, row) in table.rows().iter().enumerate() {
        if status_value(row, &roles).is_some_and(|status| config.hides_status(&status)) {
            hidden_count += 1;
            continue;
        }
        rows.push(ClassifiedRow {
            source_index,
            row: row.clone(),
            class: classify_row(row, &roles, &config.urgency, today),
        });
    }

    sort_rows(&mut rows, &config.sort, &role_map);

    let visible_columns = if config.visible_columns.is_empty() {
        (0..table.column_count()).collect()
    } else {
        config.visible_columns.clone()
    };

    TransformedView {
        columns: table.columns().to_vec(),
        visible_columns,
        role_map,
        roles,
        rows,
        hidden_count,
    }
}

/// Stable: rows equal on every term keep their fetch order.
pub fn sort_rows(rows: &mut [ClassifiedRow], terms: &[SortTerm], role_map: &RoleMap) {
    if terms.is_empty() {
        return;
    }
    let column_indices = terms
        .iter()
        .map(|term| match &term.field {
            SortField::Column(label) => role_map.index_of(label),
            _ => None,
        })
        .collect::<Vec<_>>();

    rows.sort_by(|left, right| compare_rows(left, right, terms, &column_indices));
}

pub fn compare_rows(
    left: &ClassifiedRow,
    right: &ClassifiedRow,
    terms: &[SortTerm],
    column_indices: &[Option<usize>],
) -> Ordering {
    for (index, term) in terms.iter().enumerate() {
        let ordering = match &term.field {
            SortField::Status => term
                .direction
                .apply(left.class.status_rank.cmp(&right.class.status_rank)),
            SortField::Priority => term
                .direction
                .apply(left.class.priority_rank.cmp(&right.class.priority_rank)),
            SortField::Due => {
                compare_present_first(left.class.due, right.class.due, term.direction)
            }
            SortField::Timestamp => compare_present_first(
                left.class.timestamp,
                right.class.timestamp,
                term.direction,
            ),
            SortField::Column(_) => column_indices
                .get(index)
                .copied()
                .flatten()
                .map_or(Ordering::Equal, |column| {
                    compare_cells(left.row.cell(column), right.row.cell(column), term.direction)
                }),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Missing values sort after present ones in either direction.
fn compare_present_first<T: Ord>(
    left: Option<T>,
    right: Option<T>,
    direction: SortDirection,
) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => direction.apply(left.cmp(&right)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_cells(left: &CellValue, right: &CellValue, direction: SortDirection) -> Ordering {
    match (left, right) {
        (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
        (CellValue::Empty, _) => Ordering::Greater,
        (_, CellValue::Empty) => Ordering::Less,
        (CellValue::Number(left), CellValue::Number(right)) => {
            direction.apply(left.total_cmp(right))
        }
        _ => direction.apply(left.normalized().cmp(&right.normalized())),
    }
}
