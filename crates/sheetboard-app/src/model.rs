// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::error::RowWidthError;

pub const DATE_LITERAL_TAG: &str = "Date";

/// Calendar components carried by a `Date(Y,M,D[,h,m,s])` cell. `month` is
/// zero-based and no component is range-checked; out-of-range values roll
/// over into the next unit when converted to a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateLiteral {
    pub raw: String,
    pub year: i64,
    pub month: i64,
    pub day: i64,
    pub hour: i64,
    pub minute: i64,
    pub second: i64,
}

impl DateLiteral {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let inner = trimmed
            .strip_prefix(DATE_LITERAL_TAG)?
            .strip_prefix('(')?
            .strip_suffix(')')?;

        let numbers = embedded_integers(inner);
        if numbers.len() < 3 {
            return None;
        }
        let component = |index: usize| numbers.get(index).copied().unwrap_or(0);

        Some(Self {
            raw: raw.to_owned(),
            year: numbers[0],
            month: numbers[1],
            day: numbers[2],
            hour: component(3),
            minute: component(4),
            second: component(5),
        })
    }

    pub fn has_time(&self) -> bool {
        self.hour != 0 || self.minute != 0 || self.second != 0
    }
}

fn embedded_integers(input: &str) -> Vec<i64> {
    input
        .split(|ch: char| !ch.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse::<i64>().ok())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    /// Spreadsheet day-serial, or any other plain number.
    Number(f64),
    DateLiteral(DateLiteral),
    Text(String),
}

impl CellValue {
    pub fn from_text(raw: &str) -> Self {
        match DateLiteral::parse(raw) {
            Some(literal) => Self::DateLiteral(literal),
            None => Self::Text(raw.to_owned()),
        }
    }

    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn raw_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(value) => value.to_string(),
            Self::DateLiteral(literal) => literal.raw.clone(),
            Self::Text(value) => value.clone(),
        }
    }

    pub fn normalized(&self) -> String {
        normalize(&self.raw_text())
    }
}

pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub label: String,
}

impl Column {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn normalized_label(&self) -> String {
        normalize(&self.label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<CellValue>,
}

impl Row {
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> &CellValue {
        self.cells.get(index).unwrap_or(&CellValue::Empty)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// One fetched table. Every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    /// Rows shorter than the column list are padded with empty cells; longer
    /// rows are rejected.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<CellValue>>) -> Result<Self, RowWidthError> {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, mut cells)| {
                if cells.len() > width {
                    return Err(RowWidthError {
                        row: index,
                        cells: cells.len(),
                        columns: width,
                    });
                }
                cells.resize(width, CellValue::Empty);
                Ok(Row { cells })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
