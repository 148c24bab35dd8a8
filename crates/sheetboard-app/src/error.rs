// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

/// Failure to turn one table id into a [`crate::Table`].
///
/// Date parsing has no variant here: unparseable dates degrade to an
/// absent value instead of failing the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("fetch failed for table {table_id}: {message}")]
    Fetch { table_id: String, message: String },

    #[error("no JSON payload in response for table {table_id}: {message}")]
    Format { table_id: String, message: String },

    #[error("unexpected payload for table {table_id}: {message}")]
    Schema { table_id: String, message: String },
}

impl SourceError {
    pub fn fetch(table_id: &str, message: impl Into<String>) -> Self {
        Self::Fetch {
            table_id: table_id.to_owned(),
            message: message.into(),
        }
    }

    pub fn format(table_id: &str, message: impl Into<String>) -> Self {
        Self::Format {
            table_id: table_id.to_owned(),
            message: message.into(),
        }
    }

    pub fn schema(table_id: &str, message: impl Into<String>) -> Self {
        Self::Schema {
            table_id: table_id.to_owned(),
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::Format { .. } => "format",
            Self::Schema { .. } => "schema",
        }
    }

    pub fn table_id(&self) -> &str {
        match self {
            Self::Fetch { table_id, .. }
            | Self::Format { table_id, .. }
            | Self::Schema { table_id, .. } => table_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("row {row} has {cells} cells but the table has {columns} columns")]
pub struct RowWidthError {
    pub row: usize,
    pub cells: usize,
    pub columns: usize,
}

#[cfg(test)]
mod tests {
    use super::{RowWidthError, SourceError};

    #[test]
    fn display_names_table_and_message() {
        let error = SourceError::format("1564470138", "no braces found");
        assert_eq!(error.kind(), "format");
        assert_eq!(error.table_id(), "1564470138");
        assert_eq!(
            error.to_string(),
            "no JSON payload in response for table 1564470138: no braces found"
        );
    }

    #[test]
    fn row_width_error_reports_counts() {
        let error = RowWidthError {
            row: 4,
            cells: 10,
            columns: 9,
        };
        assert_eq!(
            error.to_string(),
            "row 4 has 10 cells but the table has 9 columns"
        );
    }
}
