// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::dates::{cell_millis, format_date, format_date_time};
use crate::model::{CellValue, normalize};
use crate::roles::RoleLabels;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormat {
    DateOnly,
    DateTime,
    Raw,
}

impl ColumnFormat {
    /// The due-date column is date-only even when its label also mentions a
    /// date or time.
    pub fn for_label(label: &str, roles: &RoleLabels) -> Self {
        let label = normalize(label);
        let due_label = normalize(&roles.needed_by);
        if !due_label.is_empty() && label.contains(&due_label) {
            Self::DateOnly
        } else if label.contains("TIME") || label.contains("DATE") {
            Self::DateTime
        } else {
            Self::Raw
        }
    }
}

pub fn format_cell(value: &CellValue, format: ColumnFormat) -> String {
    match format {
        ColumnFormat::Raw => value.raw_text(),
        ColumnFormat::DateOnly => cell_millis(value).map(format_date).unwrap_or_default(),
        ColumnFormat::DateTime => cell_millis(value).map(format_date_time).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnFormat, format_cell};
    use crate::model::CellValue;
    use crate::roles::RoleLabels;

    fn format_for(label: &str) -> ColumnFormat {
        ColumnFormat::for_label(label, &RoleLabels::default())
    }

    #[test]
    fn labels_pick_a_format() {
        assert_eq!(format_for("Needed By"), ColumnFormat::DateOnly);
        assert_eq!(format_for("needed by date"), ColumnFormat::DateOnly);
        assert_eq!(format_for("Timestamp"), ColumnFormat::DateTime);
        assert_eq!(format_for("Ship Date"), ColumnFormat::DateTime);
        assert_eq!(format_for("Customer"), ColumnFormat::Raw);
    }

    #[test]
    fn due_column_drops_time_of_day() {
        let value = CellValue::from_text("Date(2026,9,14,15,30,0)");
        assert_eq!(format_cell(&value, ColumnFormat::DateOnly), "10/14/2026");
        assert_eq!(
            format_cell(&value, ColumnFormat::DateTime),
            "10/14/2026, 3:30:00 PM"
        );
    }

    #[test]
    fn serial_and_literal_render_the_same_day() {
        let serial = CellValue::Number(46_309.0);
        let literal = CellValue::from_text("Date(2026,9,14)");
        assert_eq!(
            format_cell(&serial, ColumnFormat::DateOnly),
            format_cell(&literal, ColumnFormat::DateOnly)
        );
    }

    #[test]
    fn raw_columns_keep_the_value_unmodified() {
        let literal = CellValue::from_text("Date(2026,9,14)");
        assert_eq!(format_cell(&literal, ColumnFormat::Raw), "Date(2026,9,14)");
        assert_eq!(
            format_cell(&CellValue::Text(" Acme ".to_owned()), ColumnFormat::Raw),
            " Acme "
        );
        assert_eq!(format_cell(&CellValue::Number(12.0), ColumnFormat::Raw), "12");
    }

    #[test]
    fn unparseable_dates_render_blank() {
        let value = CellValue::Text("ASAP".to_owned());
        assert_eq!(format_cell(&value, ColumnFormat::DateOnly), "");
        assert_eq!(format_cell(&CellValue::Empty, ColumnFormat::DateTime), "");
    }
}
