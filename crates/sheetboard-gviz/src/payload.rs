// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Deserialize;
use serde_json::Value;
use sheetboard_app::{CellValue, Column, SourceError, Table};

pub const SHARING_HINT: &str = "check that the sheet is shared as \"Anyone with link = Viewer\"";

/// The text between the first `{` and the last `}`, inclusive. The export
/// endpoint wraps its JSON in a comment and a callback.
pub fn extract_envelope(body: &str) -> Option<&str> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| &body[start..=end])
}

pub fn parse_response(table_id: &str, body: &str) -> Result<Table, SourceError> {
    let envelope = extract_envelope(body)
        .ok_or_else(|| SourceError::format(table_id, "response body holds no {...} object"))?;
    let payload: Value = serde_json::from_str(envelope)
        .map_err(|error| SourceError::format(table_id, format!("payload is not JSON: {error}")))?;
    if !payload.is_object() {
        return Err(SourceError::schema(table_id, "payload is not an object"));
    }

    let table = match payload.get("table") {
        Some(table) if !table.is_null() => table,
        _ => return Err(missing_table(table_id, &payload)),
    };

    let raw = RawTable::deserialize(table)
        .map_err(|error| SourceError::schema(table_id, format!("malformed table: {error}")))?;
    decode_table(table_id, raw)
}

fn missing_table(table_id: &str, payload: &Value) -> SourceError {
    let Ok(envelope) = ErrorEnvelope::deserialize(payload) else {
        return SourceError::schema(table_id, "payload has no `table` key");
    };
    if envelope.status.as_deref() != Some("error") {
        return SourceError::schema(table_id, "payload has no `table` key");
    }
    let message = envelope
        .errors
        .into_iter()
        .find_map(|error| {
            error
                .detailed_message
                .filter(|message| !message.is_empty())
                .or(error.message.filter(|message| !message.is_empty()))
        })
        .unwrap_or_else(|| "query failed".to_owned());
    SourceError::schema(table_id, format!("{message}; {SHARING_HINT}"))
}

fn decode_table(table_id: &str, raw: RawTable) -> Result<Table, SourceError> {
    let columns = raw
        .cols
        .into_iter()
        .map(|column| Column::new(column.label.unwrap_or_default()))
        .collect::<Vec<_>>();

    let mut rows = Vec::with_capacity(raw.rows.len());
    for (row_index, row) in raw.rows.into_iter().enumerate() {
        let cells = row
            .c
            .into_iter()
            .enumerate()
            .map(|(cell_index, cell)| {
                decode_cell(cell.and_then(|cell| cell.v)).ok_or_else(|| {
                    SourceError::schema(
                        table_id,
                        format!("row {row_index} cell {cell_index} holds a nested value"),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(cells);
    }

    Table::new(columns, rows).map_err(|error| SourceError::schema(table_id, error.to_string()))
}

fn decode_cell(value: Option<Value>) -> Option<CellValue> {
    match value {
        None | Some(Value::Null) => Some(CellValue::Empty),
        Some(Value::Number(number)) => {
            Some(number.as_f64().map_or(CellValue::Empty, CellValue::Number))
        }
        Some(Value::String(text)) if text.is_empty() => Some(CellValue::Empty),
        Some(Value::String(text)) => Some(CellValue::from_text(&text)),
        Some(Value::Bool(flag)) => Some(CellValue::Text(flag.to_string())),
        Some(Value::Array(_) | Value::Object(_)) => None,
    }
}

#[derive(Debug, Deserialize)]
struct RawTable {
    cols: Vec<RawColumn>,
    #[serde(default)]
    rows: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    c: Vec<Option<RawCell>>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    #[serde(default)]
    v: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    status: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    detailed_message: Option<String>,
}
