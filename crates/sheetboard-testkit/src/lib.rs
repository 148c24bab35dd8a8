// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use sheetboard_app::{CellValue, Column, SourceError, Table, TableSource, ViewConfig};
use time::macros::datetime;
use time::{Duration, PrimitiveDateTime};

pub const PARTS_TABLE_ID: &str = "0";
pub const NOTES_TABLE_ID: &str = "1847360211";

pub const PARTS_COLUMNS: [&str; 8] = [
    "Timestamp",
    "Job",
    "Customer",
    "Part",
    "Samples",
    "Priority",
    "Status",
    "Needed By",
];

pub const NOTES_COLUMNS: [&str; 4] = ["Timestamp", "Author", "Job", "Note"];

const CUSTOMERS: [&str; 12] = [
    "Acme Fabrication",
    "Birchwood Marine",
    "Cobalt Aero",
    "Delta Pumps",
    "Evergreen Tooling",
    "Foster Robotics",
    "Granite Medical",
    "Harbor Hydraulics",
    "Ironside Rail",
    "Juniper Motors",
    "Keystone Valve",
    "Lakeshore Optics",
];

const PARTS: [&str; 14] = [
    "bracket",
    "bushing",
    "flange",
    "gear blank",
    "housing",
    "manifold",
    "mounting plate",
    "shaft",
    "spacer",
    "sprocket",
    "standoff",
    "valve body",
    "weld fixture",
    "yoke",
];

const MATERIALS: [&str; 6] = ["6061", "7075", "304 SS", "A36", "Delrin", "brass"];

const PRIORITIES: [&str; 4] = ["HOT", "NORMAL", "NORMAL", "LOW"];
const STATUSES: [&str; 5] = ["OPEN", "OPEN", "OPEN", "HOLD", "DONE"];

const AUTHORS: [&str; 10] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Quinn", "Parker", "Rowan", "Kai",
];

const NOTE_WORDS: [&str; 24] = [
    "deburr",
    "inspect",
    "rework",
    "anodize",
    "tap",
    "ream",
    "first",
    "article",
    "fixture",
    "ready",
    "waiting",
    "on",
    "material",
    "customer",
    "approval",
    "shipped",
    "tolerance",
    "checked",
    "setup",
    "moved",
    "to",
    "second",
    "shift",
    "tomorrow",
];

struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, percent: usize) -> bool {
        self.int_n(100) < percent
    }
}

/// How a generated due date is encoded in its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueEncoding {
    Literal,
    Serial,
    Text,
    Unparseable,
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartsRequest {
    pub submitted: PrimitiveDateTime,
    pub job: String,
    pub customer: String,
    pub part: String,
    pub samples: bool,
    pub priority: String,
    pub status: String,
    pub due_in_days: i64,
    pub due_encoding: DueEncoding,
}

impl PartsRequest {
    pub fn cells(&self, today: PrimitiveDateTime) -> Vec<CellValue> {
        let due = today.date().midnight() + Duration::days(self.due_in_days);
        let needed_by = match self.due_encoding {
            DueEncoding::Literal => date_literal(due),
            DueEncoding::Serial => CellValue::Number(day_serial(due)),
            DueEncoding::Text => CellValue::Text(format!(
                "{}/{}/{}",
                u8::from(due.month()),
                due.day(),
                due.year()
            )),
            DueEncoding::Unparseable => CellValue::Text("ASAP".to_owned()),
            DueEncoding::Blank => CellValue::Empty,
        };

        vec![
            date_literal(self.submitted),
            CellValue::Text(self.job.clone()),
            CellValue::Text(self.customer.clone()),
            CellValue::Text(self.part.clone()),
            CellValue::Text(if self.samples { "YES" } else { "no" }.to_owned()),
            CellValue::Text(self.priority.clone()),
            CellValue::Text(self.status.clone()),
            needed_by,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShopNote {
    pub submitted: PrimitiveDateTime,
    pub author: String,
    pub job: String,
    pub note: String,
}

impl ShopNote {
    pub fn cells(&self) -> Vec<CellValue> {
        vec![
            date_literal(self.submitted),
            CellValue::Text(self.author.clone()),
            CellValue::Text(self.job.clone()),
            CellValue::Text(self.note.clone()),
        ]
    }
}

pub struct BoardFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl BoardFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn parts_request(&mut self, today: PrimitiveDateTime) -> PartsRequest {
        let due_encoding = match self.rng.int_n(20) {
            0 => DueEncoding::Unparseable,
            1 | 2 => DueEncoding::Blank,
            3..=6 => DueEncoding::Serial,
            7 | 8 => DueEncoding::Text,
            _ => DueEncoding::Literal,
        };
        PartsRequest {
            submitted: self.submitted_before(today, 21),
            job: self.job_number(),
            customer: self.pick(&CUSTOMERS).to_owned(),
            part: format!("{} {}", self.pick(&MATERIALS), self.pick(&PARTS)),
            samples: self.rng.chance(25),
            priority: self.pick(&PRIORITIES).to_owned(),
            status: self.pick(&STATUSES).to_owned(),
            due_in_days: self.int_range(-3, 21),
            due_encoding,
        }
    }

    pub fn shop_note(&mut self, today: PrimitiveDateTime) -> ShopNote {
        ShopNote {
            submitted: self.submitted_before(today, 3),
            author: self.pick(&AUTHORS).to_owned(),
            job: self.job_number(),
            note: self.sentence(3, 9),
        }
    }

    pub fn parts_table(&mut self, count: usize, today: PrimitiveDateTime) -> Result<Table> {
        let rows = (0..count)
            .map(|_| self.parts_request(today).cells(today))
            .collect();
        Table::new(columns(&PARTS_COLUMNS), rows).context("build parts table")
    }

    pub fn notes_table(&mut self, count: usize, today: PrimitiveDateTime) -> Result<Table> {
        let rows = (0..count).map(|_| self.shop_note(today).cells()).collect();
        Table::new(columns(&NOTES_COLUMNS), rows).context("build notes table")
    }

    fn job_number(&mut self) -> String {
        format!("J-{}", 24_000 + self.rng.int_n(900))
    }

    fn submitted_before(&mut self, today: PrimitiveDateTime, max_days: i64) -> PrimitiveDateTime {
        let minutes = self.int_range(0, max_days * 24 * 60);
        today - Duration::minutes(minutes)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn sentence(&mut self, min_words: usize, max_words: usize) -> String {
        let count = self.int_range(min_words as i64, max_words as i64) as usize;
        let mut sentence = (0..count)
            .map(|_| self.pick(&NOTE_WORDS))
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence.push('.');
        sentence
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    Parts,
    Notes,
}

/// In-memory [`TableSource`]. Every fetch generates a fresh table from the
/// next seed so repeated refreshes change the board.
pub struct FixtureSource {
    faker: Mutex<BoardFaker>,
    today: PrimitiveDateTime,
    tables: BTreeMap<String, (FixtureKind, usize)>,
    failures: BTreeMap<String, SourceError>,
}

impl FixtureSource {
    pub fn new(seed: u64, today: PrimitiveDateTime) -> Self {
        Self {
            faker: Mutex::new(BoardFaker::new(seed)),
            today,
            tables: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }

    /// The two tables behind [`demo_views`].
    pub fn demo(seed: u64, today: PrimitiveDateTime) -> Self {
        Self::new(seed, today)
            .with_table(PARTS_TABLE_ID, FixtureKind::Parts, 24)
            .with_table(NOTES_TABLE_ID, FixtureKind::Notes, 40)
    }

    pub fn with_table(mut self, table_id: &str, kind: FixtureKind, rows: usize) -> Self {
        self.tables.insert(table_id.to_owned(), (kind, rows));
        self
    }

    pub fn with_failure(mut self, error: SourceError) -> Self {
        self.failures.insert(error.table_id().to_owned(), error);
        self
    }
}

impl TableSource for FixtureSource {
    fn fetch_table(&self, table_id: &str) -> Result<Table, SourceError> {
        if let Some(error) = self.failures.get(table_id) {
            return Err(error.clone());
        }
        let (kind, rows) = self
            .tables
            .get(table_id)
            .copied()
            .ok_or_else(|| SourceError::fetch(table_id, "no fixture registered"))?;
        let mut faker = self
            .faker
            .lock()
            .map_err(|_| SourceError::fetch(table_id, "fixture faker lock poisoned"))?;
        let table = match kind {
            FixtureKind::Parts => faker.parts_table(rows, self.today),
            FixtureKind::Notes => faker.notes_table(rows, self.today),
        };
        table.map_err(|error| SourceError::schema(table_id, format!("{error:#}")))
    }
}

pub fn demo_views() -> Vec<ViewConfig> {
    vec![
        ViewConfig::action_items("New Parts", PARTS_TABLE_ID),
        ViewConfig::feed("Live Notes", NOTES_TABLE_ID),
    ]
}

pub fn reference_today() -> PrimitiveDateTime {
    datetime!(2026-10-14 9:30)
}

pub fn columns(labels: &[&str]) -> Vec<Column> {
    labels.iter().map(|label| Column::new(*label)).collect()
}

pub fn date_literal(value: PrimitiveDateTime) -> CellValue {
    CellValue::from_text(&format!(
        "Date({},{},{},{},{},{})",
        value.year(),
        u8::from(value.month()) - 1,
        value.day(),
        value.hour(),
        value.minute(),
        value.second()
    ))
}

pub fn day_serial(value: PrimitiveDateTime) -> f64 {
    let elapsed = value - datetime!(1899-12-30 0:00);
    elapsed.as_seconds_f64() / 86_400.0
}

/// A gviz JSON body for `table`, wrapped the way the export endpoint wraps
/// it.
pub fn gviz_body(table: &Table) -> String {
    let cols = table
        .columns()
        .iter()
        .map(|column| json!({ "id": "", "label": column.label, "type": "string" }))
        .collect::<Vec<_>>();
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            let cells = row.cells().iter().map(gviz_cell).collect::<Vec<_>>();
            json!({ "c": cells })
        })
        .collect::<Vec<_>>();
    wrap_payload(&json!({
        "version": "0.6",
        "reqId": "0",
        "status": "ok",
        "table": { "cols": cols, "rows": rows },
    }))
}

pub fn gviz_error_body(message: &str) -> String {
    wrap_payload(&json!({
        "version": "0.6",
        "reqId": "0",
        "status": "error",
        "errors": [{ "reason": "access_denied", "message": message }],
    }))
}

pub fn wrap_payload(payload: &Value) -> String {
    format!("/*O_o*/\ngoogle.visualization.Query.setResponse({payload});")
}

fn gviz_cell(cell: &CellValue) -> Value {
    match cell {
        CellValue::Empty => Value::Null,
        CellValue::Number(value) => json!({ "v": value }),
        CellValue::DateLiteral(literal) => json!({ "v": literal.raw }),
        CellValue::Text(value) => json!({ "v": value }),
    }
}
