// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::dates::{cell_millis, days_away};
use crate::model::{CellValue, Row, normalize};
use crate::roles::ResolvedRoles;

pub const UNKNOWN_STATUS_RANK: u8 = 5;
pub const UNKNOWN_PRIORITY_RANK: u8 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Open,
    Hold,
    Done,
    Other(String),
}

impl Status {
    pub fn parse(value: &str) -> Self {
        match normalize(value).as_str() {
            "OPEN" => Self::Open,
            "HOLD" => Self::Hold,
            "DONE" => Self::Done,
            other => Self::Other(other.to_owned()),
        }
    }

    pub const fn rank(&self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Hold => 1,
            Self::Done => 9,
            Self::Other(_) => UNKNOWN_STATUS_RANK,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Open => "OPEN",
            Self::Hold => "HOLD",
            Self::Done => "DONE",
            Self::Other(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Hot,
    Normal,
    Low,
    Other,
}

impl Priority {
    pub fn parse(value: &str) -> Self {
        match normalize(value).as_str() {
            "HOT" => Self::Hot,
            "NORMAL" => Self::Normal,
            "LOW" => Self::Low,
            _ => Self::Other,
        }
    }

    pub const fn rank(self) -> u8 {
        match self {
            Self::Hot => 0,
            Self::Normal => 1,
            Self::Low => 2,
            Self::Other => UNKNOWN_PRIORITY_RANK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Urgency {
    Clear,
    Yellow,
    Red,
}

impl Urgency {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

/// Day thresholds for due-date colouring. Overdue dates have negative
/// `days_away` and always fall in the red band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrgencyWindow {
    pub red_days: i64,
    pub yellow_days: i64,
}

impl Default for UrgencyWindow {
    fn default() -> Self {
        Self::WEEK
    }
}

impl UrgencyWindow {
    pub const WEEK: Self = Self {
        red_days: 7,
        yellow_days: 10,
    };

    pub const DUE_TODAY: Self = Self {
        red_days: 0,
        yellow_days: 11,
    };

    pub const fn new(red_days: i64, yellow_days: i64) -> Self {
        Self {
            red_days,
            yellow_days,
        }
    }

    pub const fn classify(&self, days_away: i64) -> Urgency {
        if days_away <= self.red_days {
            Urgency::Red
        } else if days_away <= self.yellow_days {
            Urgency::Yellow
        } else {
            Urgency::Clear
        }
    }

    pub fn classify_due(&self, due: Option<i64>, today: i64) -> Urgency {
        due.map_or(Urgency::Clear, |due| self.classify(days_away(due, today)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowClass {
    pub status: Option<Status>,
    pub status_rank: u8,
    pub priority_rank: u8,
    pub is_hot: bool,
    pub is_hold: bool,
    pub is_sample: bool,
    pub due: Option<i64>,
    pub urgency: Urgency,
    pub timestamp: Option<i64>,
}

pub fn classify_row(
    row: &Row,
    roles: &ResolvedRoles,
    window: &UrgencyWindow,
    today: i64,
) -> RowClass {
    let cell = move |index: Option<usize>| index.map(|index| row.cell(index));

    let status = cell(roles.status).map(|value| Status::parse(&value.raw_text()));
    let priority = cell(roles.priority).map(|value| Priority::parse(&value.raw_text()));
    let is_sample = cell(roles.samples).is_some_and(|value| value.normalized() == "YES");
    let due = cell(roles.needed_by).and_then(cell_millis);
    let timestamp = cell(roles.timestamp).and_then(cell_millis);

    RowClass {
        status_rank: status.as_ref().map_or(UNKNOWN_STATUS_RANK, Status::rank),
        is_hold: status == Some(Status::Hold),
        status,
        priority_rank: priority.map_or(UNKNOWN_PRIORITY_RANK, Priority::rank),
        is_hot: priority == Some(Priority::Hot),
        is_sample,
        urgency: if roles.needed_by.is_some() {
            window.classify_due(due, today)
        } else {
            Urgency::Clear
        },
        due,
        timestamp,
    }
}

pub fn status_value(row: &Row, roles: &ResolvedRoles) -> Option<String> {
    roles
        .status
        .map(|index| row.cell(index))
        .map(CellValue::normalized)
}
