// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Timestamps are milliseconds on the local wall clock: a value of zero is
//! 1970-01-01 00:00 local time. Every date that reaches classification and
//! sorting goes through this representation; unparseable input yields `None`.

use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::{datetime, format_description};
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::model::{CellValue, DateLiteral};

pub const MS_PER_DAY: i64 = 86_400_000;

const WALL_EPOCH: PrimitiveDateTime = datetime!(1970-01-01 0:00);
const SERIAL_EPOCH: PrimitiveDateTime = datetime!(1899-12-30 0:00);
const MAX_SERIAL_DAYS: f64 = 3_000_000.0;

const DATE_TIME_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
    format_description!(
        "[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period]"
    ),
    format_description!(
        "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute] [period]"
    ),
    format_description!(
        "[month padding:none]/[day padding:none]/[year] [hour padding:none]:[minute]:[second]"
    ),
    format_description!("[month padding:none]/[day padding:none]/[year] [hour padding:none]:[minute]"),
];

const DATE_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]"),
    format_description!("[month padding:none]/[day padding:none]/[year]"),
    format_description!("[month repr:short] [day padding:none], [year]"),
    format_description!("[month repr:long] [day padding:none], [year]"),
    format_description!("[day padding:none] [month repr:short] [year]"),
];

pub fn to_millis(value: PrimitiveDateTime) -> i64 {
    let millis = (value - WALL_EPOCH).whole_milliseconds();
    i64::try_from(millis).unwrap_or(if millis < 0 { i64::MIN } else { i64::MAX })
}

pub fn from_millis(millis: i64) -> Option<PrimitiveDateTime> {
    WALL_EPOCH.checked_add(Duration::milliseconds(millis))
}

pub fn local_now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    PrimitiveDateTime::new(now.date(), now.time())
}

pub fn midnight(value: PrimitiveDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(value.date(), Time::MIDNIGHT)
}

pub fn today_millis(now: PrimitiveDateTime) -> i64 {
    to_millis(midnight(now))
}

/// Whole days from `today` to `due`, rounded toward negative infinity.
pub fn days_away(due: i64, today: i64) -> i64 {
    due.saturating_sub(today).div_euclid(MS_PER_DAY)
}

pub fn serial_to_millis(serial_days: f64) -> Option<i64> {
    if !serial_days.is_finite() || serial_days.abs() > MAX_SERIAL_DAYS {
        return None;
    }
    let offset = (serial_days * MS_PER_DAY as f64).trunc() as i64;
    let millis = to_millis(SERIAL_EPOCH).checked_add(offset)?;
    from_millis(millis).map(|_| millis)
}

/// Month and day overflow roll forward, so `Date(2026,1,30)` is March 2.
pub fn literal_to_millis(literal: &DateLiteral) -> Option<i64> {
    let year = literal.year.checked_add(literal.month.div_euclid(12))?;
    let month = Month::try_from(u8::try_from(literal.month.rem_euclid(12) + 1).ok()?).ok()?;
    let first = Date::from_calendar_date(i32::try_from(year).ok()?, month, 1).ok()?;

    let seconds = literal
        .day
        .checked_sub(1)?
        .checked_mul(86_400)?
        .checked_add(literal.hour.checked_mul(3_600)?)?
        .checked_add(literal.minute.checked_mul(60)?)?
        .checked_add(literal.second)?;
    let value = first.midnight().checked_add(Duration::seconds(seconds))?;
    Some(to_millis(value))
}

pub fn parse_text_date(text: &str) -> Option<i64> {
    parse_wall_clock(text.trim()).map(to_millis)
}

fn parse_wall_clock(text: &str) -> Option<PrimitiveDateTime> {
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = OffsetDateTime::parse(text, &Rfc3339) {
        let local = parsed.to_offset(UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC));
        return Some(PrimitiveDateTime::new(local.date(), local.time()));
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = PrimitiveDateTime::parse(text, format) {
            return Some(parsed);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(parsed) = Date::parse(text, format) {
            return Some(parsed.midnight());
        }
    }

    None
}

pub fn cell_millis(cell: &CellValue) -> Option<i64> {
    match cell {
        CellValue::Empty => None,
        CellValue::Number(serial) => serial_to_millis(*serial),
        CellValue::DateLiteral(literal) => literal_to_millis(literal),
        CellValue::Text(text) => parse_text_date(text),
    }
}

pub fn format_date(millis: i64) -> String {
    from_millis(millis)
        .and_then(|value| {
            value
                .date()
                .format(format_description!(
                    "[month padding:none]/[day padding:none]/[year]"
                ))
                .ok()
        })
        .unwrap_or_default()
}

pub fn format_date_time(millis: i64) -> String {
    from_millis(millis)
        .and_then(|value| format_wall_clock(value).ok())
        .unwrap_or_default()
}

pub fn format_wall_clock(value: PrimitiveDateTime) -> Result<String, time::error::Format> {
    value.format(format_description!(
        "[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period]"
    ))
}
