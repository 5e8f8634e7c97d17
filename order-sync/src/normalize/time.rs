//! 时间工具函数: source timestamps → canonical instant + business date
//!
//! Marketplace timestamps are RFC 3339. POS exports use an ISO-8601 variant
//! with a colon-less offset (`2024-03-15T17:30:00.000+0000`) and compact
//! business dates (`20240315`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde_json::Value;

/// Offset formats tried after RFC 3339
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Naive formats, interpreted as UTC
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a source timestamp string into a UTC instant
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) && raw.len() >= 12 {
        return raw.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis);
    }
    None
}

/// Parse a JSON timestamp value: string or epoch milliseconds
pub fn parse_instant_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_instant(s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Instant → (business date, minute-resolution local time) in `tz`
pub fn to_business(instant: DateTime<Utc>, tz: Tz) -> (NaiveDate, NaiveTime) {
    let local = instant.with_timezone(&tz);
    let time = local
        .time()
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or_else(|| local.time());
    (local.date_naive(), time)
}

/// 解析营业日 (`20240315` / `2024-03-15`)
pub fn parse_business_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Business date as the POS API expects it (`YYYYMMDD`)
pub fn format_business_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// 当前营业日 (业务时区)
pub fn current_business_date(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}
