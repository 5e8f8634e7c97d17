use chrono::{DateTime, Utc};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current instant, truncated to millisecond precision
///
/// Postgres `TIMESTAMPTZ` keeps microseconds; truncating here keeps the value a
/// caller holds identical to the one read back from either store.
pub fn now_utc() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(now_millis()).unwrap_or_else(Utc::now)
}
