//! 게시 시각 표시 형식 변환.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// 출력 형식 (예: `01 Jan 2024 07:00:00`).
pub const DISPLAY_FORMAT: &str = "%d %b %Y %H:%M:%S";

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// ISO-8601 시각 문자열을 표시 타임존 기준 문자열로 변환합니다.
///
/// - 끝의 `Z`는 `+00:00`으로 취급
/// - 오프셋 없는 시각과 날짜만 있는 값은 UTC로 간주
/// - 해석할 수 없는 입력은 그대로 반환
pub fn to_display_time(raw: &str, tz: Tz) -> String {
    match parse_instant(raw) {
        Some(instant) => instant.with_timezone(&tz).format(DISPLAY_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = match trimmed.strip_suffix('Z') {
        Some(head) => format!("{}+00:00", head),
        None => trimmed.to_string(),
    };

    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S%.f%:z")
    {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
