use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How purchase dates are bucketed into drawing periods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodGranularity {
    /// Calendar month, keyed `YYYY-MM`.
    #[default]
    Month,
    /// ISO week, keyed `YYYY-Www`.
    Week,
}

impl FromStr for PeriodGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" | "monthly" => Ok(PeriodGranularity::Month),
            "week" | "weekly" => Ok(PeriodGranularity::Week),
            other => Err(format!("unknown period granularity: {}", other)),
        }
    }
}

/// Parses the timestamp formats the storage layer hands out.
///
/// Accepts RFC 3339, SQLite's `YYYY-MM-DD HH:MM:SS`, the same with a `T`
/// separator, and a bare `YYYY-MM-DD`. Offset-less values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn period_key(timestamp: &DateTime<Utc>, granularity: PeriodGranularity) -> String {
    match granularity {
        PeriodGranularity::Month => format!("{:04}-{:02}", timestamp.year(), timestamp.month()),
        PeriodGranularity::Week => {
            let week = timestamp.iso_week();
            format!("{:04}-W{:02}", week.year(), week.week())
        }
    }
}

/// The period a ticket belongs to, derived from its purchase date alone.
///
/// `None` when the date is missing or unreadable; such tickets are pending.
pub fn resolve_period(purchase_date: Option<&str>, granularity: PeriodGranularity) -> Option<String> {
    purchase_date
        .and_then(parse_timestamp)
        .map(|ts| period_key(&ts, granularity))
}

pub fn is_valid_period_key(key: &str, granularity: PeriodGranularity) -> bool {
    match granularity {
        PeriodGranularity::Month => NaiveDate::parse_from_str(&format!("{}-01", key), "%Y-%m-%d")
            .map(|date| format!("{:04}-{:02}", date.year(), date.month()) == key)
            .unwrap_or(false),
        PeriodGranularity::Week => {
            let Some((year, week)) = key.split_once("-W") else {
                return false;
            };
            match (year.parse::<i32>(), week.parse::<u32>()) {
                (Ok(y), Ok(w)) => {
                    NaiveDate::from_isoywd_opt(y, w, Weekday::Mon).is_some()
                        && format!("{:04}-W{:02}", y, w) == key
                }
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_key_from_rfc3339() {
        assert_eq!(
            resolve_period(Some("2025-01-15T10:30:00Z"), PeriodGranularity::Month),
            Some("2025-01".to_string())
        );
        assert_eq!(
            resolve_period(Some("2024-12-31T23:59:59.999Z"), PeriodGranularity::Month),
            Some("2024-12".to_string())
        );
    }

    #[test]
    fn test_offset_is_normalised_to_utc() {
        // 2025-02-01 01:00 in UTC+02:00 is still January in UTC.
        assert_eq!(
            resolve_period(Some("2025-02-01T01:00:00+02:00"), PeriodGranularity::Month),
            Some("2025-01".to_string())
        );
    }

    #[test]
    fn test_sqlite_and_date_only_formats() {
        assert_eq!(
            resolve_period(Some("2025-03-04 12:00:00"), PeriodGranularity::Month),
            Some("2025-03".to_string())
        );
        assert_eq!(
            resolve_period(Some("2025-03-04"), PeriodGranularity::Month),
            Some("2025-03".to_string())
        );
    }

    #[test]
    fn test_missing_or_garbage_dates_are_unresolved() {
        assert_eq!(resolve_period(None, PeriodGranularity::Month), None);
        assert_eq!(resolve_period(Some(""), PeriodGranularity::Month), None);
        assert_eq!(resolve_period(Some("yesterday"), PeriodGranularity::Month), None);
        assert_eq!(resolve_period(Some("2025-13-01"), PeriodGranularity::Month), None);
    }

    #[test]
    fn test_week_key_uses_iso_year() {
        // 2024-12-30 is in ISO week 1 of 2025.
        assert_eq!(
            resolve_period(Some("2024-12-30T00:00:00Z"), PeriodGranularity::Week),
            Some("2025-W01".to_string())
        );
        assert_eq!(
            resolve_period(Some("2025-01-15"), PeriodGranularity::Week),
            Some("2025-W03".to_string())
        );
    }

    #[test]
    fn test_period_key_validation() {
        assert!(is_valid_period_key("2025-01", PeriodGranularity::Month));
        assert!(!is_valid_period_key("2025-1", PeriodGranularity::Month));
        assert!(!is_valid_period_key("2025-13", PeriodGranularity::Month));
        assert!(!is_valid_period_key("January", PeriodGranularity::Month));
        assert!(is_valid_period_key("2025-W03", PeriodGranularity::Week));
        assert!(!is_valid_period_key("2025-W3", PeriodGranularity::Week));
        assert!(!is_valid_period_key("2025-W54", PeriodGranularity::Week));
        assert!(!is_valid_period_key("2025-01", PeriodGranularity::Week));
    }

    #[test]
    fn test_granularity_parsing() {
        assert_eq!("Monthly".parse::<PeriodGranularity>(), Ok(PeriodGranularity::Month));
        assert_eq!("week".parse::<PeriodGranularity>(), Ok(PeriodGranularity::Week));
        assert!("daily".parse::<PeriodGranularity>().is_err());
    }
}
