use serde::Deserialize;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_HORIZON_DAYS: u32 = 30;
pub const DEFAULT_LIMIT: usize = 50;
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;
/// Upper bound for any day-count parameter (about a century).
pub const MAX_DAYS: u32 = 36_500;

// Raw query string values. Kept as strings so a malformed number never
// rejects the request at extraction time.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub window: Option<String>,
    pub horizon: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportParams {
    pub window_days: u32,
    pub horizon_days: u32,
    pub limit: usize,
}

impl Default for ReportParams {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            horizon_days: DEFAULT_HORIZON_DAYS,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl From<&ReportQuery> for ReportParams {
    fn from(query: &ReportQuery) -> Self {
        Self {
            window_days: day_count_or(query.window.as_deref(), DEFAULT_WINDOW_DAYS),
            horizon_days: day_count_or(query.horizon.as_deref(), DEFAULT_HORIZON_DAYS),
            limit: positive_or(query.limit.as_deref(), DEFAULT_LIMIT as u32) as usize,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub days: Option<String>,
    pub limit: Option<String>,
    pub threshold: Option<String>,
}

impl ChartQuery {
    /// Trailing window in days, or `None` for all history.
    pub fn days(&self) -> Option<u32> {
        self.days
            .as_deref()
            .and_then(parse_int)
            .map(|d| d.clamp(1, i64::from(MAX_DAYS)) as u32)
    }

    pub fn limit(&self) -> i64 {
        i64::from(positive_or(self.limit.as_deref(), DEFAULT_LIMIT as u32))
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
            .as_deref()
            .and_then(parse_int)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD)
    }
}

/// Parses an integer, clamping to at least 1. Anything unparseable yields
/// `default` instead of an error.
pub fn positive_or(raw: Option<&str>, default: u32) -> u32 {
    match raw.and_then(parse_int) {
        Some(v) => v.clamp(1, i64::from(u32::MAX)) as u32,
        None => default,
    }
}

/// Like [`positive_or`], but also capped at [`MAX_DAYS`].
pub fn day_count_or(raw: Option<&str>, default: u32) -> u32 {
    positive_or(raw, default).min(MAX_DAYS)
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(window: Option<&str>, horizon: Option<&str>, limit: Option<&str>) -> ReportQuery {
        ReportQuery {
            window: window.map(String::from),
            horizon: horizon.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn missing_values_use_defaults() {
        assert_eq!(ReportParams::from(&ReportQuery::default()), ReportParams::default());
    }

    #[test]
    fn garbage_falls_back_silently() {
        let params = ReportParams::from(&query(Some("abc"), Some("1.5"), Some("")));
        assert_eq!(params, ReportParams::default());
    }

    #[test]
    fn non_positive_values_clamp_to_one() {
        let params = ReportParams::from(&query(Some("0"), Some("-12"), Some("-1")));
        assert_eq!(params.window_days, 1);
        assert_eq!(params.horizon_days, 1);
        assert_eq!(params.limit, 1);
    }

    #[test]
    fn valid_values_pass_through() {
        let params = ReportParams::from(&query(Some(" 14 "), Some("60"), Some("5")));
        assert_eq!(params.window_days, 14);
        assert_eq!(params.horizon_days, 60);
        assert_eq!(params.limit, 5);
    }

    #[test]
    fn huge_day_counts_are_capped() {
        let params = ReportParams::from(&query(Some("999999999"), Some("99999999999"), Some("999999999")));
        assert_eq!(params.window_days, MAX_DAYS);
        assert_eq!(params.horizon_days, MAX_DAYS);
        // limit is not a day count
        assert_eq!(params.limit, 999_999_999);
    }

    #[test]
    fn chart_days_saturate_instead_of_wrapping() {
        let q = ChartQuery {
            days: Some("4294967297".into()),
            ..Default::default()
        };
        assert_eq!(q.days(), Some(MAX_DAYS));

        let q = ChartQuery {
            days: Some("-40".into()),
            ..Default::default()
        };
        assert_eq!(q.days(), Some(1));
    }

    #[test]
    fn chart_query_defaults() {
        let q = ChartQuery::default();
        assert_eq!(q.days(), None);
        assert_eq!(q.limit(), 50);
        assert_eq!(q.threshold(), 5);

        let q = ChartQuery {
            days: Some("0".into()),
            limit: Some("x".into()),
            threshold: Some("0".into()),
        };
        assert_eq!(q.days(), Some(1));
        assert_eq!(q.limit(), 50);
        assert_eq!(q.threshold(), 0);
    }
}
