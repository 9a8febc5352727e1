use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed unit label carried by every [`QueryResult`].
pub const UNIT_CENTS_PER_KWH: &str = "c/kWh";

/// Count used by `highest` / `lowest` when the caller supplies none.
pub const DEFAULT_COUNT: i64 = 5;

/// Last valid hour-of-day index.
pub const MAX_HOUR: u32 = 23;

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// One day of hourly prices (c/kWh). Index into `hourly_prices` is the hour.
///
/// Upstream does not guarantee 24 entries; `hourly_prices.len()` is
/// authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Calendar day the series is valid for.
    pub reference_day: NaiveDate,
    pub hourly_prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new(reference_day: NaiveDate, hourly_prices: Vec<f64>) -> Self {
        Self {
            reference_day,
            hourly_prices,
        }
    }

    pub fn len(&self) -> usize {
        self.hourly_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hourly_prices.is_empty()
    }
}

/// A single `(hour, price)` pair in ranked output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourValue {
    pub hour: usize,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Query mode without its parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    Highest,
    Lowest,
    Over,
    Under,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Highest => "highest",
            QueryMode::Lowest => "lowest",
            QueryMode::Over => "over",
            QueryMode::Under => "under",
        }
    }

    /// Case-insensitive parse of a user-facing mode name.
    pub fn parse(s: &str) -> Result<Self, QueryError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "highest" => Ok(QueryMode::Highest),
            "lowest" => Ok(QueryMode::Lowest),
            "over" => Ok(QueryMode::Over),
            "under" => Ok(QueryMode::Under),
            _ => Err(QueryError::UnknownMode(s.to_string())),
        }
    }

    /// `true` when the most expensive hour ranks first.
    pub fn ranks_descending(&self) -> bool {
        matches!(self, QueryMode::Highest | QueryMode::Over)
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mode together with its parameter.
///
/// `count` is kept as given; clamping to the working-set size happens at
/// evaluation time (see [`crate::clamp_count`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Query {
    Highest { count: i64 },
    Lowest { count: i64 },
    /// Hours with `value >= limit`.
    Over { limit: f64 },
    /// Hours with `value <= limit`.
    Under { limit: f64 },
}

impl Query {
    pub fn mode(&self) -> QueryMode {
        match self {
            Query::Highest { .. } => QueryMode::Highest,
            Query::Lowest { .. } => QueryMode::Lowest,
            Query::Over { .. } => QueryMode::Over,
            Query::Under { .. } => QueryMode::Under,
        }
    }

    /// Build a query from a mode and its raw, optional parameter string.
    ///
    /// - `highest` / `lowest`: missing count defaults to [`DEFAULT_COUNT`];
    ///   fractional counts are truncated toward zero.
    /// - `over` / `under`: the limit is required and must be a finite number.
    pub fn from_parts(mode: QueryMode, parameter: Option<&str>) -> Result<Self, QueryError> {
        let raw = parameter.map(str::trim).filter(|s| !s.is_empty());
        match mode {
            QueryMode::Highest | QueryMode::Lowest => {
                let count = match raw {
                    None => DEFAULT_COUNT,
                    Some(r) => parse_count(r).ok_or_else(|| QueryError::InvalidParameter {
                        mode,
                        reason: format!("count '{r}' is not an integer"),
                    })?,
                };
                Ok(if mode == QueryMode::Highest {
                    Query::Highest { count }
                } else {
                    Query::Lowest { count }
                })
            }
            QueryMode::Over | QueryMode::Under => {
                let r = raw.ok_or_else(|| QueryError::InvalidParameter {
                    mode,
                    reason: "limit is required".to_string(),
                })?;
                let limit = parse_limit(r).ok_or_else(|| QueryError::InvalidParameter {
                    mode,
                    reason: format!("limit '{r}' is not a finite number"),
                })?;
                Ok(if mode == QueryMode::Over {
                    Query::Over { limit }
                } else {
                    Query::Under { limit }
                })
            }
        }
    }
}

fn parse_count(raw: &str) -> Option<i64> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    let f = raw.parse::<f64>().ok().filter(|f| f.is_finite())?;
    Some(f.trunc() as i64)
}

fn parse_limit(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Restricts a result to a single hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourFilter {
    At(u32),
    /// Resolved to the evaluation clock's hour-of-day.
    Current,
}

impl HourFilter {
    /// Parse `"current"` or an hour `0..=23`.
    ///
    /// Anything else yields `None`, i.e. no filter.
    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim();
        if t.eq_ignore_ascii_case("current") {
            return Some(HourFilter::Current);
        }
        match t.parse::<u32>() {
            Ok(h) if h <= MAX_HOUR => Some(HourFilter::At(h)),
            _ => None,
        }
    }

    /// Concrete hour to filter on, or `None` if the literal hour is out of range.
    pub fn resolve(&self, current_hour: u32) -> Option<u32> {
        match *self {
            HourFilter::At(h) if h <= MAX_HOUR => Some(h),
            HourFilter::At(_) => None,
            HourFilter::Current => Some(current_hour),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryRequest {
    pub query: Query,
    /// `None` returns the full selection.
    pub hour_filter: Option<HourFilter>,
}

impl QueryRequest {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            hour_filter: None,
        }
    }

    pub fn with_hour_filter(mut self, filter: HourFilter) -> Self {
        self.hour_filter = Some(filter);
        self
    }

    /// Build a request from user-facing strings (CLI arguments).
    pub fn parse(
        mode: &str,
        parameter: Option<&str>,
        hour: Option<&str>,
    ) -> Result<Self, QueryError> {
        let mode = QueryMode::parse(mode)?;
        let query = Query::from_parts(mode, parameter)?;
        Ok(Self {
            query,
            hour_filter: hour.and_then(HourFilter::parse),
        })
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Ranked output of a query, serialized as `{"values":[...],"unit":"c/kWh"}`.
///
/// A failed query serializes the same shape with an extra `error` field and no
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub values: Vec<HourValue>,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    pub fn new(values: Vec<HourValue>) -> Self {
        Self {
            values,
            unit: UNIT_CENTS_PER_KWH.to_string(),
            error: None,
        }
    }

    pub fn from_error(err: &QueryError) -> Self {
        Self {
            values: Vec::new(),
            unit: UNIT_CENTS_PER_KWH.to_string(),
            error: Some(err.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Successful but empty (the hour filter excluded everything).
    pub fn is_no_match(&self) -> bool {
        !self.is_error() && self.values.is_empty()
    }

    /// Top-ranked entry.
    pub fn top(&self) -> Option<&HourValue> {
        self.values.first()
    }

    pub fn hours(&self) -> Vec<usize> {
        self.values.iter().map(|hv| hv.hour).collect()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Series missing, empty, non-finite, or stale.
    InvalidSeries(String),
    /// Mode string not one of `highest | lowest | over | under`.
    UnknownMode(String),
    InvalidParameter { mode: QueryMode, reason: String },
}

impl QueryError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidSeries(_) => "INVALID_SERIES",
            QueryError::UnknownMode(_) => "UNKNOWN_MODE",
            QueryError::InvalidParameter { .. } => "INVALID_PARAMETER",
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::InvalidSeries(msg) => write!(f, "invalid series: {msg}"),
            QueryError::UnknownMode(m) => write!(
                f,
                "unknown mode '{m}'. expected one of: highest | lowest | over | under"
            ),
            QueryError::InvalidParameter { mode, reason } => {
                write!(f, "invalid parameter for mode '{mode}': {reason}")
            }
        }
    }
}

impl std::error::Error for QueryError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
