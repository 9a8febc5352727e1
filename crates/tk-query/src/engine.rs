use std::cmp::Ordering;

use chrono::{NaiveDate, Timelike};

use crate::{Clock, HourValue, PriceSeries, Query, QueryError, QueryMode, QueryRequest, QueryResult};

// ---------------------------------------------------------------------------
// Input guards
// ---------------------------------------------------------------------------

/// Rejects empty, non-finite, or stale series.
///
/// A series dated after `today` is accepted (prices are published a day ahead).
fn validate_series(series: &PriceSeries, today: NaiveDate) -> Result<(), QueryError> {
    if series.is_empty() {
        return Err(QueryError::InvalidSeries("series is empty".to_string()));
    }
    if let Some(hour) = series.hourly_prices.iter().position(|v| !v.is_finite()) {
        return Err(QueryError::InvalidSeries(format!(
            "non-finite price at hour {hour}"
        )));
    }
    if series.reference_day < today {
        return Err(QueryError::InvalidSeries(format!(
            "series is for {} but today is {}",
            series.reference_day, today
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Ranking + selection
// ---------------------------------------------------------------------------

/// Total order used for ranking: value (direction per mode), then hour ascending.
fn compare(a: &HourValue, b: &HourValue, mode: QueryMode) -> Ordering {
    // Values are finite after validation, so partial_cmp never yields None.
    let by_value = a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal);
    let by_value = if mode.ranks_descending() {
        by_value.reverse()
    } else {
        by_value
    };
    by_value.then(a.hour.cmp(&b.hour))
}

/// Rank every hour of `prices` for `mode`.
pub fn rank(prices: &[f64], mode: QueryMode) -> Vec<HourValue> {
    let mut ranked: Vec<HourValue> = prices
        .iter()
        .enumerate()
        .map(|(hour, &value)| HourValue { hour, value })
        .collect();
    ranked.sort_by(|a, b| compare(a, b, mode));
    ranked
}

/// Clamp a requested count into `1..=len` (or 0 for an empty set).
pub fn clamp_count(count: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    if count <= 0 {
        return 1;
    }
    usize::try_from(count).map_or(len, |c| c.min(len))
}

/// Apply the selection rule of `query` to an already-ranked sequence.
///
/// For `highest` / `lowest` the count is a floor: every element tying the
/// boundary value is kept as well.
pub fn select(ranked: Vec<HourValue>, query: &Query) -> Vec<HourValue> {
    match *query {
        Query::Highest { count } | Query::Lowest { count } => take_with_ties(ranked, count),
        Query::Over { limit } => ranked.into_iter().filter(|hv| hv.value >= limit).collect(),
        Query::Under { limit } => ranked.into_iter().filter(|hv| hv.value <= limit).collect(),
    }
}

fn take_with_ties(mut ranked: Vec<HourValue>, count: i64) -> Vec<HourValue> {
    let n = clamp_count(count, ranked.len());
    if n == 0 {
        return ranked;
    }
    let boundary = ranked[n - 1].value;
    let ties = ranked[n..]
        .iter()
        .take_while(|hv| hv.value == boundary)
        .count();
    ranked.truncate(n + ties);
    ranked
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Evaluate `request` against `series`.
///
/// `clock` is read exactly once: its date drives the staleness check and its
/// hour resolves [`crate::HourFilter::Current`]. An hour filter that matches
/// nothing is a successful, empty result.
pub fn evaluate(
    series: &PriceSeries,
    request: &QueryRequest,
    clock: &dyn Clock,
) -> Result<QueryResult, QueryError> {
    let now = clock.now();
    validate_series(series, now.date())?;

    let ranked = rank(&series.hourly_prices, request.query.mode());
    let selected = select(ranked, &request.query);

    let values = match request.hour_filter.and_then(|f| f.resolve(now.hour())) {
        Some(hour) => selected
            .into_iter()
            .find(|hv| hv.hour == hour as usize)
            .into_iter()
            .collect(),
        None => selected,
    };

    Ok(QueryResult::new(values))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
