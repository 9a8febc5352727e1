//! tk-fetch
//!
//! Upstream acquisition of the day's hourly prices.
//!
//! This crate owns the source abstraction, the Heyday/Fortum Tarkka HTTP source
//! and its tolerant page parser, plus [`refresh_series_file`], which keeps the
//! on-disk series current. It does **not** answer queries (see `tk-query`).

mod parse;

pub use parse::parse_graph_body;

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tk_store::{FileState, SeriesFile};
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "http://tuotanto.heyday.fi";
pub const DEFAULT_PATH: &str = "/fortum/tarkka/graafi.php";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum FetchError {
    /// Network or transport failure.
    Transport(String),
    /// Non-success HTTP status.
    Status(u16),
    /// The response body was empty.
    Empty,
    /// The body could not be turned into a price list.
    Parse(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "transport error: {msg}"),
            FetchError::Status(code) => write!(f, "upstream http error status={code}"),
            FetchError::Empty => write!(f, "No data received."),
            FetchError::Parse(msg) => write!(f, "parse failure: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Upstream hourly price source.
#[async_trait::async_trait]
pub trait SpotPriceSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Prices for the current day, index = hour.
    async fn fetch_hourly_prices(&self) -> Result<Vec<f64>, FetchError>;
}

/// Fortum Tarkka graph page served by Heyday.
#[derive(Debug, Clone)]
pub struct HeydayTarkkaSource {
    http: reqwest::Client,
    base_url: String,
    path: String,
}

impl HeydayTarkkaSource {
    pub fn new() -> Self {
        Self::new_with_base_url(DEFAULT_BASE_URL, DEFAULT_PATH)
    }

    pub fn new_with_base_url(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            path: path.into(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

impl Default for HeydayTarkkaSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SpotPriceSource for HeydayTarkkaSource {
    fn name(&self) -> &'static str {
        "heyday-tarkka"
    }

    async fn fetch_hourly_prices(&self) -> Result<Vec<f64>, FetchError> {
        let url = self.url();
        debug!(%url, "requesting tarkka graph page");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let prices = parse_graph_body(&body)?;
        debug!(hours = prices.len(), "parsed tarkka graph page");
        Ok(prices)
    }
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// File already held data for today; nothing fetched.
    AlreadyFresh,
    /// Fetched and saved `hours` prices.
    Saved { hours: usize },
}

/// Make sure `path` holds today's prices, fetching from `source` only when needed.
pub async fn refresh_series_file(
    source: &dyn SpotPriceSource,
    path: &Path,
    today: NaiveDate,
) -> Result<RefreshOutcome> {
    match tk_store::inspect(path, today)? {
        FileState::Fresh => {
            info!(path = %path.display(), "found valid data for today, nothing to do");
            return Ok(RefreshOutcome::AlreadyFresh);
        }
        state => debug!(?state, path = %path.display(), "series file needs refresh"),
    }

    let prices = source
        .fetch_hourly_prices()
        .await
        .with_context(|| format!("{} fetch failed", source.name()))?;

    let hours = prices.len();
    let file = SeriesFile::for_day(today, prices)?;
    tk_store::save(path, &file)?;
    info!(path = %path.display(), hours, "saved series file");

    Ok(RefreshOutcome::Saved { hours })
}

// ---------------------------------------------------------------------------
// Tests (no network)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let s = HeydayTarkkaSource::new_with_base_url("http://example.test/", "/graafi.php");
        assert_eq!(s.url(), "http://example.test/graafi.php");
    }

    #[test]
    fn default_points_at_heyday() {
        assert_eq!(
            HeydayTarkkaSource::default().url(),
            "http://tuotanto.heyday.fi/fortum/tarkka/graafi.php"
        );
    }

    #[test]
    fn fetch_error_display() {
        assert_eq!(FetchError::Status(503).to_string(), "upstream http error status=503");
        assert_eq!(FetchError::Empty.to_string(), "No data received.");
    }
}
