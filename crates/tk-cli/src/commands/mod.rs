//! Command handler modules for the `tarkka` binary.
//!
//! Shared helpers used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod fetch;
pub mod particle;
pub mod query;

use anyhow::Result;
use chrono::{NaiveDateTime, Timelike};
use std::path::PathBuf;
use tk_config::{LoadedConfig, TarkkaConfig};
use tk_query::{
    Clock, FixedClock, HourFilter, QueryError, QueryMode, QueryRequest, QueryResult, SystemClock,
};
use tracing::{debug, warn};

/// Resolved configuration for one invocation.
pub struct Context {
    pub cfg: TarkkaConfig,
    pub loaded: LoadedConfig,
}

pub fn load_context(config_paths: &[String], file_override: Option<PathBuf>) -> Result<Context> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = tk_config::load_layered_yaml(&path_refs)?;
    let mut cfg = TarkkaConfig::from_config_json(&loaded.config_json)?;
    if let Some(file) = file_override {
        cfg.data_file = file;
    }
    debug!(config_hash = %loaded.config_hash, data_file = %cfg.data_file.display(), "config loaded");
    Ok(Context { cfg, loaded })
}

/// Read the wall clock once; every later step of the command uses this instant.
pub fn now_once() -> FixedClock {
    FixedClock(SystemClock.now())
}

/// Build a request from CLI strings, filling a missing count from `query.default_count`.
pub fn build_request(
    ctx: &Context,
    mode: &str,
    param: Option<&str>,
    hour: Option<&str>,
) -> Result<QueryRequest, QueryError> {
    let default_count = ctx.cfg.default_count.to_string();
    let param = match (QueryMode::parse(mode)?, param) {
        (QueryMode::Highest | QueryMode::Lowest, None) => Some(default_count.as_str()),
        (_, p) => p,
    };

    let mut request = QueryRequest::parse(mode, param, None)?;
    if let Some(h) = hour {
        match HourFilter::parse(h) {
            Some(filter) => request = request.with_hour_filter(filter),
            None => warn!(hour = h, "hour is not 0-23 or \"current\"; ignoring hour filter"),
        }
    }
    Ok(request)
}

/// Load the fresh series from the configured file and evaluate `request` at `clock`.
///
/// A missing, malformed or stale file surfaces as [`QueryError::InvalidSeries`].
pub fn evaluate_file(
    ctx: &Context,
    request: &QueryRequest,
    clock: &FixedClock,
) -> Result<QueryResult, QueryError> {
    let series = tk_store::load_fresh(&ctx.cfg.data_file, clock.0.date())
        .map_err(|e| QueryError::InvalidSeries(format!("{e:#}")))?;
    tk_query::evaluate(&series, request, clock)
}

/// Hour an hour filter resolved to at `now`, for user-facing messages.
pub fn resolved_hour(request: &QueryRequest, now: NaiveDateTime) -> Option<u32> {
    request.hour_filter.and_then(|f| f.resolve(now.hour()))
}

pub fn no_match_message(hour: Option<u32>, mode: QueryMode) -> String {
    match hour {
        Some(h) => format!("Hour {h} did not match query '{mode}'."),
        None => format!("No hour matched query '{mode}'."),
    }
}
