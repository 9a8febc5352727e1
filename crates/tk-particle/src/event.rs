use serde::{Deserialize, Serialize};
use tk_query::HourValue;

/// Event lifetime when the caller gives none: one hour.
pub const DEFAULT_DURATION_SECS: i64 = 3600;

/// `--params` value meaning "derive params from the query result".
pub const QUERY_PARAMS: &str = "query";

/// Payload published for a matching hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourEvent {
    pub name: String,
    pub hour: usize,
    pub value: f64,
    /// Seconds left of the hour-long window at publish time.
    pub durationsec: i64,
}

impl HourEvent {
    pub fn from_top(name: impl Into<String>, top: &HourValue, durationsec: i64) -> Self {
        Self {
            name: name.into(),
            hour: top.hour,
            value: top.value,
            durationsec,
        }
    }
}

/// `duration` minus the time already elapsed in the current hour.
///
/// Falls back to the full `duration` if that would go negative.
pub fn remaining_duration_secs(duration: i64, minute: u32, second: u32) -> i64 {
    let elapsed = i64::from(minute) * 60 + i64::from(second);
    let remaining = duration - elapsed;
    if remaining < 0 {
        duration
    } else {
        remaining
    }
}

/// Argument string for a device function call.
///
/// `None` or [`QUERY_PARAMS`] renders `value=<v>,hour=<h>`; anything else is
/// passed through verbatim.
pub fn function_params(requested: Option<&str>, top: &HourValue) -> String {
    match requested {
        None | Some(QUERY_PARAMS) => format!("value={},hour={}", top.value, top.hour),
        Some(literal) => literal.to_string(),
    }
}
