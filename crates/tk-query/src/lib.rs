//! tk-query
//!
//! Ranking / threshold query engine over a single day's hourly spot-price series.
//!
//! Answers:
//! - which hour(s) are most expensive (`highest`)
//! - which hour(s) are cheapest (`lowest`)
//! - which hours are at or above a limit (`over`)
//! - which hours are at or below a limit (`under`)
//!
//! optionally narrowed to one hour (literal or "current").
//!
//! Deterministic, pure logic. No IO, no logging. The only environmental input is
//! the [`Clock`], read once per evaluation.

mod clock;
mod engine;
mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{clamp_count, evaluate, rank, select};
pub use types::*;
