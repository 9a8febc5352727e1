//! tk-particle
//!
//! Particle cloud integration: turns the top-ranked hour of a query into an
//! event publish or a device function call.
//!
//! The access token is passed in by the caller (resolved from the environment
//! by name in `tk-config`); it is never logged and is redacted in `Debug`.

mod client;
mod event;

pub use client::{ParticleClient, DEFAULT_BASE_URL};
pub use event::{
    function_params, remaining_duration_secs, HourEvent, DEFAULT_DURATION_SECS, QUERY_PARAMS,
};

use std::fmt;

#[derive(Debug)]
pub enum ParticleError {
    /// Network or transport failure.
    Transport(String),
    /// Particle API returned a non-success status.
    Api { status: u16, message: String },
    /// Response body could not be decoded.
    Decode(String),
}

impl fmt::Display for ParticleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticleError::Transport(msg) => write!(f, "transport error: {msg}"),
            ParticleError::Api { status, message } => {
                write!(f, "particle api error status={status}: {message}")
            }
            ParticleError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for ParticleError {}
