//! Runtime secret resolution.
//!
//! Config carries only the env var NAME (`particle.token_env`). The value is read
//! here, once, and handed to constructors. Errors name the variable, never the
//! value, and `Debug` output is redacted.

use anyhow::{bail, Result};

use crate::TarkkaConfig;

#[derive(Clone)]
pub struct ResolvedSecrets {
    /// Particle access token. `None` if the named env var was absent or blank.
    pub particle_token: Option<String>,
    token_env: String,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "particle_token",
                &self.particle_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("token_env", &self.token_env)
            .finish()
    }
}

impl ResolvedSecrets {
    /// The Particle token, or an error naming the env var that should hold it.
    pub fn require_particle_token(&self) -> Result<&str> {
        match self.particle_token.as_deref() {
            Some(t) => Ok(t),
            None => bail!(
                "SECRETS_MISSING: required env var '{}' (particle access token) is not set or empty",
                self.token_env
            ),
        }
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Read every secret named by `cfg` from the process environment.
///
/// Missing values are not an error here; commands that need a secret call the
/// matching `require_*` accessor.
pub fn resolve_secrets(cfg: &TarkkaConfig) -> ResolvedSecrets {
    ResolvedSecrets {
        particle_token: resolve_env(&cfg.particle_token_env),
        token_env: cfg.particle_token_env.clone(),
    }
}
