use std::fmt;

use serde::Deserialize;
use tracing::{debug, info};

use crate::{HourEvent, ParticleError};

pub const DEFAULT_BASE_URL: &str = "https://api.particle.io";

/// Minimal Particle cloud REST client.
#[derive(Clone)]
pub struct ParticleClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for ParticleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleClient")
            .field("base_url", &self.base_url)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(default)]
    ok: bool,
}

#[derive(Debug, Deserialize)]
struct DeviceInfo {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FunctionResponse {
    return_value: i64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

impl ParticleClient {
    pub fn new(token: String) -> Self {
        Self::new_with_base_url(token, DEFAULT_BASE_URL.to_string())
    }

    pub fn new_with_base_url(token: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Publish `event` as a private event named `event.name`.
    ///
    /// The event JSON is the `data` field; `durationsec` doubles as the TTL.
    pub async fn publish_event(&self, event: &HourEvent) -> Result<(), ParticleError> {
        let data = serde_json::to_string(event).map_err(|e| ParticleError::Decode(e.to_string()))?;
        let ttl = event.durationsec.to_string();

        let resp = self
            .http
            .post(self.url("devices/events"))
            .bearer_auth(&self.token)
            .form(&[
                ("name", event.name.as_str()),
                ("data", data.as_str()),
                ("private", "true"),
                ("ttl", ttl.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ParticleError::Transport(e.to_string()))?;

        let body: PublishResponse = decode(resp).await?;
        if !body.ok {
            return Err(ParticleError::Api {
                status: 200,
                message: "publish not acknowledged".to_string(),
            });
        }
        info!(event = %event.name, hour = event.hour, "event published");
        Ok(())
    }

    /// Look up `device`, then call `function` on it with `params`.
    ///
    /// Returns the function's integer return value.
    pub async fn call_function(
        &self,
        device: &str,
        function: &str,
        params: &str,
    ) -> Result<i64, ParticleError> {
        let resp = self
            .http
            .get(self.url(&format!("devices/{device}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ParticleError::Transport(e.to_string()))?;
        let info: DeviceInfo = decode(resp).await?;
        debug!(device, name = ?info.name, "found device");

        let resp = self
            .http
            .post(self.url(&format!("devices/{device}/{function}")))
            .bearer_auth(&self.token)
            .form(&[("arg", params)])
            .send()
            .await
            .map_err(|e| ParticleError::Transport(e.to_string()))?;
        let out: FunctionResponse = decode(resp).await?;

        info!(device, function, return_value = out.return_value, "function called");
        Ok(out.return_value)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, ParticleError> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| ParticleError::Transport(e.to_string()))?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|b| b.error_description.or(b.error))
            .unwrap_or_else(|| "unknown".to_string());
        return Err(ParticleError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&text).map_err(|e| ParticleError::Decode(e.to_string()))
}
