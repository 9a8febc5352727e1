use anyhow::{Context as _, Result};
use chrono::Timelike;
use tk_config::secrets::resolve_secrets;
use tk_particle::{function_params, remaining_duration_secs, HourEvent, ParticleClient};
use tk_query::HourValue;
use tracing::info;

use super::{build_request, evaluate_file, no_match_message, now_once, resolved_hour, Context};

/// Device function to invoke on a match.
pub struct CallTarget<'a> {
    pub device: &'a str,
    pub function: &'a str,
    pub params: Option<&'a str>,
}

fn client(ctx: &Context) -> Result<ParticleClient> {
    let secrets = resolve_secrets(&ctx.cfg);
    let token = secrets.require_particle_token()?;
    Ok(ParticleClient::new_with_base_url(
        token.to_string(),
        ctx.cfg.particle_base_url.clone(),
    ))
}

/// Evaluate at the current instant and return the top match, printing the
/// no-match line when the hour filter excluded everything.
fn top_match(
    ctx: &Context,
    mode: &str,
    param: Option<&str>,
    hour: &str,
) -> Result<(Option<HourValue>, chrono::NaiveDateTime)> {
    let clock = now_once();
    let request = build_request(ctx, mode, param, Some(hour))?;
    let result = evaluate_file(ctx, &request, &clock)?;

    let top = result.top().copied();
    if top.is_none() {
        println!("{}", no_match_message(resolved_hour(&request, clock.0), request.query.mode()));
    }
    Ok((top, clock.0))
}

pub async fn run_publish(
    ctx: &Context,
    mode: &str,
    param: Option<&str>,
    event_name: &str,
    duration: i64,
) -> Result<()> {
    let (top, now) = top_match(ctx, mode, param, "current")?;
    let Some(top) = top else {
        return Ok(());
    };

    let durationsec = remaining_duration_secs(duration, now.minute(), now.second());
    let event = HourEvent::from_top(event_name, &top, durationsec);
    println!(
        "{}",
        serde_json::to_string(&event).context("serialize event failed")?
    );

    client(ctx)?
        .publish_event(&event)
        .await
        .with_context(|| format!("publish event '{event_name}' failed"))?;
    info!(event = event_name, hour = top.hour, durationsec, "published");
    Ok(())
}

pub async fn run_call(
    ctx: &Context,
    mode: &str,
    param: Option<&str>,
    hour: &str,
    target: CallTarget<'_>,
) -> Result<()> {
    let (top, _) = top_match(ctx, mode, param, hour)?;
    let Some(top) = top else {
        return Ok(());
    };

    let arg = function_params(target.params, &top);
    let return_value = client(ctx)?
        .call_function(target.device, target.function, &arg)
        .await
        .with_context(|| {
            format!(
                "call function '{}' on device '{}' failed",
                target.function, target.device
            )
        })?;
    println!("return_value={return_value}");
    Ok(())
}
