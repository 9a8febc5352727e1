use anyhow::Result;
use tk_fetch::{HeydayTarkkaSource, RefreshOutcome};

use super::{now_once, Context};

pub async fn run_fetch(ctx: &Context) -> Result<()> {
    let today = now_once().0.date();
    let source = HeydayTarkkaSource::new_with_base_url(
        ctx.cfg.source_base_url.as_str(),
        ctx.cfg.source_path.as_str(),
    );

    let path = &ctx.cfg.data_file;
    match tk_fetch::refresh_series_file(&source, path, today).await? {
        RefreshOutcome::AlreadyFresh => {
            println!(
                "Found valid data for today in '{}', nothing to do.",
                path.display()
            );
        }
        RefreshOutcome::Saved { hours } => {
            println!("Saved {hours} hourly prices to '{}'.", path.display());
        }
    }
    Ok(())
}
