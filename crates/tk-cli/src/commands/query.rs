use anyhow::{bail, Context as _, Result};
use tk_query::QueryResult;

use super::{build_request, evaluate_file, now_once, Context};

/// Print the query result as JSON. Failures print the error-carrying shape and exit non-zero.
pub fn run_query(ctx: &Context, mode: &str, param: Option<&str>, hour: Option<&str>) -> Result<()> {
    let clock = now_once();
    let outcome =
        build_request(ctx, mode, param, hour).and_then(|req| evaluate_file(ctx, &req, &clock));

    match outcome {
        Ok(result) => {
            print_result(&result)?;
            Ok(())
        }
        Err(err) => {
            print_result(&QueryResult::from_error(&err))?;
            bail!("query failed ({}): {err}", err.code());
        }
    }
}

fn print_result(result: &QueryResult) -> Result<()> {
    let json = serde_json::to_string(result).context("serialize query result failed")?;
    println!("{json}");
    Ok(())
}
