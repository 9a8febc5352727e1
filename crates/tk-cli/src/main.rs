use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "tarkka")]
#[command(about = "Hourly spot-price queries for Fortum Tarkka", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (defaults are always applied first)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    /// Series file; overrides data.file from config
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download today's prices unless the series file is already fresh
    Fetch,

    /// Evaluate a query and print the result JSON
    Query {
        /// highest | lowest | over | under
        mode: String,

        /// Count (highest/lowest) or limit in c/kWh (over/under)
        param: Option<String>,

        /// Keep only this hour (0-23 or "current")
        #[arg(long)]
        hour: Option<String>,
    },

    /// Publish a Particle event if the current hour matches the query
    Publish {
        mode: String,
        param: Option<String>,

        /// Event name
        #[arg(long)]
        event: String,

        /// Event lifetime in seconds, shortened by the time already spent in this hour
        #[arg(long, default_value_t = tk_particle::DEFAULT_DURATION_SECS)]
        duration: i64,
    },

    /// Call a Particle device function if the hour matches the query
    Call {
        mode: String,
        param: Option<String>,

        /// Device id or name
        #[arg(long)]
        device: String,

        /// Cloud function name
        #[arg(long)]
        function: String,

        /// Function argument; "query" sends value=<v>,hour=<h>
        #[arg(long)]
        params: Option<String>,

        /// Hour to match (0-23 or "current")
        #[arg(long, default_value = "current")]
        hour: String,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present. Silent if missing; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    let ctx = commands::load_context(&cli.config_paths, cli.file)?;

    match cli.cmd {
        Commands::Fetch => commands::fetch::run_fetch(&ctx).await,

        Commands::Query { mode, param, hour } => {
            commands::query::run_query(&ctx, &mode, param.as_deref(), hour.as_deref())
        }

        Commands::Publish {
            mode,
            param,
            event,
            duration,
        } => commands::particle::run_publish(&ctx, &mode, param.as_deref(), &event, duration).await,

        Commands::Call {
            mode,
            param,
            device,
            function,
            params,
            hour,
        } => {
            let target = commands::particle::CallTarget {
                device: &device,
                function: &function,
                params: params.as_deref(),
            };
            commands::particle::run_call(&ctx, &mode, param.as_deref(), &hour, target).await
        }

        Commands::ConfigHash => {
            println!("config_hash={}", ctx.loaded.config_hash);
            println!("{}", ctx.loaded.canonical_json);
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays a clean JSON channel.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
