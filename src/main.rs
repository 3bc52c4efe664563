use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use txpulse::alert::SinkKind;
use txpulse::config::MonitorConfig;

#[derive(Parser)]
#[command(
    name = "txpulse",
    about = "Real-time volume spike monitoring for payment transaction streams",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file (defaults: $TXPULSE_CONFIG, ./txpulse.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the aggregate exports through the monitor
    Run {
        /// Per-minute status counts CSV
        #[arg(long)]
        transactions: Option<PathBuf>,

        /// Per-minute authorization-code counts CSV
        #[arg(long)]
        auth_codes: Option<PathBuf>,

        /// Minutes kept in the sliding window
        #[arg(long)]
        window_size: Option<usize>,

        /// Milliseconds between simulated minutes
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Snapshot log (JSON lines)
        #[arg(long)]
        snapshot_log: Option<PathBuf>,

        /// Alert sink: console, log or json
        #[arg(long)]
        alert_sink: Option<SinkKind>,

        /// Skip the per-minute text dashboard
        #[arg(long)]
        quiet: bool,

        /// Emit logs as JSON
        #[arg(long)]
        json_logs: bool,
    },

    /// Validate the configuration and print the effective settings
    CheckConfig,

    /// Show what the snapshot log currently holds
    Snapshots {
        /// Snapshot log to read (defaults to the configured one)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Most recent rows to list
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A named or located config file that fails to load is fatal.
    let (mut config, source) = match cli.config {
        Some(path) => (MonitorConfig::load(&path)?, Some(path)),
        None => MonitorConfig::load_or_default()?,
    };

    if let Commands::Run { json_logs: true, .. } = cli.command {
        config.logging.json = true;
    }
    init_tracing(&config.logging.level, config.logging.json);
    match &source {
        Some(path) => tracing::info!(path = %path.display(), "loaded monitor configuration"),
        None => tracing::debug!("no config file found, using compiled-in defaults"),
    }

    match cli.command {
        Commands::Run {
            transactions,
            auth_codes,
            window_size,
            tick_ms,
            snapshot_log,
            alert_sink,
            quiet,
            json_logs: _,
        } => {
            if let Some(path) = transactions {
                config.input.transactions_csv = path;
            }
            if let Some(path) = auth_codes {
                config.input.auth_codes_csv = path;
            }
            if let Some(size) = window_size {
                config.window.size = size;
            }
            if let Some(ms) = tick_ms {
                config.pacing.tick_ms = ms;
            }
            if let Some(path) = snapshot_log {
                config.snapshot.log_path = path;
            }
            if let Some(sink) = alert_sink {
                config.alerts.sink = sink;
            }
            if quiet {
                config.snapshot.console = false;
            }

            let summary = txpulse::run(&config, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "failed to listen for ctrl-c");
                    std::future::pending::<()>().await;
                }
            })
            .await?;

            println!(
                "\nProcessed {} minute(s), raised {} anomaly signal(s){}",
                summary.minutes,
                summary.signals,
                if summary.interrupted { " (interrupted)" } else { "" }
            );
        }
        Commands::CheckConfig => {
            config.validate()?;
            println!("{}", toml::to_string_pretty(&config)?);
            println!("# configuration OK");
        }
        Commands::Snapshots { path, limit } => {
            let path = path.unwrap_or_else(|| config.snapshot.log_path.clone());
            let snaps = txpulse::snapshot::read_snapshots(&path).await?;

            let Some(latest) = snaps.last() else {
                println!("No snapshots in {} yet.", path.display());
                return Ok(());
            };

            println!("\n=== Latest snapshot ({}) ===", latest.timestamp);
            println!("Approved : {}", latest.approved);
            println!("Failed   : {}", latest.failed);
            println!("Denied   : {}", latest.denied);
            println!("Reversed : {}", latest.reversed);

            println!(
                "\n{:<20} | {:>9} | {:>7} | {:>7} | {:>8}",
                "Minute", "Approved", "Failed", "Denied", "Reversed"
            );
            println!("{:-<20}-|-{:-<9}-|-{:-<7}-|-{:-<7}-|-{:-<8}", "", "", "", "", "");
            let start = snaps.len().saturating_sub(limit);
            for s in &snaps[start..] {
                println!(
                    "{:<20} | {:>9} | {:>7} | {:>7} | {:>8}",
                    s.timestamp.to_string(),
                    s.approved,
                    s.failed,
                    s.denied,
                    s.reversed
                );
            }
            println!("({} snapshot(s) total)", snaps.len());
        }
    }

    Ok(())
}
