use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokio::{
    select,
    signal::unix::{SignalKind, signal},
};

pub mod chart;
pub mod config;
pub mod http;
pub mod metrics;
pub mod policy;
pub mod thanos;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Config file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Thanos query endpoint, overrides the one in the config file
    #[arg(long, env = "THANOS_URL")]
    pub thanos_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the reports over HTTP (default)
    Serve,

    /// Build a single report and print it as JSON
    Report {
        #[arg(value_enum)]
        kind: ReportKind,

        /// Comma separated cluster names
        #[arg(long, value_delimiter = ',', required = true)]
        clusters: Vec<String>,

        /// Number of policy templates in the top violations chart
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Violations,
    Top,
    Log,
    Workloads,
}

/// Clusters and top-N limit of a `report` command, with blank clusters removed
pub fn report_scope(clusters: &[String], limit: usize) -> anyhow::Result<(Vec<String>, usize)> {
    let clusters: Vec<String> = clusters
        .iter()
        .flat_map(|cluster| http::parse_clusters(cluster))
        .collect();

    if clusters.is_empty() {
        return Err(anyhow::anyhow!("--clusters needs at least one cluster name"));
    }
    if limit == 0 {
        return Err(anyhow::anyhow!("--limit must be positive"));
    }

    Ok((clusters, limit))
}

/// Handle signals
pub fn signal_handler() -> anyhow::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        select! {
            _ = sigterm.recv() => {
                tracing::info!("SIGTERM received, exiting");
                std::process::exit(0);
            }
            _ = sigint.recv() => {
                tracing::info!("SIGINT received, exiting");
                std::process::exit(0);
            }
        }
    });

    Ok(())
}
