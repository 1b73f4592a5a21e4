use clap::Parser;
use policy_chart_exporter::{
    Args, Command, ReportKind, config::Config, http, metrics, policy::Policies, report_scope,
    signal_handler,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Register metrics
    metrics::register_metrics()?;

    // Parse config
    let args = Args::parse();
    let config = Config::from_file(&args.config)?.with_thanos_url(args.thanos_url);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            // Handle signals
            signal_handler()?;

            http::create_server(config).await
        }
        Command::Report {
            kind,
            clusters,
            limit,
        } => {
            let (clusters, limit) =
                report_scope(&clusters, limit.unwrap_or(config.charts.top_limit))?;
            let policies = Policies::new(&config)?;

            let output = match kind {
                ReportKind::Violations => {
                    serde_json::to_string(&policies.violation_chart(&clusters).await?)?
                }
                ReportKind::Top => {
                    serde_json::to_string(&policies.top_violation_chart(&clusters, limit).await?)?
                }
                ReportKind::Log => serde_json::to_string(&policies.violation_log(&clusters).await?)?,
                ReportKind::Workloads => serde_json::to_string(
                    &serde_json::json!({ "count": policies.workload_count(&clusters).await? }),
                )?,
            };

            println!("{}", output);

            Ok(())
        }
    }
}
