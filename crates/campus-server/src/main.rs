use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use campus_config::CampusConfig;
use campus_db::service::CampusService;

mod cli;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("campus error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let mut config = CampusConfig::load_with_dotenv(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        cli::Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if !config.payments.is_configured() {
                tracing::warn!("payment keys are not configured; checkout routes will fail");
            }
            let state = campus_server::open_state(&config)
                .await
                .context("failed to open database")?;
            let addr = config.server.bind_addr();
            let listener = TcpListener::bind(addr.as_str())
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            campus_server::serve(listener, state).await
        }
        cli::Commands::Migrate => {
            CampusService::from_config(&config.database)
                .await
                .context("failed to migrate database")?;
            println!("database ready: {}", config.database.path);
            Ok(())
        }
        cli::Commands::Seed => {
            let service = CampusService::from_config(&config.database)
                .await
                .context("failed to open database")?;
            let report = campus_server::seed::seed(&service)
                .await
                .context("failed to seed demo data")?;
            println!(
                "seeded {} users and {} courses (password: {})",
                report.users_created,
                report.courses_created,
                campus_server::seed::DEMO_PASSWORD
            );
            Ok(())
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("CAMPUS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
