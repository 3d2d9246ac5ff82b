use clap::Parser;
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use montime::alerting::EvaluationService;
use montime::db::postgres::PgStore;
use montime::db::store::Store;
use montime::monitoring::{CheckService, ProbeRunner};
use montime::notifications::NotificationService;
use montime::server::config::ServerConfig;
use montime::web::{create_router, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    dotenv().ok();

    let config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&config.log_dir);
    info!("Starting montime server");

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL must be set in the environment or .env file")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    let notifications = Arc::new(NotificationService::new(Duration::from_secs(
        config.notify_timeout_seconds,
    ))?);
    let evaluation = Arc::new(EvaluationService::new(store.clone(), notifications.clone()));

    let probe_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;
    let checks = Arc::new(CheckService::new(
        store.clone(),
        ProbeRunner::new(probe_client),
    ));

    let evaluation_task =
        evaluation.spawn_periodic(Duration::from_secs(config.evaluation_interval_seconds));
    let check_task = checks.spawn_periodic(Duration::from_secs(
        config.monitor_check_interval_seconds,
    ));

    let state = Arc::new(AppState {
        store,
        notifications,
        evaluation,
        checks,
        config: config.clone(),
    });
    let app = create_router(state);

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        })
        .await?;

    evaluation_task.abort();
    check_task.abort();
    Ok(())
}
