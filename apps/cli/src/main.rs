mod args;

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{Timelike, Utc};
use collector::MetricsClient;
use http_api::HttpState;
use meter_core::TickReport;
use meter_db::Db;
use meter_job::{MeterConfig, TickLog, run_tick};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = args::parse_args().map_err(|err| {
        eprintln!("{err}");
        args::print_help();
        io::Error::new(io::ErrorKind::InvalidInput, "invalid arguments")
    })?;

    let mut config = MeterConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let mut db = Db::open(&config.db_path)?;
    db.migrate()?;

    if args.once {
        let client = MetricsClient::new(config.metrics_url.clone(), config.retry_policy());
        let log = TickLog::new(config.log_dir.clone());
        let report = run_tick(&mut db, &client, &config, &log, Utc::now());
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let state = HttpState::new(config.db_path.clone());
    let db = Arc::new(Mutex::new(db));
    tokio::spawn(schedule_ticks(
        Arc::clone(&db),
        Arc::clone(&state.last_tick),
        config.clone(),
    ));

    let router = http_api::router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "metering api listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Fire one tick at the top of every minute. The store mutex is held for the
/// whole tick, so a slow rollup can never overlap the next collection.
async fn schedule_ticks(
    db: Arc<Mutex<Db>>,
    last_tick: Arc<RwLock<Option<TickReport>>>,
    config: MeterConfig,
) {
    let client = Arc::new(MetricsClient::new(
        config.metrics_url.clone(),
        config.retry_policy(),
    ));
    let log = TickLog::new(config.log_dir.clone());

    loop {
        sleep_until_next_minute().await;

        let db = Arc::clone(&db);
        let client = Arc::clone(&client);
        let config = config.clone();
        let log = log.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut db = match db.lock() {
                Ok(db) => db,
                Err(poisoned) => poisoned.into_inner(),
            };
            run_tick(&mut db, &client, &config, &log, Utc::now())
        })
        .await;

        match outcome {
            Ok(report) => {
                if let Ok(mut slot) = last_tick.write() {
                    *slot = Some(report);
                }
            }
            Err(err) => tracing::error!(error = %err, "tick task failed"),
        }
    }
}

async fn sleep_until_next_minute() {
    let now = Utc::now();
    let elapsed = u64::from(now.second()) * 1_000 + u64::from(now.timestamp_subsec_millis());
    let wait = 60_000u64.saturating_sub(elapsed).max(1);
    tokio::time::sleep(Duration::from_millis(wait)).await;
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
