use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use platebook_core::{OrderService, PlatebookConfig, SqliteOrderStore};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use platebook_server::dispatcher::Dispatcher;
use platebook_server::server;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "platebook.toml")]
    config: String,

    /// Order database file (overrides database.path)
    #[arg(short = 'o', long = "db")]
    db: Option<String>,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let mut config = match PlatebookConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };
    if let Some(db) = args.db {
        config.database.path = db;
    }

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    // Open the order store
    let pool = match platebook_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to open database {}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    if args.health {
        match platebook_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ SQLite {} at {}", v, config.database.path),
            Err(e) => {
                println!("❌ SQLite check failed: {}", e);
                std::process::exit(1);
            }
        }
        println!("✅ Platebook DB health check passed");
        return Ok(());
    }

    let store = Arc::new(SqliteOrderStore::new(pool));
    let service = OrderService::new(store, config.orders.clone());
    let (dispatcher, dispatch_task) = Dispatcher::spawn(service, config.orders.queue_capacity);

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    if config.http.enabled {
        let http_dispatcher = dispatcher.clone();
        let http_config = config.clone();
        let http_shutdown = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) =
                platebook_server::http::start_http_server(http_dispatcher, http_config, http_shutdown)
                    .await
            {
                tracing::error!("HTTP server error: {}", e);
            }
        });
    }

    let socket_path = config.service.socket_path.clone();
    server::run_unix_server(&socket_path, dispatcher, tx.subscribe()).await?;

    // Open IPC connections still hold dispatcher clones; give in-flight work a
    // bounded window to finish.
    match tokio::time::timeout(Duration::from_secs(5), dispatch_task).await {
        Ok(Err(e)) => tracing::error!("Dispatcher task failed: {}", e),
        Err(_) => tracing::warn!("Dispatcher still busy at shutdown, exiting anyway"),
        Ok(Ok(())) => {}
    }

    Ok(())
}
