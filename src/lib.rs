pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod state;

use tokio::signal;

use clients::ipstack::IpstackClient;
pub use config::Config;
use db::{NewRecord, RecordInsertError, Store};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "serve" | "daemon" | "-d" | "--daemon" => run_serve(config).await,

        "ingest" => {
            if args.len() < 3 {
                println!("Usage: geodex ingest <ip>...");
                println!("Example: geodex ingest 134.201.250.155");
                return Ok(());
            }
            cmd_ingest(&config, &args[2..]).await
        }

        "init" | "--init" => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Geodex - IP Geolocation Records Service");
    println!("Stores and queries IP geolocation data over HTTP");
    println!();
    println!("USAGE:");
    println!("  geodex <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  serve, daemon     Run the HTTP API service");
    println!("  ingest <ip>...    Fetch geolocation data for the given IPs from");
    println!("                    ipstack and insert it into the database");
    println!("  init              Create default config file");
    println!("  help              Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("  geodex serve                      # Start the API on the configured port");
    println!("  geodex ingest 134.201.250.155     # Ingest a single address");
    println!("  geodex ingest 1.2.3.4 5.6.7.8     # Ingest several addresses");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure the database path, server port and");
    println!("  ipstack credentials (IPSTACK_ACCESS_KEY overrides the config key).");
}

async fn run_serve(config: Config) -> anyhow::Result<()> {
    info!("geodex v{} starting...", env!("CARGO_PKG_VERSION"));

    let state = api::create_app_state_from_config(config.clone()).await?;

    let port = config.server.port;
    let app = api::router(state).await;
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("Web API running at http://0.0.0.0:{}", port);
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {}", e);
        }
    });

    info!("Service running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    server_handle.abort();
    info!("Service stopped");

    Ok(())
}

/// Offline batch ingestion. Per-address failures are logged and skipped so a
/// single bad lookup never aborts the run; this soft-skip stays confined to
/// this path and is never used by the request-serving handlers.
async fn cmd_ingest(config: &Config, ips: &[String]) -> anyhow::Result<()> {
    if config.ipstack.access_key.is_empty() {
        anyhow::bail!(
            "ipstack access key is not configured; set [ipstack] access_key or IPSTACK_ACCESS_KEY"
        );
    }

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let client = IpstackClient::from_config(&config.ipstack)?;

    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for ip in ips {
        info!("Fetching geolocation for {}", ip);

        let data = match client.lookup(ip).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                warn!("No data returned for {}", ip);
                skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("Lookup failed for {}: {}", ip, e);
                skipped += 1;
                continue;
            }
        };

        let zip = data.zip.as_deref().and_then(|z| z.parse::<i32>().ok());

        let record = NewRecord {
            ip_address: data.ip,
            country: data.country_name,
            region: data.region_name,
            city: data.city,
            zip,
            latitude: data.latitude,
            longitude: data.longitude,
        };

        match store.add_record(record).await {
            Ok(()) => inserted += 1,
            Err(RecordInsertError::Duplicate(ip)) => {
                warn!("Record for {} already exists, skipping", ip);
                skipped += 1;
            }
            Err(RecordInsertError::Db(e)) => return Err(e.into()),
        }
    }

    println!("Ingest finished: {} inserted, {} skipped", inserted, skipped);
    Ok(())
}
