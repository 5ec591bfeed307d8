use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use depot_analysis::AnalysisService;
use depot_client::StorageClient;
use depot_files::FileService;
use depot_server::api::{
    AnalysisState, GatewayState, StorageState, analysis_router, gateway_router, storage_router,
};
use depot_server::config::DepotConfig;
use depot_server::error::ServerError;
use depot_server::factory;

/// Depot file storage and analysis services.
#[derive(Parser, Debug)]
#[command(name = "depot-server", about = "HTTP services for depot file storage")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "depot.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the file storage service.
    Storage,
    /// Run the file analysis service.
    Analysis,
    /// Run the gateway fronting both services.
    Gateway,
    /// Run database migrations for the configured state backend, then exit.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration from the TOML file, or use defaults if the file
    // does not exist.
    let mut config: DepotConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(path = %cli.config, "config file not found, using defaults");
        DepotConfig::default()
    };

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command {
        Commands::Storage => run_storage(&config).await?,
        Commands::Analysis => run_analysis(&config).await?,
        Commands::Gateway => run_gateway(&config).await?,
        Commands::Migrate => run_migrate(&config).await?,
    }

    Ok(())
}

async fn run_storage(config: &DepotConfig) -> Result<(), ServerError> {
    let (metadata, digest_lock) = factory::create_metadata_store(&config.state).await?;
    let blobs = factory::create_blob_store(&config.blob).await?;
    info!(
        state = %config.state.backend,
        blob = %config.blob.backend,
        "storage backends initialized"
    );

    let files = Arc::new(FileService::new(metadata, blobs, digest_lock));
    let router = storage_router(StorageState { files });
    serve(config, router, "storage").await
}

async fn run_analysis(config: &DepotConfig) -> Result<(), ServerError> {
    let cache = factory::create_analysis_store(&config.state).await?;
    info!(state = %config.state.backend, "analysis cache initialized");

    let fetcher = Arc::new(StorageClient::new(config.gateway.storage_url.clone()));
    info!(storage_url = %config.gateway.storage_url, "fetching files from storage service");

    let analysis = Arc::new(AnalysisService::new(cache, fetcher));
    let router = analysis_router(AnalysisState { analysis });
    serve(config, router, "analysis").await
}

async fn run_gateway(config: &DepotConfig) -> Result<(), ServerError> {
    let state = GatewayState::from_config(&config.gateway)?;
    info!(
        storage_url = %state.storage_url,
        analysis_url = %state.analysis_url,
        "gateway upstreams configured"
    );

    let router = gateway_router(state);
    serve(config, router, "gateway").await
}

async fn run_migrate(config: &DepotConfig) -> Result<(), ServerError> {
    if config.state.backend != "postgres" {
        info!(backend = %config.state.backend, "backend needs no migrations");
        return Ok(());
    }

    let pg_config = factory::postgres_config(&config.state)?;
    let pool = depot_state_postgres::connect(&pg_config)
        .await
        .map_err(|e| ServerError::Config(format!("postgres connect: {e}")))?;
    depot_state_postgres::migrations::run_migrations_with_retry(&pool, &pg_config)
        .await
        .map_err(|e| ServerError::Config(format!("migrations failed: {e}")))?;
    info!("migrations complete");
    Ok(())
}

async fn serve(
    config: &DepotConfig,
    router: axum::Router,
    service: &str,
) -> Result<(), ServerError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, service, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
