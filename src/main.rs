use std::path::PathBuf;
use std::sync::Arc;

use auction_browser::credentials::CredentialStore;
use auction_browser::server::{self, AppState};
use auction_browser::{api, Config, Metrics, Session, Settings};
use tracing::Instrument;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    tracing::info!("Starting");

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yaml"));

    runtime.block_on(run(config_path))
}

async fn run(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(&config_path).await?;
    tracing::info!(api = %config.api_base_url, listen = %config.listen, "Loaded config");

    if config.api_key.is_empty() {
        tracing::warn!("No API key configured, requests will likely be refused");
    }

    let credentials = Arc::new(CredentialStore::from_file(&config.credentials_path).await);

    let registry = prometheus::Registry::new();
    let metrics = Metrics::new(&registry)?;

    let client = api::Client::new(
        config.api_base_url.clone(),
        config.api_key.clone(),
        Arc::clone(&credentials),
    );

    let session = Arc::new(Session::new(
        Arc::new(client),
        Arc::clone(&credentials),
        Settings::from(&config),
        metrics,
    ));

    #[cfg(unix)]
    tokio::spawn(
        reload_credentials_on_hangup(Arc::clone(&credentials))
            .instrument(tracing::info_span!("Credentials reloader")),
    );

    session
        .refresh()
        .instrument(tracing::info_span!("Initial load"))
        .await;

    let app = server::router(AppState { session, registry });

    let addr: std::net::SocketAddr = config.listen.parse()?;
    tracing::info!("Listening on {}", addr);

    axum::Server::try_bind(&addr)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Waiting for Ctrl-C {:?}", e);
            }
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(unix)]
async fn reload_credentials_on_hangup(credentials: Arc<CredentialStore>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Installing SIGHUP handler {:?}", e);
            return;
        }
    };

    while hangups.recv().await.is_some() {
        tracing::info!("Reloading credentials");
        credentials.reload().await;
    }
}
