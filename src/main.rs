mod adapters;
mod application;
mod codec;
mod config;
mod domain;
mod interface;
mod ports;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{net, HttpCollectorClient, HttpSnapshotFetcher, LiveMetrics, Registry};
use application::{
    full_identity, Announcer, AnnouncerHandle, IngestService, PullCoordinator, PushClient,
    PushLifecycle, PushScheduler,
};
use config::Config;
use domain::parse_url_list;
use interface::http::{create_router, AppState};
use ports::{CollectorClient, MetricSource, SnapshotFetcher};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("relaymon={},tower_http=info", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting RelayMon v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    let http_client = reqwest::Client::new();

    // Resolve the address other processes use to reach this instance
    let address = net::resolve_address(
        &http_client,
        config.app_host.as_deref(),
        config.use_public_ip,
        &config.ip_service_url,
    )
    .await;
    info!("✓ Instance address: {}", address);

    let live = Arc::new(LiveMetrics::detect(address.clone()));
    let registry = Arc::new(Registry::new());

    // Seed the registry from static configuration
    for (name, urls) in &config.applications {
        match parse_url_list(urls).and_then(|urls| registry.register(name, urls)) {
            Ok(()) => info!("✓ Seeded application {}", name),
            Err(e) => warn!("⚠ Skipping seed entry {}: {}", name, e),
        }
    }

    let fetcher = Arc::new(HttpSnapshotFetcher::new(http_client.clone())) as Arc<dyn SnapshotFetcher>;
    let state = AppState {
        registry: Arc::clone(&registry),
        live: Arc::clone(&live),
        puller: Arc::new(PullCoordinator::new(Arc::clone(&registry), fetcher)),
        ingest: Arc::new(IngestService::new(Arc::clone(&registry))),
    };

    // Become a pushing instance only when a collector destination is configured
    let mut push_lifecycle = None;
    let mut announcer = None;
    if let Some(settings) = config.push_settings()? {
        let identity = full_identity(&settings.app_name, &address);
        let collector =
            Arc::new(HttpCollectorClient::new(http_client.clone())) as Arc<dyn CollectorClient>;

        let client = PushClient::new(
            Arc::clone(&live) as Arc<dyn MetricSource>,
            Arc::clone(&collector),
            settings.push_url.clone(),
            identity.clone(),
        );
        let scheduler = PushScheduler::new(
            client,
            Duration::from_secs(config.push_delay_secs),
            Duration::from_secs(config.push_period_secs),
        );
        let lifecycle = Arc::new(PushLifecycle::new(scheduler));
        lifecycle.start();
        info!("✓ Pushing to {} as {}", settings.push_url, identity);

        let app_url = format!(
            "http://{}:{}{}/monitoring/data",
            address, config.app_port, config.app_context_path
        );
        announcer = Some(
            Announcer::new(
                collector,
                settings.admin_url,
                identity,
                app_url,
                Duration::from_secs(config.push_delay_secs),
                Duration::from_secs(config.announce_period_secs),
            )
            .spawn(),
        );
        push_lifecycle = Some(lifecycle);
    }

    // Create HTTP server
    let app = create_router(state, &config.push_path);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("✓ RelayMon listening on {}", addr);
    info!("  → Monitoring: http://localhost:{}/monitoring", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(push_lifecycle, announcer))
        .await?;

    Ok(())
}

async fn shutdown_signal(push: Option<Arc<PushLifecycle>>, announcer: Option<AnnouncerHandle>) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("shutdown requested");
    if let Some(lifecycle) = push {
        lifecycle.stop();
    }
    if let Some(handle) = announcer {
        handle.stop();
    }
}
