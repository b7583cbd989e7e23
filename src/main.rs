use anyhow::Result;
use stackwatch::*;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let registry = Arc::new(registry::ComponentRegistry::seeded(
        app_config.component_seeds(),
    ));
    tracing::info!(components = registry.len(), "registry seeded");
    let store = Arc::new(metrics_store::MetricsStore::new(
        app_config.collection.history_capacity,
    ));

    let docker = bollard::Docker::connect_with_unix_defaults()?;
    let controller = Arc::new(docker::DockerController::from_client(docker.clone()));
    let source = Arc::new(docker::HostMetricsSource::new(docker));

    let (events_tx, events_rx) = broadcast::channel(app_config.control.event_capacity);
    let notifier_handle = notifier::spawn(events_rx);
    let lifecycle = Arc::new(lifecycle::LifecycleController::new(
        registry.clone(),
        controller,
        events_tx,
        lifecycle::LifecycleConfig {
            timeout: app_config.control.timeout(),
            log_tail: app_config.control.log_tail,
        },
    ));

    let mut scheduler = collector::CollectionScheduler::new(
        collector::CollectorDeps {
            registry: registry.clone(),
            store: store.clone(),
            source,
        },
        collector::CollectorConfig {
            interval: app_config.collection.interval(),
            source_timeout: app_config.collection.source_timeout(),
            stats_log_interval: app_config.collection.stats_log_interval(),
        },
    );
    scheduler.start();

    let app = routes::app(registry, store, lifecycle);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
        }
    }

    scheduler.stop().await;
    notifier_handle.abort();
    Ok(())
}
