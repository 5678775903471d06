use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use ups_telemetry::collector::DialectClients;
use ups_telemetry::config::{AppConfig, DeviceRegistry, StaticRegistry};
use ups_telemetry::detect::{DetectOptions, Detector};
use ups_telemetry::handlers::AppState;
use ups_telemetry::publisher::{InfluxWriter, SinkAdapter, SnapshotPublisher, SnapshotSink};
use ups_telemetry::scheduler::Scheduler;
use ups_telemetry::snmp::{Connector, SnmpConnector};
use ups_telemetry::{logging, profiles, routes};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(AppConfig::get_config_path())?;
    logging::init_tracing(&config.settings.logging);
    config.debug_config();

    // Битые таблицы тегов = ошибка сборки, дальше не идём
    profiles::validate_tables().context("таблицы тегов невалидны")?;

    let registry: Arc<dyn DeviceRegistry> = Arc::new(StaticRegistry::load(&config.devices_path)?);
    let settings = config.settings.clone();

    let connector: Arc<dyn Connector> = Arc::new(SnmpConnector);
    let clients = DialectClients::new(connector.clone(), settings.snmp.batch_size);
    let detector = Arc::new(Detector::new(
        connector,
        DetectOptions {
            communities: settings.snmp.communities.clone(),
            timeout: settings.detection.timeout(),
            retries: 0,
        },
    ));

    let sink: Option<Arc<dyn SnapshotSink>> = if settings.sink.enabled {
        info!(url = %settings.sink.url, bucket = %settings.sink.bucket, "синк InfluxDB включён");
        Some(Arc::new(SinkAdapter::new(
            InfluxWriter::new(settings.sink.clone()),
            settings.sink.backoff(),
        )))
    } else {
        None
    };
    let publisher = SnapshotPublisher::new(sink);

    let scheduler = Scheduler::new(
        settings.clone(),
        registry.clone(),
        detector.clone(),
        clients,
        publisher.clone(),
    );
    scheduler.start();

    let state = AppState {
        publisher,
        detector,
        registry,
        detection_timeout: settings.polling.detection_timeout(),
        snmp_port: settings.snmp.port,
    };
    let listener = TcpListener::bind(&settings.http.bind)
        .await
        .with_context(|| format!("не удалось занять {}", settings.http.bind))?;
    info!(bind = %settings.http.bind, "HTTP слушает");

    let server = axum::serve(listener, routes::create_router(state))
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "не удалось подписаться на Ctrl+C");
            }
        });

    if let Err(err) = server.await {
        warn!(error = %err, "HTTP сервер остановился с ошибкой");
    }

    scheduler.stop().await;
    Ok(())
}
