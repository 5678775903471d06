use std::sync::Arc;
use std::time::Duration;

use crate::config::DeviceRegistry;
use crate::detect::Detector;
use crate::publisher::SnapshotPublisher;

pub mod events;
pub mod health;
pub mod probe;

pub use events::events;
pub use health::health;
pub use probe::handle_probe;

/// Общее состояние HTTP обработчиков
#[derive(Clone)]
pub struct AppState {
    pub publisher: SnapshotPublisher,
    pub detector: Arc<Detector>,
    pub registry: Arc<dyn DeviceRegistry>,
    pub detection_timeout: Duration,
    pub snmp_port: u16,
}
