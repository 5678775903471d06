//! Публикация снапшотов: живым подписчикам через broadcast и в синк
//! временных рядов через автомат защиты.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::formatter::TelemetrySnapshot;

pub mod influx;
pub mod sink;

pub use influx::InfluxWriter;
pub use sink::{SinkAdapter, SinkError, TimeSeriesWriter};

/// Ёмкость буфера подписчика. Отставший подписчик теряет самые старые события.
pub const SUBSCRIBER_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Автомат разомкнут, запись не пытались делать
    Skipped,
    Failed,
}

/// Приёмник снапшотов вне процесса
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn write(&self, snapshot: &TelemetrySnapshot) -> WriteOutcome;
}

#[derive(Clone)]
pub struct SnapshotPublisher {
    tx: broadcast::Sender<Arc<TelemetrySnapshot>>,
    sink: Option<Arc<dyn SnapshotSink>>,
}

impl SnapshotPublisher {
    pub fn new(sink: Option<Arc<dyn SnapshotSink>>) -> Self {
        let (tx, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        Self { tx, sink }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TelemetrySnapshot>> {
        self.tx.subscribe()
    }

    pub fn subscribers(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Подписчикам без ожидания, в синк синхронно в рамках цикла
    pub async fn publish(&self, snapshot: TelemetrySnapshot) -> Option<WriteOutcome> {
        let snapshot = Arc::new(snapshot);

        // Err = нет подписчиков, это нормально
        if let Ok(reached) = self.tx.send(snapshot.clone()) {
            debug!(device = %snapshot.id, reached, "снапшот разослан");
        }

        match &self.sink {
            Some(sink) => Some(sink.write(&snapshot).await),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{DeviceStatus, Telemetry};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snapshot(id: &str, cycle: u64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            id: id.to_string(),
            status: DeviceStatus::Online,
            address: "10.0.0.1".to_string(),
            name: id.to_string(),
            dialect: None,
            telemetry: Telemetry::default(),
            alarms: Vec::new(),
            device_info: None,
            cycle,
            timestamp: Utc::now(),
        }
    }

    #[derive(Default)]
    struct CountingSink(AtomicUsize);

    #[async_trait]
    impl SnapshotSink for CountingSink {
        async fn write(&self, _: &TelemetrySnapshot) -> WriteOutcome {
            self.0.fetch_add(1, Ordering::SeqCst);
            WriteOutcome::Written
        }
    }

    #[tokio::test]
    async fn publishes_to_subscribers_and_sink() {
        let sink = Arc::new(CountingSink::default());
        let publisher = SnapshotPublisher::new(Some(sink.clone()));
        let mut rx = publisher.subscribe();

        let outcome = publisher.publish(snapshot("ups-1", 1)).await;

        assert_eq!(outcome, Some(WriteOutcome::Written));
        assert_eq!(rx.recv().await.unwrap().id, "ups-1");
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_subscribers_is_not_an_error() {
        let publisher = SnapshotPublisher::new(None);
        assert_eq!(publisher.publish(snapshot("ups-1", 1)).await, None);
    }

    #[tokio::test]
    async fn slow_subscriber_loses_oldest() {
        let publisher = SnapshotPublisher::new(None);
        let mut rx = publisher.subscribe();

        for cycle in 0..(SUBSCRIBER_BUFFER as u64 + 10) {
            publisher.publish(snapshot("ups-1", cycle)).await;
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(10))
        ));
        assert_eq!(rx.recv().await.unwrap().cycle, 10);
    }
}
