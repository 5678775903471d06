use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{SnapshotSink, WriteOutcome};
use crate::formatter::TelemetrySnapshot;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("подключение к синку не удалось: {0}")]
    Connect(String),
    #[error("запись в синк не удалась: {0}")]
    Write(String),
}

/// Низкоуровневый писатель временных рядов
#[async_trait]
pub trait TimeSeriesWriter: Send {
    async fn connect(&mut self) -> Result<(), SinkError>;

    async fn write(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), SinkError>;

    /// Сбросить соединение: следующая запись начнёт с `connect`
    fn reset(&mut self);
}

struct BreakerState<W> {
    writer: W,
    connected: bool,
    last_failure: Option<Instant>,
}

/// Автомат защиты над писателем. После ошибки записи в течение окна
/// все записи отбрасываются без обращения к сети, без буферизации.
pub struct SinkAdapter<W> {
    state: Mutex<BreakerState<W>>,
    backoff: Duration,
}

impl<W: TimeSeriesWriter> SinkAdapter<W> {
    pub fn new(writer: W, backoff: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState {
                writer,
                connected: false,
                last_failure: None,
            }),
            backoff,
        }
    }

    pub async fn is_open(&self) -> bool {
        let state = self.state.lock().await;
        self.in_backoff(&state)
    }

    fn in_backoff(&self, state: &BreakerState<W>) -> bool {
        state
            .last_failure
            .is_some_and(|at| at.elapsed() < self.backoff)
    }

    fn trip(state: &mut BreakerState<W>) {
        state.last_failure = Some(Instant::now());
        state.connected = false;
        state.writer.reset();
    }
}

#[async_trait]
impl<W: TimeSeriesWriter> SnapshotSink for SinkAdapter<W> {
    async fn write(&self, snapshot: &TelemetrySnapshot) -> WriteOutcome {
        let mut state = self.state.lock().await;

        if self.in_backoff(&state) {
            debug!(device = %snapshot.id, "синк в паузе, снапшот отброшен");
            return WriteOutcome::Skipped;
        }

        if !state.connected {
            if let Err(err) = state.writer.connect().await {
                warn!(error = %err, backoff_secs = self.backoff.as_secs(), "синк недоступен");
                Self::trip(&mut state);
                return WriteOutcome::Failed;
            }
            state.connected = true;
            if state.last_failure.take().is_some() {
                info!("синк снова доступен");
            }
        }

        match state.writer.write(snapshot).await {
            Ok(()) => {
                state.last_failure = None;
                WriteOutcome::Written
            }
            Err(err) => {
                warn!(device = %snapshot.id, error = %err, "запись в синк не удалась");
                Self::trip(&mut state);
                WriteOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{DeviceStatus, Telemetry};
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct Probe {
        connects: AtomicUsize,
        writes: AtomicUsize,
        resets: AtomicUsize,
        failing: AtomicBool,
    }

    struct MockWriter(Arc<Probe>);

    #[async_trait]
    impl TimeSeriesWriter for MockWriter {
        async fn connect(&mut self) -> Result<(), SinkError> {
            self.0.connects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn write(&mut self, _: &TelemetrySnapshot) -> Result<(), SinkError> {
            self.0.writes.fetch_add(1, Ordering::SeqCst);
            if self.0.failing.load(Ordering::SeqCst) {
                Err(SinkError::Write("boom".into()))
            } else {
                Ok(())
            }
        }

        fn reset(&mut self) {
            self.0.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot {
            id: "ups-1".into(),
            status: DeviceStatus::Online,
            address: "10.0.0.1".into(),
            name: "ups-1".into(),
            dialect: None,
            telemetry: Telemetry::default(),
            alarms: Vec::new(),
            device_info: None,
            cycle: 0,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn breaker_skips_inside_window_and_retries_after() {
        let probe = Arc::new(Probe::default());
        let adapter = SinkAdapter::new(MockWriter(probe.clone()), Duration::from_secs(60));

        probe.failing.store(true, Ordering::SeqCst);
        assert_eq!(adapter.write(&snapshot()).await, WriteOutcome::Failed);
        assert_eq!(probe.writes.load(Ordering::SeqCst), 1);
        assert_eq!(probe.resets.load(Ordering::SeqCst), 1);
        probe.failing.store(false, Ordering::SeqCst);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(adapter.write(&snapshot()).await, WriteOutcome::Skipped);
        assert_eq!(probe.writes.load(Ordering::SeqCst), 1);
        assert!(adapter.is_open().await);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(adapter.write(&snapshot()).await, WriteOutcome::Written);
        assert_eq!(probe.writes.load(Ordering::SeqCst), 2);
        assert!(!adapter.is_open().await);
    }

    #[tokio::test]
    async fn failed_write_forces_reconnect() {
        let probe = Arc::new(Probe::default());
        let adapter = SinkAdapter::new(MockWriter(probe.clone()), Duration::ZERO);

        adapter.write(&snapshot()).await;
        adapter.write(&snapshot()).await;
        assert_eq!(probe.connects.load(Ordering::SeqCst), 1);

        probe.failing.store(true, Ordering::SeqCst);
        adapter.write(&snapshot()).await;
        probe.failing.store(false, Ordering::SeqCst);
        adapter.write(&snapshot()).await;

        assert_eq!(probe.connects.load(Ordering::SeqCst), 2);
        assert_eq!(probe.writes.load(Ordering::SeqCst), 4);
    }
}
