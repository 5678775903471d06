//! Планировщик опроса: фиксированный интервал, параллельный опрос
//! устройств с ограничением, быстрые и медленные группы тегов.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, Semaphore, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};

use crate::collector::DialectClients;
use crate::config::{DeviceRegistry, Settings};
use crate::detect::Detector;
use crate::publisher::SnapshotPublisher;

mod device;

pub use device::DeviceOutcome;
use device::DeviceState;

/// Итог одного цикла
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub online: usize,
    pub offline: usize,
    pub detected: usize,
    pub undetected: usize,
    /// Устройства, чья прошлая выборка ещё не закончилась
    pub skipped: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: DeviceOutcome) {
        match outcome {
            DeviceOutcome::Online => self.online += 1,
            DeviceOutcome::Offline => self.offline += 1,
            DeviceOutcome::Detected => self.detected += 1,
            DeviceOutcome::Undetected | DeviceOutcome::BackedOff => self.undetected += 1,
        }
    }
}

pub(crate) struct Inner {
    settings: Settings,
    registry: Arc<dyn DeviceRegistry>,
    detector: Arc<Detector>,
    clients: DialectClients,
    publisher: SnapshotPublisher,
    devices: StdMutex<HashMap<String, Arc<Mutex<DeviceState>>>>,
    limiter: Arc<Semaphore>,
    cycle: AtomicU64,
}

pub struct Scheduler {
    inner: Arc<Inner>,
    shutdown: watch::Sender<bool>,
    handle: StdMutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(
        settings: Settings,
        registry: Arc<dyn DeviceRegistry>,
        detector: Arc<Detector>,
        clients: DialectClients,
        publisher: SnapshotPublisher,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(settings.polling.max_concurrent.max(1)));
        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                settings,
                registry,
                detector,
                clients,
                publisher,
                devices: StdMutex::new(HashMap::new()),
                limiter,
                cycle: AtomicU64::new(0),
            }),
            shutdown,
            handle: StdMutex::new(None),
        }
    }

    /// Запускает цикл опроса в фоне. Повторный вызов ничего не делает.
    /// После `stop()` ни один начатый цикл больше не публикует.
    pub fn start(&self) {
        let Ok(mut handle) = self.handle.lock() else {
            return;
        };
        if handle.is_some() {
            return;
        }

        let inner = self.inner.clone();
        let mut shutdown = self.shutdown.subscribe();
        let period = inner.settings.polling.interval();

        *handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut cycles = JoinSet::new();
            info!(interval_secs = period.as_secs(), "планировщик запущен");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let cycle = inner.cycle.fetch_add(1, Ordering::SeqCst);
                        // Цикл не ждёт отстающих: следующий тик стартует вовремя
                        let inner = inner.clone();
                        cycles.spawn(async move { inner.run_cycle(cycle).await });
                    }
                    Some(done) = cycles.join_next(), if !cycles.is_empty() => {
                        log_cycle(done);
                    }
                    _ = shutdown.changed() => break,
                }
            }

            // Начатые циклы получают один бюджет выборки, остальное снимается
            let grace = inner.settings.polling.device_timeout() + inner.settings.snmp.timeout();
            let drained = timeout(grace, async {
                while let Some(done) = cycles.join_next().await {
                    log_cycle(done);
                }
            })
            .await;
            if drained.is_err() {
                warn!(cycles = cycles.len(), "циклы не уложились в остановку, прерываем");
                cycles.shutdown().await;
            }

            info!("планировщик остановлен");
        }));
    }

    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);
        let handle = self.handle.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(error = %err, "задача планировщика завершилась с ошибкой");
            }
        }
    }

    /// Прогоняет один цикл с заданным номером и ждёт все устройства
    pub async fn run_cycle(&self, cycle: u64) -> CycleReport {
        self.inner.run_cycle(cycle).await
    }

    /// Следующий цикл по внутреннему счётчику
    pub async fn tick(&self) -> CycleReport {
        let cycle = self.inner.cycle.fetch_add(1, Ordering::SeqCst);
        self.inner.run_cycle(cycle).await
    }
}

fn log_cycle(done: Result<CycleReport, JoinError>) {
    match done {
        Ok(report) => debug!(?report, "цикл завершён"),
        Err(err) => warn!(error = %err, "задача цикла завершилась с ошибкой"),
    }
}

impl Inner {
    fn state_for(&self, id: &str) -> Option<Arc<Mutex<DeviceState>>> {
        let mut devices = self.devices.lock().ok()?;
        Some(devices.entry(id.to_string()).or_default().clone())
    }

    async fn run_cycle(self: &Arc<Self>, cycle: u64) -> CycleReport {
        let mut report = CycleReport {
            cycle,
            ..Default::default()
        };

        let devices = match self.registry.devices().await {
            Ok(devices) => devices,
            Err(err) => {
                warn!(cycle, error = %err, "реестр устройств недоступен");
                return report;
            }
        };

        // Забываем устройства, которых больше нет в реестре
        if let Ok(mut states) = self.devices.lock() {
            states.retain(|id, _| devices.iter().any(|d| d.enabled && &d.id == id));
        }

        let mut tasks = JoinSet::new();
        for device in devices.into_iter().filter(|d| d.enabled) {
            let Some(state) = self.state_for(&device.id) else {
                continue;
            };
            let Ok(mut guard) = state.try_lock_owned() else {
                debug!(device = %device.id, cycle, "прошлая выборка ещё идёт, пропуск");
                report.skipped += 1;
                continue;
            };

            let inner = self.clone();
            tasks.spawn(async move {
                let _permit = inner.limiter.clone().acquire_owned().await.ok();
                inner.poll_device(device, &mut guard, cycle).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(err) => warn!(cycle, error = %err, "задача устройства упала"),
            }
        }

        report
    }
}
