use tokio::time::{Instant, timeout_at};
use tracing::debug;

use super::types::RawMap;
use crate::snmp::{FetchError, TagReader};

/// Сколько сетевых отказов подряд терпим, пока устройство не ответило ни разу
const ABORT_AFTER_SILENT_FAILURES: usize = 2;

/// Учёт ответов в рамках одной выборки.
///
/// Отличает "устройство молчит" от "устройство ответило, но тега нет".
/// С дедлайном новые запросы после него не уходят, собранное сохраняется.
#[derive(Debug, Default)]
pub struct ReadProgress {
    answered: usize,
    consecutive_failures: usize,
    last_network_error: Option<FetchError>,
    deadline: Option<Instant>,
    expired: bool,
}

impl ReadProgress {
    pub fn until(deadline: Option<Instant>) -> Self {
        Self {
            deadline,
            ..Self::default()
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn answered(&mut self) {
        self.answered += 1;
        self.consecutive_failures = 0;
    }

    /// Фиксирует отказ. `Err` = выборку пора прекращать.
    pub fn failed(&mut self, oid: &str, err: FetchError) -> Result<(), FetchError> {
        if !err.is_network() {
            debug!(oid, error = %err, "тег пропущен");
            return Ok(());
        }
        self.consecutive_failures += 1;
        if self.answered == 0 && self.consecutive_failures >= ABORT_AFTER_SILENT_FAILURES {
            return Err(err);
        }
        debug!(oid, error = %err, "сетевой отказ на теге");
        self.last_network_error = Some(err);
        Ok(())
    }

    /// Истёк ли бюджет выборки. Первое срабатывание считается сетевым отказом.
    pub fn is_expired(&mut self, oid: &str) -> bool {
        if self.expired {
            return true;
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            self.expire(oid);
        }
        self.expired
    }

    pub fn expire(&mut self, oid: &str) {
        debug!(oid, answered = self.answered, "бюджет выборки исчерпан, остаток тегов пропущен");
        self.expired = true;
        self.last_network_error = Some(FetchError::Timeout(oid.to_string()));
    }

    pub fn finish(self) -> Result<(), FetchError> {
        match (self.answered, self.last_network_error) {
            (0, Some(err)) => Err(err),
            _ => Ok(()),
        }
    }
}

/// Читает теги по одному. Отсутствующие теги просто не попадают в `raw`.
pub async fn read_scalars(
    reader: &mut dyn TagReader,
    oids: &[&'static str],
    raw: &mut RawMap,
    progress: &mut ReadProgress,
) -> Result<(), FetchError> {
    for &oid in oids {
        if progress.is_expired(oid) {
            break;
        }

        let read = match progress.deadline() {
            Some(deadline) => match timeout_at(deadline, reader.get(oid)).await {
                Ok(read) => read,
                Err(_) => {
                    progress.expire(oid);
                    break;
                }
            },
            None => reader.get(oid).await,
        };

        match read {
            Ok(Some(value)) => {
                raw.insert(oid.to_string(), value);
                progress.answered();
            }
            Ok(None) => progress.answered(),
            Err(err) => progress.failed(oid, err)?,
        }
    }

    Ok(())
}
