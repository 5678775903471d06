use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::formatter::AlarmThresholds;

/// Цикл опроса
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Интервал цикла (секунды)
    pub interval_secs: u64,
    /// Медленные группы читаются каждый N-й цикл
    pub slow_divisor: u64,
    /// Бюджет на выборку одного устройства (секунды)
    pub device_timeout_secs: u64,
    /// Сколько устройств опрашивается одновременно
    pub max_concurrent: usize,
    /// После стольких офлайн-циклов подряд автодетект повторяется
    pub rediscover_after: u32,
    /// Бюджет на автодетект одного устройства (секунды)
    pub detection_timeout_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            slow_divisor: 12,
            device_timeout_secs: 4,
            max_concurrent: 32,
            rediscover_after: 3,
            detection_timeout_secs: 60,
        }
    }
}

impl PollingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.device_timeout_secs)
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_secs(self.detection_timeout_secs)
    }
}

/// Параметры SNMP запросов при опросе
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpSettings {
    pub port: u16,
    /// Таймаут одного запроса (мс)
    pub timeout_ms: u64,
    /// Количество повторов при таймауте
    pub retries: u32,
    /// Тегов в одном групповом запросе
    pub batch_size: usize,
    /// Community в порядке перебора при автодетекте
    pub communities: Vec<String>,
}

impl Default for SnmpSettings {
    fn default() -> Self {
        Self {
            port: 161,
            timeout_ms: 2000,
            retries: 1,
            batch_size: 10,
            communities: ["public", "private", "admin", "snmp", "manager", "ups", "monitor"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl SnmpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Худший случай для одного тега: таймаут на каждую попытку
    pub fn request_budget(&self) -> Duration {
        self.timeout() * (self.retries + 1)
    }
}

/// Автодетект и его повторы
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Таймаут одной пробы (мс), короче обычного: перебор длинный
    pub timeout_ms: u64,
    /// Первая пауза после неудачного автодетекта (секунды)
    pub backoff_secs: u64,
    /// Потолок паузы (секунды)
    pub max_backoff_secs: u64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 1500,
            backoff_secs: 60,
            max_backoff_secs: 900,
        }
    }
}

impl DetectionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Пауза перед попыткой номер `failures + 1`, удваивается до потолка
    pub fn backoff(&self, failures: u32) -> Duration {
        let factor = 1u64 << failures.saturating_sub(1).min(16);
        Duration::from_secs(
            self.backoff_secs
                .saturating_mul(factor)
                .min(self.max_backoff_secs),
        )
    }
}

/// InfluxDB v2
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkSettings {
    pub enabled: bool,
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
    /// Окно, в котором после ошибки записи не пытаемся писать (секунды)
    pub backoff_secs: u64,
    /// Таймаут HTTP запроса (секунды)
    pub timeout_secs: u64,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "http://localhost:8086".to_string(),
            token: String::new(),
            org: "ups".to_string(),
            bucket: "ups_monitoring".to_string(),
            measurement: "ups_status".to_string(),
            backoff_secs: 60,
            timeout_secs: 5,
        }
    }
}

impl SinkSettings {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub bind: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Базовые настройки приложения
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub polling: PollingSettings,
    pub snmp: SnmpSettings,
    pub detection: DetectionSettings,
    pub sink: SinkSettings,
    pub alarms: AlarmThresholds,
    pub logging: LoggingSettings,
    pub http: HttpSettings,
}
