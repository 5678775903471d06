use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

pub mod registry;
pub mod settings;

pub use registry::{DeviceConfig, DeviceRegistry, StaticRegistry};
pub use settings::{LogFormat, LoggingSettings, Settings};

/// Путь к конфигу по умолчанию, если не задан UPS_CONFIG
pub const DEFAULT_CONFIG_PATH: &str = "./config/ups-telemetry.yaml";

/// Главная конфигурация приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Базовые настройки
    #[serde(flatten)]
    pub settings: Settings,
    /// Файл реестра устройств
    #[serde(default = "default_devices_path")]
    pub devices_path: String,
}

fn default_devices_path() -> String {
    "./config/devices.yaml".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            devices_path: default_devices_path(),
        }
    }
}

impl AppConfig {
    /// Загружает конфигурацию из YAML файла и применяет переменные окружения.
    /// Отсутствующий файл = значения по умолчанию.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Не удалось прочитать файл: {}", path.display()))?;
            Self::from_yaml(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yml::from_str(content).context("Не удалось распарсить YAML")
    }

    /// Путь к конфигу из UPS_CONFIG или по умолчанию
    pub fn get_config_path() -> String {
        env::var("UPS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Переопределения из окружения поверх файла
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let s = &mut self.settings;
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(v) = number("UPS_POLL_INTERVAL") {
            s.polling.interval_secs = v;
        }
        if let Some(v) = number("UPS_SLOW_DIVISOR") {
            s.polling.slow_divisor = v;
        }
        if let Some(v) = number("SNMP_TIMEOUT") {
            s.snmp.timeout_ms = v;
        }
        if let Some(v) = number("SNMP_RETRIES") {
            s.snmp.retries = v as u32;
        }
        if let Some(list) = lookup("SNMP_COMMUNITIES") {
            s.snmp.communities = list
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(url) = lookup("INFLUXDB_URL") {
            s.sink.url = url;
            s.sink.enabled = true;
        }
        if let Some(token) = lookup("INFLUXDB_TOKEN") {
            s.sink.token = token;
        }
        if let Some(org) = lookup("INFLUXDB_ORG") {
            s.sink.org = org;
        }
        if let Some(bucket) = lookup("INFLUXDB_BUCKET") {
            s.sink.bucket = bucket;
        }
        if let Some(bind) = lookup("UPS_HTTP_BIND") {
            s.http.bind = bind;
        }
        if let Some(path) = lookup("UPS_DEVICES") {
            self.devices_path = path;
        }
    }

    /// Ошибка здесь фатальна при старте
    pub fn validate(&self) -> Result<()> {
        let s = &self.settings;
        if s.polling.interval_secs == 0 {
            bail!("polling.interval_secs должен быть больше 0");
        }
        if s.polling.slow_divisor == 0 {
            bail!("polling.slow_divisor должен быть больше 0");
        }
        if s.polling.device_timeout_secs == 0 || s.snmp.timeout_ms == 0 {
            bail!("таймауты опроса должны быть больше 0");
        }
        if s.polling.device_timeout() < s.snmp.request_budget() {
            bail!(
                "polling.device_timeout_secs ({} с) меньше бюджета одного тега ({} мс x {} попыток)",
                s.polling.device_timeout_secs,
                s.snmp.timeout_ms,
                s.snmp.retries + 1
            );
        }
                if s.polling.max_concurrent == 0 {
            bail!("polling.max_concurrent должен быть больше 0");
        }
        if s.snmp.communities.is_empty() {
            bail!("список snmp.communities пуст");
        }
        if s.sink.enabled && s.sink.url.trim().is_empty() {
            bail!("sink.url обязателен при sink.enabled");
        }
        Ok(())
    }

    pub fn debug_config(&self) {
        let s = &self.settings;
        tracing::debug!(
            interval_secs = s.polling.interval_secs,
            slow_divisor = s.polling.slow_divisor,
            communities = s.snmp.communities.len(),
            sink = s.sink.enabled,
            devices = %self.devices_path,
            "конфигурация загружена"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.settings.polling.interval_secs, 5);
        assert_eq!(config.settings.polling.slow_divisor, 12);
        assert_eq!(config.settings.sink.backoff_secs, 60);
        assert_eq!(config.settings.snmp.communities[0], "public");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml(
            "polling:\n  interval_secs: 10\nsnmp:\n  communities: [ups]\nlogging:\n  format: json\n",
        )
        .unwrap();

        assert_eq!(config.settings.polling.interval_secs, 10);
        assert_eq!(config.settings.polling.slow_divisor, 12);
        assert_eq!(config.settings.snmp.communities, vec!["ups".to_string()]);
        assert_eq!(config.settings.logging.format, LogFormat::Json);
        assert_eq!(config.devices_path, "./config/devices.yaml");
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("UPS_POLL_INTERVAL", "2"),
            ("SNMP_COMMUNITIES", "ups, monitor,,"),
            ("INFLUXDB_URL", "http://influx:8086"),
            ("SNMP_RETRIES", "oops"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.settings.polling.interval_secs, 2);
        assert_eq!(config.settings.snmp.communities, vec!["ups", "monitor"]);
        assert!(config.settings.sink.enabled);
        assert_eq!(config.settings.snmp.retries, 1);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = AppConfig::default();
        config.settings.polling.slow_divisor = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.settings.snmp.communities.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.settings.polling.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn device_budget_must_cover_one_tag_with_retries() {
        let mut config = AppConfig::default();
        config.settings.snmp.timeout_ms = 2000;
        config.settings.snmp.retries = 2;
        config.settings.polling.device_timeout_secs = 4;
        assert!(config.validate().is_err());

        config.settings.polling.device_timeout_secs = 6;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "polling:\n  slow_divisor: 6\ndevices_path: /etc/ups/devices.yaml").unwrap();

        let config = AppConfig::load(file.path()).unwrap();

        assert_eq!(config.settings.polling.slow_divisor, 6);
        assert!(config.devices_path.ends_with("devices.yaml"));
    }
}
