use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;

use crate::profiles::DialectKind;
use crate::snmp::SnmpVersion;

/// Запись реестра об одном ИБП
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub address: String,
    /// `None` = порт из настроек SNMP
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub community: Option<String>,
    #[serde(default)]
    pub version: Option<SnmpVersion>,
    /// Диалект, заданный оператором. Если задан, автодетект не запускается.
    #[serde(default)]
    pub dialect: Option<DialectKind>,
    /// Диалект, найденный автодетектом (пишется обратно один раз)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_dialect: Option<DialectKind>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl DeviceConfig {
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            address: address.into(),
            port: None,
            community: None,
            version: None,
            dialect: None,
            detected_dialect: None,
            enabled: true,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }
}

/// Внешний реестр устройств. Подсистема его только читает, кроме
/// однократной записи найденного диалекта.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn devices(&self) -> Result<Vec<DeviceConfig>>;

    async fn record_dialect(&self, id: &str, kind: DialectKind) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    devices: Vec<DeviceConfig>,
}

/// Реестр в памяти, загружается из YAML
#[derive(Debug, Default)]
pub struct StaticRegistry {
    devices: RwLock<Vec<DeviceConfig>>,
}

impl StaticRegistry {
    pub fn new(devices: Vec<DeviceConfig>) -> Self {
        Self {
            devices: RwLock::new(devices),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Не удалось прочитать файл: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: RegistryFile =
            serde_yml::from_str(content).context("Не удалось распарсить YAML реестра")?;

        let mut seen = HashSet::new();
        for device in &file.devices {
            if !seen.insert(device.id.as_str()) {
                anyhow::bail!("Устройство '{}' объявлено дважды", device.id);
            }
            if device.address.trim().is_empty() {
                anyhow::bail!("У устройства '{}' пустой адрес", device.id);
            }
        }

        Ok(Self::new(file.devices))
    }
}

#[async_trait]
impl DeviceRegistry for StaticRegistry {
    async fn devices(&self) -> Result<Vec<DeviceConfig>> {
        Ok(self.devices.read().await.clone())
    }

    async fn record_dialect(&self, id: &str, kind: DialectKind) -> Result<()> {
        let mut devices = self.devices.write().await;
        let device = devices
            .iter_mut()
            .find(|d| d.id == id)
            .with_context(|| format!("Устройство '{}' не найдено в реестре", id))?;

        if device.detected_dialect != Some(kind) {
            info!(device = id, dialect = %kind, "диалект записан в реестр");
            device.detected_dialect = Some(kind);
        }
        Ok(())
    }
}
