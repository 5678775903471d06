//! Работа с одним устройством за один цикл

use chrono::Utc;
use std::sync::Arc;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};

use super::Inner;
use crate::collector::FetchParams;
use crate::config::DeviceConfig;
use crate::detect::DialectCapabilities;
use crate::formatter::{
    DeviceInfo, DeviceStatus, Telemetry, TelemetrySnapshot, alarms_for, normalize, threshold_alarms,
};
use crate::snmp::{Endpoint, SnmpVersion};

/// Что случилось с устройством в цикле
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOutcome {
    Online,
    Offline,
    /// Автодетект прошёл, телеметрия со следующего цикла
    Detected,
    Undetected,
    /// Автодетект отложен до конца паузы
    BackedOff,
}

/// Настроенное устройство: возможности и готовые параметры выборки
pub(super) struct Configured {
    pub caps: Arc<DialectCapabilities>,
    pub params: FetchParams,
}

/// Состояние между циклами. Пишет только задача этого же устройства.
#[derive(Default)]
pub(super) struct DeviceState {
    pub configured: Option<Configured>,
    pub device_info: Option<DeviceInfo>,
    pub consecutive_failures: u32,
    pub detection_failures: u32,
    pub next_detection_at: Option<Instant>,
}

impl Inner {
    fn endpoint(&self, device: &DeviceConfig, caps: &DialectCapabilities) -> Endpoint {
        Endpoint {
            address: device.address.clone(),
            port: device.port.unwrap_or(self.settings.snmp.port),
            community: caps.community.clone(),
            version: caps.version,
            timeout: self.settings.snmp.timeout(),
            retries: self.settings.snmp.retries,
        }
    }

    fn install(&self, state: &mut DeviceState, device: &DeviceConfig, caps: DialectCapabilities) {
        let params = caps.fetch_params(self.endpoint(device, &caps));
        state.configured = Some(Configured {
            caps: Arc::new(caps),
            params,
        });
        state.consecutive_failures = 0;
    }

    pub(super) async fn poll_device(
        &self,
        device: DeviceConfig,
        state: &mut DeviceState,
        cycle: u64,
    ) -> DeviceOutcome {
        if state.configured.is_none() {
            if let Some(kind) = device.dialect {
                let community = device
                    .community
                    .clone()
                    .or_else(|| self.settings.snmp.communities.first().cloned())
                    .unwrap_or_default();
                let caps = DialectCapabilities::declared(
                    kind,
                    device.version.unwrap_or(SnmpVersion::V2c),
                    community,
                );
                self.install(state, &device, caps);
            } else {
                return self.configure(device, state, cycle).await;
            }
        }

        let Some(configured) = state.configured.as_ref() else {
            return DeviceOutcome::Undetected;
        };
        let caps = configured.caps.clone();

        let include_slow =
            cycle % self.settings.polling.slow_divisor == 0 || state.device_info.is_none();
        let groups = caps.groups_for_cycle(include_slow);
        let client = self.clients.for_dialect(caps.kind);

        // Клиент сам останавливается на дедлайне и отдаёт собранное.
        // Внешний таймаут страхует от зависшего подключения.
        let budget = self.settings.polling.device_timeout();
        let params = configured.params.with_deadline(Instant::now() + budget);
        let fetched = timeout(
            budget + self.settings.snmp.timeout(),
            client.fetch_raw(&params, &groups),
        )
        .await;

        let raw = match fetched {
            Ok(Ok(raw)) if !raw.is_empty() => raw,
            Ok(Ok(_)) => {
                debug!(device = %device.id, "устройство не отдало ни одного тега");
                return self.offline(device, state, cycle).await;
            }
            Ok(Err(err)) => {
                debug!(device = %device.id, error = %err, "выборка не удалась");
                return self.offline(device, state, cycle).await;
            }
            Err(_) => {
                debug!(device = %device.id, "выборка не уложилась в таймаут");
                return self.offline(device, state, cycle).await;
            }
        };

        state.consecutive_failures = 0;

        let normalized = normalize(caps.kind, &raw);
        if include_slow && !normalized.identity.is_empty() {
            state
                .device_info
                .get_or_insert_with(DeviceInfo::default)
                .merge(normalized.identity);
        }
        if let (Some(info), Some(vendor)) = (state.device_info.as_mut(), caps.vendor.as_ref()) {
            if info.manufacturer.is_none() {
                info.manufacturer = Some(vendor.clone());
            }
        }

        let mut alarms = alarms_for(caps.kind, &raw);
        alarms.extend(threshold_alarms(&normalized.telemetry, &self.settings.alarms));

        let snapshot = TelemetrySnapshot {
            id: device.id.clone(),
            status: DeviceStatus::Online,
            address: device.address.clone(),
            name: device.display_name().to_string(),
            dialect: Some(caps.kind),
            telemetry: normalized.telemetry,
            alarms,
            device_info: state.device_info.clone(),
            cycle,
            timestamp: Utc::now(),
        };
        self.publisher.publish(snapshot).await;

        DeviceOutcome::Online
    }

    /// Автодетект. Успех занимает цикл целиком, снапшот не публикуется.
    async fn configure(&self, device: DeviceConfig, state: &mut DeviceState, cycle: u64) -> DeviceOutcome {
        if let Some(at) = state.next_detection_at {
            if Instant::now() < at {
                self.publish_offline(&device, state, cycle).await;
                return DeviceOutcome::BackedOff;
            }
        }

        let port = device.port.unwrap_or(self.settings.snmp.port);
        let detected = timeout(
            self.settings.polling.detection_timeout(),
            self.detector
                .detect_preferring(&device.address, port, device.community.as_deref()),
        )
        .await;

        match detected {
            Ok(Ok(caps)) => {
                state.detection_failures = 0;
                state.next_detection_at = None;
                if let Err(err) = self.registry.record_dialect(&device.id, caps.kind).await {
                    warn!(device = %device.id, error = %err, "не удалось записать диалект в реестр");
                }
                info!(device = %device.id, dialect = %caps.kind, version = %caps.version, "устройство настроено");
                self.install(state, &device, caps);
                DeviceOutcome::Detected
            }
            failed => {
                let reason = match failed {
                    Ok(Err(err)) => err.to_string(),
                    _ => "таймаут автодетекта".to_string(),
                };
                state.detection_failures += 1;
                let backoff = self.settings.detection.backoff(state.detection_failures);
                state.next_detection_at = Some(Instant::now() + backoff);
                warn!(
                    device = %device.id,
                    failures = state.detection_failures,
                    retry_in_secs = backoff.as_secs(),
                    "автодетект не удался: {}",
                    reason
                );
                self.publish_offline(&device, state, cycle).await;
                DeviceOutcome::Undetected
            }
        }
    }

    async fn offline(&self, device: DeviceConfig, state: &mut DeviceState, cycle: u64) -> DeviceOutcome {
        state.consecutive_failures += 1;

        let declared = state
            .configured
            .as_ref()
            .is_some_and(|c| c.caps.declared);
        if !declared && state.consecutive_failures >= self.settings.polling.rediscover_after {
            info!(
                device = %device.id,
                cycles = state.consecutive_failures,
                "устройство молчит, повторим автодетект"
            );
            state.configured = None;
            state.consecutive_failures = 0;
        }

        self.publish_offline(&device, state, cycle).await;
        DeviceOutcome::Offline
    }

    async fn publish_offline(&self, device: &DeviceConfig, state: &DeviceState, cycle: u64) {
        let snapshot = TelemetrySnapshot {
            id: device.id.clone(),
            status: DeviceStatus::Offline,
            address: device.address.clone(),
            name: device.display_name().to_string(),
            dialect: state.configured.as_ref().map(|c| c.caps.kind),
            telemetry: Telemetry::default(),
            alarms: Vec::new(),
            device_info: state.device_info.clone(),
            cycle,
            timestamp: Utc::now(),
        };
        self.publisher.publish(snapshot).await;
    }
}
