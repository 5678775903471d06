//! Автодетект: по одному адресу подбирает версию, community и диалект.
//!
//! Перебор детерминированный и останавливается на первом успехе, поэтому
//! повторный запуск против того же устройства даёт тот же результат.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::collector::RawMap;
use crate::collector::scalar_collector::{ReadProgress, read_scalars};
use crate::profiles::DialectKind;
use crate::snmp::{Connector, Endpoint, SYS_DESCR, SYS_OBJECT_ID, SnmpVersion, TagReader};

pub mod capabilities;

pub use capabilities::{DialectCapabilities, vendor_hint};

/// Минимум ответивших стандартных проб, чтобы считать устройство UPS-MIB
const STANDARD_QUORUM: usize = 2;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("{address}: ни одна комбинация версии и community не ответила ({attempts} попыток)")]
    NoResponse { address: String, attempts: usize },
    #[error("{address}: агент отвечает, но ни один диалект UPS не подошёл")]
    NoDialect { address: String },
}

/// Параметры перебора
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Community в порядке перебора
    pub communities: Vec<String>,
    /// Таймаут одного запроса при переборе
    pub timeout: Duration,
    pub retries: u32,
}

pub struct Detector {
    connector: Arc<dyn Connector>,
    options: DetectOptions,
}

impl Detector {
    pub fn new(connector: Arc<dyn Connector>, options: DetectOptions) -> Self {
        Self { connector, options }
    }

    pub async fn detect(&self, address: &str, port: u16) -> Result<DialectCapabilities, DetectError> {
        self.detect_preferring(address, port, None).await
    }

    /// То же, но community из реестра пробуется первой
    pub async fn detect_preferring(
        &self,
        address: &str,
        port: u16,
        preferred: Option<&str>,
    ) -> Result<DialectCapabilities, DetectError> {
        let mut communities: Vec<&str> = preferred.into_iter().collect();
        for community in &self.options.communities {
            if !communities.contains(&community.as_str()) {
                communities.push(community);
            }
        }

        let mut attempts = 0;

        for version in SnmpVersion::ALL {
            for &community in &communities {
                attempts += 1;
                let endpoint = Endpoint {
                    address: address.to_string(),
                    port,
                    community: community.to_string(),
                    version,
                    timeout: self.options.timeout,
                    retries: self.options.retries,
                };

                let mut reader = match self.connector.open(&endpoint).await {
                    Ok(reader) => reader,
                    Err(err) => {
                        debug!(address, %version, community = %community, error = %err, "сессия не открылась");
                        continue;
                    }
                };

                match reader.get(SYS_DESCR).await {
                    Ok(sys_descr) => {
                        info!(address, %version, community = %community, "агент ответил");
                        return self
                            .classify(address, version, community, reader.as_mut(), sys_descr)
                            .await;
                    }
                    Err(err) => {
                        debug!(address, %version, community = %community, error = %err, "нет ответа");
                    }
                }
            }
        }

        Err(DetectError::NoResponse {
            address: address.to_string(),
            attempts,
        })
    }

    async fn classify(
        &self,
        address: &str,
        version: SnmpVersion,
        community: &str,
        reader: &mut dyn TagReader,
        sys_descr: Option<String>,
    ) -> Result<DialectCapabilities, DetectError> {
        let mut progress = ReadProgress::default();
        progress.answered();

        let sys_object_id = probe(reader, &[SYS_OBJECT_ID], &mut progress)
            .await
            .remove(SYS_OBJECT_ID);

        let standard = probe(reader, &oids(DialectKind::Standard.probe_tags()), &mut progress).await;
        let enterprise = probe(reader, &oids(DialectKind::Enterprise.probe_tags()), &mut progress).await;
        debug!(
            address,
            standard = standard.len(),
            enterprise = enterprise.len(),
            "пробы диалектов"
        );

        let (kind, layered) = if standard.len() >= STANDARD_QUORUM {
            (DialectKind::Standard, !enterprise.is_empty())
        } else if !enterprise.is_empty() {
            (DialectKind::Enterprise, false)
        } else {
            let minimal = probe(reader, &oids(DialectKind::Minimal.probe_tags()), &mut progress).await;
            if !minimal.is_empty() {
                (DialectKind::Minimal, false)
            } else if !standard.is_empty() {
                (DialectKind::Standard, false)
            } else {
                return Err(DetectError::NoDialect {
                    address: address.to_string(),
                });
            }
        };

        // Полный скан: дальше опрашиваем только то, что ответило
        let mut tables = vec![kind];
        if layered {
            tables.push(DialectKind::Enterprise);
        }

        let mut groups = BTreeSet::new();
        let mut working_tags = BTreeSet::new();
        for table in tables {
            let found = probe(reader, &oids(table.tags().iter()), &mut progress).await;
            for oid in found.into_keys() {
                if let Some(tag) = table.find(&oid) {
                    groups.insert(tag.group);
                }
                working_tags.insert(oid);
            }
        }

        let vendor = sys_object_id.as_deref().and_then(vendor_hint).map(str::to_string);

        info!(
            address,
            dialect = %kind,
            layered,
            tags = working_tags.len(),
            vendor = vendor.as_deref().unwrap_or("-"),
            "диалект определён"
        );

        Ok(DialectCapabilities {
            kind,
            version,
            community: community.to_string(),
            groups,
            working_tags,
            layered,
            declared: false,
            sys_descr,
            sys_object_id,
            vendor,
        })
    }
}

fn oids(tags: impl Iterator<Item = &'static crate::profiles::Tag>) -> Vec<&'static str> {
    tags.map(|t| t.oid).collect()
}

/// Поштучное чтение. Молчание тега на этом этапе = тега нет.
async fn probe(reader: &mut dyn TagReader, oids: &[&'static str], progress: &mut ReadProgress) -> RawMap {
    let mut raw = RawMap::new();
    if let Err(err) = read_scalars(reader, oids, &mut raw, progress).await {
        debug!(error = %err, "проба прервана");
    }
    raw
}
