use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::timeout_at;
use tracing::debug;

use super::scalar_collector::{ReadProgress, read_scalars};
use super::types::{FetchParams, RawMap};
use super::DialectClient;
use crate::profiles::{DialectKind, TagGroup};
use crate::snmp::{Connector, FetchError};

/// Клиент полного набора производителя: групповые запросы с откатом
/// на поштучное чтение, если прошивка не справилась с группой
pub struct EnterpriseClient {
    connector: Arc<dyn Connector>,
    batch_size: usize,
}

impl EnterpriseClient {
    pub fn new(connector: Arc<dyn Connector>, batch_size: usize) -> Self {
        Self {
            connector,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl DialectClient for EnterpriseClient {
    fn kind(&self) -> DialectKind {
        DialectKind::Enterprise
    }

    async fn fetch_raw(&self, params: &FetchParams, groups: &[TagGroup]) -> Result<RawMap, FetchError> {
        let tags = params.plan(DialectKind::Enterprise, groups);
        let oids: Vec<&'static str> = tags.iter().map(|t| t.oid).collect();

        let mut reader = self.connector.open(&params.endpoint).await?;
        let mut raw = RawMap::new();
        let mut progress = ReadProgress::until(params.deadline);

        for chunk in oids.chunks(self.batch_size) {
            if progress.is_expired(chunk[0]) {
                break;
            }

            let batch = match progress.deadline() {
                Some(deadline) => match timeout_at(deadline, reader.get_many(chunk)).await {
                    Ok(batch) => batch,
                    Err(_) => {
                        progress.expire(chunk[0]);
                        break;
                    }
                },
                None => reader.get_many(chunk).await,
            };

            match batch {
                Ok(values) => {
                    raw.extend(values);
                    progress.answered();
                }
                Err(err) => {
                    debug!(
                        target = %params.endpoint.target(),
                        size = chunk.len(),
                        error = %err,
                        "групповой запрос не прошёл, читаем по одному"
                    );
                    if err.is_network() {
                        progress.failed(chunk[0], err)?;
                    }
                    read_scalars(reader.as_mut(), chunk, &mut raw, &mut progress).await?;
                }
            }
        }
        progress.finish()?;

        Ok(raw)
    }
}
