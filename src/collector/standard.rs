use async_trait::async_trait;
use std::sync::Arc;

use super::scalar_collector::{ReadProgress, read_scalars};
use super::types::{FetchParams, RawMap};
use super::DialectClient;
use crate::profiles::{DialectKind, TagGroup};
use crate::snmp::{Connector, FetchError};

/// Клиент UPS-MIB. Терпим к пропущенным тегам: старые прошивки отдают не всё.
pub struct StandardClient {
    connector: Arc<dyn Connector>,
}

impl StandardClient {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl DialectClient for StandardClient {
    fn kind(&self) -> DialectKind {
        DialectKind::Standard
    }

    async fn fetch_raw(&self, params: &FetchParams, groups: &[TagGroup]) -> Result<RawMap, FetchError> {
        let mut tags = params.plan(DialectKind::Standard, groups);
        if params.layered {
            // Некоторые устройства отвечают на оба набора
            tags.extend(params.plan(DialectKind::Enterprise, groups));
        }

        let mut reader = self.connector.open(&params.endpoint).await?;
        let mut raw = RawMap::new();
        let mut progress = ReadProgress::until(params.deadline);

        let oids: Vec<&'static str> = tags.iter().map(|t| t.oid).collect();
        read_scalars(reader.as_mut(), &oids, &mut raw, &mut progress).await?;
        progress.finish()?;

        Ok(raw)
    }
}
