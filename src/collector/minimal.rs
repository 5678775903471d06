use async_trait::async_trait;
use std::sync::Arc;

use super::scalar_collector::{ReadProgress, read_scalars};
use super::types::{FetchParams, RawMap};
use super::DialectClient;
use crate::profiles::{DialectKind, TagGroup};
use crate::snmp::{Connector, FetchError};

/// Клиент для урезанных прошивок. Групповые запросы на них не работают,
/// поэтому только поштучно.
pub struct MinimalClient {
    connector: Arc<dyn Connector>,
}

impl MinimalClient {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

/// Снисходительный разбор числа: выкидывает всё кроме цифр и точки,
/// при полном провале возвращает 0
pub fn lenient_number(raw: &str) -> f64 {
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    clean.parse::<f64>().unwrap_or(0.0)
}

#[async_trait]
impl DialectClient for MinimalClient {
    fn kind(&self) -> DialectKind {
        DialectKind::Minimal
    }

    async fn fetch_raw(&self, params: &FetchParams, groups: &[TagGroup]) -> Result<RawMap, FetchError> {
        let tags = params.plan(DialectKind::Minimal, groups);

        let mut reader = self.connector.open(&params.endpoint).await?;
        let mut raw = RawMap::new();
        let mut progress = ReadProgress::until(params.deadline);

        let oids: Vec<&'static str> = tags.iter().map(|t| t.oid).collect();
        read_scalars(reader.as_mut(), &oids, &mut raw, &mut progress).await?;
        progress.finish()?;

        // Строки идентификации не трогаем, числовые чистим
        for tag in &tags {
            if !tag.field.is_numeric() {
                continue;
            }
            if let Some(value) = raw.get_mut(tag.oid) {
                *value = lenient_number(value).to_string();
            }
        }

        Ok(raw)
    }
}
