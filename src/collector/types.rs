use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::time::Instant;

use crate::profiles::{DialectKind, Tag, TagGroup};
use crate::snmp::Endpoint;

/// Сырые ответы: OID тега -> строковое значение
pub type RawMap = BTreeMap<String, String>;

/// Параметры одной выборки
#[derive(Debug, Clone)]
pub struct FetchParams {
    pub endpoint: Endpoint,
    /// Теги, подтверждённые автодетектом. `None` = опрашивать всю таблицу.
    pub working_tags: Option<Arc<BTreeSet<String>>>,
    /// Стандартный диалект дополнительно читает ответившие теги производителя
    pub layered: bool,
    /// После этого момента новые запросы не уходят, выборка отдаёт собранное
    pub deadline: Option<Instant>,
}

impl FetchParams {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            working_tags: None,
            layered: false,
            deadline: None,
        }
    }

    /// Копия параметров с бюджетом на одну выборку
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// Теги диалекта из запрошенных групп, отфильтрованные по рабочему набору
    pub fn plan(&self, dialect: DialectKind, groups: &[TagGroup]) -> Vec<&'static Tag> {
        dialect
            .tags_in(groups)
            .filter(|tag| match &self.working_tags {
                Some(working) => working.contains(tag.oid),
                None => true,
            })
            .collect()
    }
}
