use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::collector::FetchParams;
use crate::profiles::{DialectKind, TagGroup};
use crate::snmp::{Endpoint, SnmpVersion};

/// Результат автодетекта: чем и как разговаривать с устройством
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialectCapabilities {
    pub kind: DialectKind,
    pub version: SnmpVersion,
    pub community: String,
    /// Группы, в которых ответил хотя бы один тег
    pub groups: BTreeSet<TagGroup>,
    /// Теги, ответившие при сканировании. Пусто для объявленного диалекта.
    pub working_tags: BTreeSet<String>,
    /// Стандартный диалект плюс ответившие теги производителя
    pub layered: bool,
    /// Диалект взят из реестра, сканирования не было
    pub declared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sys_descr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sys_object_id: Option<String>,
    /// Производитель по номеру enterprise из sysObjectID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
}

impl DialectCapabilities {
    /// Возможности для диалекта, объявленного в реестре: вся таблица тегов
    pub fn declared(kind: DialectKind, version: SnmpVersion, community: impl Into<String>) -> Self {
        Self {
            kind,
            version,
            community: community.into(),
            groups: kind.tags().iter().map(|t| t.group).collect(),
            working_tags: BTreeSet::new(),
            layered: false,
            declared: true,
            sys_descr: None,
            sys_object_id: None,
            vendor: None,
        }
    }

    pub fn responds(&self, group: TagGroup) -> bool {
        self.groups.contains(&group)
    }

    /// Группы для цикла: быстрые всегда, медленные по флагу
    pub fn groups_for_cycle(&self, include_slow: bool) -> Vec<TagGroup> {
        TagGroup::FAST
            .iter()
            .chain(TagGroup::SLOW.iter().filter(|_| include_slow))
            .copied()
            .filter(|g| self.responds(*g))
            .collect()
    }

    /// Параметры выборки с рабочим набором тегов
    pub fn fetch_params(&self, endpoint: Endpoint) -> FetchParams {
        let mut params = FetchParams::new(endpoint);
        params.layered = self.layered;
        if !self.declared {
            params.working_tags = Some(Arc::new(self.working_tags.clone()));
        }
        params
    }
}

/// Известные номера enterprise (1.3.6.1.4.1.N)
const VENDORS: &[(u32, &str)] = &[
    (318, "APC"),
    (534, "Eaton"),
    (935, "Megatec/Voltronic"),
    (56788, "INVT"),
];

pub fn vendor_hint(sys_object_id: &str) -> Option<&'static str> {
    let number: u32 = sys_object_id
        .trim_start_matches('.')
        .strip_prefix("1.3.6.1.4.1.")?
        .split('.')
        .next()?
        .parse()
        .ok()?;

    VENDORS
        .iter()
        .find(|(n, _)| *n == number)
        .map(|(_, name)| *name)
}
