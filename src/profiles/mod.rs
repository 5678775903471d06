//! Статические таблицы тегов для каждого диалекта.
//!
//! Таблицы только читаются; их корректность проверяется один раз при старте
//! через [`validate_tables`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::snmp::parse_oid;

pub mod decoders;
pub mod enterprise;
pub mod minimal;
pub mod standard;

pub use decoders::Decoder;

/// Диалект, на котором говорит устройство
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// RFC 1628 UPS-MIB
    Standard,
    /// Полный регистровый набор производителя (INVT, enterprise 56788)
    Enterprise,
    /// 5-8 тегов Megatec/Voltronic для урезанных прошивок
    Minimal,
}

impl DialectKind {
    pub const ALL: [DialectKind; 3] = [
        DialectKind::Standard,
        DialectKind::Enterprise,
        DialectKind::Minimal,
    ];

    pub fn tags(self) -> &'static [Tag] {
        match self {
            DialectKind::Standard => standard::TAGS,
            DialectKind::Enterprise => enterprise::TAGS,
            DialectKind::Minimal => minimal::TAGS,
        }
    }

    pub fn alarm_table(self) -> &'static [AlarmTag] {
        match self {
            DialectKind::Enterprise => enterprise::ALARMS,
            DialectKind::Standard | DialectKind::Minimal => &[],
        }
    }

    /// Теги, по которым автодетект оценивает поддержку диалекта
    pub fn probe_tags(self) -> impl Iterator<Item = &'static Tag> {
        self.tags().iter().filter(|t| t.probe)
    }

    pub fn tags_in(self, groups: &[TagGroup]) -> impl Iterator<Item = &'static Tag> + '_ {
        self.tags().iter().filter(move |t| groups.contains(&t.group))
    }

    pub fn find(self, oid: &str) -> Option<&'static Tag> {
        self.tags().iter().find(|t| t.oid == oid)
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialectKind::Standard => f.write_str("standard"),
            DialectKind::Enterprise => f.write_str("enterprise"),
            DialectKind::Minimal => f.write_str("minimal"),
        }
    }
}

/// Именованная группа тегов
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagGroup {
    Identification,
    Battery,
    Input,
    Output,
    Status,
    Alarms,
    EnterpriseExtra,
}

impl TagGroup {
    /// Опрашиваются каждый цикл
    pub const FAST: [TagGroup; 6] = [
        TagGroup::Battery,
        TagGroup::Input,
        TagGroup::Output,
        TagGroup::Status,
        TagGroup::Alarms,
        TagGroup::EnterpriseExtra,
    ];
    /// Опрашиваются раз в N циклов
    pub const SLOW: [TagGroup; 1] = [TagGroup::Identification];

    pub fn is_slow(self) -> bool {
        Self::SLOW.contains(&self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    L1,
    L2,
    L3,
}

/// Поле канонической записи, в которое попадает значение тега
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Manufacturer,
    Model,
    Serial,
    Firmware,
    BatteryType,
    /// Число фаз, как его сообщает само устройство (1 или 3)
    InputPhases,
    OutputPhases,
    InputVoltage(Phase),
    InputCurrent(Phase),
    InputFrequency,
    InputPower,
    InputLineBads,
    OutputVoltage(Phase),
    OutputCurrent(Phase),
    OutputLoad(Phase),
    OutputFrequency,
    OutputActivePower,
    OutputApparentPower,
    OutputPowerFactor,
    BypassVoltage(Phase),
    BypassCurrent(Phase),
    BypassFrequency,
    BatteryVoltage,
    BatteryCurrent,
    BatteryCharge,
    BatteryRuntime,
    BatteryTemperature,
    SecondsOnBattery,
    PowerSource,
    BatteryStatus,
    Connection,
    MaintenanceBreaker,
    BatteryTestResult,
    AlarmsPresent,
    /// Бит в карте аварий; разбирается экстрактором аварий, не нормализатором
    AlarmFlag,
}

impl Field {
    pub fn is_identity(self) -> bool {
        matches!(
            self,
            Field::Manufacturer
                | Field::Model
                | Field::Serial
                | Field::Firmware
                | Field::BatteryType
        )
    }

    /// Числовое поле (в отличие от строк идентификации и перечислений)
    pub fn is_numeric(self) -> bool {
        !self.is_identity() && self != Field::AlarmFlag
    }
}

/// Описание одного тега
#[derive(Debug, Clone, Copy)]
pub struct Tag {
    pub name: &'static str,
    pub oid: &'static str,
    pub group: TagGroup,
    pub field: Field,
    /// Множитель сырого значения (десятые доли вольта -> 0.1)
    pub scale: f64,
    pub decoder: Option<&'static Decoder>,
    pub probe: bool,
}

impl Tag {
    pub const fn new(name: &'static str, oid: &'static str, group: TagGroup, field: Field) -> Self {
        Self {
            name,
            oid,
            group,
            field,
            scale: 1.0,
            decoder: None,
            probe: false,
        }
    }

    pub const fn scaled(self, scale: f64) -> Self {
        Self { scale, ..self }
    }

    pub const fn decoded(self, decoder: &'static Decoder) -> Self {
        Self {
            decoder: Some(decoder),
            ..self
        }
    }

    pub const fn probe(self) -> Self {
        Self { probe: true, ..self }
    }
}

/// Метка для бита аварии
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmTag {
    pub code: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("{dialect}: тег {name} имеет невалидный OID {oid}")]
    InvalidOid {
        dialect: DialectKind,
        name: &'static str,
        oid: &'static str,
    },
    #[error("{dialect}: тег {name} имеет недопустимый множитель {scale}")]
    InvalidScale {
        dialect: DialectKind,
        name: &'static str,
        scale: f64,
    },
    #[error("OID {0} объявлен дважды")]
    DuplicateOid(&'static str),
    #[error("декодер {decoder}: код {code} объявлен дважды")]
    DuplicateCode { decoder: &'static str, code: i64 },
    #[error("{dialect}: метка аварии {code} не соответствует тегу группы alarms")]
    OrphanAlarm {
        dialect: DialectKind,
        code: &'static str,
    },
}

/// Проверяет все таблицы. Ошибка здесь фатальна для запуска.
pub fn validate_tables() -> Result<(), ProfileError> {
    let mut seen = HashSet::new();

    for dialect in DialectKind::ALL {
        for tag in dialect.tags() {
            if parse_oid(tag.oid).is_err() {
                return Err(ProfileError::InvalidOid {
                    dialect,
                    name: tag.name,
                    oid: tag.oid,
                });
            }
            if !tag.scale.is_finite() || tag.scale == 0.0 {
                return Err(ProfileError::InvalidScale {
                    dialect,
                    name: tag.name,
                    scale: tag.scale,
                });
            }
            // OID уникальны и между таблицами: стандартный клиент может
            // смешивать теги двух диалектов в одной выборке
            if !seen.insert(tag.oid) {
                return Err(ProfileError::DuplicateOid(tag.oid));
            }
            if let Some(decoder) = tag.decoder {
                decoder.validate()?;
            }
        }

        for alarm in dialect.alarm_table() {
            let known = dialect
                .find(alarm.code)
                .is_some_and(|t| t.group == TagGroup::Alarms);
            if !known {
                return Err(ProfileError::OrphanAlarm {
                    dialect,
                    code: alarm.code,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_are_valid() {
        validate_tables().unwrap();
    }

    #[test]
    fn minimal_dialect_stays_small() {
        let count = DialectKind::Minimal.tags().len();
        assert!((5..=8).contains(&count), "{} тегов", count);
    }

    #[test]
    fn every_dialect_has_probe_tags() {
        for dialect in DialectKind::ALL {
            assert!(dialect.probe_tags().count() > 0, "{}", dialect);
        }
    }

    #[test]
    fn group_filter_respects_cadence() {
        let slow: Vec<_> = DialectKind::Enterprise.tags_in(&TagGroup::SLOW).collect();
        assert!(!slow.is_empty());
        assert!(slow.iter().all(|t| t.field.is_identity()));

        let fast = DialectKind::Enterprise.tags_in(&TagGroup::FAST);
        assert!(fast.into_iter().all(|t| !t.group.is_slow()));
    }

    #[test]
    fn alarm_tags_are_fetched_with_fast_groups() {
        for alarm in DialectKind::Enterprise.alarm_table() {
            let tag = DialectKind::Enterprise.find(alarm.code).unwrap();
            assert!(TagGroup::FAST.contains(&tag.group));
        }
    }
}
