use serde::{Deserialize, Serialize};
use std::fmt;

/// Версия протокола. Порядок вариантов = порядок перебора при автодетекте
/// (сначала самая старая совместимая).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnmpVersion {
    V1,
    V2c,
}

impl SnmpVersion {
    pub const ALL: [SnmpVersion; 2] = [SnmpVersion::V1, SnmpVersion::V2c];

    pub fn supports_bulk(self) -> bool {
        matches!(self, SnmpVersion::V2c)
    }
}

impl fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnmpVersion::V1 => f.write_str("SNMPv1"),
            SnmpVersion::V2c => f.write_str("SNMPv2c"),
        }
    }
}
