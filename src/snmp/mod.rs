use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod oid;
pub mod session;
pub mod value;
pub mod version;

pub use oid::{parent_oid, parse_oid};
pub use session::{SnmpConnector, SnmpSession};
pub use version::SnmpVersion;

/// sysDescr: отвечает любой SNMP-агент, используется для проверки связи
pub const SYS_DESCR: &str = "1.3.6.1.2.1.1.1.0";
/// sysObjectID: идентификатор агента, из него берём номер производителя
pub const SYS_OBJECT_ID: &str = "1.3.6.1.2.1.1.2.0";

/// Ошибки опроса устройства
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("таймаут SNMP запроса к {0}")]
    Timeout(String),
    #[error("ошибка транспорта SNMP: {0}")]
    Transport(String),
    #[error("невалидный OID: {0}")]
    InvalidTag(String),
    #[error("групповой запрос отклонён: {0}")]
    BatchRejected(String),
    #[error("групповые запросы не поддерживаются в SNMPv1")]
    BatchUnsupported,
}

impl FetchError {
    /// Устройство не ответило вообще (в отличие от "тег не поддерживается")
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Timeout(_) | FetchError::Transport(_))
    }
}

/// Параметры подключения к одному агенту
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
    pub community: String,
    pub version: SnmpVersion,
    pub timeout: Duration,
    pub retries: u32,
}

impl Endpoint {
    pub fn target(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Чтение значений тегов с одного агента.
///
/// `Ok(None)` означает, что агент ответил, но тег не поддерживает
/// (noSuchObject, noSuchInstance, ненулевой error-status).
#[async_trait]
pub trait TagReader: Send {
    async fn get(&mut self, oid: &str) -> Result<Option<String>, FetchError>;

    /// Групповое чтение. Возвращает только теги, на которые агент ответил.
    async fn get_many(&mut self, oids: &[&str]) -> Result<Vec<(String, String)>, FetchError>;
}

/// Фабрика сессий. Отдельный трейт нужен, чтобы подменять сеть в тестах.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, endpoint: &Endpoint) -> Result<Box<dyn TagReader>, FetchError>;
}
