use async_trait::async_trait;
use std::sync::Arc;

use crate::profiles::{DialectKind, TagGroup};
use crate::snmp::{Connector, FetchError};

pub mod enterprise;
pub mod minimal;
pub mod scalar_collector;
pub mod standard;
pub mod types;

pub use enterprise::EnterpriseClient;
pub use minimal::{MinimalClient, lenient_number};
pub use standard::StandardClient;
pub use types::{FetchParams, RawMap};

/// Общий контракт клиентов диалектов.
///
/// Отказ отдельного тега никогда не ошибка: в результат попадает то, что
/// ответило. `Err` означает, что устройство не ответило вообще.
#[async_trait]
pub trait DialectClient: Send + Sync {
    fn kind(&self) -> DialectKind;

    async fn fetch_raw(&self, params: &FetchParams, groups: &[TagGroup]) -> Result<RawMap, FetchError>;
}

/// Набор клиентов всех диалектов поверх одного коннектора
#[derive(Clone)]
pub struct DialectClients {
    standard: Arc<StandardClient>,
    enterprise: Arc<EnterpriseClient>,
    minimal: Arc<MinimalClient>,
}

impl DialectClients {
    pub fn new(connector: Arc<dyn Connector>, batch_size: usize) -> Self {
        Self {
            standard: Arc::new(StandardClient::new(connector.clone())),
            enterprise: Arc::new(EnterpriseClient::new(connector.clone(), batch_size)),
            minimal: Arc::new(MinimalClient::new(connector)),
        }
    }

    pub fn for_dialect(&self, kind: DialectKind) -> Arc<dyn DialectClient> {
        match kind {
            DialectKind::Standard => self.standard.clone(),
            DialectKind::Enterprise => self.enterprise.clone(),
            DialectKind::Minimal => self.minimal.clone(),
        }
    }
}
