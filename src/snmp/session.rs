use async_trait::async_trait;
use snmp2::{AsyncSession, Oid};
use tokio::time::timeout;
use tracing::trace;

use super::value::render_value;
use super::{Connector, Endpoint, FetchError, SnmpVersion, TagReader, parent_oid, parse_oid};

/// Асинхронная сессия SNMPv1/v2c с таймаутом и повторами на каждый запрос
pub struct SnmpSession {
    session: AsyncSession,
    endpoint: Endpoint,
}

impl SnmpSession {
    pub async fn open(endpoint: &Endpoint) -> Result<Self, FetchError> {
        let target = endpoint.target();
        let community = endpoint.community.as_bytes();
        let session = match endpoint.version {
            SnmpVersion::V1 => AsyncSession::new_v1(target.as_str(), community, 0).await,
            SnmpVersion::V2c => AsyncSession::new_v2c(target.as_str(), community, 0).await,
        }
        .map_err(|e| FetchError::Transport(format!("Не удалось создать SNMP сессию {}: {}", target, e)))?;

        Ok(Self {
            session,
            endpoint: endpoint.clone(),
        })
    }

    fn timeout_error(&self) -> FetchError {
        FetchError::Timeout(self.endpoint.target())
    }
}

#[async_trait]
impl TagReader for SnmpSession {
    async fn get(&mut self, oid_str: &str) -> Result<Option<String>, FetchError> {
        let oid = parse_oid(oid_str).map_err(|e| FetchError::InvalidTag(e.to_string()))?;

        for attempt in 0..=self.endpoint.retries {
            match timeout(self.endpoint.timeout, self.session.get(&oid)).await {
                Ok(Ok(resp)) => {
                    if resp.error_status != 0 {
                        trace!(oid = oid_str, status = resp.error_status, "агент вернул error-status");
                        return Ok(None);
                    }
                    let value = resp
                        .varbinds
                        .into_iter()
                        .next()
                        .and_then(|(_, value)| render_value(&value));
                    return Ok(value);
                }
                Ok(Err(e)) => {
                    return Err(FetchError::Transport(format!("SNMP GET запрос не удался: {}", e)));
                }
                Err(_) => trace!(oid = oid_str, attempt, "таймаут GET"),
            }
        }

        Err(self.timeout_error())
    }

    async fn get_many(&mut self, oids: &[&str]) -> Result<Vec<(String, String)>, FetchError> {
        if !self.endpoint.version.supports_bulk() {
            return Err(FetchError::BatchUnsupported);
        }
        if oids.is_empty() {
            return Ok(Vec::new());
        }

        // GETBULK с non_repeaters = n работает как GETNEXT по каждому родителю
        let mut parents: Vec<Oid<'static>> = Vec::with_capacity(oids.len());
        for oid in oids {
            let parent = parent_oid(oid).ok_or_else(|| FetchError::InvalidTag(oid.to_string()))?;
            parents.push(parse_oid(parent).map_err(|e| FetchError::InvalidTag(e.to_string()))?);
        }
        let refs: Vec<&Oid<'_>> = parents.iter().collect();
        let wanted: Vec<String> = oids
            .iter()
            .map(|o| o.trim().trim_start_matches('.').to_string())
            .collect();
        let n = refs.len() as u32;

        for attempt in 0..=self.endpoint.retries {
            match timeout(self.endpoint.timeout, self.session.getbulk(&refs, n, 0)).await {
                Ok(Ok(resp)) => {
                    if resp.error_status != 0 {
                        return Err(FetchError::BatchRejected(format!(
                            "error-status {} index {}",
                            resp.error_status, resp.error_index
                        )));
                    }
                    let mut values = Vec::new();
                    for (oid, value) in resp.varbinds {
                        let oid = oid.to_string();
                        if !wanted.contains(&oid) {
                            continue;
                        }
                        if let Some(rendered) = render_value(&value) {
                            values.push((oid, rendered));
                        }
                    }
                    return Ok(values);
                }
                Ok(Err(e)) => {
                    return Err(FetchError::BatchRejected(format!("SNMP GETBULK запрос не удался: {}", e)));
                }
                Err(_) => trace!(attempt, "таймаут GETBULK"),
            }
        }

        Err(self.timeout_error())
    }
}

/// Боевой коннектор поверх snmp2
#[derive(Debug, Default, Clone)]
pub struct SnmpConnector;

#[async_trait]
impl Connector for SnmpConnector {
    async fn open(&self, endpoint: &Endpoint) -> Result<Box<dyn TagReader>, FetchError> {
        let session = SnmpSession::open(endpoint).await?;
        Ok(Box::new(session))
    }
}
