use anyhow::{Context, Result};
use snmp2::Oid;

pub fn parse_oid(s: &str) -> Result<Oid<'static>> {
    let parts: Result<Vec<u64>, _> = s
        .trim()
        .split('.')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u64>())
        .collect();

    let parts = parts.context(format!("Невалидный OID: {}", s))?;
    if parts.len() < 2 {
        anyhow::bail!("Слишком короткий OID: {}", s);
    }
    Oid::from(&parts).map_err(|e| anyhow::anyhow!("Не удалось создать Oid: {:?}", e))
}

/// Родитель OID: всё кроме последнего компонента.
/// GETNEXT по родителю возвращает сам тег, если агент его поддерживает.
pub fn parent_oid(s: &str) -> Option<&str> {
    let trimmed = s.trim().trim_start_matches('.');
    trimmed.rsplit_once('.').map(|(parent, _)| parent)
}
