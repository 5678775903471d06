use serde::{Deserialize, Serialize};

use crate::detect::DialectCapabilities;

#[derive(Debug, Deserialize)]
pub struct ProbeRequest {
    pub ip: String,
    #[serde(default)]
    pub port: Option<u16>,
    /// Попробовать первой, до списка из конфига
    #[serde(default)]
    pub community: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub ip: String,
    pub port: u16,
    pub capabilities: DialectCapabilities,
}
