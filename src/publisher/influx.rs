use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::sink::{SinkError, TimeSeriesWriter};
use crate::config::settings::SinkSettings;
use crate::formatter::{JsonFormatter, TelemetrySnapshot};

/// Писатель InfluxDB v2 по HTTP, line protocol
pub struct InfluxWriter {
    settings: SinkSettings,
    client: Option<Client>,
}

impl InfluxWriter {
    pub fn new(settings: SinkSettings) -> Self {
        Self {
            settings,
            client: None,
        }
    }

    fn base_url(&self) -> &str {
        self.settings.url.trim_end_matches('/')
    }
}

#[async_trait]
impl TimeSeriesWriter for InfluxWriter {
    async fn connect(&mut self) -> Result<(), SinkError> {
        let client = Client::builder()
            .timeout(self.settings.timeout())
            .build()
            .map_err(|e| SinkError::Connect(e.to_string()))?;

        client
            .get(format!("{}/ping", self.base_url()))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SinkError::Connect(e.to_string()))?;

        debug!(url = %self.settings.url, "InfluxDB доступен");
        self.client = Some(client);
        Ok(())
    }

    async fn write(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), SinkError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| SinkError::Write("нет соединения".to_string()))?;

        let line = line_protocol(&self.settings.measurement, snapshot);

        client
            .post(format!("{}/api/v2/write", self.base_url()))
            .query(&[
                ("org", self.settings.org.as_str()),
                ("bucket", self.settings.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header("Authorization", format!("Token {}", self.settings.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SinkError::Write(e.to_string()))?;

        Ok(())
    }

    fn reset(&mut self) {
        self.client = None;
    }
}

fn escape_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, ',' | '=' | ' ') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Одна строка на снапшот: теги устройства, числовые поля и `online`
pub fn line_protocol(measurement: &str, snapshot: &TelemetrySnapshot) -> String {
    let mut line = escape_measurement(measurement);

    for (key, value) in [
        ("device_id", snapshot.id.as_str()),
        ("device_name", snapshot.name.as_str()),
        ("ip", snapshot.address.as_str()),
    ] {
        if !value.is_empty() {
            line.push_str(&format!(",{}={}", key, escape_key(value)));
        }
    }

    let mut fields: Vec<String> = JsonFormatter::numeric_fields(&snapshot.telemetry)
        .into_iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(k, v)| format!("{}={}", escape_key(&k), v))
        .collect();
    fields.push(format!("online={}i", if snapshot.is_online() { 1 } else { 0 }));

    line.push(' ');
    line.push_str(&fields.join(","));

    if let Some(ns) = snapshot.timestamp.timestamp_nanos_opt() {
        line.push_str(&format!(" {}", ns));
    }

    line
}
