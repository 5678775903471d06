use anyhow::Result;
use serde_json::Value;

use super::snapshot::{Telemetry, TelemetrySnapshot};

/// JSON представление снапшотов для HTTP и стримов
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn to_json_string(snapshot: &TelemetrySnapshot) -> Result<String> {
        Ok(serde_json::to_string(snapshot)?)
    }

    /// Разворачивает числовую телеметрию в плоские пары
    /// `input_voltage_l1 = 220.0`. Текстовые значения не попадают.
    pub fn numeric_fields(telemetry: &Telemetry) -> Vec<(String, f64)> {
        let mut fields = Vec::new();
        if let Ok(value) = serde_json::to_value(telemetry) {
            Self::flatten(&value, String::new(), &mut fields);
        }
        fields
    }

    fn flatten(value: &Value, prefix: String, out: &mut Vec<(String, f64)>) {
        match value {
            Value::Object(map) => {
                for (key, nested) in map {
                    let name = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}_{}", prefix, key)
                    };
                    Self::flatten(nested, name, out);
                }
            }
            Value::Number(n) if !prefix.is_empty() => {
                // phases тоже число, но это не измерение
                if prefix == "phases" {
                    return;
                }
                if let Some(v) = n.as_f64() {
                    out.push((prefix, v));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::snapshot::Reading;

    #[test]
    fn snapshot_json_uses_camel_case_keys() {
        let snapshot = TelemetrySnapshot {
            id: "ups-1".into(),
            status: crate::formatter::DeviceStatus::Offline,
            address: "10.0.0.1".into(),
            name: "ups-1".into(),
            dialect: None,
            telemetry: Telemetry::default(),
            alarms: Vec::new(),
            device_info: None,
            cycle: 7,
            timestamp: chrono::Utc::now(),
        };

        let json: Value = serde_json::from_str(&JsonFormatter::to_json_string(&snapshot).unwrap()).unwrap();

        assert_eq!(json["status"], "offline");
        assert_eq!(json["cycle"], 7);
        assert!(json.get("deviceInfo").is_some());
    }

    #[test]
    fn flattens_nested_numeric_readings() {
        let mut telemetry = Telemetry::default();
        telemetry.phases = Some(1);
        telemetry.input.voltage.l1 = Some(Reading::Number(221.5));
        telemetry.battery.charge_percent = Some(Reading::Number(98.0));
        telemetry.status.battery_status = Some(Reading::Text("Normal".into()));

        let fields = JsonFormatter::numeric_fields(&telemetry);

        assert!(fields.contains(&("input_voltage_l1".to_string(), 221.5)));
        assert!(fields.contains(&("battery_charge_percent".to_string(), 98.0)));
        assert_eq!(fields.len(), 2);
    }
}
