//! Аварии: флаги производителя и пороговые проверки по нормализованным значениям

use serde::{Deserialize, Serialize};

use super::snapshot::{Alarm, Reading, Telemetry};
use crate::collector::RawMap;
use crate::profiles::{AlarmTag, DialectKind, Field};

/// Разбирает карту флагов "тег -> 0/1" в список аварий.
///
/// Порядок совпадает с порядком объявления в таблице. Флаги, которых нет
/// в таблице, идут в конце с кодом вместо метки. Нечисловые значения
/// молча пропускаются.
pub fn extract_alarms(bitmap: &RawMap, table: &[AlarmTag]) -> Vec<Alarm> {
    let mut alarms: Vec<Alarm> = table
        .iter()
        .filter(|tag| bitmap.get(tag.code).is_some_and(|v| is_raised(v)))
        .map(|tag| Alarm::new(tag.code, tag.label))
        .collect();

    for (code, value) in bitmap {
        if is_raised(value) && !table.iter().any(|t| t.code == code) {
            alarms.push(Alarm::new(code.clone(), code.clone()));
        }
    }

    alarms
}

fn is_raised(value: &str) -> bool {
    value.trim().parse::<i64>() == Ok(1)
}

/// Выбирает из сырой выборки флаги аварий диалекта и разбирает их
pub fn alarms_for(kind: DialectKind, raw: &RawMap) -> Vec<Alarm> {
    let mut bitmap = RawMap::new();

    let layered = match kind {
        DialectKind::Standard => Some(DialectKind::Enterprise),
        _ => None,
    };

    for dialect in std::iter::once(kind).chain(layered) {
        for tag in dialect.tags().iter().filter(|t| t.field == Field::AlarmFlag) {
            if let Some(value) = raw.get(tag.oid) {
                bitmap.insert(tag.oid.to_string(), value.clone());
            }
        }
    }

    let table = match kind {
        DialectKind::Standard => DialectKind::Enterprise.alarm_table(),
        _ => kind.alarm_table(),
    };

    extract_alarms(&bitmap, table)
}

/// Пороги для аварий, вычисляемых по значениям
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmThresholds {
    pub input_voltage_low: f64,
    pub battery_critical: f64,
    pub battery_low: f64,
    pub battery_temperature_high: f64,
    pub load_overload: f64,
    pub load_high: f64,
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self {
            input_voltage_low: 180.0,
            battery_critical: 20.0,
            battery_low: 50.0,
            battery_temperature_high: 45.0,
            load_overload: 90.0,
            load_high: 70.0,
        }
    }
}

fn number(slot: &Option<Reading>) -> Option<f64> {
    slot.as_ref().and_then(Reading::as_f64)
}

pub fn threshold_alarms(telemetry: &Telemetry, t: &AlarmThresholds) -> Vec<Alarm> {
    let mut alarms = Vec::new();

    if let Some(vin) = number(&telemetry.input.voltage.l1) {
        if vin > 0.0 && vin < t.input_voltage_low {
            alarms.push(Alarm::new("INPUT_V_LOW", format!("Input voltage low: {:.1}V", vin)));
        }
    }

    if let Some(charge) = number(&telemetry.battery.charge_percent) {
        if charge > 0.0 && charge < t.battery_critical {
            alarms.push(Alarm::new("BAT_CRITICAL", format!("Battery critical: {:.1}%", charge)));
        } else if charge >= t.battery_critical && charge < t.battery_low {
            alarms.push(Alarm::new("BAT_LOW", format!("Battery low: {:.1}%", charge)));
        }
    }

    if let Some(temp) = number(&telemetry.battery.temperature) {
        if temp > t.battery_temperature_high {
            alarms.push(Alarm::new("BAT_OVERTEMP", format!("Battery over temperature: {:.1}C", temp)));
        }
    }

    // Берём самую нагруженную фазу
    let load = [
        &telemetry.output.load.l1,
        &telemetry.output.load.l2,
        &telemetry.output.load.l3,
    ]
    .into_iter()
    .filter_map(number)
    .reduce(f64::max);

    if let Some(load) = load {
        if load > t.load_overload {
            alarms.push(Alarm::new("OVERLOAD", format!("Overload: {:.1}%", load)));
        } else if load > t.load_high {
            alarms.push(Alarm::new("LOAD_HIGH", format!("Load high: {:.1}%", load)));
        }
    }

    alarms
}
