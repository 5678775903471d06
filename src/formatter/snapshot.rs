use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profiles::{DialectKind, Field, Phase};

/// Значение поля после нормализации. Нечисловой ответ там, где ждали
/// число, проходит как строка.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
}

impl Reading {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Number(v) => Some(*v),
            Reading::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reading::Text(s) => Some(s),
            Reading::Number(_) => None,
        }
    }
}

pub type Slot = Option<Reading>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l2: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l3: Slot,
}

impl PhaseValues {
    pub fn get_mut(&mut self, phase: Phase) -> &mut Slot {
        match phase {
            Phase::L1 => &mut self.l1,
            Phase::L2 => &mut self.l2,
            Phase::L3 => &mut self.l3,
        }
    }

    pub fn single_phase(&mut self) {
        self.l2 = None;
        self.l3 = None;
    }

    fn is_empty(&self) -> bool {
        self.l1.is_none() && self.l2.is_none() && self.l3.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputReadings {
    #[serde(default, skip_serializing_if = "PhaseValues::is_empty")]
    pub voltage: PhaseValues,
    #[serde(default, skip_serializing_if = "PhaseValues::is_empty")]
    pub current: PhaseValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_bads: Slot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputReadings {
    #[serde(default, skip_serializing_if = "PhaseValues::is_empty")]
    pub voltage: PhaseValues,
    #[serde(default, skip_serializing_if = "PhaseValues::is_empty")]
    pub current: PhaseValues,
    #[serde(default, skip_serializing_if = "PhaseValues::is_empty")]
    pub load: PhaseValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_power: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apparent_power: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_factor: Slot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BypassReadings {
    #[serde(default, skip_serializing_if = "PhaseValues::is_empty")]
    pub voltage: PhaseValues,
    #[serde(default, skip_serializing_if = "PhaseValues::is_empty")]
    pub current: PhaseValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Slot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatteryReadings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge_percent: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds_on_battery: Slot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReadings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_source: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_status: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_breaker: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_test: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarms_present: Slot,
}

/// Каноническая запись телеметрии, одинаковая для всех диалектов
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<u8>,
    #[serde(default)]
    pub input: InputReadings,
    #[serde(default)]
    pub output: OutputReadings,
    #[serde(default)]
    pub battery: BatteryReadings,
    #[serde(default)]
    pub status: StatusReadings,
    #[serde(default)]
    pub bypass: BypassReadings,
}

impl Telemetry {
    /// Ячейка для поля. `None` для идентификации и флагов аварий:
    /// они живут не в телеметрии.
    pub fn slot_mut(&mut self, field: Field) -> Option<&mut Slot> {
        let slot = match field {
            Field::InputVoltage(p) => self.input.voltage.get_mut(p),
            Field::InputCurrent(p) => self.input.current.get_mut(p),
            Field::InputFrequency => &mut self.input.frequency,
            Field::InputPower => &mut self.input.power,
            Field::InputLineBads => &mut self.input.line_bads,
            Field::OutputVoltage(p) => self.output.voltage.get_mut(p),
            Field::OutputCurrent(p) => self.output.current.get_mut(p),
            Field::OutputLoad(p) => self.output.load.get_mut(p),
            Field::OutputFrequency => &mut self.output.frequency,
            Field::OutputActivePower => &mut self.output.active_power,
            Field::OutputApparentPower => &mut self.output.apparent_power,
            Field::OutputPowerFactor => &mut self.output.power_factor,
            Field::BypassVoltage(p) => self.bypass.voltage.get_mut(p),
            Field::BypassCurrent(p) => self.bypass.current.get_mut(p),
            Field::BypassFrequency => &mut self.bypass.frequency,
            Field::BatteryVoltage => &mut self.battery.voltage,
            Field::BatteryCurrent => &mut self.battery.current,
            Field::BatteryCharge => &mut self.battery.charge_percent,
            Field::BatteryRuntime => &mut self.battery.runtime_minutes,
            Field::BatteryTemperature => &mut self.battery.temperature,
            Field::SecondsOnBattery => &mut self.battery.seconds_on_battery,
            Field::PowerSource => &mut self.status.power_source,
            Field::BatteryStatus => &mut self.status.battery_status,
            Field::Connection => &mut self.status.connection,
            Field::MaintenanceBreaker => &mut self.status.maintenance_breaker,
            Field::BatteryTestResult => &mut self.status.battery_test,
            Field::AlarmsPresent => &mut self.status.alarms_present,
            Field::Manufacturer
            | Field::Model
            | Field::Serial
            | Field::Firmware
            | Field::BatteryType
            | Field::InputPhases
            | Field::OutputPhases
            | Field::AlarmFlag => return None,
        };
        Some(slot)
    }

    /// Оставляет только L1 во всех пофазных группах
    pub fn collapse_to_single_phase(&mut self) {
        self.input.voltage.single_phase();
        self.input.current.single_phase();
        self.output.voltage.single_phase();
        self.output.current.single_phase();
        self.output.load.single_phase();
        self.bypass.voltage.single_phase();
        self.bypass.current.single_phase();
    }

    pub fn is_empty(&self) -> bool {
        *self == Telemetry::default()
    }
}

/// Паспорт устройства, опрашивается на медленных циклах
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_type: Option<String>,
}

impl DeviceInfo {
    pub fn slot_mut(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::Manufacturer => Some(&mut self.manufacturer),
            Field::Model => Some(&mut self.model),
            Field::Serial => Some(&mut self.serial),
            Field::Firmware => Some(&mut self.firmware),
            Field::BatteryType => Some(&mut self.battery_type),
            _ => None,
        }
    }

    /// Новые значения поверх старых; пропавшие поля не затираются
    pub fn merge(&mut self, newer: DeviceInfo) {
        if newer.manufacturer.is_some() {
            self.manufacturer = newer.manufacturer;
        }
        if newer.model.is_some() {
            self.model = newer.model;
        }
        if newer.serial.is_some() {
            self.serial = newer.serial;
        }
        if newer.firmware.is_some() {
            self.firmware = newer.firmware;
        }
        if newer.battery_type.is_some() {
            self.battery_type = newer.battery_type;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == DeviceInfo::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub code: String,
    pub label: String,
}

impl Alarm {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
}

/// Снимок одного устройства за один цикл. После публикации не меняется.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub id: String,
    pub status: DeviceStatus,
    pub address: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<DialectKind>,
    pub telemetry: Telemetry,
    pub alarms: Vec<Alarm>,
    pub device_info: Option<DeviceInfo>,
    /// Номер цикла опроса, монотонно растёт в пределах процесса
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
}

impl TelemetrySnapshot {
    pub fn is_online(&self) -> bool {
        self.status == DeviceStatus::Online
    }
}
