//! Регистровый набор INVT (enterprise 56788), корень 1.3.6.1.4.1.56788.1.1.1

use super::decoders::{
    BATTERY_STATUS, BATTERY_TEST_RESULT, BATTERY_TYPE, CONNECTION, MAINTENANCE_BREAKER, POWER_SOURCE,
};
use super::Field::*;
use super::Phase::{L1, L2, L3};
use super::TagGroup::*;
use super::{AlarmTag, Tag};

macro_rules! invt {
    ($suffix:literal) => {
        concat!("1.3.6.1.4.1.56788.1.1.1.", $suffix)
    };
}

pub static TAGS: &[Tag] = &[
    // upsInfo
    Tag::new("monitorVersion", invt!("1.1"), Identification, Firmware),
    Tag::new("companyName", invt!("1.2"), Identification, Manufacturer),
    Tag::new("model", invt!("1.3"), Identification, Model),
    Tag::new("serialNumber", invt!("1.4"), Identification, Serial),
    Tag::new("batteryType", invt!("1.10"), Identification, BatteryType).decoded(&BATTERY_TYPE),
    // Фазность из upsInfo читается каждый цикл: по ней режутся L2/L3
    Tag::new("inputPhases", invt!("1.5"), Status, InputPhases),
    Tag::new("outputPhases", invt!("1.6"), Status, OutputPhases),
    // upsStatus
    Tag::new("connected", invt!("2.1"), Status, Connection).decoded(&CONNECTION),
    Tag::new("loadOnSource", invt!("2.2"), Status, PowerSource)
        .decoded(&POWER_SOURCE)
        .probe(),
    Tag::new("batteryStatus", invt!("2.3"), Status, BatteryStatus)
        .decoded(&BATTERY_STATUS)
        .probe(),
    Tag::new("maintainBreaker", invt!("2.4"), Status, MaintenanceBreaker).decoded(&MAINTENANCE_BREAKER),
    Tag::new("batteryTestResult", invt!("2.5"), Status, BatteryTestResult).decoded(&BATTERY_TEST_RESULT),
    // upsDataBypass
    Tag::new("bypassVoltageA", invt!("3.1.1"), EnterpriseExtra, BypassVoltage(L1)),
    Tag::new("bypassVoltageB", invt!("3.1.2"), EnterpriseExtra, BypassVoltage(L2)),
    Tag::new("bypassVoltageC", invt!("3.1.3"), EnterpriseExtra, BypassVoltage(L3)),
    Tag::new("bypassCurrentA", invt!("3.1.4"), EnterpriseExtra, BypassCurrent(L1)),
    Tag::new("bypassCurrentB", invt!("3.1.5"), EnterpriseExtra, BypassCurrent(L2)),
    Tag::new("bypassCurrentC", invt!("3.1.6"), EnterpriseExtra, BypassCurrent(L3)),
    Tag::new("bypassFrequencyA", invt!("3.1.7"), EnterpriseExtra, BypassFrequency).scaled(0.1),
    // upsDataInput
    Tag::new("inputVoltageA", invt!("3.2.1"), Input, InputVoltage(L1)).probe(),
    Tag::new("inputVoltageB", invt!("3.2.2"), Input, InputVoltage(L2)),
    Tag::new("inputVoltageC", invt!("3.2.3"), Input, InputVoltage(L3)),
    Tag::new("inputCurrentA", invt!("3.2.4"), Input, InputCurrent(L1)).scaled(0.1),
    Tag::new("inputCurrentB", invt!("3.2.5"), Input, InputCurrent(L2)).scaled(0.1),
    Tag::new("inputCurrentC", invt!("3.2.6"), Input, InputCurrent(L3)).scaled(0.1),
    Tag::new("inputActivePowerA", invt!("3.2.7"), Input, InputPower).scaled(0.1),
    Tag::new("inputFrequencyA", invt!("3.2.10"), Input, InputFrequency).scaled(0.1),
    // upsDataOutput
    Tag::new("outputVoltageA", invt!("3.3.1"), Output, OutputVoltage(L1)).probe(),
    Tag::new("outputVoltageB", invt!("3.3.2"), Output, OutputVoltage(L2)),
    Tag::new("outputVoltageC", invt!("3.3.3"), Output, OutputVoltage(L3)),
    Tag::new("outputCurrentA", invt!("3.3.4"), Output, OutputCurrent(L1)).scaled(0.1),
    Tag::new("outputCurrentB", invt!("3.3.5"), Output, OutputCurrent(L2)).scaled(0.1),
    Tag::new("outputCurrentC", invt!("3.3.6"), Output, OutputCurrent(L3)).scaled(0.1),
    Tag::new("outputFrequencyA", invt!("3.3.10"), Output, OutputFrequency).scaled(0.1),
    Tag::new("outputPowerFactorA", invt!("3.3.11"), Output, OutputPowerFactor).scaled(0.01),
    Tag::new("outputApparentPowerTotal", invt!("3.3.12"), Output, OutputApparentPower).scaled(0.1),
    Tag::new("outputActivePowerTotal", invt!("3.3.13"), Output, OutputActivePower).scaled(0.1),
    // upsDataLoad
    Tag::new("loadPercentA", invt!("3.4.1"), Output, OutputLoad(L1)),
    Tag::new("loadPercentB", invt!("3.4.2"), Output, OutputLoad(L2)),
    Tag::new("loadPercentC", invt!("3.4.3"), Output, OutputLoad(L3)),
    // upsDataBattery
    Tag::new("batteryVoltage", invt!("3.5.1"), Battery, BatteryVoltage)
        .scaled(0.1)
        .probe(),
    Tag::new("batteryCurrent", invt!("3.5.2"), Battery, BatteryCurrent).scaled(0.1),
    Tag::new("batteryChargePercent", invt!("3.5.3"), Battery, BatteryCharge),
    Tag::new("batteryRuntimeRemaining", invt!("3.5.4"), Battery, BatteryRuntime),
    Tag::new("batteryTemperature", invt!("3.5.5"), Battery, BatteryTemperature),
    // upsAlarm: флаги 0/1
    Tag::new("alarmMainsAbnormal", invt!("4.1"), Alarms, AlarmFlag),
    Tag::new("alarmBatteryLow", invt!("4.2"), Alarms, AlarmFlag),
    Tag::new("alarmOverload", invt!("4.3"), Alarms, AlarmFlag),
    Tag::new("alarmOnBypass", invt!("4.4"), Alarms, AlarmFlag),
    Tag::new("alarmInverterFault", invt!("4.5"), Alarms, AlarmFlag),
    Tag::new("alarmRectifierFault", invt!("4.6"), Alarms, AlarmFlag),
    Tag::new("alarmFanFailure", invt!("4.7"), Alarms, AlarmFlag),
    Tag::new("alarmOverTemperature", invt!("4.8"), Alarms, AlarmFlag),
    Tag::new("alarmBatteryTestFailed", invt!("4.9"), Alarms, AlarmFlag),
];

/// Порядок объявления = порядок аварий в снапшоте
pub static ALARMS: &[AlarmTag] = &[
    AlarmTag { code: invt!("4.1"), label: "MainsAbnormal" },
    AlarmTag { code: invt!("4.2"), label: "LowBattery" },
    AlarmTag { code: invt!("4.3"), label: "Overload" },
    AlarmTag { code: invt!("4.4"), label: "OnBypass" },
    AlarmTag { code: invt!("4.5"), label: "InverterFault" },
    AlarmTag { code: invt!("4.6"), label: "RectifierFault" },
    AlarmTag { code: invt!("4.7"), label: "FanFailure" },
    AlarmTag { code: invt!("4.8"), label: "OverTemperature" },
    AlarmTag { code: invt!("4.9"), label: "BatteryTestFailed" },
];
