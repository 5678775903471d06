//! RFC 1628 UPS-MIB (1.3.6.1.2.1.33)

use super::decoders::{UPS_MIB_BATTERY_STATUS, UPS_MIB_OUTPUT_SOURCE};
use super::Field::*;
use super::Phase::{L1, L2, L3};
use super::Tag;
use super::TagGroup::*;

pub static TAGS: &[Tag] = &[
    // upsIdent
    Tag::new("upsIdentManufacturer", "1.3.6.1.2.1.33.1.1.1.0", Identification, Manufacturer).probe(),
    Tag::new("upsIdentModel", "1.3.6.1.2.1.33.1.1.2.0", Identification, Model).probe(),
    Tag::new("upsIdentUPSSoftwareVersion", "1.3.6.1.2.1.33.1.1.3.0", Identification, Firmware),
    // upsBattery
    Tag::new("upsBatteryStatus", "1.3.6.1.2.1.33.1.2.1.0", Battery, BatteryStatus)
        .decoded(&UPS_MIB_BATTERY_STATUS)
        .probe(),
    Tag::new("upsSecondsOnBattery", "1.3.6.1.2.1.33.1.2.2.0", Battery, SecondsOnBattery),
    Tag::new("upsEstimatedMinutesRemaining", "1.3.6.1.2.1.33.1.2.3.0", Battery, BatteryRuntime),
    Tag::new("upsEstimatedChargeRemaining", "1.3.6.1.2.1.33.1.2.4.0", Battery, BatteryCharge).probe(),
    Tag::new("upsBatteryVoltage", "1.3.6.1.2.1.33.1.2.5.0", Battery, BatteryVoltage).scaled(0.1),
    Tag::new("upsBatteryCurrent", "1.3.6.1.2.1.33.1.2.6.0", Battery, BatteryCurrent).scaled(0.1),
    Tag::new("upsBatteryTemperature", "1.3.6.1.2.1.33.1.2.7.0", Battery, BatteryTemperature),
    // upsInput: таблица по линиям, индекс = номер фазы
    Tag::new("upsInputLineBads", "1.3.6.1.2.1.33.1.3.1.0", Input, InputLineBads),
    Tag::new("upsInputFrequency.1", "1.3.6.1.2.1.33.1.3.3.1.2.1", Input, InputFrequency).scaled(0.1),
    Tag::new("upsInputVoltage.1", "1.3.6.1.2.1.33.1.3.3.1.3.1", Input, InputVoltage(L1)),
    Tag::new("upsInputVoltage.2", "1.3.6.1.2.1.33.1.3.3.1.3.2", Input, InputVoltage(L2)),
    Tag::new("upsInputVoltage.3", "1.3.6.1.2.1.33.1.3.3.1.3.3", Input, InputVoltage(L3)),
    Tag::new("upsInputCurrent.1", "1.3.6.1.2.1.33.1.3.3.1.4.1", Input, InputCurrent(L1)).scaled(0.1),
    Tag::new("upsInputCurrent.2", "1.3.6.1.2.1.33.1.3.3.1.4.2", Input, InputCurrent(L2)).scaled(0.1),
    Tag::new("upsInputCurrent.3", "1.3.6.1.2.1.33.1.3.3.1.4.3", Input, InputCurrent(L3)).scaled(0.1),
    Tag::new("upsInputTruePower.1", "1.3.6.1.2.1.33.1.3.3.1.5.1", Input, InputPower),
    // upsOutput
    Tag::new("upsOutputSource", "1.3.6.1.2.1.33.1.4.1.0", Status, PowerSource).decoded(&UPS_MIB_OUTPUT_SOURCE),
    Tag::new("upsOutputFrequency", "1.3.6.1.2.1.33.1.4.2.0", Output, OutputFrequency).scaled(0.1),
    Tag::new("upsOutputVoltage.1", "1.3.6.1.2.1.33.1.4.4.1.2.1", Output, OutputVoltage(L1)).probe(),
    Tag::new("upsOutputVoltage.2", "1.3.6.1.2.1.33.1.4.4.1.2.2", Output, OutputVoltage(L2)),
    Tag::new("upsOutputVoltage.3", "1.3.6.1.2.1.33.1.4.4.1.2.3", Output, OutputVoltage(L3)),
    Tag::new("upsOutputCurrent.1", "1.3.6.1.2.1.33.1.4.4.1.3.1", Output, OutputCurrent(L1)).scaled(0.1),
    Tag::new("upsOutputCurrent.2", "1.3.6.1.2.1.33.1.4.4.1.3.2", Output, OutputCurrent(L2)).scaled(0.1),
    Tag::new("upsOutputCurrent.3", "1.3.6.1.2.1.33.1.4.4.1.3.3", Output, OutputCurrent(L3)).scaled(0.1),
    Tag::new("upsOutputPower.1", "1.3.6.1.2.1.33.1.4.4.1.4.1", Output, OutputActivePower),
    Tag::new("upsOutputPercentLoad.1", "1.3.6.1.2.1.33.1.4.4.1.5.1", Output, OutputLoad(L1)),
    Tag::new("upsOutputPercentLoad.2", "1.3.6.1.2.1.33.1.4.4.1.5.2", Output, OutputLoad(L2)),
    Tag::new("upsOutputPercentLoad.3", "1.3.6.1.2.1.33.1.4.4.1.5.3", Output, OutputLoad(L3)),
    // upsAlarm: стандарт даёт только счётчик активных аварий
    Tag::new("upsAlarmsPresent", "1.3.6.1.2.1.33.1.6.1.0", Status, AlarmsPresent),
];
