//! Megatec/Voltronic (enterprise 935): только теги, которые реально отвечают
//! на урезанных прошивках. Значения в десятых долях.

use super::Field::*;
use super::Phase::L1;
use super::Tag;
use super::TagGroup::*;

pub const MANUFACTURER: &str = "Megatec/Voltronic";

pub static TAGS: &[Tag] = &[
    Tag::new("upsBaseModel", "1.3.6.1.4.1.935.1.1.1.1.1.1.0", Identification, Model).probe(),
    Tag::new("upsBaseFirmware", "1.3.6.1.4.1.935.1.1.1.1.2.1.0", Identification, Firmware),
    Tag::new("upsBatteryCapacity", "1.3.6.1.4.1.935.1.1.1.2.2.1.0", Battery, BatteryCharge).probe(),
    Tag::new("upsBatteryVoltage", "1.3.6.1.4.1.935.1.1.1.2.2.2.0", Battery, BatteryVoltage).scaled(0.1),
    Tag::new("upsInputVoltage", "1.3.6.1.4.1.935.1.1.1.3.2.1.0", Input, InputVoltage(L1))
        .scaled(0.1)
        .probe(),
    Tag::new("upsInputFrequency", "1.3.6.1.4.1.935.1.1.1.3.2.4.0", Input, InputFrequency).scaled(0.1),
    Tag::new("upsOutputVoltage", "1.3.6.1.4.1.935.1.1.1.4.2.1.0", Output, OutputVoltage(L1))
        .scaled(0.1)
        .probe(),
    Tag::new("upsOutputLoad", "1.3.6.1.4.1.935.1.1.1.4.2.3.0", Output, OutputLoad(L1)),
];
