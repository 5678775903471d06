//! Нормализатор: сырые строки тегов -> каноническая запись.
//!
//! Чистые функции без ввода-вывода. Выход не зависит от того, какой
//! клиент диалекта собрал данные.

use super::snapshot::{DeviceInfo, Reading, Telemetry};
use crate::collector::RawMap;
use crate::profiles::{DialectKind, Field, Phase, Tag, enterprise, minimal, standard};

/// Результат нормализации одной выборки
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub telemetry: Telemetry,
    pub identity: DeviceInfo,
}

/// Масштабирует сырое значение и срезает шум плавающей точки
pub fn scale_value(raw: f64, scale: f64) -> f64 {
    ((raw * scale) * 1e6).round() / 1e6
}

/// Значение одного тега в каноническом виде
pub fn convert(tag: &Tag, raw: &str) -> Reading {
    let trimmed = raw.trim();

    if let Some(decoder) = tag.decoder {
        return match trimmed.parse::<i64>() {
            Ok(code) => Reading::Text(decoder.decode(code)),
            Err(_) => Reading::Text(trimmed.to_string()),
        };
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Reading::Number(scale_value(value, tag.scale)),
        _ => Reading::Text(trimmed.to_string()),
    }
}

/// Таблицы, по которым разбирается выборка диалекта. Стандартный
/// диалект может нести наслоенные теги производителя.
fn tables(kind: DialectKind) -> Vec<&'static [Tag]> {
    match kind {
        DialectKind::Standard => vec![standard::TAGS, enterprise::TAGS],
        DialectKind::Enterprise => vec![enterprise::TAGS],
        DialectKind::Minimal => vec![minimal::TAGS],
    }
}

pub fn normalize(kind: DialectKind, raw: &RawMap) -> Normalized {
    let mut out = Normalized::default();

    // Первая таблица выигрывает: стандартные теги важнее наслоенных
    for table in tables(kind) {
        for tag in table.iter() {
            let Some(value) = raw.get(tag.oid) else {
                continue;
            };

            if let Some(slot) = out.identity.slot_mut(tag.field) {
                let text = match (tag.decoder, convert(tag, value)) {
                    (Some(_), Reading::Text(label)) => label,
                    _ => value.trim().to_string(),
                };
                if slot.is_none() && !text.is_empty() {
                    *slot = Some(text);
                }
                continue;
            }

            if let Some(slot) = out.telemetry.slot_mut(tag.field) {
                if slot.is_none() {
                    *slot = Some(convert(tag, value));
                }
            }
        }
    }

    infer_phases(kind, raw, &mut out.telemetry);

    if kind == DialectKind::Minimal {
        derive_minimal(&mut out);
    }

    out
}

/// Ниже этого напряжения фаза считается отсутствующей: однофазные
/// прошивки отвечают на теги L2/L3 нулями
const LIVE_PHASE_VOLTS: f64 = 50.0;

/// Фазность: что сообщает устройство, иначе по живым напряжениям L2/L3
fn infer_phases(kind: DialectKind, raw: &RawMap, telemetry: &mut Telemetry) {
    let mut reported: Option<u8> = None;
    let mut any_voltage = false;
    let mut live_extra_phase = false;

    for table in tables(kind) {
        for tag in table.iter() {
            let Some(value) = raw.get(tag.oid) else {
                continue;
            };
            match tag.field {
                Field::InputPhases | Field::OutputPhases => {
                    if let Ok(n @ (1 | 3)) = value.trim().parse::<u8>() {
                        reported = Some(reported.map_or(n, |r| r.max(n)));
                    }
                }
                Field::InputVoltage(phase) | Field::OutputVoltage(phase) => {
                    any_voltage = true;
                    let live = convert(tag, value)
                        .as_f64()
                        .is_some_and(|v| v > LIVE_PHASE_VOLTS);
                    if live && phase != Phase::L1 {
                        live_extra_phase = true;
                    }
                }
                _ => {}
            }
        }
    }

    let phases = match reported {
        Some(n) => n,
        None if live_extra_phase => 3,
        None if any_voltage => 1,
        None => return,
    };

    telemetry.phases = Some(phases);
    if phases == 1 {
        telemetry.collapse_to_single_phase();
    }
}

/// Поля, которых минимальный набор не отдаёт, но которые можно вывести
fn derive_minimal(out: &mut Normalized) {
    if out.identity.manufacturer.is_none() {
        out.identity.manufacturer = Some(minimal::MANUFACTURER.to_string());
    }

    let telemetry = &mut out.telemetry;
    if telemetry.output.frequency.is_none() {
        telemetry.output.frequency = telemetry.input.frequency.clone();
    }

    if telemetry.status.power_source.is_none() {
        let input_voltage = telemetry
            .input
            .voltage
            .l1
            .as_ref()
            .and_then(Reading::as_f64);
        if let Some(volts) = input_voltage {
            let source = if volts < 50.0 { "Battery" } else { "Normal" };
            telemetry.status.power_source = Some(Reading::Text(source.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{Phase, TagGroup, decoders::UPS_MIB_BATTERY_STATUS};

    fn raw(pairs: &[(&str, &str)]) -> RawMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn number(reading: &Option<Reading>) -> f64 {
        reading.as_ref().and_then(Reading::as_f64).unwrap()
    }

    #[test]
    fn scale_tenths_of_a_volt() {
        let tag = Tag::new("v", "1.3.6.1.4.1.935.1.1.1.4.2.1.0", TagGroup::Output, Field::OutputVoltage(Phase::L1))
            .scaled(0.1);
        assert_eq!(convert(&tag, "1201"), Reading::Number(120.1));
    }

    #[test]
    fn scale_round_trip_matches_product() {
        for (raw, scale) in [(1201.0, 0.1), (95.0, 0.01), (230.0, 1.0), (7.0, 0.1)] {
            let got = scale_value(raw, scale);
            assert!((got - raw * scale).abs() < 1e-6, "{} * {} -> {}", raw, scale, got);
        }
    }

    #[test]
    fn unknown_enum_code_becomes_text() {
        let tag = Tag::new("s", "1.3.6.1.2.1.33.1.2.1.0", TagGroup::Battery, Field::BatteryStatus)
            .decoded(&UPS_MIB_BATTERY_STATUS);
        assert_eq!(convert(&tag, "2"), Reading::Text("Normal".into()));
        let unknown = convert(&tag, "42");
        assert_eq!(unknown.as_text(), Some("unknown code 42"));
    }

    #[test]
    fn non_numeric_value_passes_through_as_text() {
        let tag = Tag::new("v", "1.3.6.1.2.1.33.1.2.5.0", TagGroup::Battery, Field::BatteryVoltage).scaled(0.1);
        assert_eq!(convert(&tag, " n/a "), Reading::Text("n/a".into()));
    }

    #[test]
    fn standard_single_phase_device() {
        let data = raw(&[
            ("1.3.6.1.2.1.33.1.1.1.0", "ACME"),
            ("1.3.6.1.2.1.33.1.1.2.0", "Guardian 3000"),
            ("1.3.6.1.2.1.33.1.2.1.0", "2"),
            ("1.3.6.1.2.1.33.1.2.4.0", "97"),
            ("1.3.6.1.2.1.33.1.2.5.0", "1365"),
            ("1.3.6.1.2.1.33.1.3.3.1.2.1", "600"),
            ("1.3.6.1.2.1.33.1.3.3.1.3.1", "121"),
            ("1.3.6.1.2.1.33.1.4.1.0", "3"),
            ("1.3.6.1.2.1.33.1.4.4.1.2.1", "120"),
        ]);

        let out = normalize(DialectKind::Standard, &data);

        assert_eq!(out.identity.manufacturer.as_deref(), Some("ACME"));
        assert_eq!(out.identity.model.as_deref(), Some("Guardian 3000"));
        assert_eq!(out.telemetry.phases, Some(1));
        assert_eq!(number(&out.telemetry.battery.voltage), 136.5);
        assert_eq!(number(&out.telemetry.input.frequency), 60.0);
        assert_eq!(number(&out.telemetry.input.voltage.l1), 121.0);
        assert!(out.telemetry.input.voltage.l2.is_none());
        assert_eq!(
            out.telemetry.status.battery_status,
            Some(Reading::Text("Normal".into()))
        );
        assert_eq!(
            out.telemetry.status.power_source,
            Some(Reading::Text("Normal".into()))
        );
    }

    #[test]
    fn enterprise_three_phase_device() {
        let base = "1.3.6.1.4.1.56788.1.1.1";
        let data = raw(&[
            (&format!("{base}.3.2.1"), "220"),
            (&format!("{base}.3.2.2"), "221"),
            (&format!("{base}.3.2.3"), "219"),
            (&format!("{base}.3.3.1"), "230"),
            (&format!("{base}.3.3.11"), "95"),
            (&format!("{base}.3.5.1"), "2712"),
            (&format!("{base}.2.2"), "2"),
            (&format!("{base}.4.3"), "1"),
        ]);

        let out = normalize(DialectKind::Enterprise, &data);

        assert_eq!(out.telemetry.phases, Some(3));
        assert_eq!(number(&out.telemetry.input.voltage.l3), 219.0);
        assert_eq!(number(&out.telemetry.output.power_factor), 0.95);
        assert_eq!(number(&out.telemetry.battery.voltage), 271.2);
        assert_eq!(
            out.telemetry.status.power_source,
            Some(Reading::Text("Bypass".into()))
        );
    }

    #[test]
    fn zero_voltage_on_l2_l3_means_single_phase() {
        let base = "1.3.6.1.4.1.56788.1.1.1";
        let data = raw(&[
            (&format!("{base}.3.2.1"), "220"),
            (&format!("{base}.3.2.2"), "0"),
            (&format!("{base}.3.2.3"), "0"),
            (&format!("{base}.3.3.1"), "230"),
            (&format!("{base}.3.3.2"), "0"),
            (&format!("{base}.3.3.3"), "0"),
        ]);

        let out = normalize(DialectKind::Enterprise, &data);

        assert_eq!(out.telemetry.phases, Some(1));
        assert_eq!(number(&out.telemetry.input.voltage.l1), 220.0);
        assert!(out.telemetry.input.voltage.l2.is_none());
        assert!(out.telemetry.output.voltage.l3.is_none());
    }

    #[test]
    fn reported_phase_count_wins_over_voltages() {
        let base = "1.3.6.1.4.1.56788.1.1.1";
        // Трёхфазный ИБП с пропавшими фазами на входе
        let data = raw(&[
            (&format!("{base}.1.5"), "3"),
            (&format!("{base}.1.6"), "3"),
            (&format!("{base}.3.2.1"), "220"),
            (&format!("{base}.3.2.2"), "0"),
            (&format!("{base}.3.2.3"), "0"),
        ]);

        let out = normalize(DialectKind::Enterprise, &data);

        assert_eq!(out.telemetry.phases, Some(3));
        assert_eq!(number(&out.telemetry.input.voltage.l2), 0.0);
    }

    #[test]
    fn battery_type_is_decoded_into_identity() {
        let data = raw(&[
            ("1.3.6.1.4.1.56788.1.1.1.1.3", "UPS 10kVA"),
            ("1.3.6.1.4.1.56788.1.1.1.1.10", "1"),
        ]);

        let out = normalize(DialectKind::Enterprise, &data);

        assert_eq!(out.identity.model.as_deref(), Some("UPS 10kVA"));
        assert_eq!(out.identity.battery_type.as_deref(), Some("Lithium-ion"));
    }

    #[test]
    fn standard_prefers_its_own_tags_over_layered_ones() {
        let data = raw(&[
            ("1.3.6.1.2.1.33.1.1.2.0", "UPS-MIB model"),
            ("1.3.6.1.4.1.56788.1.1.1.1.3", "vendor model"),
            ("1.3.6.1.4.1.56788.1.1.1.1.4", "SN-001"),
        ]);

        let out = normalize(DialectKind::Standard, &data);

        assert_eq!(out.identity.model.as_deref(), Some("UPS-MIB model"));
        assert_eq!(out.identity.serial.as_deref(), Some("SN-001"));
    }

    #[test]
    fn minimal_device_gets_derived_fields() {
        let data = raw(&[
            ("1.3.6.1.4.1.935.1.1.1.1.1.1.0", "HS-1K"),
            ("1.3.6.1.4.1.935.1.1.1.2.2.1.0", "90"),
            ("1.3.6.1.4.1.935.1.1.1.3.2.1.0", "1232"),
            ("1.3.6.1.4.1.935.1.1.1.3.2.4.0", "600"),
            ("1.3.6.1.4.1.935.1.1.1.4.2.1.0", "1201"),
        ]);

        let out = normalize(DialectKind::Minimal, &data);

        assert_eq!(out.identity.manufacturer.as_deref(), Some(minimal::MANUFACTURER));
        assert_eq!(number(&out.telemetry.input.voltage.l1), 123.2);
        assert_eq!(number(&out.telemetry.output.voltage.l1), 120.1);
        assert_eq!(number(&out.telemetry.output.frequency), 60.0);
        assert_eq!(
            out.telemetry.status.power_source,
            Some(Reading::Text("Normal".into()))
        );
    }

    #[test]
    fn empty_raw_map_gives_empty_record() {
        let out = normalize(DialectKind::Enterprise, &RawMap::new());
        assert!(out.telemetry.is_empty());
        assert!(out.identity.is_empty());
    }
}
