use super::ProfileError;

/// Отображение числового кода перечисления в метку
#[derive(Debug)]
pub struct Decoder {
    pub name: &'static str,
    pub entries: &'static [(i64, &'static str)],
}

impl Decoder {
    pub fn label(&self, code: i64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
    }

    /// Никогда не падает: для неизвестного кода возвращает "unknown code N"
    pub fn decode(&self, code: i64) -> String {
        match self.label(code) {
            Some(label) => label.to_string(),
            None => format!("unknown code {}", code),
        }
    }

    pub(super) fn validate(&self) -> Result<(), ProfileError> {
        for (i, (code, _)) in self.entries.iter().enumerate() {
            if self.entries[..i].iter().any(|(c, _)| c == code) {
                return Err(ProfileError::DuplicateCode {
                    decoder: self.name,
                    code: *code,
                });
            }
        }
        Ok(())
    }
}

// RFC 1628 upsBatteryStatus
pub static UPS_MIB_BATTERY_STATUS: Decoder = Decoder {
    name: "ups_mib_battery_status",
    entries: &[(1, "Unknown"), (2, "Normal"), (3, "Low"), (4, "Depleted")],
};

// RFC 1628 upsOutputSource
pub static UPS_MIB_OUTPUT_SOURCE: Decoder = Decoder {
    name: "ups_mib_output_source",
    entries: &[
        (1, "Other"),
        (2, "None"),
        (3, "Normal"),
        (4, "Bypass"),
        (5, "Battery"),
        (6, "Booster"),
        (7, "Reducer"),
    ],
};

pub static POWER_SOURCE: Decoder = Decoder {
    name: "power_source",
    entries: &[(0, "None"), (1, "Normal"), (2, "Bypass")],
};

pub static BATTERY_STATUS: Decoder = Decoder {
    name: "battery_status",
    entries: &[
        (0, "Not connected"),
        (1, "Not operating"),
        (2, "Float charge"),
        (3, "Boost charge"),
        (4, "Discharging"),
    ],
};

pub static CONNECTION: Decoder = Decoder {
    name: "connection",
    entries: &[(0, "Disconnected"), (1, "Connected")],
};

pub static MAINTENANCE_BREAKER: Decoder = Decoder {
    name: "maintenance_breaker",
    entries: &[(0, "Open"), (1, "Closed")],
};

pub static BATTERY_TEST_RESULT: Decoder = Decoder {
    name: "battery_test_result",
    entries: &[(0, "No test"), (1, "Passed"), (2, "Failed"), (3, "In progress")],
};

pub static BATTERY_TYPE: Decoder = Decoder {
    name: "battery_type",
    entries: &[(0, "VRLA"), (1, "Lithium-ion"), (2, "NiCd")],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_decode_to_labels() {
        assert_eq!(UPS_MIB_BATTERY_STATUS.decode(3), "Low");
        assert_eq!(POWER_SOURCE.decode(2), "Bypass");
        assert_eq!(BATTERY_TYPE.decode(0), "VRLA");
    }

    #[test]
    fn unknown_codes_fall_back_to_text_with_code() {
        for code in [-1, 0, 99, i64::MAX] {
            let label = UPS_MIB_BATTERY_STATUS.decode(code);
            assert!(label.contains(&code.to_string()), "{}", label);
        }
    }
}
