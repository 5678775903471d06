pub mod alarms;
pub mod json;
pub mod normalizer;
pub mod snapshot;

pub use alarms::{AlarmThresholds, alarms_for, extract_alarms, threshold_alarms};
pub use json::JsonFormatter;
pub use normalizer::{Normalized, normalize};
pub use snapshot::{Alarm, DeviceInfo, DeviceStatus, Reading, Telemetry, TelemetrySnapshot};
