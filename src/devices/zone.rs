// MIT License - Copyright (c) 2026 Peter Wright
// ISAPI zone status wire model

use serde::Deserialize;

use super::record::{DeviceKind, DeviceRecord};

/// Response body of `GET /ISAPI/SecurityCP/status/zones?format=json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneStatusList {
    #[serde(rename = "ZoneList", default)]
    pub zones: Vec<ZoneEntry>,
}

/// The panel wraps each zone in a single-key object.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneEntry {
    #[serde(rename = "Zone")]
    pub zone: ZoneStatus,
}

/// Status of one alarm zone as reported by the panel.
///
/// Wired zones report no radio or battery data, so all numeric fields
/// default to zero when absent. `signal` is the bar indicator shown in
/// the panel UI; `real_signal` is the underlying dBm-derived value and
/// is what the bridge exports.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStatus {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tamper_evident: bool,
    #[serde(default)]
    pub charge: Option<String>,
    #[serde(default)]
    pub charge_value: i32,
    #[serde(default)]
    pub signal: i32,
    #[serde(default)]
    pub real_signal: i32,
    #[serde(default)]
    pub temperature: i32,
}

impl ZoneStatus {
    /// Normalize into the uniform record shape shared with sirens.
    pub fn to_record(&self) -> DeviceRecord {
        DeviceRecord {
            kind: DeviceKind::Zone,
            id: self.id,
            name: self.name.clone(),
            signal: self.real_signal,
            temperature: self.temperature,
            charge_value: self.charge_value,
        }
    }
}
