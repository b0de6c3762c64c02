// MIT License - Copyright (c) 2026 Peter Wright
// ISAPI external-device status wire model

use serde::Deserialize;

use super::record::{DeviceKind, DeviceRecord};

/// Response body of `GET /ISAPI/SecurityCP/status/exDevStatus?format=json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExDevStatusBody {
    #[serde(rename = "ExDevStatus", default)]
    pub status: ExDevStatus,
}

/// The external-device report. The panel also lists output modules,
/// repeaters, keypads, remotes and transmitters here; the bridge only
/// consumes the sirens.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExDevStatus {
    #[serde(rename = "SirenList", default)]
    pub sirens: Vec<SirenEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SirenEntry {
    #[serde(rename = "Siren")]
    pub siren: SirenStatus,
}

/// Status of one wireless siren.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SirenStatus {
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
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub is_via_repeater: bool,
}

impl SirenStatus {
    /// Normalize into the uniform record shape shared with zones.
    pub fn to_record(&self) -> DeviceRecord {
        DeviceRecord {
            kind: DeviceKind::Siren,
            id: self.id,
            name: self.name.clone(),
            signal: self.real_signal,
            temperature: self.temperature,
            charge_value: self.charge_value,
        }
    }
}
