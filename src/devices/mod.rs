// MIT License - Copyright (c) 2026 Peter Wright
// Device models

pub mod record;
pub mod siren;
pub mod zone;

pub use record::{DeviceKind, DeviceRecord, Snapshot};
pub use siren::{ExDevStatus, ExDevStatusBody, SirenStatus};
pub use zone::{ZoneStatus, ZoneStatusList};
