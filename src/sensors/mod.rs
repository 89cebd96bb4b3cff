use serde::{Deserialize, Serialize};

use crate::error::Issues;
use crate::pin::PinRegistry;
use crate::settings::{gate, Profile};

pub mod dht;
pub mod light;
pub mod moisture;
pub mod ultrasonic;

pub use dht::{Dht, DhtModel};
pub use light::Light;
pub use moisture::Moisture;
pub use ultrasonic::Ultrasonic;

pub(crate) use dht::RawDht;
pub(crate) use light::RawLight;
pub(crate) use moisture::RawMoisture;
pub(crate) use ultrasonic::RawUltrasonic;

/// Sensor wiring for one device. Which sections must be present is
/// decided by the device class profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dht: Option<Dht>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moisture: Option<Moisture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ultrasonic: Option<Ultrasonic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light: Option<Light>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawSensors {
    pub dht: Option<RawDht>,
    pub moisture: Option<RawMoisture>,
    pub ultrasonic: Option<RawUltrasonic>,
    pub light: Option<RawLight>,
}

pub(crate) fn resolve(
    raw: Option<RawSensors>,
    profile: &Profile,
    pins: &mut PinRegistry,
    issues: &mut Issues,
) -> Sensors {
    let raw = raw.unwrap_or_default();

    let dht = gate(raw.dht, profile.dht, "sensors.dht", profile.label, issues)
        .and_then(|raw| dht::resolve(raw, pins, issues));

    let moisture = gate(
        raw.moisture,
        profile.moisture,
        "sensors.moisture",
        profile.label,
        issues,
    )
    .and_then(|raw| moisture::resolve(raw, pins, issues));

    let ultrasonic = gate(
        raw.ultrasonic,
        profile.ultrasonic,
        "sensors.ultrasonic",
        profile.label,
        issues,
    )
    .and_then(|raw| ultrasonic::resolve(raw, profile.pot_offset, profile.label, pins, issues));

    let light = gate(raw.light, profile.light, "sensors.light", profile.label, issues)
        .and_then(|raw| light::resolve(raw, pins, issues));

    Sensors {
        dht,
        moisture,
        ultrasonic,
        light,
    }
}
