use serde::{Deserialize, Serialize};

use crate::error::Issues;
use crate::pin::{Gpio, PinRegistry, Role};

/// Resistive soil moisture probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Moisture {
    /// Supply pin. The probe is energised only while sampling to slow
    /// electrode corrosion, so its power rail is a GPIO.
    pub power_pin: Gpio,
    /// Analog sense pin.
    pub sense_pin: Gpio,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawMoisture {
    pub power_pin: Option<i64>,
    pub sense_pin: Option<i64>,
}

pub(crate) fn resolve(
    raw: RawMoisture,
    pins: &mut PinRegistry,
    issues: &mut Issues,
) -> Option<Moisture> {
    let power_pin = pins.claim(raw.power_pin, "sensors.moisture.power_pin", Role::Output, issues);
    let sense_pin = pins.claim(raw.sense_pin, "sensors.moisture.sense_pin", Role::Input, issues);

    Some(Moisture {
        power_pin: power_pin?,
        sense_pin: sense_pin?,
    })
}
