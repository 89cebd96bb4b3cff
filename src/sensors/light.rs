use serde::{Deserialize, Serialize};

use crate::error::{Issues, Problem};
use crate::pin::{Gpio, PinRegistry, Role};

/// The divider cannot sit above the ESP32 ADC ceiling.
pub const REFERENCE_VOLTAGE_MAX: f64 = 3.6;

/// Photoresistor divider read through the ADC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Light {
    pub pin: Gpio,
    /// Supply voltage of the divider, used to convert raw readings.
    pub reference_voltage: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawLight {
    pub pin: Option<i64>,
    pub reference_voltage: Option<f64>,
}

pub(crate) fn resolve(raw: RawLight, pins: &mut PinRegistry, issues: &mut Issues) -> Option<Light> {
    let pin = pins.claim(raw.pin, "sensors.light.pin", Role::Input, issues);

    let reference_voltage = match raw.reference_voltage {
        Some(value) if value.is_finite() && value > 0.0 && value <= REFERENCE_VOLTAGE_MAX => {
            Some(value)
        }
        Some(_) => {
            issues.push(
                "sensors.light.reference_voltage",
                Problem::OutOfRange {
                    min: 0.0,
                    max: REFERENCE_VOLTAGE_MAX,
                },
            );
            None
        }
        None => {
            issues.missing("sensors.light.reference_voltage");
            None
        }
    };

    Some(Light {
        pin: pin?,
        reference_voltage: reference_voltage?,
    })
}
