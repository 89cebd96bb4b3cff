use serde::{Deserialize, Serialize};

use crate::error::{Issues, Problem};
use crate::pin::{Gpio, PinRegistry, Role};
use crate::settings::Requirement;

/// HC-SR04 ultrasonic distance sensor: a short pulse on the trigger pin,
/// distance read back as the echo pulse width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ultrasonic {
    pub trigger_pin: Gpio,
    pub echo_pin: Gpio,
    /// Sensor-to-pot-rim distance. Plant height is reported relative to
    /// it on device classes that calibrate against the pot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pot_offset_cm: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawUltrasonic {
    pub trigger_pin: Option<i64>,
    pub echo_pin: Option<i64>,
    pub pot_offset_cm: Option<f64>,
}

pub(crate) fn resolve(
    raw: RawUltrasonic,
    offset: Requirement,
    class_label: &str,
    pins: &mut PinRegistry,
    issues: &mut Issues,
) -> Option<Ultrasonic> {
    let trigger_pin = pins.claim(
        raw.trigger_pin,
        "sensors.ultrasonic.trigger_pin",
        Role::Output,
        issues,
    );
    let echo_pin = pins.claim(raw.echo_pin, "sensors.ultrasonic.echo_pin", Role::Input, issues);

    let pot_offset_cm = match (raw.pot_offset_cm, offset) {
        (Some(_), Requirement::Unused) => {
            issues.unused("sensors.ultrasonic.pot_offset_cm", class_label);
            None
        }
        (Some(value), _) if value.is_finite() && value > 0.0 => Some(value),
        (Some(_), _) => {
            issues.push("sensors.ultrasonic.pot_offset_cm", Problem::NotPositive);
            None
        }
        (None, Requirement::Required) => {
            issues.missing("sensors.ultrasonic.pot_offset_cm");
            None
        }
        (None, _) => None,
    };

    Some(Ultrasonic {
        trigger_pin: trigger_pin?,
        echo_pin: echo_pin?,
        pot_offset_cm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pot_offset_cm: Option<f64>) -> RawUltrasonic {
        RawUltrasonic {
            trigger_pin: Some(25),
            echo_pin: Some(26),
            pot_offset_cm,
        }
    }

    #[test]
    fn pot_offset_must_be_positive_and_finite() {
        for bad in [0.0, -3.5, f64::NAN, f64::INFINITY] {
            let mut issues = Issues::default();
            let mut pins = PinRegistry::default();

            let sensor = resolve(
                raw(Some(bad)),
                Requirement::Required,
                "generic-light devices",
                &mut pins,
                &mut issues,
            );

            assert_eq!(sensor.map(|s| s.pot_offset_cm), Some(None));
            assert!(!issues.is_empty());
        }
    }

    #[test]
    fn pot_offset_is_flagged_when_the_class_ignores_it() {
        let mut issues = Issues::default();
        let mut pins = PinRegistry::default();

        resolve(
            raw(Some(12.5)),
            Requirement::Unused,
            "height devices",
            &mut pins,
            &mut issues,
        );

        let issues = issues.into_vec();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "sensors.ultrasonic.pot_offset_cm");
        assert_eq!(issues[0].problem, Problem::Unused("height devices".into()));
    }
}
