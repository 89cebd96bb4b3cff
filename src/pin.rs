use std::fmt;

use serde::Serialize;

use crate::error::{Issues, Problem};

/// Highest GPIO number on the ESP32.
pub const GPIO_MAX: u8 = 39;

// GPIO34-39 have no output driver.
const INPUT_ONLY_FIRST: u8 = 34;

/// A validated ESP32 GPIO number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Gpio(u8);

impl Gpio {
    pub fn number(self) -> u8 {
        self.0
    }

    /// GPIO34-39 can only be read, never driven.
    pub fn is_input_only(self) -> bool {
        self.0 >= INPUT_ONLY_FIRST
    }
}

impl fmt::Display for Gpio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// How a peripheral uses its pin. `Output` covers everything the firmware
/// drives: trigger lines, indicator segments, sensor power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Input,
    Output,
}

/// Tracks which GPIO is claimed by which field so a pin wired to two
/// peripherals surfaces as a validation issue.
#[derive(Debug, Default)]
pub struct PinRegistry {
    claimed: Vec<(Gpio, String)>,
}

impl PinRegistry {
    /// Validate a raw pin number and claim it for `field`. Records an
    /// issue and returns `None` when the pin is unusable.
    pub fn claim(
        &mut self,
        raw: Option<i64>,
        field: &str,
        role: Role,
        issues: &mut Issues,
    ) -> Option<Gpio> {
        let value = match raw {
            Some(value) => value,
            None => {
                issues.missing(field);
                return None;
            }
        };

        let number = match u8::try_from(value) {
            Ok(number) if number <= GPIO_MAX => number,
            _ => {
                issues.push(field, Problem::NotAGpio { value });
                return None;
            }
        };

        let pin = Gpio(number);
        if role == Role::Output && pin.is_input_only() {
            issues.push(field, Problem::InputOnlyGpio { pin: number });
            return None;
        }

        if let Some((_, other)) = self.claimed.iter().find(|(claimed, _)| *claimed == pin) {
            issues.push(
                field,
                Problem::DuplicateGpio {
                    pin: number,
                    other: other.clone(),
                },
            );
            return None;
        }

        self.claimed.push((pin, field.to_string()));
        Some(pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Issue;

    #[test]
    fn claims_a_valid_pin() {
        let mut issues = Issues::default();
        let mut pins = PinRegistry::default();

        let pin = pins.claim(Some(27), "sensors.dht.pin", Role::Output, &mut issues);

        assert_eq!(pin.map(Gpio::number), Some(27));
        assert!(issues.is_empty());
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        let mut issues = Issues::default();
        let mut pins = PinRegistry::default();

        for value in [-1, 40, 255, 1000] {
            assert!(pins
                .claim(Some(value), "sensors.dht.pin", Role::Input, &mut issues)
                .is_none());
        }

        assert_eq!(issues.into_vec().len(), 4);
    }

    #[test]
    fn rejects_input_only_pins_for_outputs() {
        let mut issues = Issues::default();
        let mut pins = PinRegistry::default();

        assert!(pins
            .claim(Some(35), "indicator.din_pin", Role::Output, &mut issues)
            .is_none());
        assert_eq!(
            issues.into_vec(),
            vec![Issue {
                field: "indicator.din_pin".into(),
                problem: Problem::InputOnlyGpio { pin: 35 },
            }]
        );
    }

    #[test]
    fn allows_input_only_pins_for_inputs() {
        let mut issues = Issues::default();
        let mut pins = PinRegistry::default();

        assert!(pins
            .claim(Some(35), "sensors.light.pin", Role::Input, &mut issues)
            .is_some());
        assert!(issues.is_empty());
    }

    #[test]
    fn reports_double_assignment_with_the_first_claimant() {
        let mut issues = Issues::default();
        let mut pins = PinRegistry::default();

        pins.claim(Some(16), "sensors.moisture.sense_pin", Role::Input, &mut issues);
        let second = pins.claim(Some(16), "sensors.light.pin", Role::Input, &mut issues);

        assert!(second.is_none());
        assert_eq!(
            issues.into_vec(),
            vec![Issue {
                field: "sensors.light.pin".into(),
                problem: Problem::DuplicateGpio {
                    pin: 16,
                    other: "sensors.moisture.sense_pin".into(),
                },
            }]
        );
    }
}
