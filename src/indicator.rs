use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Issues, Problem};
use crate::pin::{Gpio, PinRegistry, Role};

/// Status display wiring: a MAX7219-style LED matrix on a three-wire
/// serial hookup, or three discrete RGB legs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Indicator {
    Matrix {
        din_pin: Gpio,
        cs_pin: Gpio,
        clk_pin: Gpio,
    },
    Rgb {
        red_pin: Gpio,
        green_pin: Gpio,
        blue_pin: Gpio,
    },
}

impl Indicator {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            Indicator::Matrix { .. } => IndicatorKind::Matrix,
            Indicator::Rgb { .. } => IndicatorKind::Rgb,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    Matrix,
    Rgb,
}

impl FromStr for IndicatorKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matrix" => Ok(IndicatorKind::Matrix),
            "rgb" => Ok(IndicatorKind::Rgb),
            _ => Err(()),
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Matrix => write!(f, "matrix"),
            IndicatorKind::Rgb => write!(f, "rgb"),
        }
    }
}

// One flat raw table for both kinds; the declared kind decides which
// pins are consumed and which are flagged as unused.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawIndicator {
    pub kind: Option<String>,
    pub din_pin: Option<i64>,
    pub cs_pin: Option<i64>,
    pub clk_pin: Option<i64>,
    pub red_pin: Option<i64>,
    pub green_pin: Option<i64>,
    pub blue_pin: Option<i64>,
}

pub(crate) fn resolve(
    raw: RawIndicator,
    expected: Option<IndicatorKind>,
    class_label: &str,
    pins: &mut PinRegistry,
    issues: &mut Issues,
) -> Option<Indicator> {
    let kind = match raw.kind {
        Some(value) => match value.parse::<IndicatorKind>() {
            Ok(kind) => Some(kind),
            Err(()) => {
                issues.push("indicator.kind", Problem::UnknownIndicatorKind { value });
                None
            }
        },
        None => {
            issues.missing("indicator.kind");
            None
        }
    };

    let kind = kind?;
    if let Some(expected) = expected {
        if kind != expected {
            issues.push(
                "indicator.kind",
                Problem::WrongIndicatorKind {
                    class: class_label.to_string(),
                    expected: expected.to_string(),
                },
            );
        }
    }

    match kind {
        IndicatorKind::Matrix => {
            reject_stray(&raw.red_pin, "indicator.red_pin", "a matrix indicator", issues);
            reject_stray(&raw.green_pin, "indicator.green_pin", "a matrix indicator", issues);
            reject_stray(&raw.blue_pin, "indicator.blue_pin", "a matrix indicator", issues);

            let din_pin = pins.claim(raw.din_pin, "indicator.din_pin", Role::Output, issues);
            let cs_pin = pins.claim(raw.cs_pin, "indicator.cs_pin", Role::Output, issues);
            let clk_pin = pins.claim(raw.clk_pin, "indicator.clk_pin", Role::Output, issues);

            Some(Indicator::Matrix {
                din_pin: din_pin?,
                cs_pin: cs_pin?,
                clk_pin: clk_pin?,
            })
        }
        IndicatorKind::Rgb => {
            reject_stray(&raw.din_pin, "indicator.din_pin", "an rgb indicator", issues);
            reject_stray(&raw.cs_pin, "indicator.cs_pin", "an rgb indicator", issues);
            reject_stray(&raw.clk_pin, "indicator.clk_pin", "an rgb indicator", issues);

            let red_pin = pins.claim(raw.red_pin, "indicator.red_pin", Role::Output, issues);
            let green_pin = pins.claim(raw.green_pin, "indicator.green_pin", Role::Output, issues);
            let blue_pin = pins.claim(raw.blue_pin, "indicator.blue_pin", Role::Output, issues);

            Some(Indicator::Rgb {
                red_pin: red_pin?,
                green_pin: green_pin?,
                blue_pin: blue_pin?,
            })
        }
    }
}

fn reject_stray(value: &Option<i64>, field: &str, by: &str, issues: &mut Issues) {
    if value.is_some() {
        issues.unused(field, by);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_raw() -> RawIndicator {
        RawIndicator {
            kind: Some("matrix".into()),
            din_pin: Some(5),
            cs_pin: Some(13),
            clk_pin: Some(12),
            ..RawIndicator::default()
        }
    }

    #[test]
    fn resolves_a_matrix_indicator() {
        let mut issues = Issues::default();
        let mut pins = PinRegistry::default();

        let indicator = resolve(
            matrix_raw(),
            Some(IndicatorKind::Matrix),
            "generic devices",
            &mut pins,
            &mut issues,
        )
        .expect("valid indicator");

        assert_eq!(indicator.kind(), IndicatorKind::Matrix);
        assert!(issues.is_empty());
    }

    #[test]
    fn flags_a_kind_the_class_does_not_drive() {
        let mut issues = Issues::default();
        let mut pins = PinRegistry::default();

        resolve(
            matrix_raw(),
            Some(IndicatorKind::Rgb),
            "environment devices",
            &mut pins,
            &mut issues,
        );

        let issues = issues.into_vec();
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].problem,
            Problem::WrongIndicatorKind {
                class: "environment devices".into(),
                expected: "rgb".into(),
            }
        );
    }

    #[test]
    fn flags_pins_from_the_other_kind() {
        let mut issues = Issues::default();
        let mut pins = PinRegistry::default();

        let mut raw = matrix_raw();
        raw.red_pin = Some(4);

        resolve(raw, None, "generic devices", &mut pins, &mut issues);

        let issues = issues.into_vec();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "indicator.red_pin");
        assert_eq!(issues[0].problem, Problem::Unused("a matrix indicator".into()));
    }

    #[test]
    fn missing_kind_still_reports_once() {
        let mut issues = Issues::default();
        let mut pins = PinRegistry::default();

        let raw = RawIndicator::default();
        assert!(resolve(raw, None, "generic devices", &mut pins, &mut issues).is_none());
        assert_eq!(issues.into_vec().len(), 1);
    }
}
