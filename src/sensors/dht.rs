use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Issues, Problem};
use crate::pin::{Gpio, PinRegistry, Role};

/// DHT11/DHT22 single-wire temperature and humidity sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dht {
    /// Data line. The protocol pulls the line low to request a reading,
    /// so the pin must be output-capable.
    pub pin: Gpio,
    pub model: DhtModel,
}

/// Supported sensor models. The two differ in resolution and pulse
/// timing, which the sampling firmware needs to know up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DhtModel {
    Dht11,
    Dht22,
}

impl FromStr for DhtModel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dht11" => Ok(DhtModel::Dht11),
            "dht22" => Ok(DhtModel::Dht22),
            _ => Err(()),
        }
    }
}

impl fmt::Display for DhtModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DhtModel::Dht11 => write!(f, "dht11"),
            DhtModel::Dht22 => write!(f, "dht22"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawDht {
    pub pin: Option<i64>,
    pub model: Option<String>,
}

pub(crate) fn resolve(raw: RawDht, pins: &mut PinRegistry, issues: &mut Issues) -> Option<Dht> {
    let pin = pins.claim(raw.pin, "sensors.dht.pin", Role::Output, issues);

    let model = match raw.model {
        Some(value) => match value.parse() {
            Ok(model) => Some(model),
            Err(()) => {
                issues.push("sensors.dht.model", Problem::UnknownSensorModel { value });
                None
            }
        },
        None => {
            issues.missing("sensors.dht.model");
            None
        }
    };

    Some(Dht {
        pin: pin?,
        model: model?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_models() {
        assert_eq!("dht11".parse(), Ok(DhtModel::Dht11));
        assert_eq!("dht22".parse(), Ok(DhtModel::Dht22));
        assert_eq!("dht21".parse::<DhtModel>(), Err(()));
        assert_eq!("DHT11".parse::<DhtModel>(), Err(()));
    }

    #[test]
    fn unknown_model_is_reported_alongside_the_pin() {
        let mut issues = Issues::default();
        let mut pins = PinRegistry::default();

        let raw = RawDht {
            pin: Some(99),
            model: Some("dht21".into()),
        };

        assert!(resolve(raw, &mut pins, &mut issues).is_none());
        assert_eq!(issues.into_vec().len(), 2);
    }
}
