use std::fmt;
use std::path::Path;
use std::str::FromStr;

use config::{Config, Environment, File};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Issues, Problem};
use crate::indicator::{self, Indicator, IndicatorKind, RawIndicator};
use crate::pin::PinRegistry;
use crate::sensors::{self, RawSensors, Sensors};
use crate::telemetry::{self, RawTelemetry, Telemetry};

/// DHCP hostname limit the device id must fit.
pub const MAX_DEVICE_ID_LEN: usize = 32;
/// 802.11 SSIDs cap at 32 bytes.
pub const MAX_SSID_LEN: usize = 32;
/// WPA2 pre-shared keys cap at 64 bytes.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Environment variables prefixed `PLANT_` override file values, with
/// `__` separating sections, e.g. `PLANT_TELEMETRY__INFLUX__TOKEN`.
pub const ENV_PREFIX: &str = "PLANT";

/// One device's complete configuration, validated against its class
/// profile. Built by [`Settings::load`] before any subsystem starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub device: Device,
    pub wifi: Wifi,
    pub sensors: Sensors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<Indicator>,
    pub telemetry: Telemetry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    /// Unique sensor name, also used as the DHCP hostname.
    pub id: heapless::String<MAX_DEVICE_ID_LEN>,
    pub class: DeviceClass,
    /// Seconds between reports.
    pub interval_seconds: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wifi {
    pub ssid: heapless::String<MAX_SSID_LEN>,
    pub password: heapless::String<MAX_PASSWORD_LEN>,
}

/// The four firmware variants a configuration can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceClass {
    /// DHT11 plus soil moisture, height ranging and an LED matrix.
    Generic,
    /// DHT22 build with a light sensor, pot-calibrated height ranging
    /// and a Graphite metrics sink on top of the generic set.
    GenericLight,
    /// Soil and air monitoring with an RGB status LED, no ranging.
    Environment,
    /// Height ranging only.
    Height,
}

impl DeviceClass {
    pub const ALL: [DeviceClass; 4] = [
        DeviceClass::Generic,
        DeviceClass::GenericLight,
        DeviceClass::Environment,
        DeviceClass::Height,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceClass::Generic => "generic",
            DeviceClass::GenericLight => "generic-light",
            DeviceClass::Environment => "environment",
            DeviceClass::Height => "height",
        }
    }

    pub(crate) fn profile(self) -> Profile {
        use Requirement::{Required, Unused};

        match self {
            DeviceClass::Generic => Profile {
                label: "generic devices",
                dht: Required,
                moisture: Required,
                ultrasonic: Required,
                pot_offset: Unused,
                light: Unused,
                indicator: Required,
                indicator_kind: Some(IndicatorKind::Matrix),
                loki: Required,
                graphite: Unused,
            },
            DeviceClass::GenericLight => Profile {
                label: "generic-light devices",
                dht: Required,
                moisture: Required,
                ultrasonic: Required,
                pot_offset: Required,
                light: Required,
                indicator: Required,
                indicator_kind: Some(IndicatorKind::Matrix),
                loki: Required,
                graphite: Required,
            },
            DeviceClass::Environment => Profile {
                label: "environment devices",
                dht: Required,
                moisture: Required,
                ultrasonic: Unused,
                pot_offset: Unused,
                light: Unused,
                indicator: Required,
                indicator_kind: Some(IndicatorKind::Rgb),
                loki: Unused,
                graphite: Unused,
            },
            DeviceClass::Height => Profile {
                label: "height devices",
                dht: Unused,
                moisture: Unused,
                ultrasonic: Required,
                pot_offset: Unused,
                light: Unused,
                indicator: Unused,
                indicator_kind: None,
                loki: Unused,
                graphite: Unused,
            },
        }
    }
}

impl FromStr for DeviceClass {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(DeviceClass::Generic),
            "generic-light" => Ok(DeviceClass::GenericLight),
            "environment" => Ok(DeviceClass::Environment),
            "height" => Ok(DeviceClass::Height),
            _ => Err(()),
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a device class consumes a configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Requirement {
    Required,
    Optional,
    Unused,
}

/// Field coverage for one device class: which sections its firmware
/// reads. A required section that is absent and a present section the
/// class never reads are both validation issues.
#[derive(Debug, Clone)]
pub(crate) struct Profile {
    pub label: &'static str,
    pub dht: Requirement,
    pub moisture: Requirement,
    pub ultrasonic: Requirement,
    pub pot_offset: Requirement,
    pub light: Requirement,
    pub indicator: Requirement,
    pub indicator_kind: Option<IndicatorKind>,
    pub loki: Requirement,
    pub graphite: Requirement,
}

impl Profile {
    // Used while the device class itself is unknown: validate whatever
    // is present, report nothing about coverage.
    fn lenient() -> Self {
        use Requirement::Optional;

        Profile {
            label: "this device class",
            dht: Optional,
            moisture: Optional,
            ultrasonic: Optional,
            pot_offset: Optional,
            light: Optional,
            indicator: Optional,
            indicator_kind: None,
            loki: Optional,
            graphite: Optional,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawSettings {
    pub device: Option<RawDevice>,
    pub wifi: Option<RawWifi>,
    pub sensors: Option<RawSensors>,
    pub indicator: Option<RawIndicator>,
    pub telemetry: Option<RawTelemetry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawDevice {
    pub id: Option<String>,
    pub class: Option<String>,
    // Wide on purpose: zero and negative intervals must reach
    // validation instead of dying as a type error.
    pub interval_seconds: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawWifi {
    pub ssid: Option<String>,
    pub password: Option<String>,
}

impl Settings {
    /// Load and validate a configuration file, with `PLANT_*`
    /// environment variables overriding file values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());

        let raw: RawSettings = Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        let settings = Self::from_raw(raw)?;
        info!(
            "Configuration loaded: {} ({}), reporting every {}s",
            settings.device.id, settings.device.class, settings.device.interval_seconds
        );
        Ok(settings)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, Error> {
        let raw: RawSettings = toml::from_str(input)?;
        Self::from_raw(raw)
    }

    /// Render the record back to TOML. Parsing the output yields an
    /// equal record.
    pub fn to_toml_string(&self) -> Result<String, Error> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate a raw document, reporting every problem at once.
    pub(crate) fn from_raw(raw: RawSettings) -> Result<Self, Error> {
        let mut issues = Issues::default();
        let mut pins = PinRegistry::default();

        let raw_device = raw.device.unwrap_or_default();
        let id = bounded::<MAX_DEVICE_ID_LEN>(raw_device.id, "device.id", &mut issues);
        let class = match raw_device.class {
            Some(value) => match value.parse::<DeviceClass>() {
                Ok(class) => Some(class),
                Err(()) => {
                    issues.push("device.class", Problem::UnknownDeviceClass { value });
                    None
                }
            },
            None => {
                issues.missing("device.class");
                None
            }
        };
        let interval_seconds = resolve_interval(raw_device.interval_seconds, &mut issues);

        let raw_wifi = raw.wifi.unwrap_or_default();
        let ssid = bounded::<MAX_SSID_LEN>(raw_wifi.ssid, "wifi.ssid", &mut issues);
        let password = bounded::<MAX_PASSWORD_LEN>(raw_wifi.password, "wifi.password", &mut issues);

        let profile = class.map(DeviceClass::profile).unwrap_or_else(Profile::lenient);

        let sensors = sensors::resolve(raw.sensors, &profile, &mut pins, &mut issues);

        let indicator = gate(
            raw.indicator,
            profile.indicator,
            "indicator",
            profile.label,
            &mut issues,
        )
        .and_then(|raw| {
            indicator::resolve(raw, profile.indicator_kind, profile.label, &mut pins, &mut issues)
        });

        let telemetry = telemetry::resolve(raw.telemetry, &profile, &mut issues);

        match (id, class, interval_seconds, ssid, password, telemetry) {
            (
                Some(id),
                Some(class),
                Some(interval_seconds),
                Some(ssid),
                Some(password),
                Some(telemetry),
            ) if issues.is_empty() => Ok(Settings {
                device: Device {
                    id,
                    class,
                    interval_seconds,
                },
                wifi: Wifi { ssid, password },
                sensors,
                indicator,
                telemetry,
            }),
            _ => Err(issues.into()),
        }
    }
}

fn resolve_interval(raw: Option<i64>, issues: &mut Issues) -> Option<u16> {
    let value = match raw {
        Some(value) => value,
        None => {
            issues.missing("device.interval_seconds");
            return None;
        }
    };

    match u16::try_from(value) {
        Ok(seconds) if seconds >= 1 => Some(seconds),
        _ => {
            issues.push("device.interval_seconds", Problem::IntervalOutOfRange { value });
            None
        }
    }
}

fn bounded<const N: usize>(
    raw: Option<String>,
    field: &str,
    issues: &mut Issues,
) -> Option<heapless::String<N>> {
    let value = require_string(raw, field, issues)?;
    match heapless::String::from_str(&value) {
        Ok(bounded) => Some(bounded),
        Err(_) => {
            issues.push(field, Problem::TooLong { max: N });
            None
        }
    }
}

/// Reject missing and blank values in one place.
pub(crate) fn require_string(
    raw: Option<String>,
    field: &str,
    issues: &mut Issues,
) -> Option<String> {
    match raw {
        Some(value) if value.trim().is_empty() => {
            issues.push(field, Problem::Empty);
            None
        }
        Some(value) => Some(value),
        None => {
            issues.missing(field);
            None
        }
    }
}

/// Apply a class profile to one optional section: pass through what the
/// class consumes, flag what it requires but lacks or carries unread.
pub(crate) fn gate<T>(
    raw: Option<T>,
    requirement: Requirement,
    field: &str,
    label: &str,
    issues: &mut Issues,
) -> Option<T> {
    match (raw, requirement) {
        (Some(_), Requirement::Unused) => {
            issues.unused(field, label);
            None
        }
        (Some(value), _) => Some(value),
        (None, Requirement::Required) => {
            issues.missing(field);
            None
        }
        (None, _) => None,
    }
}
