//! Typed, validated configuration for the plant/sourdough monitoring
//! device family.
//!
//! One TOML document (plus `PLANT_*` environment overrides for secrets)
//! describes a device: identity, Wi-Fi, sensor and indicator wiring, and
//! telemetry sink credentials. [`settings::Settings::load`] checks the
//! whole document against the declared device class and reports every
//! missing, malformed or unread field in a single pass, so a bad flash
//! configuration fails at startup instead of at first upload.

pub mod error;
pub mod indicator;
pub mod pin;
pub mod sensors;
pub mod settings;
pub mod telemetry;

pub use error::{Error, Issue, Problem};
pub use settings::{DeviceClass, Settings};
