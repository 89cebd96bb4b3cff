use std::fmt;

use config::ConfigError;
use thiserror::Error;

/// What is wrong with a single configuration field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Problem {
    #[error("required but missing")]
    Missing,

    #[error("not used by {0}")]
    Unused(String),

    #[error("must not be empty")]
    Empty,

    #[error("must be at most {max} bytes")]
    TooLong { max: usize },

    #[error("{value} is not an ESP32 GPIO (expected 0-39)")]
    NotAGpio { value: i64 },

    #[error("GPIO{pin} is input-only and cannot drive this peripheral")]
    InputOnlyGpio { pin: u8 },

    #[error("GPIO{pin} is already assigned to {other}")]
    DuplicateGpio { pin: u8, other: String },

    #[error("interval of {value} seconds is out of range (expected 1-65535)")]
    IntervalOutOfRange { value: i64 },

    #[error("unknown device class {value:?} (expected \"generic\", \"generic-light\", \"environment\" or \"height\")")]
    UnknownDeviceClass { value: String },

    #[error("unknown sensor model {value:?} (expected \"dht11\" or \"dht22\")")]
    UnknownSensorModel { value: String },

    #[error("unknown indicator kind {value:?} (expected \"matrix\" or \"rgb\")")]
    UnknownIndicatorKind { value: String },

    #[error("{class} devices use a {expected} indicator")]
    WrongIndicatorKind { class: String, expected: String },

    #[error("must be a finite number between {min} and {max}")]
    OutOfRange { min: f64, max: f64 },

    #[error("must be a positive, finite number")]
    NotPositive,

    #[error("not a valid PEM certificate: {reason}")]
    InvalidPem { reason: String },
}

/// One offending field, addressed by its dotted path in the TOML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub field: String,
    pub problem: Problem,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// Collects findings across the whole document so a bad file is reported
/// in one pass instead of failing on the first field.
#[derive(Debug, Default)]
pub struct Issues(Vec<Issue>);

impl Issues {
    pub fn push(&mut self, field: impl Into<String>, problem: Problem) {
        self.0.push(Issue {
            field: field.into(),
            problem,
        });
    }

    pub fn missing(&mut self, field: impl Into<String>) {
        self.push(field, Problem::Missing);
    }

    pub fn unused(&mut self, field: impl Into<String>, by: &str) {
        self.push(field, Problem::Unused(by.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Issue> {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The configuration sources could not be read at all.
    #[error("failed to load configuration: {0}")]
    Source(#[from] ConfigError),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The sources parsed, but one or more fields are missing, malformed
    /// or not consumed by the declared device class.
    #[error("{0}")]
    Invalid(InvalidSettings),
}

impl Error {
    /// The validation findings, if this is an [`Error::Invalid`].
    pub fn issues(&self) -> Option<&[Issue]> {
        match self {
            Error::Invalid(invalid) => Some(&invalid.issues),
            _ => None,
        }
    }
}

/// Every validation finding for one document.
#[derive(Debug)]
pub struct InvalidSettings {
    pub issues: Vec<Issue>,
}

impl fmt::Display for InvalidSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.issues.len() == 1 { "" } else { "s" };
        write!(f, "configuration invalid ({} issue{plural})", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl From<Issues> for Error {
    fn from(issues: Issues) -> Self {
        Error::Invalid(InvalidSettings {
            issues: issues.into_vec(),
        })
    }
}
