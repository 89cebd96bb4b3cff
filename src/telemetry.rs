use serde::{Deserialize, Serialize};

use crate::error::{Issues, Problem};
use crate::settings::{gate, require_string, Profile};

/// Telemetry sink credentials for one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Telemetry {
    // root_ca stays first: TOML writes plain values before sub-tables.
    pub root_ca: RootCa,
    pub influx: Influx,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loki: Option<Loki>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphite: Option<Graphite>,
}

/// InfluxDB Cloud connection coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Influx {
    pub host: String,
    pub org_id: String,
    /// Sent verbatim as the Authorization header, scheme prefix included.
    pub token: String,
    pub bucket: String,
}

/// Grafana Cloud Loki log sink credentials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Loki {
    pub user: String,
    pub api_key: String,
}

/// Graphite metrics sink credentials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graphite {
    pub user: String,
    pub api_key: String,
}

/// PEM certificate bundle trusted for TLS uploads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RootCa(String);

impl RootCa {
    pub fn pem(&self) -> &str {
        &self.0
    }

    /// Number of certificates in the bundle.
    pub fn certificate_count(&self) -> usize {
        rustls_pemfile::certs(&mut self.0.as_bytes())
            .filter(Result::is_ok)
            .count()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawTelemetry {
    pub root_ca: Option<String>,
    pub influx: Option<RawInflux>,
    pub loki: Option<RawSink>,
    pub graphite: Option<RawSink>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawInflux {
    pub host: Option<String>,
    pub org_id: Option<String>,
    pub token: Option<String>,
    pub bucket: Option<String>,
}

// Loki and Graphite share the user/key shape on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawSink {
    pub user: Option<String>,
    pub api_key: Option<String>,
}

pub(crate) fn resolve(
    raw: Option<RawTelemetry>,
    profile: &Profile,
    issues: &mut Issues,
) -> Option<Telemetry> {
    let raw = raw.unwrap_or_default();

    let root_ca = resolve_root_ca(raw.root_ca, issues);

    let influx = match raw.influx {
        Some(raw) => resolve_influx(raw, issues),
        None => {
            issues.missing("telemetry.influx");
            None
        }
    };

    let loki = gate(raw.loki, profile.loki, "telemetry.loki", profile.label, issues)
        .and_then(|raw| resolve_sink(raw, "telemetry.loki", issues))
        .map(|(user, api_key)| Loki { user, api_key });

    let graphite = gate(
        raw.graphite,
        profile.graphite,
        "telemetry.graphite",
        profile.label,
        issues,
    )
    .and_then(|raw| resolve_sink(raw, "telemetry.graphite", issues))
    .map(|(user, api_key)| Graphite { user, api_key });

    Some(Telemetry {
        root_ca: root_ca?,
        influx: influx?,
        loki,
        graphite,
    })
}

fn resolve_influx(raw: RawInflux, issues: &mut Issues) -> Option<Influx> {
    let host = require_string(raw.host, "telemetry.influx.host", issues);
    let org_id = require_string(raw.org_id, "telemetry.influx.org_id", issues);
    let token = require_string(raw.token, "telemetry.influx.token", issues);
    let bucket = require_string(raw.bucket, "telemetry.influx.bucket", issues);

    Some(Influx {
        host: host?,
        org_id: org_id?,
        token: token?,
        bucket: bucket?,
    })
}

fn resolve_sink(raw: RawSink, prefix: &str, issues: &mut Issues) -> Option<(String, String)> {
    let user = require_string(raw.user, &format!("{prefix}.user"), issues);
    let api_key = require_string(raw.api_key, &format!("{prefix}.api_key"), issues);
    Some((user?, api_key?))
}

fn resolve_root_ca(raw: Option<String>, issues: &mut Issues) -> Option<RootCa> {
    let pem = require_string(raw, "telemetry.root_ca", issues)?;

    let certs: Result<Vec<_>, _> = rustls_pemfile::certs(&mut pem.as_bytes()).collect();
    match certs {
        Ok(list) if list.is_empty() => {
            issues.push(
                "telemetry.root_ca",
                Problem::InvalidPem {
                    reason: "no certificates found".into(),
                },
            );
            None
        }
        Ok(_) => Some(RootCa(pem)),
        Err(err) => {
            issues.push(
                "telemetry.root_ca",
                Problem::InvalidPem {
                    reason: err.to_string(),
                },
            );
            None
        }
    }
}

// 256 bytes of well-formed base64 between valid markers; decodes even
// though it is clearly a placeholder.
#[cfg(test)]
pub(crate) const PLACEHOLDER_PEM: &str = "-----BEGIN CERTIFICATE-----\n\
    exampleexampleexampleexampleexampleexampleexampleexampleexamplee\n\
    exampleexampleexampleexampleexampleexampleexampleexampleexamplee\n\
    exampleexampleexampleexampleexampleexampleexampleexampleexamplee\n\
    exampleexampleexampleexampleexampleexampleexampleexampleexamplee\n\
    -----END CERTIFICATE-----\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_bundle_counts_one_certificate() {
        let mut issues = Issues::default();
        let ca = resolve_root_ca(Some(PLACEHOLDER_PEM.into()), &mut issues)
            .expect("placeholder PEM decodes");

        assert_eq!(ca.certificate_count(), 1);
        assert!(issues.is_empty());
    }

    #[test]
    fn rejects_text_without_certificates() {
        let mut issues = Issues::default();

        assert!(resolve_root_ca(Some("not a certificate".into()), &mut issues).is_none());
        let issues = issues.into_vec();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "telemetry.root_ca");
        assert!(matches!(issues[0].problem, Problem::InvalidPem { .. }));
    }

    #[test]
    fn rejects_a_truncated_bundle() {
        let truncated = "-----BEGIN CERTIFICATE-----\nexample\n-----END CERTIFICATE-----\n";
        let mut issues = Issues::default();

        assert!(resolve_root_ca(Some(truncated.into()), &mut issues).is_none());
        assert!(!issues.is_empty());
    }

    #[test]
    fn influx_fields_are_all_required() {
        let mut issues = Issues::default();

        let raw = RawInflux {
            host: Some("eu-central-1-1.aws.cloud2.influxdata.com".into()),
            org_id: None,
            token: Some(" ".into()),
            bucket: Some("sourdough".into()),
        };

        assert!(resolve_influx(raw, &mut issues).is_none());
        let issues = issues.into_vec();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field, "telemetry.influx.org_id");
        assert_eq!(issues[1].field, "telemetry.influx.token");
        assert_eq!(issues[1].problem, Problem::Empty);
    }
}
