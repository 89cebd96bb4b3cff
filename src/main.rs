use std::env;
use std::process::ExitCode;

use anyhow::Context;
use log::{error, info};

use plant_monitor_config::Settings;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = env::args().nth(1).unwrap_or_else(|| "cfg.toml".to_string());

    match check(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn check(path: &str) -> anyhow::Result<()> {
    let settings =
        Settings::load(path).with_context(|| format!("configuration check failed for {path}"))?;

    info!(
        "{} ({}) reports every {}s",
        settings.device.id, settings.device.class, settings.device.interval_seconds
    );
    info!("influx host: {}", settings.telemetry.influx.host);
    if let Some(loki) = &settings.telemetry.loki {
        info!("loki user: {}", loki.user);
    }
    if let Some(graphite) = &settings.telemetry.graphite {
        info!("graphite user: {}", graphite.user);
    }
    info!(
        "trust anchors: {} certificate(s)",
        settings.telemetry.root_ca.certificate_count()
    );

    Ok(())
}
