//! Health command implementation

use crate::cli::run::load_config_with_overrides;
use crate::cli::HealthArgs;
use crate::health::probe;
use crate::hub::{HttpHubApi, HubApi, SystemInfo};
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub backend: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_info: Option<SystemInfo>,
}

impl HealthStatus {
    pub fn is_reachable(&self) -> bool {
        self.status == "reachable"
    }
}

/// Probe `api` once and collect the result.
pub async fn check_health(api: &dyn HubApi, backend: &str) -> HealthStatus {
    let start = Instant::now();
    let report = probe(api).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, error) = match &report.probe {
        Ok(()) => ("reachable", None),
        Err(e) => ("unreachable", Some(e.to_string())),
    };

    HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: backend.to_string(),
        latency_ms,
        error,
        system_info: report.info.and_then(Result::ok),
    }
}

/// Format health status as pretty text
fn format_health_pretty(status: &HealthStatus) -> Result<String, std::fmt::Error> {
    let mut output = String::new();

    let status_display = if status.is_reachable() {
        "Reachable".green()
    } else {
        "Unreachable".red()
    };

    writeln!(output, "Backend: {}", status.backend)?;
    writeln!(output, "Status: {}", status_display)?;
    writeln!(output, "Latency: {}ms", status.latency_ms)?;
    if let Some(error) = &status.error {
        writeln!(output, "Error: {}", error)?;
    }

    if let Some(info) = &status.system_info {
        writeln!(output)?;
        writeln!(output, "{}", crate::cli::output::format_system_info(info))?;
    }

    Ok(output)
}

/// Render a health status in the requested format.
pub fn render_health(status: &HealthStatus, json: bool) -> anyhow::Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(status)?)
    } else {
        Ok(format_health_pretty(status)?)
    }
}

/// Handle `edge-console health`. Fails when the backend is unreachable.
pub async fn handle_health(args: &HealthArgs) -> anyhow::Result<()> {
    let config = load_config_with_overrides(&args.backend)?;
    let api = HttpHubApi::new(config.backend.clone(), config.health_check.timeout())?;

    let status = check_health(&api, &config.backend.base_url()).await;
    println!("{}", render_health(&status, args.json)?);

    if !status.is_reachable() {
        anyhow::bail!("backend at {} is not reachable", status.backend);
    }
    Ok(())
}
