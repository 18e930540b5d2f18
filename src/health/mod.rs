//! Backend heartbeat.
//!
//! The console calls [`probe`] on every heartbeat tick (first one immediately)
//! and feeds the outcome to its [`HealthMonitor`]. A failed probe produces one
//! "not reachable" notification; further failures stay quiet until a probe
//! succeeds again.

mod config;
mod state;


pub use config::*;
pub use state::*;

use crate::hub::{ApiError, HubApi, SystemInfo};

/// Outcome of one heartbeat.
#[derive(Debug)]
pub struct ProbeReport {
    pub probe: Result<(), ApiError>,
    /// Present only when the probe succeeded
    pub info: Option<Result<SystemInfo, ApiError>>,
}

/// Probe liveness and, when the backend answers, fetch system info.
pub async fn probe(api: &dyn HubApi) -> ProbeReport {
    match api.health().await {
        Ok(()) => {
            let info = api.system_info().await;
            if let Err(e) = &info {
                tracing::warn!(error = %e, "Failed to fetch system info");
            }
            ProbeReport {
                probe: Ok(()),
                info: Some(info),
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "Health probe failed");
            ProbeReport {
                probe: Err(e),
                info: None,
            }
        }
    }
}
