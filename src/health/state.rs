//! Reachability tracking with one-shot outage notification.

use crate::hub::SystemInfo;
use chrono::{DateTime, Utc};

/// What a probe result means for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to report
    Unchanged,
    /// First failure since the last success; notify once
    WentDown,
    /// First success after an outage
    Recovered,
}

/// Reachability state owned by the console.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    /// Last probe outcome; optimistic until proven otherwise
    reachable: bool,
    /// Count of consecutive failed probes
    consecutive_failures: u32,
    /// When the last probe completed
    last_check_time: Option<DateTime<Utc>>,
    system_info: Option<SystemInfo>,
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self {
            reachable: true,
            consecutive_failures: 0,
            last_check_time: None,
            system_info: None,
        }
    }
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_check_time(&self) -> Option<DateTime<Utc>> {
        self.last_check_time
    }

    pub fn system_info(&self) -> Option<&SystemInfo> {
        self.system_info.as_ref()
    }

    /// Apply a probe outcome.
    pub fn record_probe(&mut self, ok: bool) -> Transition {
        self.last_check_time = Some(Utc::now());

        if ok {
            self.consecutive_failures = 0;
            let was_down = !self.reachable;
            self.reachable = true;
            if was_down {
                Transition::Recovered
            } else {
                Transition::Unchanged
            }
        } else {
            self.consecutive_failures += 1;
            let was_up = self.reachable;
            self.reachable = false;
            if was_up {
                Transition::WentDown
            } else {
                Transition::Unchanged
            }
        }
    }

    /// Replace the system snapshot wholesale.
    pub fn set_system_info(&mut self, info: SystemInfo) {
        self.system_info = Some(info);
    }
}
