//! Tracking of long-running remote operations.
//!
//! One [`TaskTracker`] exists per [`OperationKind`]. Upload completes with its
//! request; training and deployment are started and then polled until the
//! backend reports a terminal status. Every start bumps the tracker's epoch so
//! that responses belonging to an abandoned start are recognised and dropped.

mod history;
mod params;

pub use history::*;
pub use params::*;

use crate::console::ConsoleError;
use crate::hub::{OperationStatus, PollPhase};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of tracked operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Upload,
    Training,
    Deployment,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Upload,
        OperationKind::Training,
        OperationKind::Deployment,
    ];

    fn index(self) -> usize {
        match self {
            OperationKind::Upload => 0,
            OperationKind::Training => 1,
            OperationKind::Deployment => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            OperationKind::Upload => "Upload",
            OperationKind::Training => "Training",
            OperationKind::Deployment => "Deployment",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upload" => Ok(OperationKind::Upload),
            "training" | "train" => Ok(OperationKind::Training),
            "deployment" | "deploy" => Ok(OperationKind::Deployment),
            _ => Err(format!("Unknown operation kind: {}", s)),
        }
    }
}

/// Lifecycle state of a tracked operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OperationState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Observable view of one operation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedOperation {
    pub kind: OperationKind,
    /// Backend-issued id, present only while polling is meaningful
    pub operation_id: Option<String>,
    pub progress: u8,
    pub state: OperationState,
    pub last_error: Option<String>,
    /// Last status message the backend reported
    pub message: Option<String>,
}

/// What a poll response did to the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Response belongs to an id that is no longer tracked
    Stale,
    /// Still running at this progress
    Progress(u8),
    Completed,
    Failed(String),
}

/// Single-kind operation tracker.
#[derive(Debug)]
pub struct TaskTracker {
    op: TrackedOperation,
    epoch: u64,
}

impl TaskTracker {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            op: TrackedOperation {
                kind,
                operation_id: None,
                progress: 0,
                state: OperationState::Idle,
                last_error: None,
                message: None,
            },
            epoch: 0,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.op.kind
    }

    pub fn view(&self) -> &TrackedOperation {
        &self.op
    }

    pub fn state(&self) -> OperationState {
        self.op.state
    }

    pub fn is_running(&self) -> bool {
        self.op.state == OperationState::Running
    }

    /// Enter `Running` at zero progress. Rejected without side effects while
    /// an operation of this kind is already running.
    pub fn begin(&mut self) -> Result<u64, ConsoleError> {
        if self.is_running() {
            return Err(ConsoleError::precondition(format!(
                "{} already in progress",
                self.op.kind
            )));
        }

        self.epoch += 1;
        self.op.state = OperationState::Running;
        self.op.progress = 0;
        self.op.operation_id = None;
        self.op.last_error = None;
        self.op.message = None;
        Ok(self.epoch)
    }

    /// Whether a start response issued under `epoch` may still be applied.
    pub fn is_current_epoch(&self, epoch: u64) -> bool {
        self.epoch == epoch && self.is_running()
    }

    /// Record the backend-issued id for the start made under `epoch`.
    /// Returns false (and changes nothing) when that start was superseded.
    pub fn accept_id(&mut self, epoch: u64, operation_id: String) -> bool {
        if !self.is_current_epoch(epoch) {
            return false;
        }
        tracing::info!(kind = %self.op.kind, operation_id = %operation_id, "Operation accepted by backend");
        self.op.operation_id = Some(operation_id);
        true
    }

    /// Whether `operation_id` is the one currently being polled.
    pub fn is_current(&self, operation_id: &str) -> bool {
        self.is_running() && self.op.operation_id.as_deref() == Some(operation_id)
    }

    /// Apply a poll response issued for `operation_id`.
    ///
    /// Progress never moves backwards while running. Terminal statuses clear
    /// the id so the kind is available for a new start.
    pub fn apply_poll(&mut self, operation_id: &str, status: &OperationStatus) -> PollOutcome {
        if !self.is_current(operation_id) {
            return PollOutcome::Stale;
        }

        if !status.message.is_empty() {
            self.op.message = Some(status.message.clone());
        }

        match status.phase() {
            PollPhase::Running => {
                self.op.progress = self.op.progress.max(status.percent());
                PollOutcome::Progress(self.op.progress)
            }
            PollPhase::Completed => {
                self.op.progress = self.op.progress.max(status.percent());
                self.finish_ok();
                PollOutcome::Completed
            }
            PollPhase::Failed => {
                let message = if status.message.is_empty() {
                    "unknown error".to_string()
                } else {
                    status.message.clone()
                };
                self.finish_err(message.clone());
                PollOutcome::Failed(message)
            }
        }
    }

    /// Mark the start made under `epoch` as completed (upload path).
    pub fn complete(&mut self, epoch: u64) -> bool {
        if !self.is_current_epoch(epoch) {
            return false;
        }
        self.op.progress = 100;
        self.finish_ok();
        true
    }

    /// Mark the start made under `epoch` as failed before any polling began.
    pub fn fail(&mut self, epoch: u64, message: impl Into<String>) -> bool {
        if !self.is_current_epoch(epoch) {
            return false;
        }
        self.finish_err(message.into());
        true
    }

    /// Return to `Idle`, abandoning whatever was in flight.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.op.state = OperationState::Idle;
        self.op.progress = 0;
        self.op.operation_id = None;
        self.op.last_error = None;
        self.op.message = None;
    }

    fn finish_ok(&mut self) {
        self.op.state = OperationState::Completed;
        self.op.operation_id = None;
        tracing::info!(kind = %self.op.kind, "Operation completed");
    }

    fn finish_err(&mut self, message: String) {
        self.op.state = OperationState::Failed;
        self.op.operation_id = None;
        tracing::warn!(kind = %self.op.kind, error = %message, "Operation failed");
        self.op.last_error = Some(message);
    }
}

/// The three per-kind trackers.
#[derive(Debug)]
pub struct Operations {
    trackers: [TaskTracker; 3],
}

impl Default for Operations {
    fn default() -> Self {
        Self {
            trackers: OperationKind::ALL.map(TaskTracker::new),
        }
    }
}

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: OperationKind) -> &TaskTracker {
        &self.trackers[kind.index()]
    }

    pub fn get_mut(&mut self, kind: OperationKind) -> &mut TaskTracker {
        &mut self.trackers[kind.index()]
    }

    pub fn views(&self) -> Vec<TrackedOperation> {
        self.trackers.iter().map(|t| t.view().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(s: &str, progress: Option<f64>, message: &str) -> OperationStatus {
        OperationStatus {
            status: s.to_string(),
            progress,
            message: message.to_string(),
        }
    }

    fn running_tracker(kind: OperationKind, id: &str) -> TaskTracker {
        let mut tracker = TaskTracker::new(kind);
        let epoch = tracker.begin().unwrap();
        assert!(tracker.accept_id(epoch, id.to_string()));
        tracker
    }

    #[test]
    fn test_new_tracker_is_idle() {
        let tracker = TaskTracker::new(OperationKind::Training);
        assert_eq!(tracker.state(), OperationState::Idle);
        assert_eq!(tracker.view().progress, 0);
        assert!(tracker.view().operation_id.is_none());
    }

    #[test]
    fn test_begin_while_running_rejected_without_side_effects() {
        let mut tracker = running_tracker(OperationKind::Deployment, "dep-1");
        tracker.apply_poll("dep-1", &status("running", Some(20.0), "working"));
        let before = tracker.view().clone();

        let err = tracker.begin().unwrap_err();
        assert!(matches!(err, ConsoleError::Precondition(_)));
        assert_eq!(tracker.view(), &before);
    }

    #[test]
    fn test_training_completes() {
        let mut tracker = running_tracker(OperationKind::Training, "t-1");

        let outcome = tracker.apply_poll("t-1", &status("running", Some(40.0), ""));
        assert_eq!(outcome, PollOutcome::Progress(40));
        assert_eq!(tracker.state(), OperationState::Running);

        let outcome = tracker.apply_poll("t-1", &status("completed", Some(100.0), "done"));
        assert_eq!(outcome, PollOutcome::Completed);
        assert_eq!(tracker.state(), OperationState::Completed);
        assert_eq!(tracker.view().progress, 100);
        assert!(tracker.view().operation_id.is_none());
    }

    #[test]
    fn test_deployment_fails_with_message() {
        let mut tracker = running_tracker(OperationKind::Deployment, "d-1");
        let outcome = tracker.apply_poll("d-1", &status("failed", None, "disk full"));

        assert_eq!(outcome, PollOutcome::Failed("disk full".to_string()));
        assert_eq!(tracker.state(), OperationState::Failed);
        assert_eq!(tracker.view().last_error.as_deref(), Some("disk full"));
        assert!(tracker.view().operation_id.is_none());
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut tracker = running_tracker(OperationKind::Training, "t-1");
        tracker.apply_poll("t-1", &status("running", Some(60.0), ""));
        let outcome = tracker.apply_poll("t-1", &status("running", Some(20.0), ""));
        assert_eq!(outcome, PollOutcome::Progress(60));
    }

    #[test]
    fn test_stale_id_ignored() {
        let mut tracker = running_tracker(OperationKind::Training, "new");
        let outcome = tracker.apply_poll("old", &status("completed", Some(100.0), ""));
        assert_eq!(outcome, PollOutcome::Stale);
        assert_eq!(tracker.state(), OperationState::Running);
        assert_eq!(tracker.view().progress, 0);
    }

    #[test]
    fn test_terminal_state_ignores_further_polls() {
        let mut tracker = running_tracker(OperationKind::Training, "t-1");
        tracker.apply_poll("t-1", &status("failed", None, "boom"));
        let outcome = tracker.apply_poll("t-1", &status("completed", Some(100.0), ""));
        assert_eq!(outcome, PollOutcome::Stale);
        assert_eq!(tracker.state(), OperationState::Failed);
    }

    #[test]
    fn test_reset_invalidates_pending_start() {
        let mut tracker = TaskTracker::new(OperationKind::Deployment);
        let epoch = tracker.begin().unwrap();
        tracker.reset();

        assert!(!tracker.accept_id(epoch, "late".to_string()));
        assert_eq!(tracker.state(), OperationState::Idle);
        assert!(tracker.view().operation_id.is_none());
    }

    #[test]
    fn test_restart_after_terminal() {
        let mut tracker = TaskTracker::new(OperationKind::Upload);
        let epoch = tracker.begin().unwrap();
        assert!(tracker.complete(epoch));
        assert_eq!(tracker.view().progress, 100);

        let next = tracker.begin().unwrap();
        assert_ne!(epoch, next);
        assert_eq!(tracker.view().progress, 0);
        assert!(!tracker.complete(epoch));
    }

    #[test]
    fn test_failed_start_without_message() {
        let mut tracker = running_tracker(OperationKind::Training, "t-1");
        let outcome = tracker.apply_poll("t-1", &status("failed", None, ""));
        assert_eq!(outcome, PollOutcome::Failed("unknown error".to_string()));
    }

    #[test]
    fn test_operations_holds_one_tracker_per_kind() {
        let mut ops = Operations::new();
        ops.get_mut(OperationKind::Training).begin().unwrap();

        assert!(ops.get(OperationKind::Training).is_running());
        assert!(!ops.get(OperationKind::Deployment).is_running());
        assert_eq!(ops.views().len(), 3);
        assert_eq!(ops.get(OperationKind::Upload).kind(), OperationKind::Upload);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("deploy".parse::<OperationKind>(), Ok(OperationKind::Deployment));
        assert_eq!("Training".parse::<OperationKind>(), Ok(OperationKind::Training));
        assert!("video".parse::<OperationKind>().is_err());
    }
}
