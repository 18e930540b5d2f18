//! Commands sent to a running console and the handle used to send them.

use super::ConsoleSnapshot;
use crate::tasks::{DeploymentParams, OperationKind, TrainingParams, UploadParams};
use tokio::sync::{mpsc, watch};

/// A user intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect(String),
    Disconnect,
    StartServer,
    Upload(UploadParams),
    Train(TrainingParams),
    Deploy(DeploymentParams),
    Reset(OperationKind),
    StartStream,
    StopStream,
    Dismiss(u64),
    Shutdown,
}

/// Cloneable front door to a console running on its own task.
#[derive(Debug, Clone)]
pub struct ConsoleHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<ConsoleSnapshot>,
}

impl ConsoleHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        snapshots: watch::Receiver<ConsoleSnapshot>,
    ) -> Self {
        Self {
            commands,
            snapshots,
        }
    }

    /// Queue a command. Returns false once the console has exited.
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Latest published state.
    pub fn snapshot(&self) -> ConsoleSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ConsoleSnapshot> {
        self.snapshots.clone()
    }
}
