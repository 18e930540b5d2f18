use crate::hub::{SystemInfo, UserInfo};
use crate::notify::{Notification, Severity};
use crate::session::ConnectionStatus;
use crate::stream::StreamView;
use crate::tasks::{OperationKind, TrackedOperation, UploadRecord};
use serde::Serialize;

/// A live notification as observers see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
}

impl From<&Notification> for NotificationView {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id,
            message: n.message.clone(),
            severity: n.severity,
        }
    }
}

/// Immutable copy of all console state, published after every command and event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsoleSnapshot {
    pub connection: ConnectionStatus,
    pub user: Option<UserInfo>,
    pub operations: Vec<TrackedOperation>,
    pub stream: StreamView,
    pub system_info: Option<SystemInfo>,
    pub backend_reachable: bool,
    pub notifications: Vec<NotificationView>,
    pub uploads: Vec<UploadRecord>,
}

impl ConsoleSnapshot {
    pub fn operation(&self, kind: OperationKind) -> Option<&TrackedOperation> {
        self.operations.iter().find(|op| op.kind == kind)
    }

    /// Whether any live notification has exactly this text.
    pub fn has_notification(&self, message: &str) -> bool {
        self.notifications.iter().any(|n| n.message == message)
    }
}
