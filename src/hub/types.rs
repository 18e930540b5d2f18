//! Wire types for the edge ML backend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hub user identity returned by connect and status calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub server_running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ConnectRequest<'a> {
    pub token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConnectResponse {
    pub user_info: UserInfo,
}

/// Response to `POST /jupyterhub/start-server`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStartResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Response to `GET /jupyterhub/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_info: Option<UserInfo>,
}

/// An image selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub mime: String,
}

impl ImageFile {
    /// Classify a path by extension. Returns `None` for anything that is not an image.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let mime = mime_guess::from_path(&path).first_raw()?;
        if !mime.starts_with("image/") {
            return None;
        }
        Some(Self {
            path,
            mime: mime.to_string(),
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string())
    }
}

/// Response to `POST /training/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub training_id: String,
    pub files_uploaded: u32,
    #[serde(default)]
    pub message: String,
}

/// Body of `POST /training/execute-notebook`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteNotebookRequest {
    pub object_name: String,
    pub notebook_path: String,
    pub timeout: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrainingStartResponse {
    pub training_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeploymentRequest<'a> {
    pub model_type: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeploymentStartResponse {
    pub deployment_id: String,
}

/// Phase of a polled operation as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Running,
    Completed,
    Failed,
}

/// Response to the training and deployment status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub status: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: String,
}

impl OperationStatus {
    /// `completed` and `failed` are terminal, every other value is still running.
    pub fn phase(&self) -> PollPhase {
        match self.status.as_str() {
            "completed" => PollPhase::Completed,
            "failed" => PollPhase::Failed,
            _ => PollPhase::Running,
        }
    }

    /// Progress clamped to `[0, 100]`. A missing value reads as zero.
    pub fn percent(&self) -> u8 {
        match self.progress {
            Some(p) if p.is_finite() => p.clamp(0.0, 100.0).round() as u8,
            _ => 0,
        }
    }
}

/// Response to `POST /stream/start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStartResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub mqtt_connected: bool,
    #[serde(default)]
    pub is_running: bool,
}

/// Response to `POST /stream/stop`. The backend reports its own failures
/// in-band with `status = "error"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStopResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Snapshot returned by `GET /system/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemInfo {
    pub jupyterhub_url: String,
    /// Operator identity on the hub
    pub jupyterhub_user: String,
    /// Address of the edge device models are deployed to
    pub jetson_ip: String,
    pub connected: bool,
    pub active_deployments: u32,
}
