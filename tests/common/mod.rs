//! Shared test utilities for edge-console integration tests.
//!
//! Provides a scripted in-memory backend and a fake push transport so
//! console scenarios run without a network.

#![allow(dead_code)]

use async_trait::async_trait;
use edge_console::config::ConsoleConfig;
use edge_console::console::Console;
use edge_console::hub::{
    ApiError, ExecuteNotebookRequest, HubApi, HubStatus, ImageFile, OperationStatus,
    ServerStartResponse, StreamStartResponse, StreamStopResponse, SystemInfo, UploadResponse,
    UserInfo,
};
use edge_console::stream::{ChannelEvent, ChannelHandle, ChannelSink, PushTransport};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Builders
// =============================================================================

pub fn make_user(name: &str, server_running: bool) -> UserInfo {
    UserInfo {
        name: name.to_string(),
        admin: false,
        server_running,
        last_activity: None,
    }
}

pub fn status(status: &str, progress: Option<f64>, message: &str) -> OperationStatus {
    OperationStatus {
        status: status.to_string(),
        progress,
        message: message.to_string(),
    }
}

pub fn http_error(status: u16, detail: &str) -> ApiError {
    ApiError::Http {
        status,
        detail: detail.to_string(),
    }
}

// =============================================================================
// Scripted backend
// =============================================================================

pub type Script<T> = Mutex<VecDeque<Result<T, ApiError>>>;

fn next_or<T>(script: &Script<T>, default: impl FnOnce() -> Result<T, ApiError>) -> Result<T, ApiError> {
    script.lock().unwrap().pop_front().unwrap_or_else(default)
}

/// In-memory [`HubApi`] with per-endpoint response queues.
///
/// Each endpoint pops its next scripted response, or falls back to a
/// successful default. Endpoints can be gated so their response is held
/// until the test releases it, or delayed on the (paused) clock.
#[derive(Default)]
pub struct ScriptedHub {
    calls: Mutex<Vec<String>>,
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
    delays: Mutex<HashMap<&'static str, VecDeque<Duration>>>,
    pub health: Script<()>,
    pub system_info: Script<SystemInfo>,
    pub connect: Script<UserInfo>,
    pub start_server: Script<ServerStartResponse>,
    pub hub_status: Script<HubStatus>,
    pub upload: Script<UploadResponse>,
    pub execute_notebook: Script<String>,
    pub training_status: Script<OperationStatus>,
    pub start_deployment: Script<String>,
    pub deployment_status: Script<OperationStatus>,
    pub start_stream: Script<StreamStartResponse>,
    pub stop_stream: Script<StreamStopResponse>,
}

impl ScriptedHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push<T>(script: &Script<T>, response: Result<T, ApiError>) {
        script.lock().unwrap().push_back(response);
    }

    /// Number of calls made to `endpoint`.
    pub fn count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == endpoint)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Hold responses from `endpoint` until [`ScriptedHub::release`].
    pub fn gate(&self, endpoint: &'static str) {
        self.gates
            .lock()
            .unwrap()
            .insert(endpoint, Arc::new(Notify::new()));
    }

    /// Let one held response from `endpoint` through.
    pub fn release(&self, endpoint: &'static str) {
        if let Some(gate) = self.gates.lock().unwrap().get(endpoint) {
            gate.notify_one();
        }
    }

    /// Make the next call to `endpoint` sleep for `delay` before it takes
    /// its scripted response.
    pub fn delay_next(&self, endpoint: &'static str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(delay);
    }

    async fn enter(&self, endpoint: &'static str) {
        self.calls.lock().unwrap().push(endpoint.to_string());
        let gate = self.gates.lock().unwrap().get(endpoint).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl HubApi for ScriptedHub {
    async fn health(&self) -> Result<(), ApiError> {
        self.enter("health").await;
        next_or(&self.health, || Ok(()))
    }

    async fn system_info(&self) -> Result<SystemInfo, ApiError> {
        self.enter("system_info").await;
        next_or(&self.system_info, || {
            Ok(SystemInfo {
                jupyterhub_url: "http://hub.local:8000".to_string(),
                jupyterhub_user: "akumar".to_string(),
                jetson_ip: "192.168.1.50".to_string(),
                connected: true,
                active_deployments: 0,
            })
        })
    }

    async fn connect(&self, _token: &str) -> Result<UserInfo, ApiError> {
        self.enter("connect").await;
        next_or(&self.connect, || Ok(make_user("akumar", true)))
    }

    async fn start_server(&self) -> Result<ServerStartResponse, ApiError> {
        self.enter("start_server").await;
        next_or(&self.start_server, || {
            Ok(ServerStartResponse {
                status: "started".to_string(),
                message: "Server started successfully".to_string(),
            })
        })
    }

    async fn hub_status(&self) -> Result<HubStatus, ApiError> {
        self.enter("hub_status").await;
        next_or(&self.hub_status, || {
            Ok(HubStatus {
                status: "connected".to_string(),
                message: String::new(),
                user_info: Some(make_user("akumar", true)),
            })
        })
    }

    async fn upload(&self, object_name: &str, files: &[ImageFile]) -> Result<UploadResponse, ApiError> {
        self.enter("upload").await;
        let count = files.len() as u32;
        let name = object_name.to_string();
        next_or(&self.upload, || {
            Ok(UploadResponse {
                training_id: format!("upload-{}", name),
                files_uploaded: count,
                message: String::new(),
            })
        })
    }

    async fn execute_notebook(&self, _request: &ExecuteNotebookRequest) -> Result<String, ApiError> {
        self.enter("execute_notebook").await;
        next_or(&self.execute_notebook, || Ok("train-1".to_string()))
    }

    async fn training_status(&self, _training_id: &str) -> Result<OperationStatus, ApiError> {
        self.enter("training_status").await;
        next_or(&self.training_status, || Ok(status("running", None, "")))
    }

    async fn start_deployment(&self, _model_type: &str) -> Result<String, ApiError> {
        self.enter("start_deployment").await;
        next_or(&self.start_deployment, || Ok("deploy-1".to_string()))
    }

    async fn deployment_status(&self, _deployment_id: &str) -> Result<OperationStatus, ApiError> {
        self.enter("deployment_status").await;
        next_or(&self.deployment_status, || Ok(status("running", None, "")))
    }

    async fn start_stream(&self) -> Result<StreamStartResponse, ApiError> {
        self.enter("start_stream").await;
        next_or(&self.start_stream, || {
            Ok(StreamStartResponse {
                status: "started".to_string(),
                mqtt_connected: true,
                is_running: true,
            })
        })
    }

    async fn stop_stream(&self) -> Result<StreamStopResponse, ApiError> {
        self.enter("stop_stream").await;
        next_or(&self.stop_stream, || {
            Ok(StreamStopResponse {
                status: "stopped".to_string(),
                message: String::new(),
            })
        })
    }
}

// =============================================================================
// Fake push transport
// =============================================================================

/// One channel opened through [`FakeTransport`].
#[derive(Clone)]
pub struct OpenedChannel {
    pub url: String,
    pub sink: ChannelSink,
    pub cancel: CancellationToken,
}

impl OpenedChannel {
    pub fn send(&self, event: ChannelEvent) {
        assert!(self.sink.emit(event), "console went away");
    }

    pub fn frame(&self, text: &str) {
        self.send(ChannelEvent::Frame(text.to_string()));
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Records every open; the test drives the channel by hand.
#[derive(Default)]
pub struct FakeTransport {
    opened: Mutex<Vec<OpenedChannel>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn last(&self) -> OpenedChannel {
        self.opened
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no channel opened")
    }
}

impl PushTransport for FakeTransport {
    fn open(&self, url: &str, sink: ChannelSink) -> ChannelHandle {
        let cancel = CancellationToken::new();
        self.opened.lock().unwrap().push(OpenedChannel {
            url: url.to_string(),
            sink,
            cancel: cancel.clone(),
        });
        ChannelHandle::new(cancel, None)
    }
}

// =============================================================================
// Console setup
// =============================================================================

pub fn test_config() -> ConsoleConfig {
    let mut config = ConsoleConfig::default();
    config.health_check.enabled = false;
    config
}

pub fn make_console(hub: &Arc<ScriptedHub>, transport: &Arc<FakeTransport>) -> Console {
    Console::new(
        test_config(),
        Arc::clone(hub) as Arc<dyn HubApi>,
        Arc::clone(transport) as Arc<dyn PushTransport>,
    )
}

/// A console whose hub session is already `Connected`.
pub async fn connected_console(
    hub: &Arc<ScriptedHub>,
    transport: &Arc<FakeTransport>,
) -> Console {
    let mut console = make_console(hub, transport);
    console.connect("test-token").unwrap();
    console.settle().await;
    assert!(console.is_ready());
    console
}
