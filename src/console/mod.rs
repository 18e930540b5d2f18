//! Console engine.
//!
//! [`Console`] is the single owner of every piece of client state: the hub
//! session, the three operation trackers, the stream session, the health
//! monitor, the notification queue and the upload history. Commands are
//! applied to completion one at a time. Network calls and timers run on
//! spawned tasks that never touch state; they send an [`Event`] back, and the
//! event is applied on the console's own task. After every command and every
//! event a fresh [`ConsoleSnapshot`] is published.

mod command;
mod error;
mod event;
mod snapshot;

pub use command::*;
pub use error::*;
pub use event::*;
pub use snapshot::*;

use crate::config::ConsoleConfig;
use crate::health::{self, HealthMonitor, Transition};
use crate::hub::{ApiError, ExecuteNotebookRequest, HubApi};
use crate::notify::{NotificationQueue, Severity};
use crate::session::Session;
use crate::stream::{ChannelSink, PushTransport, StreamSession};
use crate::tasks::{
    DeploymentParams, OperationKind, Operations, PollOutcome, TrainingParams, UploadHistory,
    UploadParams, UploadRecord,
};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 32;

/// Idle yields after which [`Console::settle`] gives up waiting for events.
const SETTLE_IDLE_ROUNDS: usize = 4;

/// The console engine.
pub struct Console {
    config: ConsoleConfig,
    api: Arc<dyn HubApi>,
    transport: Arc<dyn PushTransport>,
    session: Session,
    operations: Operations,
    stream: StreamSession,
    health: HealthMonitor,
    notifications: NotificationQueue,
    uploads: UploadHistory,
    /// Last heartbeat issued, and the newest one whose report was applied
    health_ticks_issued: u64,
    health_ticks_applied: u64,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    snapshot_tx: watch::Sender<ConsoleSnapshot>,
}

impl Console {
    pub fn new(
        config: ConsoleConfig,
        api: Arc<dyn HubApi>,
        transport: Arc<dyn PushTransport>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(ConsoleSnapshot::default());
        let notifications = NotificationQueue::new(config.operations.notification_ttl());
        let uploads = UploadHistory::new(config.operations.upload_history_limit);

        let console = Self {
            config,
            api,
            transport,
            session: Session::new(),
            operations: Operations::new(),
            stream: StreamSession::new(),
            health: HealthMonitor::new(),
            notifications,
            uploads,
            health_ticks_issued: 0,
            health_ticks_applied: 0,
            events_tx,
            events_rx,
            snapshot_tx,
        };
        console.snapshot_tx.send_replace(console.snapshot());
        console
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn operations(&self) -> &Operations {
        &self.operations
    }

    pub fn stream(&self) -> &StreamSession {
        &self.stream
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn subscribe(&self) -> watch::Receiver<ConsoleSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Build a snapshot of the current state.
    pub fn snapshot(&self) -> ConsoleSnapshot {
        ConsoleSnapshot {
            connection: self.session.status(),
            user: self.session.user().cloned(),
            operations: self.operations.views(),
            stream: self.stream.view(),
            system_info: self.health.system_info().cloned(),
            backend_reachable: self.health.is_reachable(),
            notifications: self.notifications.iter().map(NotificationView::from).collect(),
            uploads: self.uploads.iter().cloned().collect(),
        }
    }

    // ------------------------------------------------------------------
    // Hub session
    // ------------------------------------------------------------------

    /// Authenticate with the hub. The outcome arrives as an event.
    pub fn connect(&mut self, token: &str) -> Result<(), ConsoleError> {
        let attempt = match self.session.begin_connect(token) {
            Ok(attempt) => attempt,
            Err(e) => return self.reject(e),
        };

        let api = Arc::clone(&self.api);
        let token = token.trim().to_string();
        self.spawn_request(async move {
            let result = api.connect(&token).await;
            Event::Connected { attempt, result }
        });
        self.publish();
        Ok(())
    }

    pub fn disconnect(&mut self) {
        let had_credential = self.session.token().is_some();
        self.session.disconnect();
        info!(had_credential, "Hub session closed");
        self.publish();
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    /// Ask the hub to start the user's notebook server.
    pub fn start_remote_server(&mut self) -> Result<(), ConsoleError> {
        if let Err(e) = self.session.require_ready() {
            return self.reject(e);
        }

        let api = Arc::clone(&self.api);
        self.spawn_request(async move { Event::ServerStarted(api.start_server().await) });
        self.publish();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    pub fn upload(&mut self, params: UploadParams) -> Result<(), ConsoleError> {
        if let Err(e) = self.check_can_start(OperationKind::Upload) {
            return self.reject(e);
        }
        let selection = match params.validate() {
            Ok(selection) => selection,
            Err(e) => return self.reject(e),
        };
        let epoch = match self.operations.get_mut(OperationKind::Upload).begin() {
            Ok(epoch) => epoch,
            Err(e) => return self.reject(e),
        };

        if selection.skipped > 0 {
            self.notify(
                format!(
                    "Only image files are allowed: skipped {} file(s)",
                    selection.skipped
                ),
                Severity::Warning,
            );
        }
        self.notify("Uploading images to JupyterHub...", Severity::Info);
        info!(
            object_name = %selection.object_name,
            files = selection.images.len(),
            "Upload started"
        );

        let api = Arc::clone(&self.api);
        let object_name = selection.object_name;
        let images = selection.images;
        self.spawn_request(async move {
            let result = api.upload(&object_name, &images).await;
            Event::Uploaded {
                epoch,
                object_name,
                result,
            }
        });
        self.publish();
        Ok(())
    }

    pub fn train(&mut self, params: TrainingParams) -> Result<(), ConsoleError> {
        if let Err(e) = self.check_can_start(OperationKind::Training) {
            return self.reject(e);
        }
        let object_name = match params.validate() {
            Ok(name) => name,
            Err(e) => return self.reject(e),
        };
        let epoch = match self.operations.get_mut(OperationKind::Training).begin() {
            Ok(epoch) => epoch,
            Err(e) => return self.reject(e),
        };

        self.notify(
            format!("Starting training for {}...", object_name),
            Severity::Info,
        );

        let request = ExecuteNotebookRequest {
            object_name,
            notebook_path: self.config.training.notebook_path.clone(),
            timeout: self.config.training.timeout_seconds,
        };
        let api = Arc::clone(&self.api);
        self.spawn_request(async move {
            let result = api.execute_notebook(&request).await;
            Event::OperationStarted {
                kind: OperationKind::Training,
                epoch,
                result,
            }
        });
        self.publish();
        Ok(())
    }

    pub fn deploy(&mut self, params: DeploymentParams) -> Result<(), ConsoleError> {
        if let Err(e) = self.check_can_start(OperationKind::Deployment) {
            return self.reject(e);
        }
        let model_type = match params.validate(&self.config.deployment.model_type) {
            Ok(model_type) => model_type,
            Err(e) => return self.reject(e),
        };
        let epoch = match self.operations.get_mut(OperationKind::Deployment).begin() {
            Ok(epoch) => epoch,
            Err(e) => return self.reject(e),
        };

        self.notify("Starting deployment to Jetson...", Severity::Info);

        let api = Arc::clone(&self.api);
        self.spawn_request(async move {
            let result = api.start_deployment(&model_type).await;
            Event::OperationStarted {
                kind: OperationKind::Deployment,
                epoch,
                result,
            }
        });
        self.publish();
        Ok(())
    }

    /// Return `kind` to idle. Anything still in flight for it becomes stale.
    pub fn reset_operation(&mut self, kind: OperationKind) {
        self.operations.get_mut(kind).reset();
        debug!(%kind, "Operation reset");
        self.publish();
    }

    /// Ready first, then the per-kind running check.
    fn check_can_start(&self, kind: OperationKind) -> Result<(), ConsoleError> {
        self.session.require_ready()?;
        if self.operations.get(kind).is_running() {
            return Err(ConsoleError::precondition(format!(
                "{} already in progress",
                kind
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stream
    // ------------------------------------------------------------------

    /// Start backend streaming services and open the detections channel.
    /// Returns false when the stream is already starting or active.
    pub fn start_stream(&mut self) -> bool {
        let Some(generation) = self.stream.begin_start() else {
            debug!(state = %self.stream.state(), "Stream start ignored");
            return false;
        };

        self.notify("Starting live stream...", Severity::Info);
        let api = Arc::clone(&self.api);
        self.spawn_request(async move {
            let result = api.start_stream().await;
            Event::StreamStarted { generation, result }
        });
        self.publish();
        true
    }

    /// Tear the stream down on the client immediately, then tell the backend.
    pub fn stop_stream(&mut self) {
        let generation = self.stream.begin_stop();
        info!(generation, "Live stream stopping");

        let api = Arc::clone(&self.api);
        self.spawn_request(async move {
            let result = api.stop_stream().await;
            Event::StreamStopped { generation, result }
        });
        self.publish();
    }

    // ------------------------------------------------------------------
    // Notifications and health
    // ------------------------------------------------------------------

    pub fn dismiss(&mut self, id: u64) -> bool {
        let removed = self.notifications.dismiss(id);
        self.publish();
        removed
    }

    /// Run one heartbeat. The result arrives as an event; a report that
    /// lands after a newer one has been applied is dropped.
    pub fn health_tick(&mut self) {
        self.health_ticks_issued += 1;
        let tick = self.health_ticks_issued;
        let api = Arc::clone(&self.api);
        self.spawn_request(async move {
            let report = health::probe(api.as_ref()).await;
            Event::HealthProbed { tick, report }
        });
    }

    // ------------------------------------------------------------------
    // Driving the engine
    // ------------------------------------------------------------------

    /// Apply one command. Rejections are already surfaced as notifications.
    pub fn handle_command(&mut self, command: Command) {
        let result = match command {
            Command::Connect(token) => self.connect(&token),
            Command::Disconnect => {
                self.disconnect();
                Ok(())
            }
            Command::StartServer => self.start_remote_server(),
            Command::Upload(params) => self.upload(params),
            Command::Train(params) => self.train(params),
            Command::Deploy(params) => self.deploy(params),
            Command::Reset(kind) => {
                self.reset_operation(kind);
                Ok(())
            }
            Command::StartStream => {
                self.start_stream();
                Ok(())
            }
            Command::StopStream => {
                self.stop_stream();
                Ok(())
            }
            Command::Dismiss(id) => {
                self.dismiss(id);
                Ok(())
            }
            Command::Shutdown => Ok(()),
        };

        if let Err(e) = result {
            debug!(error = %e, "Command rejected");
        }
    }

    /// Apply one event to completion.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Connected { attempt, result } => self.on_connected(attempt, result),
            Event::ServerStarted(result) => self.on_server_started(result),
            Event::RecheckDue => self.on_recheck_due(),
            Event::HubStatus(result) => match result {
                Ok(status) => {
                    if status.status == "connected" {
                        if let Some(user) = status.user_info {
                            self.session.refresh_user(user);
                        }
                    }
                }
                Err(e) => warn!(error = %e, "Hub status re-check failed"),
            },
            Event::Uploaded {
                epoch,
                object_name,
                result,
            } => self.on_uploaded(epoch, object_name, result),
            Event::OperationStarted {
                kind,
                epoch,
                result,
            } => self.on_operation_started(kind, epoch, result),
            Event::PollDue { kind, operation_id } => self.on_poll_due(kind, operation_id),
            Event::Polled {
                kind,
                operation_id,
                result,
            } => self.on_polled(kind, operation_id, result),
            Event::StreamStarted { generation, result } => {
                self.on_stream_started(generation, result)
            }
            Event::StreamStopped { generation, result } => {
                self.on_stream_stopped(generation, result)
            }
            Event::Channel { generation, event } => {
                self.stream.on_channel(generation, event);
            }
            Event::HealthProbed { tick, report } => self.on_health_probed(tick, report),
            Event::NotificationExpired(id) => {
                self.notifications.dismiss(id);
            }
        }
        self.publish();
    }

    /// Let spawned work run and apply every event it produces, until nothing
    /// new arrives for a few scheduler turns. Timers are not advanced.
    pub async fn settle(&mut self) -> usize {
        let mut applied = 0;
        let mut idle = 0;
        while idle < SETTLE_IDLE_ROUNDS {
            tokio::task::yield_now().await;
            let mut progressed = false;
            while let Ok(event) = self.events_rx.try_recv() {
                self.handle_event(event);
                applied += 1;
                progressed = true;
            }
            idle = if progressed { 0 } else { idle + 1 };
        }
        applied
    }

    /// Run until `cancel` fires, a shutdown command arrives, or every command
    /// sender is dropped. Closes any open channel on the way out.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) {
        let health_enabled = self.config.health_check.enabled;
        let mut heartbeat = tokio::time::interval(self.config.health_check.interval());
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            backend = %self.config.backend.base_url(),
            health_check = health_enabled,
            "Console started"
        );
        self.publish();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Console shutting down");
                    break;
                }
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => {
                        info!("Console shutting down");
                        break;
                    }
                    Some(command) => {
                        self.handle_command(command);
                    }
                },
                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event);
                }
                _ = heartbeat.tick(), if health_enabled => {
                    self.health_tick();
                }
            }
        }

        self.stream.shutdown();
        self.publish();
    }

    /// Run the console on its own task.
    pub fn spawn(self, cancel: CancellationToken) -> (ConsoleHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let handle = ConsoleHandle::new(commands_tx, self.subscribe());
        let task = tokio::spawn(self.run(commands_rx, cancel));
        (handle, task)
    }

    // ------------------------------------------------------------------
    // Event handlers
    // ------------------------------------------------------------------

    fn on_connected(&mut self, attempt: u64, result: Result<crate::hub::UserInfo, ApiError>) {
        match self.session.complete_connect(attempt, result) {
            None => {}
            Some(Ok(user)) => {
                self.notify(
                    format!("Connected to JupyterHub as {}", user.name),
                    Severity::Success,
                );
                if user.server_running {
                    self.notify("JupyterHub server is already running", Severity::Success);
                } else {
                    self.notify(
                        "JupyterHub server is not running. Will start automatically when needed.",
                        Severity::Info,
                    );
                }
            }
            Some(Err(e)) => {
                self.notify(describe("Connection error", &e), Severity::Error);
            }
        }
    }

    fn on_server_started(&mut self, result: Result<crate::hub::ServerStartResponse, ApiError>) {
        match result {
            Ok(response) => {
                let message = if response.message.is_empty() {
                    "Server start requested".to_string()
                } else {
                    response.message
                };
                self.notify(message, Severity::Success);
                self.schedule(
                    self.config.operations.server_recheck_delay(),
                    Event::RecheckDue,
                );
            }
            Err(e) => {
                warn!(error = %e, "Server start failed");
                self.notify(describe("Server start error", &e), Severity::Error);
            }
        }
    }

    fn on_recheck_due(&mut self) {
        if !self.session.is_ready() {
            debug!("Skipping status re-check: not connected");
            return;
        }
        let api = Arc::clone(&self.api);
        self.spawn_request(async move { Event::HubStatus(api.hub_status().await) });
    }

    fn on_uploaded(
        &mut self,
        epoch: u64,
        object_name: String,
        result: Result<crate::hub::UploadResponse, ApiError>,
    ) {
        let tracker = self.operations.get_mut(OperationKind::Upload);
        match result {
            Ok(response) => {
                if !tracker.complete(epoch) {
                    debug!(epoch, "Discarding stale upload result");
                    return;
                }
                self.notify(
                    format!(
                        "Successfully uploaded {} images for {}",
                        response.files_uploaded, object_name
                    ),
                    Severity::Success,
                );
                self.uploads.record(UploadRecord {
                    training_id: response.training_id,
                    object_name,
                    files_count: response.files_uploaded,
                    uploaded_at: Utc::now(),
                });
            }
            Err(e) => {
                let error = ConsoleError::from(e);
                if tracker.fail(epoch, error.to_string()) {
                    self.notify(format!("Upload error: {}", error), Severity::Error);
                }
            }
        }
    }

    fn on_operation_started(
        &mut self,
        kind: OperationKind,
        epoch: u64,
        result: Result<String, ApiError>,
    ) {
        let tracker = self.operations.get_mut(kind);
        match result {
            Ok(operation_id) => {
                if !tracker.accept_id(epoch, operation_id.clone()) {
                    debug!(%kind, %operation_id, "Discarding stale start response");
                    return;
                }
                let message = match kind {
                    OperationKind::Deployment => "Deployment started via JupyterHub".to_string(),
                    _ => format!("{} started", kind),
                };
                self.notify(message, Severity::Success);
                self.schedule_poll(kind, operation_id);
            }
            Err(e) => {
                let error = ConsoleError::from(e);
                if tracker.fail(epoch, error.to_string()) {
                    self.notify(format!("{} error: {}", kind, error), Severity::Error);
                }
            }
        }
    }

    fn on_poll_due(&mut self, kind: OperationKind, operation_id: String) {
        if !self.operations.get(kind).is_current(&operation_id) {
            debug!(%kind, %operation_id, "Poll loop ended: id no longer tracked");
            return;
        }

        let api = Arc::clone(&self.api);
        self.spawn_request(async move {
            let result = match kind {
                OperationKind::Training => api.training_status(&operation_id).await,
                OperationKind::Deployment => api.deployment_status(&operation_id).await,
                OperationKind::Upload => Err(ApiError::InvalidResponse(
                    "upload is not polled".to_string(),
                )),
            };
            Event::Polled {
                kind,
                operation_id,
                result,
            }
        });
    }

    fn on_polled(
        &mut self,
        kind: OperationKind,
        operation_id: String,
        result: Result<crate::hub::OperationStatus, ApiError>,
    ) {
        let status = match result {
            Ok(status) => status,
            Err(e) => {
                if self.operations.get(kind).is_current(&operation_id) {
                    warn!(%kind, %operation_id, error = %e, "Status poll failed, retrying");
                    self.schedule_poll(kind, operation_id);
                }
                return;
            }
        };

        match self.operations.get_mut(kind).apply_poll(&operation_id, &status) {
            PollOutcome::Stale => {
                debug!(%kind, %operation_id, "Discarding stale poll result");
            }
            PollOutcome::Progress(progress) => {
                debug!(%kind, %operation_id, progress, "Operation progress");
                self.schedule_poll(kind, operation_id);
            }
            PollOutcome::Completed => {
                self.notify(
                    format!("{} completed successfully!", kind),
                    Severity::Success,
                );
            }
            PollOutcome::Failed(message) => {
                let error = ConsoleError::BackendFailure(format!("{} failed: {}", kind, message));
                self.notify(error.to_string(), Severity::Error);
            }
        }
    }

    fn on_stream_started(
        &mut self,
        generation: u64,
        result: Result<crate::hub::StreamStartResponse, ApiError>,
    ) {
        match result {
            Ok(response) => {
                if !self.stream.is_starting(generation) {
                    debug!(generation, "Discarding stale stream start response");
                    return;
                }
                let broker = if response.mqtt_connected {
                    "Connected"
                } else {
                    "Disconnected"
                };
                self.notify(
                    format!("Stream services started. MQTT: {}", broker),
                    Severity::Success,
                );

                let sink = ChannelSink::new(generation, self.events_tx.clone());
                let handle = self
                    .transport
                    .open(&self.config.backend.detections_ws_url(), sink);
                let video_url = self
                    .config
                    .backend
                    .video_url(Utc::now().timestamp_millis());
                self.stream.activate(generation, handle, video_url);
            }
            Err(e) => {
                if self.stream.abort_start(generation) {
                    warn!(error = %e, "Stream start failed");
                    self.notify(format!("Failed to start stream: {}", e), Severity::Error);
                }
            }
        }
    }

    fn on_stream_stopped(
        &mut self,
        generation: u64,
        result: Result<crate::hub::StreamStopResponse, ApiError>,
    ) {
        if !self.stream.finish_stop(generation) {
            debug!(generation, "Discarding stale stream stop response");
            return;
        }

        match result {
            Ok(response) if response.status != "error" => {
                self.notify("Stream services stopped", Severity::Info);
            }
            Ok(response) => {
                warn!(message = %response.message, "Backend reported error stopping stream");
            }
            Err(e) => {
                warn!(error = %e, "Stream stop request failed");
            }
        }
        self.notify("Live stream stopped", Severity::Info);
    }

    fn on_health_probed(&mut self, tick: u64, report: health::ProbeReport) {
        if tick <= self.health_ticks_applied {
            debug!(tick, newest = self.health_ticks_applied, "Discarding out-of-order health report");
            return;
        }
        self.health_ticks_applied = tick;

        match self.health.record_probe(report.probe.is_ok()) {
            Transition::WentDown => {
                warn!("Backend server is not reachable");
                self.notify("Backend server is not reachable", Severity::Error);
            }
            Transition::Recovered => info!("Backend server reachable again"),
            Transition::Unchanged => {}
        }

        if let Some(Ok(info)) = report.info {
            self.health.set_system_info(info);
        }
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn notify(&mut self, message: impl Into<String>, severity: Severity) -> u64 {
        let now = Instant::now();
        self.notifications.prune(now);
        let id = self.notifications.push(message, severity, now);
        self.schedule(self.notifications.ttl(), Event::NotificationExpired(id));
        id
    }

    fn reject<T>(&mut self, error: ConsoleError) -> Result<T, ConsoleError> {
        debug!(error = %error, "Rejected");
        self.notify(error.to_string(), Severity::Error);
        self.publish();
        Err(error)
    }

    fn schedule_poll(&self, kind: OperationKind, operation_id: String) {
        self.schedule(
            self.config.operations.poll_interval(),
            Event::PollDue { kind, operation_id },
        );
    }

    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            // The console may already be gone
            let _ = tx.send(request.await);
        });
    }

    fn schedule(&self, delay: Duration, event: Event) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
    }

    fn publish(&mut self) {
        self.notifications.prune(Instant::now());
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

/// Surface the backend's `detail` as-is; prefix anything else.
fn describe(context: &str, error: &ApiError) -> String {
    match error {
        ApiError::Http { detail, .. } => detail.clone(),
        other => format!("{}: {}", context, other),
    }
}
