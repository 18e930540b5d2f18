//! Live detection stream controller.
//!
//! `Stopped → Starting → Active → Stopping → Stopped`, with `Active → Error`
//! when the transport drops. There is no automatic reconnect: the channel
//! lives exactly as long as the user wants the stream on, and a new channel
//! only comes from an explicit start. Each start bumps the generation, and
//! anything stamped with an older generation is ignored.

mod frame;
mod transport;

pub use frame::*;
pub use transport::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable stream controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    #[default]
    Stopped,
    Starting,
    Active,
    Stopping,
    Error,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamState::Stopped => "stopped",
            StreamState::Starting => "starting",
            StreamState::Active => "active",
            StreamState::Stopping => "stopping",
            StreamState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Kind of frame that was applied, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedFrame {
    Detections,
    Status,
    StatusChange,
}

/// Read-only copy of the stream session for observers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamView {
    pub state: StreamState,
    pub connected: bool,
    pub stats: StreamStats,
    pub detections: Vec<Detection>,
    pub video_url: Option<String>,
    pub frame_timestamp: Option<String>,
    pub frame_dimensions: Option<FrameDimensions>,
}

/// Stream session owned by the console. The transport handle never leaves it.
#[derive(Debug, Default)]
pub struct StreamSession {
    state: StreamState,
    generation: u64,
    connected: bool,
    stats: StreamStats,
    detections: Vec<Detection>,
    video_url: Option<String>,
    frame_timestamp: Option<String>,
    frame_dimensions: Option<FrameDimensions>,
    handle: Option<ChannelHandle>,
}

impl StreamSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn has_transport(&self) -> bool {
        self.handle.is_some()
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn view(&self) -> StreamView {
        StreamView {
            state: self.state,
            connected: self.connected,
            stats: self.stats.clone(),
            detections: self.detections.clone(),
            video_url: self.video_url.clone(),
            frame_timestamp: self.frame_timestamp.clone(),
            frame_dimensions: self.frame_dimensions,
        }
    }

    /// Enter `Starting` from a fresh session. Returns the new generation, or
    /// `None` while a start is in flight or the stream is already active.
    ///
    /// A pending stop request does not block a start: the generation bump
    /// makes its late response stale.
    pub fn begin_start(&mut self) -> Option<u64> {
        match self.state {
            StreamState::Stopped | StreamState::Error | StreamState::Stopping => {
                self.release_transport();
                self.clear_session_data();
                self.generation += 1;
                self.state = StreamState::Starting;
                Some(self.generation)
            }
            StreamState::Starting | StreamState::Active => None,
        }
    }

    /// Whether a start response for `generation` may still be applied.
    pub fn is_starting(&self, generation: u64) -> bool {
        self.generation == generation && self.state == StreamState::Starting
    }

    /// Install the opened transport and video reference. The channel reports
    /// its own connection asynchronously.
    pub fn activate(&mut self, generation: u64, handle: ChannelHandle, video_url: String) -> bool {
        if !self.is_starting(generation) {
            handle.close();
            return false;
        }
        self.handle = Some(handle);
        self.video_url = Some(video_url);
        self.state = StreamState::Active;
        true
    }

    /// The start request failed: back to `Stopped` with nothing opened.
    pub fn abort_start(&mut self, generation: u64) -> bool {
        if !self.is_starting(generation) {
            return false;
        }
        self.state = StreamState::Stopped;
        true
    }

    /// Apply a transport event. Returns what changed, if anything.
    pub fn on_channel(&mut self, generation: u64, event: ChannelEvent) -> Option<AppliedFrame> {
        if generation != self.generation || self.handle.is_none() {
            tracing::debug!(generation, current = self.generation, "Ignoring event from stale channel");
            return None;
        }

        match event {
            ChannelEvent::Opened => {
                tracing::info!("Detections channel connected");
                self.connected = true;
                None
            }
            ChannelEvent::Frame(text) => self.apply_frame(&text),
            ChannelEvent::Closed { reason } => {
                tracing::info!(?reason, "Detections channel disconnected");
                self.channel_lost();
                None
            }
            ChannelEvent::Failed(error) => {
                tracing::warn!(error = %error, "Detections channel error");
                self.channel_lost();
                None
            }
        }
    }

    /// Apply one text frame. Malformed frames are dropped without touching state.
    pub fn apply_frame(&mut self, text: &str) -> Option<AppliedFrame> {
        let frame = match ChannelFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, "Dropping malformed channel frame");
                return None;
            }
        };

        match frame {
            ChannelFrame::Detections {
                data,
                timestamp,
                frame_dimensions,
            } => {
                self.detections = data;
                self.frame_timestamp = timestamp;
                if frame_dimensions.is_some() {
                    self.frame_dimensions = frame_dimensions;
                }
                Some(AppliedFrame::Detections)
            }
            ChannelFrame::Status(stats) => {
                self.stats = stats;
                Some(AppliedFrame::Status)
            }
            ChannelFrame::StatusChange {
                status_type,
                status_value,
            } => {
                tracing::info!(status_type = %status_type, status_value = %status_value, "Stream status change");
                Some(AppliedFrame::StatusChange)
            }
        }
    }

    /// Tear down the client side unconditionally and enter `Stopping`.
    /// Returns the generation the stop request belongs to.
    pub fn begin_stop(&mut self) -> u64 {
        self.release_transport();
        self.clear_session_data();
        self.generation += 1;
        self.state = StreamState::Stopping;
        self.generation
    }

    /// The stop request for `generation` resolved (either way).
    pub fn finish_stop(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state != StreamState::Stopping {
            return false;
        }
        self.state = StreamState::Stopped;
        true
    }

    /// Close any open transport (console shutdown).
    pub fn shutdown(&mut self) {
        self.release_transport();
        self.connected = false;
    }

    fn channel_lost(&mut self) {
        self.connected = false;
        self.handle = None;
        if self.state == StreamState::Active {
            self.state = StreamState::Error;
        }
    }

    fn clear_session_data(&mut self) {
        self.connected = false;
        self.video_url = None;
        self.detections.clear();
        self.stats = StreamStats::default();
        self.frame_timestamp = None;
        self.frame_dimensions = None;
    }

    fn release_transport(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
    }
}
