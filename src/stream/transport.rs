//! Push channel transport.
//!
//! A transport runs on its own task and reports lifecycle and text frames to
//! the console through a [`ChannelSink`]. The console owns the returned
//! [`ChannelHandle`]; closing or dropping it ends the task.

use crate::console::Event;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle and data events reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Frame(String),
    Closed { reason: Option<String> },
    Failed(String),
}

/// Where a transport reports its events. Stamped with the stream generation
/// it was opened for.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    generation: u64,
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false once the console has gone away.
    pub fn emit(&self, event: ChannelEvent) -> bool {
        self.tx
            .send(Event::Channel {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// Exclusive handle to an open transport.
#[derive(Debug)]
pub struct ChannelHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
    pub fn new(cancel: CancellationToken, task: Option<JoinHandle<()>>) -> Self {
        Self { cancel, task }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Signal the transport task to close. Does not wait for it.
    pub fn close(mut self) {
        self.cancel.cancel();
        // The task sends a close frame on its own; detaching is enough.
        self.task.take();
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Opens push channels.
pub trait PushTransport: Send + Sync {
    fn open(&self, url: &str, sink: ChannelSink) -> ChannelHandle;
}

/// WebSocket transport over tokio-tungstenite.
#[derive(Debug, Default, Clone)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

impl PushTransport for WsTransport {
    fn open(&self, url: &str, sink: ChannelSink) -> ChannelHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_socket(url.to_string(), sink, cancel.clone()));
        ChannelHandle::new(cancel, Some(task))
    }
}

async fn run_socket(url: String, sink: ChannelSink, cancel: CancellationToken) {
    info!(url = %url, generation = sink.generation(), "Opening detections channel");

    let connected = tokio::select! {
        () = cancel.cancelled() => return,
        result = tokio_tungstenite::connect_async(url.as_str()) => result,
    };

    let ws_stream = match connected {
        Ok((ws_stream, _response)) => ws_stream,
        Err(e) => {
            warn!(error = %e, "Detections channel failed to connect");
            sink.emit(ChannelEvent::Failed(e.to_string()));
            return;
        }
    };

    if !sink.emit(ChannelEvent::Opened) {
        return;
    }
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("Detections channel closed by console");
                if let Err(e) = write.send(Message::Close(None)).await {
                    debug!(error = %e, "Failed to send close frame");
                }
                return;
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if !sink.emit(ChannelEvent::Frame(text)) {
                            return;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            warn!(error = %e, "Failed to answer ping");
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame.map(|f| f.reason.to_string()).filter(|r| !r.is_empty());
                        info!(?reason, "Detections channel closed by server");
                        sink.emit(ChannelEvent::Closed { reason });
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Detections channel read error");
                        sink.emit(ChannelEvent::Failed(e.to_string()));
                        return;
                    }
                    None => {
                        info!("Detections channel ended");
                        sink.emit(ChannelEvent::Closed { reason: None });
                        return;
                    }
                }
            }
        }
    }
}
