//! Output formatting helpers for CLI commands

use crate::console::{ConsoleSnapshot, NotificationView};
use crate::hub::SystemInfo;
use crate::notify::Severity;
use crate::session::ConnectionStatus;
use crate::stream::{Detection, StreamState};
use crate::tasks::{OperationState, TrackedOperation, UploadRecord};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// One notification as a single colored line.
pub fn format_notification(n: &NotificationView) -> String {
    let tag = match n.severity {
        Severity::Info => "info".blue(),
        Severity::Success => "ok".green(),
        Severity::Warning => "warn".yellow(),
        Severity::Error => "error".red(),
    };
    format!("[{}] #{} {}", tag, n.id, n.message)
}

pub fn format_connection(snapshot: &ConsoleSnapshot) -> String {
    let status = match snapshot.connection {
        ConnectionStatus::Connected => "connected".green(),
        ConnectionStatus::Connecting => "connecting".yellow(),
        ConnectionStatus::Disconnected => "disconnected".normal(),
        ConnectionStatus::Error => "error".red(),
    };
    match &snapshot.user {
        Some(user) => {
            let server = if user.server_running {
                "server running"
            } else {
                "server stopped"
            };
            format!("Hub: {} as {} ({})", status, user.name, server)
        }
        None => format!("Hub: {}", status),
    }
}

/// Format operations as a table
pub fn format_operations_table(operations: &[TrackedOperation]) -> String {
    let mut table = new_table(vec!["Operation", "State", "Progress", "Id", "Detail"]);

    for op in operations {
        let state = match op.state {
            OperationState::Idle => "Idle".normal().to_string(),
            OperationState::Running => "Running".cyan().to_string(),
            OperationState::Completed => "Completed".green().to_string(),
            OperationState::Failed => "Failed".red().to_string(),
        };
        let detail = op
            .last_error
            .as_deref()
            .or(op.message.as_deref())
            .unwrap_or("");

        table.add_row(vec![
            Cell::new(op.kind),
            Cell::new(state),
            Cell::new(format!("{}%", op.progress)),
            Cell::new(op.operation_id.as_deref().unwrap_or("-")),
            Cell::new(detail),
        ]);
    }

    table.to_string()
}

/// Format live detections as a table
pub fn format_detections_table(detections: &[Detection]) -> String {
    let mut table = new_table(vec!["Name", "Confidence", "Box"]);

    for d in detections {
        table.add_row(vec![
            Cell::new(&d.name),
            Cell::new(format!("{:.1}%", d.confidence)),
            Cell::new(format!(
                "{:.0},{:.0} {:.0}x{:.0}",
                d.bbox[0], d.bbox[1], d.bbox[2], d.bbox[3]
            )),
        ]);
    }

    table.to_string()
}

/// Format recent uploads as a table
pub fn format_uploads_table(uploads: &[UploadRecord]) -> String {
    let mut table = new_table(vec!["Object", "Files", "Training Id", "Uploaded"]);

    for u in uploads {
        table.add_row(vec![
            Cell::new(&u.object_name),
            Cell::new(u.files_count),
            Cell::new(&u.training_id),
            Cell::new(u.uploaded_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]);
    }

    table.to_string()
}

pub fn format_system_info(info: &SystemInfo) -> String {
    let connected = if info.connected {
        "yes".green()
    } else {
        "no".red()
    };
    format!(
        "Hub URL: {}\nHub user: {}\nDevice: {}\nDevice connected: {}\nActive deployments: {}",
        info.jupyterhub_url, info.jupyterhub_user, info.jetson_ip, connected, info.active_deployments
    )
}

pub fn format_stream_line(snapshot: &ConsoleSnapshot) -> String {
    let stream = &snapshot.stream;
    let state = match stream.state {
        StreamState::Active if stream.connected => "live".green(),
        StreamState::Active => "active".yellow(),
        StreamState::Starting | StreamState::Stopping => stream.state.to_string().yellow(),
        StreamState::Stopped => "stopped".normal(),
        StreamState::Error => "error".red(),
    };
    format!(
        "Stream: {} (mqtt: {}, detections: {}, viewers: {})",
        state,
        if stream.stats.mqtt_connected { "up" } else { "down" },
        stream.detections.len(),
        stream.stats.active_websockets
    )
}

/// Full multi-section rendering used by the `status` command.
pub fn format_snapshot(snapshot: &ConsoleSnapshot) -> String {
    let mut sections = vec![
        format_connection(snapshot),
        format_backend_line(snapshot.backend_reachable),
        format_operations_table(&snapshot.operations),
        format_stream_line(snapshot),
    ];

    if let Some(url) = &snapshot.stream.video_url {
        sections.push(format!("Video: {}", url));
    }
    if !snapshot.stream.detections.is_empty() {
        sections.push(format_detections_table(&snapshot.stream.detections));
    }
    if let Some(info) = &snapshot.system_info {
        sections.push(format_system_info(info));
    }
    if !snapshot.uploads.is_empty() {
        sections.push(format_uploads_table(&snapshot.uploads));
    }
    for n in &snapshot.notifications {
        sections.push(format_notification(n));
    }

    sections.join("\n")
}

fn format_backend_line(reachable: bool) -> String {
    if reachable {
        format!("Backend: {}", "reachable".green())
    } else {
        format!("Backend: {}", "unreachable".red())
    }
}
