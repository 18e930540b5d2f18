//! Line commands accepted by `edge-console run`.

use crate::console::Command;
use crate::tasks::{DeploymentParams, OperationKind, TrainingParams, UploadParams};
use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  connect <token>            authenticate with the hub
  disconnect                 forget the hub session
  server                     start the remote notebook server
  upload <object> <files..>  upload training images for an object
  train <object>             train a model for an object
  deploy [model_type]        deploy the trained model to the device
  reset <upload|train|deploy>
  stream start|stop          control the live detection stream
  dismiss <id>               dismiss a notification
  status                     show the full console state
  help                       show this message
  quit                       exit";

/// What a typed line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplAction {
    Send(Command),
    Status,
    Help,
    Quit,
    Nothing,
}

/// Parse one input line.
pub fn parse_line(line: &str) -> Result<ReplAction, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(ReplAction::Nothing);
    };
    let rest: Vec<&str> = words.collect();

    let action = match verb.to_lowercase().as_str() {
        "connect" => {
            let token = rest.first().ok_or("usage: connect <token>")?;
            ReplAction::Send(Command::Connect((*token).to_string()))
        }
        "disconnect" => ReplAction::Send(Command::Disconnect),
        "server" => ReplAction::Send(Command::StartServer),
        "upload" => {
            let (object_name, files) = rest
                .split_first()
                .ok_or("usage: upload <object> <files..>")?;
            ReplAction::Send(Command::Upload(UploadParams::new(
                *object_name,
                files.iter().map(|f| PathBuf::from(*f)).collect(),
            )))
        }
        "train" => {
            let object_name = rest.first().ok_or("usage: train <object>")?;
            ReplAction::Send(Command::Train(TrainingParams::new(*object_name)))
        }
        "deploy" => ReplAction::Send(Command::Deploy(DeploymentParams {
            model_type: rest.first().map(|s| s.to_string()),
        })),
        "reset" => {
            let kind = rest.first().ok_or("usage: reset <upload|train|deploy>")?;
            let kind: OperationKind = kind.parse()?;
            ReplAction::Send(Command::Reset(kind))
        }
        "stream" => match rest.first().copied() {
            Some("start") => ReplAction::Send(Command::StartStream),
            Some("stop") => ReplAction::Send(Command::StopStream),
            _ => return Err("usage: stream start|stop".to_string()),
        },
        "dismiss" => {
            let id = rest
                .first()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or("usage: dismiss <id>")?;
            ReplAction::Send(Command::Dismiss(id))
        }
        "status" => ReplAction::Status,
        "help" | "?" => ReplAction::Help,
        "quit" | "exit" => ReplAction::Quit,
        other => return Err(format!("Unknown command: {} (try 'help')", other)),
    };

    Ok(action)
}
