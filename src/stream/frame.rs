//! Push channel frame format.
//!
//! Every frame is a JSON object with a `type` discriminator.

use serde::{Deserialize, Serialize};

/// One detected face/object in a video frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub name: String,
    pub confidence: f64,
    /// `[x, y, width, height]` in frame pixels
    #[serde(rename = "box")]
    pub bbox: [f64; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDimensions {
    pub width: u32,
    pub height: u32,
}

/// Broker and service statistics carried by `status` frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamStats {
    pub mqtt_connected: bool,
    pub active_detections: u32,
    pub active_websockets: u32,
    pub is_running: bool,
}

/// A well-formed frame from the detections channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelFrame {
    Detections {
        #[serde(default)]
        data: Vec<Detection>,
        #[serde(default)]
        timestamp: Option<String>,
        #[serde(default)]
        frame_dimensions: Option<FrameDimensions>,
    },
    Status(StreamStats),
    StatusChange {
        #[serde(default)]
        status_type: String,
        #[serde(default)]
        status_value: serde_json::Value,
    },
}

impl ChannelFrame {
    /// Parse a text frame. Malformed JSON and unknown types are errors.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detections() {
        let frame = ChannelFrame::parse(
            r#"{"type":"detections","data":[{"name":"Alice","confidence":92.3,"box":[0,0,10,10]}],
                "timestamp":"2025-07-07T19:56:14","frame_dimensions":{"width":1280,"height":720}}"#,
        )
        .unwrap();

        match frame {
            ChannelFrame::Detections {
                data,
                frame_dimensions,
                ..
            } => {
                assert_eq!(data.len(), 1);
                assert_eq!(data[0].name, "Alice");
                assert_eq!(data[0].bbox, [0.0, 0.0, 10.0, 10.0]);
                assert!(data[0].person_id.is_none());
                assert_eq!(frame_dimensions.unwrap().width, 1280);
            }
            other => panic!("expected detections, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_partial_status() {
        let frame =
            ChannelFrame::parse(r#"{"type":"status","mqtt_connected":true,"active_detections":1}"#)
                .unwrap();
        assert_eq!(
            frame,
            ChannelFrame::Status(StreamStats {
                mqtt_connected: true,
                active_detections: 1,
                active_websockets: 0,
                is_running: false,
            })
        );
    }

    #[test]
    fn test_parse_status_change() {
        let frame = ChannelFrame::parse(
            r#"{"type":"status_change","status_type":"mqtt_connected","status_value":false}"#,
        )
        .unwrap();
        assert!(matches!(frame, ChannelFrame::StatusChange { ref status_type, .. } if status_type == "mqtt_connected"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ChannelFrame::parse("not json").is_err());
        assert!(ChannelFrame::parse(r#"{"data":[]}"#).is_err());
        assert!(ChannelFrame::parse(r#"{"type":"heartbeat"}"#).is_err());
        assert!(ChannelFrame::parse(r#"{"type":"detections","data":[{"name":"x"}]}"#).is_err());
    }
}
