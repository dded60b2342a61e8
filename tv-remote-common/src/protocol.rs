//! WebSocket protocol types for the TV remote-control channel.
//!
//! # Protocol Overview
//!
//! The device exposes a secure WebSocket endpoint:
//!
//! ```text
//! wss://<host>:<port>/api/v2/channels/samsung.remote.control?name=<base64 name>[&token=<token>]
//! ```
//!
//! Outbound frames are JSON objects with a `method` and `params`. Inbound
//! frames are JSON objects with an `event` name and an optional `data` payload.
//!
//! ## Connection Flow
//!
//! 1. Client opens the WebSocket (the device presents a self-signed certificate)
//! 2. Without a token the TV shows an "allow this device" prompt
//! 3. Device sends `ms.channel.connect` on success (with `data.token` on first pairing)
//!    or `ms.channel.unauthorized` if the user denied access
//! 4. Client sends `ms.remote.control` / `ms.channel.emit` requests
//!
//! Unparseable frames are not an error condition; the device occasionally sends
//! non-JSON payloads and callers are expected to drop them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel path on the device's WebSocket API.
pub const REMOTE_CONTROL_CHANNEL: &str = "samsung.remote.control";

/// Method name for key presses.
pub const METHOD_REMOTE_CONTROL: &str = "ms.remote.control";

/// Method name for channel broadcasts (used for app launches).
pub const METHOD_CHANNEL_EMIT: &str = "ms.channel.emit";

/// Authorization confirmed.
pub const EVENT_CONNECT: &str = "ms.channel.connect";

/// Authorization denied.
pub const EVENT_UNAUTHORIZED: &str = "ms.channel.unauthorized";

/// Channel ready for commands.
pub const EVENT_READY: &str = "ms.channel.ready";

/// Outbound request envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRequest {
    pub method: &'static str,
    pub params: RequestParams,
}

/// Parameters of an outbound request, one shape per method.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    RemoteKey(RemoteKeyParams),
    Emit(EmitParams),
}

/// Parameters of an `ms.remote.control` key click.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteKeyParams {
    #[serde(rename = "Cmd")]
    pub cmd: &'static str,
    #[serde(rename = "DataOfCmd")]
    pub data_of_cmd: String,
    #[serde(rename = "Option")]
    pub option: &'static str,
    #[serde(rename = "TypeOfRemote")]
    pub type_of_remote: &'static str,
}

/// Parameters of an `ms.channel.emit` broadcast to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmitParams {
    pub event: &'static str,
    pub to: &'static str,
    pub data: AppOperation,
}

/// App operation carried by an emit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppOperation {
    pub operation: &'static str,
    pub id: String,
}

impl DeviceRequest {
    /// A single click of a remote-control key (e.g. `KEY_VOLUP`).
    pub fn key_click(key_code: impl Into<String>) -> Self {
        Self {
            method: METHOD_REMOTE_CONTROL,
            params: RequestParams::RemoteKey(RemoteKeyParams {
                cmd: "Click",
                data_of_cmd: key_code.into(),
                option: "false",
                type_of_remote: "SendRemoteKey",
            }),
        }
    }

    /// Ask the device host to execute an installed application.
    pub fn launch_app(app_id: impl Into<String>) -> Self {
        Self {
            method: METHOD_CHANNEL_EMIT,
            params: RequestParams::Emit(EmitParams {
                event: "ed.apps.launch",
                to: "host",
                data: AppOperation {
                    operation: "execute",
                    id: app_id.into(),
                },
            }),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Raw inbound frame as sent by the device.
#[derive(Debug, Clone, Deserialize)]
struct RawEvent {
    event: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Interpreted inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// `ms.channel.connect`; carries a fresh token when the device issued one.
    Authorized { token: Option<String> },
    /// `ms.channel.unauthorized`.
    Unauthorized,
    /// `ms.channel.ready`.
    Ready,
    /// Any other event name.
    Other(String),
}

impl DeviceEvent {
    /// Parse an inbound text frame.
    ///
    /// Fails only when the frame is not a JSON object with a string `event`.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let raw: RawEvent = serde_json::from_str(text)?;

        Ok(match raw.event.as_str() {
            EVENT_CONNECT => DeviceEvent::Authorized {
                token: raw.data.as_ref().and_then(extract_token),
            },
            EVENT_UNAUTHORIZED => DeviceEvent::Unauthorized,
            EVENT_READY => DeviceEvent::Ready,
            _ => DeviceEvent::Other(raw.event),
        })
    }
}

/// Tokens are usually numeric strings, but some firmware sends a bare number.
fn extract_token(data: &Value) -> Option<String> {
    let token = match data.get("token")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_click_envelope() {
        let json: Value = serde_json::from_str(&DeviceRequest::key_click("KEY_VOLUP").to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            json!({
                "method": "ms.remote.control",
                "params": {
                    "Cmd": "Click",
                    "DataOfCmd": "KEY_VOLUP",
                    "Option": "false",
                    "TypeOfRemote": "SendRemoteKey"
                }
            })
        );
    }

    #[test]
    fn test_launch_app_envelope() {
        let json: Value =
            serde_json::from_str(&DeviceRequest::launch_app("org.tizen.netflix-1.0").to_json().unwrap()).unwrap();
        assert_eq!(json["method"], "ms.channel.emit");
        assert_eq!(json["params"]["to"], "host");
        assert_eq!(json["params"]["data"]["operation"], "execute");
        assert_eq!(json["params"]["data"]["id"], "org.tizen.netflix-1.0");
    }

    #[test]
    fn test_parse_authorized_with_token() {
        let event = DeviceEvent::parse(
            r#"{"event":"ms.channel.connect","data":{"id":"abc","token":"13374242"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            DeviceEvent::Authorized {
                token: Some("13374242".to_string())
            }
        );
    }

    #[test]
    fn test_parse_authorized_numeric_token() {
        let event = DeviceEvent::parse(r#"{"event":"ms.channel.connect","data":{"token":55}}"#).unwrap();
        assert_eq!(
            event,
            DeviceEvent::Authorized {
                token: Some("55".to_string())
            }
        );
    }

    #[test]
    fn test_parse_authorized_without_token() {
        let event = DeviceEvent::parse(r#"{"event":"ms.channel.connect","data":{"clients":[]}}"#).unwrap();
        assert_eq!(event, DeviceEvent::Authorized { token: None });

        let event = DeviceEvent::parse(r#"{"event":"ms.channel.connect","data":{"token":""}}"#).unwrap();
        assert_eq!(event, DeviceEvent::Authorized { token: None });
    }

    #[test]
    fn test_parse_other_events() {
        assert_eq!(
            DeviceEvent::parse(r#"{"event":"ms.channel.unauthorized"}"#).unwrap(),
            DeviceEvent::Unauthorized
        );
        assert_eq!(
            DeviceEvent::parse(r#"{"event":"ms.channel.ready","data":{}}"#).unwrap(),
            DeviceEvent::Ready
        );
        assert_eq!(
            DeviceEvent::parse(r#"{"event":"ms.channel.clientConnect"}"#).unwrap(),
            DeviceEvent::Other("ms.channel.clientConnect".to_string())
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(DeviceEvent::parse("not json").is_err());
        assert!(DeviceEvent::parse(r#"{"data":{}}"#).is_err());
        assert!(DeviceEvent::parse("[1,2,3]").is_err());
    }
}
