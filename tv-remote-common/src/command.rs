//! Remote commands and the fixed action tables.

use std::fmt;

use crate::protocol::DeviceRequest;

/// Action name to remote-control key code, in display order.
pub const KEY_ACTIONS: &[(&str, &str)] = &[
    ("volup", "KEY_VOLUP"),
    ("voldown", "KEY_VOLDOWN"),
    ("mute", "KEY_MUTE"),
    ("home", "KEY_HOME"),
    ("channelup", "KEY_CHUP"),
    ("channeldown", "KEY_CHDOWN"),
    ("power", "KEY_POWER"),
    ("poweroff", "KEY_POWEROFF"),
    ("poweron", "KEY_POWERON"),
    ("up", "KEY_UP"),
    ("down", "KEY_DOWN"),
    ("left", "KEY_LEFT"),
    ("right", "KEY_RIGHT"),
    ("enter", "KEY_ENTER"),
    ("back", "KEY_RETURN"),
    ("source", "KEY_SOURCE"),
];

/// Action name to installed application identifier.
pub const APP_ACTIONS: &[(&str, &str)] = &[
    ("netflix", "org.tizen.netflix-1.0"),
    ("youtube", "111299001912"),
    ("spotify", "3201606009684"),
];

/// A single command to deliver to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Press a remote-control key.
    Key(String),
    /// Launch an application by identifier.
    LaunchApp(String),
}

impl Command {
    /// Resolve an action name. Key actions take precedence over app actions.
    pub fn from_action(action: &str) -> Option<Self> {
        if let Some((_, code)) = KEY_ACTIONS.iter().find(|(name, _)| *name == action) {
            return Some(Command::Key((*code).to_string()));
        }
        APP_ACTIONS
            .iter()
            .find(|(name, _)| *name == action)
            .map(|(_, id)| Command::LaunchApp((*id).to_string()))
    }

    /// All known action names: key actions first, then app actions.
    pub fn valid_actions() -> Vec<String> {
        KEY_ACTIONS
            .iter()
            .chain(APP_ACTIONS.iter())
            .map(|(name, _)| (*name).to_string())
            .collect()
    }

    /// The outbound request envelope for this command.
    pub fn to_request(&self) -> DeviceRequest {
        match self {
            Command::Key(code) => DeviceRequest::key_click(code.as_str()),
            Command::LaunchApp(app_id) => DeviceRequest::launch_app(app_id.as_str()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Key(code) => write!(f, "key {}", code),
            Command::LaunchApp(app_id) => write!(f, "launch {}", app_id),
        }
    }
}
