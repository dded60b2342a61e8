//! TV Remote Common Types
//!
//! Device wire protocol and command tables shared by the gateway and its tests.

pub mod command;
pub mod protocol;

pub use command::{Command, APP_ACTIONS, KEY_ACTIONS};
pub use protocol::{DeviceEvent, DeviceRequest, REMOTE_CONTROL_CHANNEL};
