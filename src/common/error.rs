use std::time::Duration;
use thiserror::Error;

use crate::entity::bo::control_bo::PeerKind;
use crate::entity::bo::thread_status::ThreadStatus;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // http server error
    HttpError = 1001,
    // config or logger error
    ConfigError = 1002,
    // an actor did not reach Running
    StartupError = 1003,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// process level error, fatal for the banner server
#[derive(Debug, Clone, Error)]
#[error("banner server error code: {}, msg: {}", .code.as_u16(), .msg)]
pub struct BannerError {
    pub code: ErrorCode,
    pub msg: String,
}

/// rendezvous failure between a peer and the coordinator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("{0} peer already has a command in flight")]
    Busy(PeerKind),

    #[error("{0} peer cannot submit while {1:?}")]
    NotRunning(PeerKind, ThreadStatus),

    #[error("{0} peer gave up waiting for the coordinator after {1:?}")]
    Timeout(PeerKind, Duration),

    #[error("{0} peer was cancelled while waiting for the coordinator")]
    Cancelled(PeerKind),

    #[error("coordinator is gone, {0} peer cannot submit")]
    Disconnected(PeerKind),
}

/// input rejected by a wire adapter before any command was built
/// the Display text is what the console prints back
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Unknown command. Type \"HELP\" for a list of commands.")]
    UnknownCommand(String),

    #[error("Invalid color ID. Please select 1-3.")]
    InvalidSlot,

    #[error("Invalid color \"{0}\". Type \"COLORS\" for a list of available colors.")]
    InvalidColor(String),

    #[error("Please enter a time in 24-hour military format.\nExample: 0800 (8:00 AM), 2000 (8:00 PM)")]
    InvalidTime,

    #[error("Please enter a venue name.\nExample: VENUE The Forum")]
    MissingVenue,
}

// renderer error
#[derive(Debug, Error)]
#[error("render error msg: {0}")]
pub struct RenderError(pub String);
