use std::fmt;

use webpipe::frame::FrameError;
use webpipe::session::SessionError;

// Process exit codes.
pub const SUCCESS: i32 = 0;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::BadMagic { .. } | FrameError::LineTooLong { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn session_error(err: SessionError) -> CliError {
    match err {
        SessionError::Desynchronized(err) => frame_error("input desynchronized", err),
        SessionError::Frame(err) => frame_error("reading stdin", err),
        SessionError::Output(err) => CliError::new(INTERNAL, format!("writing stdout: {err}")),
        SessionError::Protocol(err) => CliError::new(INTERNAL, format!("encoding response: {err}")),
    }
}
