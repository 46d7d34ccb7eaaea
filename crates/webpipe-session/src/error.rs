use webpipe_frame::FrameError;
use webpipe_protocol::ProtocolError;

/// Errors that end a gateway session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading requests failed.
    #[error("input error: {0}")]
    Frame(#[from] FrameError),

    /// Writing a response failed for a reason other than the peer going away.
    #[error("output error: {0}")]
    Output(FrameError),

    /// The input can no longer be split into lines and frames.
    #[error("stream desynchronized: {0}")]
    Desynchronized(FrameError),

    /// A response could not be serialized.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors seen by a [`Client`](crate::Client).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The gateway answered with a non-empty `err`.
    #[error("gateway error: {0}")]
    Remote(String),

    /// A response or blob carried an unexpected id.
    #[error("response id mismatch (expected {expected}, got {got})")]
    IdMismatch { expected: i64, got: i64 },

    /// The gateway closed its output before answering.
    #[error("gateway closed the stream")]
    Closed,

    /// The gateway sent geometry that does not match its blob.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The gateway process exited unsuccessfully.
    #[error("gateway exited with {0}")]
    Exit(std::process::ExitStatus),

    /// The client was already closed.
    #[error("client already closed")]
    AlreadyClosed,
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// True when a write failed because nobody is reading our output anymore.
pub(crate) fn peer_gone(err: &FrameError) -> bool {
    match err {
        FrameError::ConnectionClosed => true,
        FrameError::Io(io) => io.kind() == std::io::ErrorKind::BrokenPipe,
        _ => false,
    }
}
