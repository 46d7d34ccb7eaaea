/// Errors raised while decoding or encoding protocol lines.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The line is not valid JSON.
    #[error("invalid JSON line: {0}")]
    Json(#[from] serde_json::Error),

    /// The line parsed, but the top-level value is not an object.
    #[error("line did not parse to a JSON object")]
    NotAnObject,
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
