/// Errors that can occur while reading or writing lines and blob frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header does not start with the `TAK35EM1` magic.
    #[error("invalid blob frame magic (expected \"TAK35EM1\", got {found:02x?})")]
    BadMagic { found: [u8; 8] },

    /// The stream ended before a complete header or payload was read.
    #[error("truncated blob frame ({received} of {expected} bytes)")]
    Truncated { expected: usize, received: usize },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The payload buffer could not be allocated.
    #[error("cannot allocate {size} bytes for blob payload")]
    Allocation { size: usize },

    /// A text line grew past the configured maximum without a newline.
    #[error("line exceeds {max} bytes without a newline")]
    LineTooLong { max: usize },

    /// An I/O error occurred while reading or writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer stopped accepting bytes.
    #[error("connection closed (write returned 0 bytes)")]
    ConnectionClosed,
}

impl FrameError {
    /// True when the stream position is still aligned on a line boundary
    /// after this error, so the next request can be read safely.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::Truncated { .. }
                | FrameError::PayloadTooLarge { .. }
                | FrameError::Allocation { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
