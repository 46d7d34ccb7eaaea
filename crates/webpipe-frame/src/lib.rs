//! Blob frame transport for the webpipe gateway.
//!
//! The gateway stream interleaves two kinds of units over one byte stream:
//! newline-terminated JSON text lines and binary blob frames. Every blob is
//! framed with:
//! - An 8-byte magic (`TAK35EM1`) for stream synchronization
//! - A 4-byte little-endian id correlating the blob with its request
//! - A 4-byte little-endian payload length
//!
//! [`FrameReader`] reads both kinds of unit through one buffer so bytes read
//! ahead while scanning for a newline are never lost. [`FrameWriter`] flushes
//! after every unit.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    encode_frame, Frame, FrameConfig, FrameHeader, DEFAULT_MAX_LINE, DEFAULT_MAX_PAYLOAD,
    HEADER_SIZE, MAGIC,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
