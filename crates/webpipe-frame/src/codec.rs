use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: magic (8) + id (4) + size (4) = 16 bytes.
pub const HEADER_SIZE: usize = 16;

/// Magic bytes: "TAK35EM1".
pub const MAGIC: [u8; 8] = *b"TAK35EM1";

/// Default maximum payload size: 1 GiB.
///
/// Large enough for a fully decoded 16383x16383 RGBA image.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024 * 1024 * 1024;

/// Default maximum length of one text line, newline included.
pub const DEFAULT_MAX_LINE: usize = 4096;

/// A blob frame tagged with the id of the request it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The request id this blob belongs to.
    pub id: u32,
    /// The blob payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(id: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }
}

/// A parsed 16-byte frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub id: u32,
    pub size: u32,
}

impl FrameHeader {
    /// Parse and validate a header. The magic is checked before anything else.
    pub fn parse(raw: &[u8; HEADER_SIZE]) -> Result<Self> {
        let mut found = [0u8; 8];
        found.copy_from_slice(&raw[0..8]);
        if found != MAGIC {
            return Err(FrameError::BadMagic { found });
        }

        let mut rest = &raw[8..];
        let id = rest.get_u32_le();
        let size = rest.get_u32_le();
        Ok(Self { id, size })
    }

    /// Serialize the header into its wire form.
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..8].copy_from_slice(&MAGIC);
        out[8..12].copy_from_slice(&self.id.to_le_bytes());
        out[12..16].copy_from_slice(&self.size.to_le_bytes());
        out
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬───────────┬─────────────────┐
/// │ Magic (8B)   │ Id        │ Size      │ Payload          │
/// │ "TAK35EM1"   │ (4B LE)   │ (4B LE)   │ (Size bytes)     │
/// └──────────────┴───────────┴───────────┴─────────────────┘
/// ```
pub fn encode_frame(id: u32, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let size = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&FrameHeader { id, size }.to_bytes());
    dst.put_slice(payload);
    Ok(())
}

/// Limits applied by [`FrameReader`](crate::FrameReader) and
/// [`FrameWriter`](crate::FrameWriter).
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 1 GiB.
    pub max_payload_size: usize,
    /// Maximum text line length in bytes. Default: 4096.
    pub max_line_length: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            max_line_length: DEFAULT_MAX_LINE,
        }
    }
}
