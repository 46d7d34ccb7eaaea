use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};

use crate::codec::{Frame, FrameConfig, FrameHeader, HEADER_SIZE};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads text lines and blob frames from one `Read` stream.
///
/// Lines and frames share a single read-ahead buffer, so a frame that arrives
/// in the same chunk as the preceding line is never lost. Frame payloads
/// larger than what is already buffered are read straight into their final
/// allocation.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    bytes_read: u64,
}

impl<T: Read> FrameReader<T> {
    /// Create a new reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            bytes_read: 0,
        }
    }

    /// Read the next text line, without its `\n` or `\r\n` terminator.
    ///
    /// Returns `Ok(None)` at end of input. A final line without a terminator
    /// is returned as-is. A blank line is returned as an empty buffer.
    pub fn read_line(&mut self) -> Result<Option<Bytes>> {
        let max = self.config.max_line_length;
        let mut scanned = 0usize;
        loop {
            if let Some(pos) = self.buf[scanned..].iter().position(|&b| b == b'\n') {
                let end = scanned + pos + 1;
                if end > max {
                    return Err(FrameError::LineTooLong { max });
                }
                let mut line = self.buf.split_to(end);
                line.truncate(end - 1);
                if line.last() == Some(&b'\r') {
                    line.truncate(line.len() - 1);
                }
                return Ok(Some(line.freeze()));
            }

            scanned = self.buf.len();
            if scanned >= max {
                return Err(FrameError::LineTooLong { max });
            }

            if self.fill()? == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.buf.split().freeze()));
            }
        }
    }

    /// Read the next complete blob frame (blocking).
    ///
    /// On `PayloadTooLarge` and `Allocation` the declared payload is consumed
    /// and dropped, so the stream stays aligned for the next line. If the
    /// stream ends before the whole payload arrives, the result is
    /// `Truncated` whatever the declared size.
    pub fn read_frame(&mut self) -> Result<Frame> {
        while self.buf.len() < HEADER_SIZE {
            if self.fill()? == 0 {
                let received = self.buf.len();
                self.buf.clear();
                return Err(FrameError::Truncated {
                    expected: HEADER_SIZE,
                    received,
                });
            }
        }

        let mut raw = [0u8; HEADER_SIZE];
        raw.copy_from_slice(&self.buf[..HEADER_SIZE]);
        self.buf.advance(HEADER_SIZE);
        let header = FrameHeader::parse(&raw)?;
        let size = header.size as usize;

        if size > self.config.max_payload_size {
            self.discard(size)?;
            return Err(FrameError::PayloadTooLarge {
                size,
                max: self.config.max_payload_size,
            });
        }

        let mut payload = Vec::new();
        if payload.try_reserve_exact(size).is_err() {
            self.discard(size)?;
            return Err(FrameError::Allocation { size });
        }

        let buffered = self.buf.len().min(size);
        payload.extend_from_slice(&self.buf[..buffered]);
        self.buf.advance(buffered);

        // Capacity is already reserved, so this never reallocates.
        payload.resize(size, 0);
        let mut filled = buffered;
        while filled < size {
            match self.inner.read(&mut payload[filled..]) {
                Ok(0) => {
                    return Err(FrameError::Truncated {
                        expected: size,
                        received: filled,
                    })
                }
                Ok(n) => {
                    filled += n;
                    self.bytes_read += n as u64;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        Ok(Frame {
            id: header.id,
            payload: Bytes::from(payload),
        })
    }

    /// Total bytes pulled from the underlying stream so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    fn fill(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    self.bytes_read += n as u64;
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Drop `size` payload bytes. A stream that ends first is `Truncated`.
    fn discard(&mut self, size: usize) -> Result<()> {
        let buffered = self.buf.len().min(size);
        self.buf.advance(buffered);
        let mut remaining = size - buffered;

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        while remaining > 0 {
            let want = remaining.min(READ_CHUNK_SIZE);
            match self.inner.read(&mut chunk[..want]) {
                Ok(0) => {
                    tracing::debug!(remaining, "stream ended while discarding blob payload");
                    return Err(FrameError::Truncated {
                        expected: size,
                        received: size - remaining,
                    });
                }
                Ok(n) => {
                    remaining -= n;
                    self.bytes_read += n as u64;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }
}
