use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};

use crate::codec::{FrameConfig, FrameHeader};
use crate::error::{FrameError, Result};

const LINE_BUFFER_CAPACITY: usize = 4 * 1024;

/// Writes text lines and blob frames to any `Write` stream.
///
/// Every call writes one complete unit and flushes, so a peer blocked on a
/// pipe read observes it immediately.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    bytes_written: u64,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(LINE_BUFFER_CAPACITY),
            config,
            bytes_written: 0,
        }
    }

    /// Send a payload tagged with `id`.
    ///
    /// The header goes out from a stack buffer and the payload straight from
    /// the caller's slice, so large blobs are never copied.
    pub fn send(&mut self, id: u32, payload: &[u8]) -> Result<()> {
        let size = u32::try_from(payload.len())
            .ok()
            .filter(|_| payload.len() <= self.config.max_payload_size)
            .ok_or(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size.min(u32::MAX as usize),
            })?;

        let header = FrameHeader { id, size }.to_bytes();
        write_all(&mut self.inner, &header, &mut self.bytes_written)?;
        write_all(&mut self.inner, payload, &mut self.bytes_written)?;
        self.flush()
    }

    /// Write one text line. A trailing `\n` is appended.
    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.reserve(line.len() + 1);
        self.buf.put_slice(line);
        self.buf.put_u8(b'\n');
        self.write_buffered()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Total bytes handed to the underlying stream so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }


    fn write_buffered(&mut self) -> Result<()> {
        write_all(&mut self.inner, &self.buf, &mut self.bytes_written)?;
        self.flush()
    }
}

fn write_all<T: Write>(inner: &mut T, mut bytes: &[u8], counter: &mut u64) -> Result<()> {
    while !bytes.is_empty() {
        match inner.write(bytes) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => {
                bytes = &bytes[n..];
                *counter += n as u64;
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(())
}
