use std::io::{Read, Write};

use webpipe_codec::{ImageCodec, DEFAULT_QUALITY};
use webpipe_frame::{FrameConfig, FrameError, FrameReader, FrameWriter};
use webpipe_protocol::{format_response, parse_request, Request};

use crate::dispatch::{Dispatcher, Outcome};
use crate::error::{peer_gone, Result, SessionError};

pub const ERR_BLOB_TOO_LARGE: &str = "Blob too large";
pub const ERR_BLOB_ALLOC: &str = "Failed to allocate blob";
pub const ERR_BAD_FRAME: &str = "Invalid blob frame";

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Line and payload limits for incoming requests.
    pub frame: FrameConfig,
    /// Lossy encoder quality.
    pub quality: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            quality: DEFAULT_QUALITY,
        }
    }
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Non-blank request lines read.
    pub requests: u64,
    /// Requests answered with an error or dropped on a truncated blob.
    pub failed: u64,
    /// Blank lines skipped.
    pub skipped_lines: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

enum Step {
    Continue,
    Stop,
}

/// What the loop does with a request whose blob could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlobPolicy {
    /// No reply; keep serving.
    Drop,
    /// Reply with this error and keep serving.
    Reply(&'static str),
    /// Reply with this error, then end the session.
    Desynchronized(&'static str),
    Fatal,
}

fn blob_policy(err: &FrameError) -> BlobPolicy {
    match err {
        FrameError::Truncated { .. } => BlobPolicy::Drop,
        FrameError::PayloadTooLarge { .. } => BlobPolicy::Reply(ERR_BLOB_TOO_LARGE),
        FrameError::Allocation { .. } => BlobPolicy::Reply(ERR_BLOB_ALLOC),
        FrameError::BadMagic { .. } => BlobPolicy::Desynchronized(ERR_BAD_FRAME),
        _ => BlobPolicy::Fatal,
    }
}

/// Drives the request/response loop over one input and one output stream.
pub struct Session<R, W, C> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    dispatcher: Dispatcher<C>,
    stats: SessionStats,
}

impl<R: Read, W: Write, C: ImageCodec> Session<R, W, C> {
    pub fn new(input: R, output: W, codec: C) -> Self {
        Self::with_config(input, output, codec, SessionConfig::default())
    }

    pub fn with_config(input: R, output: W, codec: C, config: SessionConfig) -> Self {
        Self {
            reader: FrameReader::with_config(input, config.frame.clone()),
            // Output blobs are bounded by the codec, not by the input limit.
            writer: FrameWriter::with_config(
                output,
                FrameConfig {
                    max_payload_size: u32::MAX as usize,
                    ..config.frame
                },
            ),
            dispatcher: Dispatcher::new(codec).with_quality(config.quality),
            stats: SessionStats::default(),
        }
    }

    /// Serve requests until end of input.
    ///
    /// Returns the session counters on a clean stop: end of input, or the
    /// output side closing. A single bad request never ends the session;
    /// only a desynchronized input stream or an I/O failure does.
    pub fn run(mut self) -> Result<SessionStats> {
        let result = loop {
            match self.step() {
                Ok(Step::Continue) => {}
                Ok(Step::Stop) => break Ok(()),
                Err(err) => break Err(err),
            }
        };

        self.stats.bytes_in = self.reader.bytes_read();
        self.stats.bytes_out = self.writer.bytes_written();
        result.map(|()| self.stats)
    }

    fn step(&mut self) -> Result<Step> {
        let line = match self.reader.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::debug!("end of input");
                return Ok(Step::Stop);
            }
            Err(err @ FrameError::LineTooLong { .. }) => {
                tracing::error!(error = %err, "request line too long");
                return Err(SessionError::Desynchronized(err));
            }
            Err(err) => return Err(SessionError::Frame(err)),
        };

        if line.is_empty() {
            self.stats.skipped_lines += 1;
            return Ok(Step::Continue);
        }

        self.stats.requests += 1;
        let request = parse_request(&line);

        let outcome = match self.reader.read_frame() {
            Ok(blob) => self.dispatcher.dispatch(&request, blob),
            Err(err) => match blob_policy(&err) {
                BlobPolicy::Drop => {
                    tracing::warn!(
                        id = request.header.id,
                        error = %err,
                        "dropping request with truncated blob"
                    );
                    self.stats.failed += 1;
                    return Ok(Step::Continue);
                }
                BlobPolicy::Reply(message) => {
                    tracing::warn!(id = request.header.id, error = %err, "{message}");
                    Outcome::failed(&request, message)
                }
                BlobPolicy::Desynchronized(message) => {
                    tracing::error!(
                        id = request.header.id,
                        error = %err,
                        "input stream desynchronized"
                    );
                    self.stats.failed += 1;
                    let reply = Outcome::failed(&request, message);
                    if let Err(write_err) = self.respond(&request, &reply) {
                        tracing::debug!(error = %write_err, "could not report invalid blob frame");
                    }
                    return Err(SessionError::Desynchronized(err));
                }
                BlobPolicy::Fatal => return Err(SessionError::Frame(err)),
            },
        };

        if outcome.is_failure() {
            self.stats.failed += 1;
        }

        match self.respond(&request, &outcome) {
            Ok(()) => Ok(Step::Continue),
            Err(SessionError::Output(err)) if peer_gone(&err) => {
                tracing::info!(error = %err, "output closed by peer");
                Ok(Step::Stop)
            }
            Err(err) => Err(err),
        }
    }

    fn respond(&mut self, request: &Request, outcome: &Outcome) -> Result<()> {
        let line = format_response(&outcome.response)?;
        self.writer.write_line(&line).map_err(SessionError::Output)?;
        if let Some(blob) = &outcome.blob {
            self.writer
                .send(outcome.response.frame_id(), blob)
                .map_err(SessionError::Output)?;
        }
        tracing::debug!(
            id = request.header.id,
            err = %outcome.response.header.err,
            blob_len = outcome.blob.as_ref().map_or(0, Vec::len),
            "response written"
        );
        Ok(())
    }
}
