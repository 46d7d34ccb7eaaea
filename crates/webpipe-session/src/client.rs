use std::ffi::OsStr;
use std::io::{self, Read, Write};
use std::process::{self, Child, ChildStdin, ChildStdout, Stdio};

use bytes::Bytes;
use webpipe_codec::{DecodedImage, ImageInfo};
use webpipe_frame::{FrameConfig, FrameReader, FrameWriter};
use webpipe_protocol::{parse_response, ImageOptions, Request, Response};

use crate::dispatch::Command;
use crate::error::{ClientError, ClientResult};

/// A gateway reply: the response line and, for blob-producing commands that
/// succeeded, the output blob.
#[derive(Debug, Clone)]
pub struct Reply {
    pub response: Response,
    pub blob: Option<Bytes>,
}

/// Talks to a gateway over a pair of byte streams.
///
/// Requests are strictly sequential; each call writes one request and reads
/// its reply before returning. Ids start at 1 and increase by one per call.
pub struct Client<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    next_id: i64,
}

impl<R: Read, W: Write> Client<R, W> {
    /// `reader` carries gateway output, `writer` gateway input.
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, FrameConfig::default())
    }

    pub fn with_config(reader: R, writer: W, config: FrameConfig) -> Self {
        Self {
            reader: FrameReader::with_config(reader, config.clone()),
            writer: FrameWriter::with_config(writer, config),
            next_id: 1,
        }
    }

    /// Read the dimensions of a WebP image.
    pub fn config(&mut self, webp: &[u8]) -> ClientResult<ImageInfo> {
        let reply = self.call("config", ImageOptions::default(), webp)?;
        let options = reply.response.options;
        Ok(ImageInfo {
            width: dimension(options.width)?,
            height: dimension(options.height)?,
        })
    }

    /// Decode a WebP image to RGBA.
    pub fn decode(&mut self, webp: &[u8]) -> ClientResult<DecodedImage> {
        let reply = self.call("decode", ImageOptions::default(), webp)?;
        let options = reply.response.options;
        let width = dimension(options.width)?;
        let height = dimension(options.height)?;
        let pixels = reply.blob.unwrap_or_default();

        let expected = width as usize * height as usize * 4;
        if options.stride != i64::from(width) * 4 || pixels.len() != expected {
            return Err(ClientError::Malformed(format!(
                "{width}x{height} stride {} with {} pixel bytes",
                options.stride,
                pixels.len()
            )));
        }

        Ok(DecodedImage {
            width,
            height,
            pixels: pixels.to_vec(),
        })
    }

    /// Encode an RGBA buffer to WebP.
    pub fn encode_nrgba(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: u32,
    ) -> ClientResult<Vec<u8>> {
        let options = ImageOptions::new(width.into(), height.into(), stride.into());
        let reply = self.call("encodeNRGBA", options, pixels)?;
        Ok(reply.blob.unwrap_or_default().to_vec())
    }

    /// Encode an 8-bit luma plane to WebP.
    pub fn encode_gray(
        &mut self,
        luma: &[u8],
        width: u32,
        height: u32,
        stride: u32,
    ) -> ClientResult<Vec<u8>> {
        let options = ImageOptions::new(width.into(), height.into(), stride.into());
        let reply = self.call("encodeGray", options, luma)?;
        Ok(reply.blob.unwrap_or_default().to_vec())
    }

    /// Send an arbitrary command and read its reply.
    ///
    /// A non-empty `err` becomes [`ClientError::Remote`]. A blob is read only
    /// when the command produces one and the reply is not an error.
    pub fn call(
        &mut self,
        command: &str,
        options: ImageOptions,
        blob: &[u8],
    ) -> ClientResult<Reply> {
        let request = Request::new(self.next_id, command, options);
        self.next_id = self.next_id.wrapping_add(1);

        self.writer.write_line(&request.to_line()?)?;
        self.writer.send(request.frame_id(), blob)?;

        let line = self.reader.read_line()?.ok_or(ClientError::Closed)?;
        let response = parse_response(&line)?;
        if response.header.id != request.header.id {
            return Err(ClientError::IdMismatch {
                expected: request.header.id,
                got: response.header.id,
            });
        }
        if response.is_error() {
            tracing::debug!(id = request.header.id, err = %response.header.err, "gateway error");
            return Err(ClientError::Remote(response.header.err));
        }

        let blob = if Command::parse(command).produces_blob() {
            let frame = self.reader.read_frame()?;
            if frame.id != response.frame_id() {
                return Err(ClientError::IdMismatch {
                    expected: request.header.id,
                    got: i64::from(frame.id),
                });
            }
            Some(frame.payload)
        } else {
            None
        };

        Ok(Reply { response, blob })
    }
}

fn dimension(value: i64) -> ClientResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| ClientError::Malformed(format!("invalid dimension {value}")))
}

/// A gateway running as a child process, spoken to over its stdin/stdout.
///
/// The child's stderr is inherited so its diagnostics stay visible.
pub struct ChildClient {
    client: Option<Client<ChildStdout, ChildStdin>>,
    child: Child,
}

impl ChildClient {
    /// Start `program` with no arguments.
    pub fn spawn(program: impl AsRef<OsStr>) -> ClientResult<Self> {
        Self::spawn_command(process::Command::new(program))
    }

    /// Start a prepared command; its stdio is overridden.
    pub fn spawn_command(mut command: process::Command) -> ClientResult<Self> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        tracing::debug!(pid = child.id(), "gateway started");

        Ok(Self {
            client: Some(Client::new(stdout, stdin)),
            child,
        })
    }

    /// The protocol client, until [`ChildClient::close`] is called.
    pub fn client(&mut self) -> ClientResult<&mut Client<ChildStdout, ChildStdin>> {
        self.client.as_mut().ok_or(ClientError::AlreadyClosed)
    }

    pub fn config(&mut self, webp: &[u8]) -> ClientResult<ImageInfo> {
        self.client()?.config(webp)
    }

    pub fn decode(&mut self, webp: &[u8]) -> ClientResult<DecodedImage> {
        self.client()?.decode(webp)
    }

    pub fn encode_nrgba(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: u32,
    ) -> ClientResult<Vec<u8>> {
        self.client()?.encode_nrgba(pixels, width, height, stride)
    }

    pub fn encode_gray(
        &mut self,
        luma: &[u8],
        width: u32,
        height: u32,
        stride: u32,
    ) -> ClientResult<Vec<u8>> {
        self.client()?.encode_gray(luma, width, height, stride)
    }

    /// Close the gateway's stdin and wait for it to exit.
    ///
    /// Fails with [`ClientError::Exit`] on a non-zero exit status and with
    /// [`ClientError::AlreadyClosed`] when called twice.
    pub fn close(&mut self) -> ClientResult<()> {
        let client = self.client.take().ok_or(ClientError::AlreadyClosed)?;
        drop(client);

        let status = self.child.wait()?;
        tracing::debug!(%status, "gateway exited");
        if status.success() {
            Ok(())
        } else {
            Err(ClientError::Exit(status))
        }
    }
}

impl Drop for ChildClient {
    fn drop(&mut self) {
        if self.client.take().is_some() {
            let _ = self.child.wait();
        }
    }
}

fn missing_pipe(name: &str) -> ClientError {
    ClientError::Io(io::Error::other(format!("child {name} was not captured")))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;
    use webpipe_frame::encode_frame;
    use webpipe_protocol::{format_response, ResponseHeader};

    use super::*;

    fn response(id: i64, err: &str, options: ImageOptions) -> Vec<u8> {
        let mut line = format_response(&Response {
            header: ResponseHeader {
                version: 1,
                id,
                err: err.to_string(),
            },
            options,
        })
        .unwrap();
        line.push(b'\n');
        line
    }

    fn blob(id: u32, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(id, payload, &mut buf).unwrap();
        buf.to_vec()
    }

    fn connect(gateway_output: Vec<u8>) -> Client<Cursor<Vec<u8>>, Vec<u8>> {
        Client::new(Cursor::new(gateway_output), Vec::new())
    }

    #[test]
    fn request_wire_format() {
        let mut client = connect(response(1, "", ImageOptions::new(4, 2, 0)));
        client.config(b"webp").unwrap();

        let written = client.writer.get_ref().clone();
        let mut reader = FrameReader::new(Cursor::new(written));
        let line = reader.read_line().unwrap().unwrap();
        assert_eq!(
            line.as_ref(),
            br#"{"header":{"version":1,"id":1,"command":"config"},"data":{"options":{"width":0,"height":0,"stride":0}}}"#
        );
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.id, 1);
        assert_eq!(frame.payload.as_ref(), b"webp");
    }

    #[test]
    fn config_returns_dimensions() {
        let mut client = connect(response(1, "", ImageOptions::new(64, 32, 0)));
        let info = client.config(b"x").unwrap();
        assert_eq!(
            info,
            ImageInfo {
                width: 64,
                height: 32
            }
        );
    }

    #[test]
    fn decode_reads_blob() {
        let output = [
            response(1, "", ImageOptions::new(2, 1, 8)),
            blob(1, &[9u8; 8]),
        ]
        .concat();
        let image = connect(output).decode(b"x").unwrap();
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.pixels, vec![9u8; 8]);
    }

    #[test]
    fn decode_rejects_short_blob() {
        let output = [
            response(1, "", ImageOptions::new(2, 2, 8)),
            blob(1, &[0u8; 8]),
        ]
        .concat();
        assert!(matches!(
            connect(output).decode(b"x"),
            Err(ClientError::Malformed(_))
        ));
    }

    #[test]
    fn remote_error_skips_blob() {
        let output = [
            response(1, "Failed to decode WebP", ImageOptions::default()),
            response(2, "", ImageOptions::new(1, 1, 0)),
        ]
        .concat();
        let mut client = connect(output);

        match client.decode(b"x") {
            Err(ClientError::Remote(msg)) => assert_eq!(msg, "Failed to decode WebP"),
            other => panic!("expected remote error, got {other:?}"),
        }
        // The next reply is still aligned.
        assert_eq!(client.config(b"x").unwrap().width, 1);
    }

    #[test]
    fn encode_returns_blob() {
        let output = [
            response(1, "", ImageOptions::default()),
            blob(1, b"RIFFwebp"),
            response(2, "", ImageOptions::default()),
            blob(2, b"RIFFgray"),
        ]
        .concat();
        let mut client = connect(output);
        assert_eq!(client.encode_nrgba(&[0; 4], 1, 1, 4).unwrap(), b"RIFFwebp");
        assert_eq!(client.encode_gray(&[0; 1], 1, 1, 1).unwrap(), b"RIFFgray");
    }

    #[test]
    fn id_mismatch_is_detected() {
        let mut client = connect(response(5, "", ImageOptions::new(1, 1, 0)));
        assert!(matches!(
            client.config(b"x"),
            Err(ClientError::IdMismatch {
                expected: 1,
                got: 5
            })
        ));

        let output = [response(1, "", ImageOptions::default()), blob(9, b"x")].concat();
        assert!(matches!(
            connect(output).encode_gray(&[0], 1, 1, 1),
            Err(ClientError::IdMismatch {
                expected: 1,
                got: 9
            })
        ));
    }

    #[test]
    fn closed_stream_is_reported() {
        assert!(matches!(connect(Vec::new()).config(b"x"), Err(ClientError::Closed)));
    }

    #[test]
    fn unknown_command_reply_has_no_blob() {
        let mut client = connect(response(1, "Unknown command: nope", ImageOptions::default()));
        match client.call("nope", ImageOptions::default(), b"") {
            Err(ClientError::Remote(msg)) => assert_eq!(msg, "Unknown command: nope"),
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn ids_increase_per_call() {
        let output = [
            response(1, "", ImageOptions::new(1, 1, 0)),
            response(2, "", ImageOptions::new(2, 2, 0)),
        ]
        .concat();
        let mut client = connect(output);
        assert_eq!(client.config(b"a").unwrap().width, 1);
        assert_eq!(client.config(b"b").unwrap().width, 2);
        assert_eq!(client.next_id, 3);
    }
}
