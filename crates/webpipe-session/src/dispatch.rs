use webpipe_codec::{CodecError, ImageCodec, PixelGeometry, DEFAULT_QUALITY};
use webpipe_frame::Frame;
use webpipe_protocol::{ImageOptions, Request, Response};

pub const ERR_GET_INFO: &str = "Failed to get WebP info";
pub const ERR_DECODE: &str = "Failed to decode WebP";
pub const ERR_CONFIG_INIT: &str = "Error initializing WebPConfig";
pub const ERR_ENCODE_NRGBA: &str = "Error encoding NRGBA to WebP";
pub const ERR_ENCODE_GRAY: &str = "Error encoding Gray to WebP";

/// Commands understood by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Decode,
    Config,
    EncodeNrgba,
    EncodeGray,
    Unknown,
}

impl Command {
    /// Match a command name exactly; anything else is [`Command::Unknown`].
    pub fn parse(name: &str) -> Self {
        match name {
            "decode" => Command::Decode,
            "config" => Command::Config,
            "encodeNRGBA" => Command::EncodeNrgba,
            "encodeGray" => Command::EncodeGray,
            _ => Command::Unknown,
        }
    }

    /// True when a successful reply is followed by an output blob.
    pub fn produces_blob(self) -> bool {
        matches!(
            self,
            Command::Decode | Command::EncodeNrgba | Command::EncodeGray
        )
    }
}

/// The reply to one request: a response line and an optional output blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub response: Response,
    pub blob: Option<Vec<u8>>,
}

impl Outcome {
    fn success(response: Response, blob: Option<Vec<u8>>) -> Self {
        Self { response, blob }
    }

    /// A failed reply carrying `err` and no blob.
    pub fn failed(request: &Request, err: &str) -> Self {
        Self {
            response: Response::reply_to(&request.header).with_error(err),
            blob: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.response.is_error()
    }
}

/// Runs one request against an [`ImageCodec`].
#[derive(Debug, Clone)]
pub struct Dispatcher<C> {
    codec: C,
    quality: f32,
}

impl<C: ImageCodec> Dispatcher<C> {
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            quality: DEFAULT_QUALITY,
        }
    }

    /// Override the lossy encoder quality.
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    /// Execute `request` with its input blob.
    ///
    /// The blob is consumed here and dropped when this returns, whatever the
    /// outcome.
    pub fn dispatch(&self, request: &Request, blob: Frame) -> Outcome {
        if blob.id != request.frame_id() {
            tracing::warn!(
                request_id = request.header.id,
                frame_id = blob.id,
                "blob id does not match request id; using request id"
            );
        }

        let command = Command::parse(&request.header.command);
        let payload = blob.payload.as_ref();
        tracing::debug!(
            id = request.header.id,
            command = %request.header.command,
            blob_len = payload.len(),
            "dispatching request"
        );

        match command {
            Command::Decode => self.decode(request, payload),
            Command::Config => self.config(request, payload),
            Command::EncodeNrgba => self.encode(request, payload, 4, ERR_ENCODE_NRGBA),
            Command::EncodeGray => self.encode(request, payload, 1, ERR_ENCODE_GRAY),
            Command::Unknown => {
                tracing::warn!(
                    id = request.header.id,
                    command = %request.header.command,
                    "unknown command"
                );
                Outcome::failed(
                    request,
                    &format!("Unknown command: {}", request.header.command),
                )
            }
        }
    }

    fn config(&self, request: &Request, payload: &[u8]) -> Outcome {
        match self.codec.probe(payload) {
            Ok(info) => Outcome::success(
                Response::reply_to(&request.header).with_options(ImageOptions::new(
                    i64::from(info.width),
                    i64::from(info.height),
                    0,
                )),
                None,
            ),
            Err(err) => fail(request, ERR_GET_INFO, &err),
        }
    }

    fn decode(&self, request: &Request, payload: &[u8]) -> Outcome {
        if let Err(err) = self.codec.probe(payload) {
            return fail(request, ERR_GET_INFO, &err);
        }
        match self.codec.decode_rgba(payload) {
            Ok(image) => {
                let options = ImageOptions::new(
                    i64::from(image.width),
                    i64::from(image.height),
                    i64::from(image.stride()),
                );
                Outcome::success(
                    Response::reply_to(&request.header).with_options(options),
                    Some(image.pixels),
                )
            }
            Err(err) => fail(request, ERR_DECODE, &err),
        }
    }

    fn encode(
        &self,
        request: &Request,
        payload: &[u8],
        bytes_per_pixel: usize,
        encode_err: &str,
    ) -> Outcome {
        let options = request.options;
        let result = PixelGeometry::checked(
            options.width,
            options.height,
            options.stride,
            bytes_per_pixel,
            payload.len(),
        )
        .and_then(|geometry| {
            if bytes_per_pixel == 4 {
                self.codec.encode_rgba(payload, geometry, self.quality)
            } else {
                self.codec.encode_gray(payload, geometry, self.quality)
            }
        });

        match result {
            Ok(webp) => Outcome::success(Response::reply_to(&request.header), Some(webp)),
            Err(err @ CodecError::ConfigInit) => fail(request, ERR_CONFIG_INIT, &err),
            Err(err) => fail(request, encode_err, &err),
        }
    }
}

fn fail(request: &Request, message: &str, cause: &CodecError) -> Outcome {
    tracing::warn!(
        id = request.header.id,
        command = %request.header.command,
        error = %cause,
        "{message}"
    );
    Outcome::failed(request, message)
}
