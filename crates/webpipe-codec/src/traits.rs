use crate::error::Result;
use crate::geometry::PixelGeometry;

/// Geometry read from a compressed image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// A fully decoded RGBA image with tightly packed rows.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Bytes per row (`width * 4`).
    pub fn stride(&self) -> u32 {
        self.width * 4
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &format_args!("<{} bytes>", self.pixels.len()))
            .finish()
    }
}

/// The compressed-image operations the dispatcher needs.
///
/// Implementations must not trust `geometry` blindly: it is validated by the
/// caller, but an implementation that reads raw memory re-checks it against
/// the buffer length.
pub trait ImageCodec {
    /// Read width and height without decoding pixel data.
    fn probe(&self, data: &[u8]) -> Result<ImageInfo>;

    /// Decode to 4-channel RGBA.
    fn decode_rgba(&self, data: &[u8]) -> Result<DecodedImage>;

    /// Lossy-encode an RGBA buffer.
    fn encode_rgba(&self, pixels: &[u8], geometry: PixelGeometry, quality: f32) -> Result<Vec<u8>>;

    /// Lossy-encode an 8-bit luma plane, with flat mid-gray chroma.
    fn encode_gray(&self, luma: &[u8], geometry: PixelGeometry, quality: f32) -> Result<Vec<u8>>;
}

impl<C: ImageCodec + ?Sized> ImageCodec for &C {
    fn probe(&self, data: &[u8]) -> Result<ImageInfo> {
        (**self).probe(data)
    }

    fn decode_rgba(&self, data: &[u8]) -> Result<DecodedImage> {
        (**self).decode_rgba(data)
    }

    fn encode_rgba(&self, pixels: &[u8], geometry: PixelGeometry, quality: f32) -> Result<Vec<u8>> {
        (**self).encode_rgba(pixels, geometry, quality)
    }

    fn encode_gray(&self, luma: &[u8], geometry: PixelGeometry, quality: f32) -> Result<Vec<u8>> {
        (**self).encode_gray(luma, geometry, quality)
    }
}
