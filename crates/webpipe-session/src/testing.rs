//! In-memory codec double for dispatcher and driver tests.

use webpipe_codec::{CodecError, DecodedImage, ImageCodec, ImageInfo, PixelGeometry, Result};

const TAG: &[u8; 4] = b"FAKE";

/// A fake compressed image: `FAKE` followed by width and height as u32 LE.
pub(crate) fn fake_image(width: u32, height: u32) -> Vec<u8> {
    let mut image = TAG.to_vec();
    image.extend_from_slice(&width.to_le_bytes());
    image.extend_from_slice(&height.to_le_bytes());
    image
}

/// Probes [`fake_image`] buffers and "encodes" to them. Trailing bytes after
/// the 12-byte image make decoding fail.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FakeCodec {
    pub(crate) fail_config_init: bool,
}

impl ImageCodec for FakeCodec {
    fn probe(&self, data: &[u8]) -> Result<ImageInfo> {
        if data.len() < 12 || &data[..4] != TAG {
            return Err(CodecError::Probe { len: data.len() });
        }
        let width = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let height = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
        Ok(ImageInfo { width, height })
    }

    fn decode_rgba(&self, data: &[u8]) -> Result<DecodedImage> {
        let info = self.probe(data)?;
        if data.len() != 12 {
            return Err(CodecError::Decode {
                width: info.width,
                height: info.height,
                len: data.len(),
            });
        }
        Ok(DecodedImage {
            width: info.width,
            height: info.height,
            pixels: vec![0x7f; info.width as usize * info.height as usize * 4],
        })
    }

    fn encode_rgba(
        &self,
        _pixels: &[u8],
        geometry: PixelGeometry,
        _quality: f32,
    ) -> Result<Vec<u8>> {
        self.encode(geometry)
    }

    fn encode_gray(&self, _luma: &[u8], geometry: PixelGeometry, _quality: f32) -> Result<Vec<u8>> {
        self.encode(geometry)
    }
}

impl FakeCodec {
    fn encode(&self, geometry: PixelGeometry) -> Result<Vec<u8>> {
        if self.fail_config_init {
            return Err(CodecError::ConfigInit);
        }
        Ok(fake_image(geometry.width, geometry.height))
    }
}
