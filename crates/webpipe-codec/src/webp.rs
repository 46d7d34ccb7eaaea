use std::ffi::{c_int, c_void};
use std::mem::MaybeUninit;
use std::ptr;

use libwebp_sys as sys;

use crate::error::{CodecError, EncodeErrorKind, Result};
use crate::geometry::PixelGeometry;
use crate::traits::{DecodedImage, ImageCodec, ImageInfo};

/// Lossy quality used by the gateway.
pub const DEFAULT_QUALITY: f32 = 75.0;

/// Largest width or height a WebP image can have.
pub const MAX_DIMENSION: u32 = 16383;

const GRAY_CHROMA: u8 = 128;

/// [`ImageCodec`] backed by libwebp.
///
/// Every buffer handed back to the caller is a Rust-owned `Vec<u8>`; libwebp
/// decodes into a buffer we allocate and encodes through a writer callback
/// that appends to one.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpCodec;

impl WebpCodec {
    pub fn new() -> Self {
        Self
    }
}

impl ImageCodec for WebpCodec {
    fn probe(&self, data: &[u8]) -> Result<ImageInfo> {
        let mut width: c_int = 0;
        let mut height: c_int = 0;
        // SAFETY: `data` is valid for reads of `data.len()` bytes and the
        // out-pointers reference live locals.
        let ok = unsafe { sys::WebPGetInfo(data.as_ptr(), data.len(), &mut width, &mut height) };
        if ok == 0 || width <= 0 || height <= 0 {
            return Err(CodecError::Probe { len: data.len() });
        }
        Ok(ImageInfo {
            width: width as u32,
            height: height as u32,
        })
    }

    fn decode_rgba(&self, data: &[u8]) -> Result<DecodedImage> {
        let info = self.probe(data)?;
        let stride = info.width as usize * 4;
        let size = stride * info.height as usize;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(size)
            .map_err(|_| CodecError::Allocation {
                size,
                what: "decoded pixels",
            })?;
        pixels.resize(size, 0);

        // SAFETY: `pixels` is exactly `size` writable bytes, which is
        // `height` rows of `stride` bytes as reported by the probe.
        let out = unsafe {
            sys::WebPDecodeRGBAInto(
                data.as_ptr(),
                data.len(),
                pixels.as_mut_ptr(),
                size,
                stride as c_int,
            )
        };
        if out.is_null() {
            return Err(CodecError::Decode {
                width: info.width,
                height: info.height,
                len: data.len(),
            });
        }

        Ok(DecodedImage {
            width: info.width,
            height: info.height,
            pixels,
        })
    }

    fn encode_rgba(&self, pixels: &[u8], geometry: PixelGeometry, quality: f32) -> Result<Vec<u8>> {
        ensure_fits(pixels, geometry, 4)?;
        let config = encoder_config(quality)?;
        let mut picture = Picture::new(geometry)?;
        picture.raw.use_argb = 1;

        // SAFETY: `ensure_fits` verified that `height` rows of `width * 4`
        // bytes, `stride` apart, lie inside `pixels`.
        let ok = unsafe {
            sys::WebPPictureImportRGBA(&mut picture.raw, pixels.as_ptr(), geometry.stride as c_int)
        };
        if ok == 0 {
            return Err(CodecError::Encode {
                kind: picture.error_kind(),
            });
        }

        picture.encode(&config)
    }

    fn encode_gray(&self, luma: &[u8], geometry: PixelGeometry, quality: f32) -> Result<Vec<u8>> {
        ensure_fits(luma, geometry, 1)?;
        let config = encoder_config(quality)?;

        let mut y = owned_plane(luma.len(), "luma plane")?;
        y.extend_from_slice(luma);
        let (uv_width, uv_height) = geometry.chroma_dimensions();
        let uv_size = uv_width as usize * uv_height as usize;
        let mut u = owned_plane(uv_size, "chroma plane")?;
        u.resize(uv_size, GRAY_CHROMA);
        let mut v = owned_plane(uv_size, "chroma plane")?;
        v.resize(uv_size, GRAY_CHROMA);

        // Declared after the planes so it is dropped before them.
        let mut picture = Picture::new(geometry)?;
        picture.raw.use_argb = 0;
        picture.raw.y = y.as_mut_ptr();
        picture.raw.u = u.as_mut_ptr();
        picture.raw.v = v.as_mut_ptr();
        picture.raw.y_stride = geometry.stride as c_int;
        picture.raw.uv_stride = uv_width as c_int;

        picture.encode(&config)
    }
}

fn ensure_fits(buf: &[u8], geometry: PixelGeometry, bytes_per_pixel: usize) -> Result<()> {
    let checked = PixelGeometry::checked(
        i64::from(geometry.width),
        i64::from(geometry.height),
        i64::from(geometry.stride),
        bytes_per_pixel,
        buf.len(),
    )?;
    if checked.width > MAX_DIMENSION || checked.height > MAX_DIMENSION {
        return Err(CodecError::Encode {
            kind: EncodeErrorKind::BadDimension,
        });
    }
    Ok(())
}

fn owned_plane(size: usize, what: &'static str) -> Result<Vec<u8>> {
    let mut plane = Vec::new();
    plane
        .try_reserve_exact(size)
        .map_err(|_| CodecError::Allocation { size, what })?;
    Ok(plane)
}

fn encoder_config(quality: f32) -> Result<sys::WebPConfig> {
    let mut config = MaybeUninit::<sys::WebPConfig>::uninit();
    // SAFETY: WebPInitConfig writes every field when it reports success.
    if !unsafe { sys::WebPInitConfig(config.as_mut_ptr()) } {
        return Err(CodecError::ConfigInit);
    }
    // SAFETY: initialized above.
    let mut config = unsafe { config.assume_init() };
    config.lossless = 0;
    config.quality = quality;
    Ok(config)
}

/// Owns a `WebPPicture` and frees its internal buffers on drop.
struct Picture {
    raw: sys::WebPPicture,
}

impl Picture {
    fn new(geometry: PixelGeometry) -> Result<Self> {
        let mut raw = MaybeUninit::<sys::WebPPicture>::uninit();
        // SAFETY: WebPPictureInit writes every field when it reports success.
        if !unsafe { sys::WebPPictureInit(raw.as_mut_ptr()) } {
            return Err(CodecError::PictureInit);
        }
        // SAFETY: initialized above.
        let mut raw = unsafe { raw.assume_init() };
        raw.width = geometry.width as c_int;
        raw.height = geometry.height as c_int;
        Ok(Self { raw })
    }

    fn error_kind(&self) -> EncodeErrorKind {
        EncodeErrorKind::from_code(self.raw.error_code as i32)
    }

    fn encode(&mut self, config: &sys::WebPConfig) -> Result<Vec<u8>> {
        let mut output: Vec<u8> = Vec::new();
        self.raw.writer = Some(collect_output);
        self.raw.custom_ptr = (&mut output as *mut Vec<u8>).cast::<c_void>();

        // SAFETY: `custom_ptr` points at `output`, which outlives the call;
        // `collect_output` is the only code that dereferences it.
        let ok = unsafe { sys::WebPEncode(config, &mut self.raw) };

        self.raw.writer = None;
        self.raw.custom_ptr = ptr::null_mut();

        if ok == 0 {
            let kind = self.error_kind();
            tracing::debug!(
                width = self.raw.width,
                height = self.raw.height,
                code = kind.code(),
                "WebPEncode failed"
            );
            return Err(CodecError::Encode { kind });
        }
        tracing::trace!(
            width = self.raw.width,
            height = self.raw.height,
            bytes = output.len(),
            "picture encoded"
        );
        Ok(output)
    }
}

impl Drop for Picture {
    fn drop(&mut self) {
        // SAFETY: `raw` was initialized by WebPPictureInit. WebPPictureFree
        // releases only buffers libwebp allocated itself.
        unsafe { sys::WebPPictureFree(&mut self.raw) };
    }
}

unsafe extern "C" fn collect_output(
    data: *const u8,
    data_size: usize,
    picture: *const sys::WebPPicture,
) -> c_int {
    if data_size == 0 {
        return 1;
    }
    // SAFETY: only installed by `Picture::encode`, which points `custom_ptr`
    // at a `Vec<u8>` it exclusively borrows for the duration of WebPEncode.
    let output = unsafe { &mut *(*picture).custom_ptr.cast::<Vec<u8>>() };
    if output.try_reserve(data_size).is_err() {
        return 0;
    }
    // SAFETY: libwebp passes `data_size` readable bytes at `data`.
    output.extend_from_slice(unsafe { std::slice::from_raw_parts(data, data_size) });
    1
}
