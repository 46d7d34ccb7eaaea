//! Image codec collaborator for the webpipe gateway.
//!
//! - [`traits`]: the [`ImageCodec`] seam the dispatcher calls through
//! - [`geometry`]: pixel buffer geometry validation
//! - [`webp`]: the libwebp-backed implementation

pub mod error;
pub mod geometry;
pub mod traits;
pub mod webp;

pub use error::{CodecError, EncodeErrorKind, Result};
pub use geometry::PixelGeometry;
pub use traits::{DecodedImage, ImageCodec, ImageInfo};
pub use webp::{WebpCodec, DEFAULT_QUALITY, MAX_DIMENSION};
