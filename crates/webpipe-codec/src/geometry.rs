use crate::error::{CodecError, Result};

/// Validated geometry of a row-major pixel buffer.
///
/// A `PixelGeometry` obtained from [`PixelGeometry::checked`] guarantees that
/// every row lies inside the buffer it was checked against, and that all
/// three values fit in a C `int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelGeometry {
    pub width: u32,
    pub height: u32,
    /// Bytes per row.
    pub stride: u32,
}

impl PixelGeometry {
    /// Validate request geometry against a buffer of `len` bytes holding
    /// `bytes_per_pixel` bytes per pixel.
    pub fn checked(
        width: i64,
        height: i64,
        stride: i64,
        bytes_per_pixel: usize,
        len: usize,
    ) -> Result<Self> {
        let invalid = |reason: &'static str| CodecError::InvalidGeometry {
            width,
            height,
            stride,
            len,
            reason,
        };

        if width <= 0 || height <= 0 {
            return Err(invalid("width and height must be positive"));
        }
        let limit = i64::from(i32::MAX);
        if width > limit || height > limit || stride > limit {
            return Err(invalid("dimension out of range"));
        }

        let geometry = Self {
            width: width as u32,
            height: height as u32,
            stride: stride.max(0) as u32,
        };

        let row = geometry.row_bytes(bytes_per_pixel);
        if (geometry.stride as u64) < row {
            return Err(invalid("stride shorter than one row"));
        }
        if (len as u64) < geometry.required_len(bytes_per_pixel) {
            return Err(invalid("buffer shorter than geometry"));
        }

        Ok(geometry)
    }

    /// Bytes of pixel data in one row, excluding padding.
    pub fn row_bytes(&self, bytes_per_pixel: usize) -> u64 {
        self.width as u64 * bytes_per_pixel as u64
    }

    /// Minimum buffer length: every full stride but the last, plus one row.
    pub fn required_len(&self, bytes_per_pixel: usize) -> u64 {
        self.stride as u64 * (self.height as u64).saturating_sub(1)
            + self.row_bytes(bytes_per_pixel)
    }

    /// Dimensions of one half-resolution chroma plane, rounded up.
    pub fn chroma_dimensions(&self) -> (u32, u32) {
        (self.width.div_ceil(2), self.height.div_ceil(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(err: CodecError) -> &'static str {
        match err {
            CodecError::InvalidGeometry { reason, .. } => reason,
            other => panic!("expected InvalidGeometry, got {other:?}"),
        }
    }

    #[test]
    fn accepts_tight_rgba() {
        let g = PixelGeometry::checked(4, 2, 16, 4, 32).unwrap();
        assert_eq!(
            g,
            PixelGeometry {
                width: 4,
                height: 2,
                stride: 16
            }
        );
        assert_eq!(g.required_len(4), 32);
    }

    #[test]
    fn accepts_padded_stride_without_trailing_padding() {
        // Last row does not need its padding.
        let g = PixelGeometry::checked(3, 3, 16, 4, 16 * 2 + 12).unwrap();
        assert_eq!(g.required_len(4), 44);
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        assert_eq!(
            reason(PixelGeometry::checked(0, 3, 3, 1, 9).unwrap_err()),
            "width and height must be positive"
        );
        assert_eq!(
            reason(PixelGeometry::checked(3, -1, 3, 1, 9).unwrap_err()),
            "width and height must be positive"
        );
    }

    #[test]
    fn rejects_short_stride_and_buffer() {
        assert_eq!(
            reason(PixelGeometry::checked(4, 2, 15, 4, 64).unwrap_err()),
            "stride shorter than one row"
        );
        assert_eq!(
            reason(PixelGeometry::checked(4, 2, 16, 4, 31).unwrap_err()),
            "buffer shorter than geometry"
        );
        assert_eq!(
            reason(PixelGeometry::checked(3, 3, -1, 1, 9).unwrap_err()),
            "stride shorter than one row"
        );
    }

    #[test]
    fn rejects_values_beyond_c_int() {
        assert_eq!(
            reason(PixelGeometry::checked(1 << 40, 1, 1 << 42, 4, 0).unwrap_err()),
            "dimension out of range"
        );
    }

    #[test]
    fn chroma_dimensions_round_up() {
        let g = PixelGeometry::checked(3, 3, 3, 1, 9).unwrap();
        assert_eq!(g.chroma_dimensions(), (2, 2));
        let g = PixelGeometry::checked(4, 1, 4, 1, 4).unwrap();
        assert_eq!(g.chroma_dimensions(), (2, 1));
    }
}
