use std::fmt;

/// Reasons libwebp gives for a failed encode.
///
/// Built from the encoder's numeric error code with [`EncodeErrorKind::from_code`];
/// codes outside the known range are kept as [`EncodeErrorKind::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeErrorKind {
    OutOfMemory,
    BitstreamOutOfMemory,
    NullParameter,
    InvalidConfiguration,
    BadDimension,
    Partition0Overflow,
    PartitionOverflow,
    BadWrite,
    FileTooBig,
    UserAbort,
    Unknown(i32),
}

impl EncodeErrorKind {
    /// Map a libwebp `VP8_ENC_ERROR_*` code.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::OutOfMemory,
            2 => Self::BitstreamOutOfMemory,
            3 => Self::NullParameter,
            4 => Self::InvalidConfiguration,
            5 => Self::BadDimension,
            6 => Self::Partition0Overflow,
            7 => Self::PartitionOverflow,
            8 => Self::BadWrite,
            9 => Self::FileTooBig,
            10 => Self::UserAbort,
            other => Self::Unknown(other),
        }
    }

    /// The libwebp code this kind was built from.
    pub fn code(self) -> i32 {
        match self {
            Self::OutOfMemory => 1,
            Self::BitstreamOutOfMemory => 2,
            Self::NullParameter => 3,
            Self::InvalidConfiguration => 4,
            Self::BadDimension => 5,
            Self::Partition0Overflow => 6,
            Self::PartitionOverflow => 7,
            Self::BadWrite => 8,
            Self::FileTooBig => 9,
            Self::UserAbort => 10,
            Self::Unknown(code) => code,
        }
    }
}

impl fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("OUT_OF_MEMORY: Out of memory allocating objects"),
            Self::BitstreamOutOfMemory => {
                f.write_str("BITSTREAM_OUT_OF_MEMORY: Out of memory re-allocating byte buffer")
            }
            Self::NullParameter => f.write_str("NULL_PARAMETER: NULL parameter passed to function"),
            Self::InvalidConfiguration => {
                f.write_str("INVALID_CONFIGURATION: configuration is invalid")
            }
            Self::BadDimension => f.write_str(
                "BAD_DIMENSION: Bad picture dimension. Maximum width and height allowed is 16383 pixels.",
            ),
            Self::Partition0Overflow => {
                f.write_str("PARTITION0_OVERFLOW: Partition #0 is too big to fit 512k")
            }
            Self::PartitionOverflow => {
                f.write_str("PARTITION_OVERFLOW: Partition is too big to fit 16M")
            }
            Self::BadWrite => f.write_str("BAD_WRITE: Picture writer returned an I/O error"),
            Self::FileTooBig => f.write_str("FILE_TOO_BIG: File would be too big to fit in 4G"),
            Self::UserAbort => f.write_str("USER_ABORT: encoding abort requested by user"),
            Self::Unknown(code) => write!(f, "unknown encoder error code {code}"),
        }
    }
}

/// Errors from probing, decoding or encoding an image.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The input is not a WebP bitstream the decoder recognizes.
    #[error("failed to read WebP header from {len} bytes")]
    Probe { len: usize },

    /// The header was valid but the bitstream failed to decode.
    #[error("failed to decode {width}x{height} WebP image from {len} bytes")]
    Decode { width: u32, height: u32, len: usize },

    /// The encoder configuration could not be initialized.
    #[error("encoder configuration could not be initialized")]
    ConfigInit,

    /// The picture structure could not be initialized.
    #[error("encoder picture could not be initialized")]
    PictureInit,

    /// The pixel geometry does not describe the supplied buffer.
    #[error(
        "invalid pixel geometry {width}x{height} stride {stride} for {len} bytes: {reason}"
    )]
    InvalidGeometry {
        width: i64,
        height: i64,
        stride: i64,
        len: usize,
        reason: &'static str,
    },

    /// libwebp rejected the picture.
    #[error("WebP encode failed: {kind}")]
    Encode { kind: EncodeErrorKind },

    /// A working buffer could not be allocated.
    #[error("cannot allocate {size} bytes for {what}")]
    Allocation { size: usize, what: &'static str },
}

pub type Result<T> = std::result::Result<T, CodecError>;
