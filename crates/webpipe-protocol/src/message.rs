use serde::{Deserialize, Serialize};

/// Maximum length of the `command` and `err` text fields, in characters.
pub const MAX_FIELD_CHARS: usize = 255;

/// Protocol version stamped on requests built by this crate.
pub const PROTOCOL_VERSION: i64 = 1;

/// Truncate a text field to [`MAX_FIELD_CHARS`] characters.
///
/// Truncation happens on a character boundary, never inside a multi-byte
/// sequence.
pub fn bound_field(mut value: String) -> String {
    if let Some((cut, _)) = value.char_indices().nth(MAX_FIELD_CHARS) {
        value.truncate(cut);
    }
    value
}

/// Header of a request line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeader {
    pub version: i64,
    /// Correlates the request with its response and output blob.
    pub id: i64,
    pub command: String,
    /// Accepted for symmetry with responses; ignored on input.
    pub err: String,
}

/// Pixel geometry of the blob that accompanies a message.
///
/// Zero in every field means "no image".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    pub width: i64,
    pub height: i64,
    /// Bytes per row.
    pub stride: i64,
}

impl ImageOptions {
    pub fn new(width: i64, height: i64, stride: i64) -> Self {
        Self {
            width,
            height,
            stride,
        }
    }
}

/// One decoded request line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub header: RequestHeader,
    pub options: ImageOptions,
}

impl Request {
    /// Build a request for `command`.
    pub fn new(id: i64, command: impl Into<String>, options: ImageOptions) -> Self {
        Self {
            header: RequestHeader {
                version: PROTOCOL_VERSION,
                id,
                command: bound_field(command.into()),
                err: String::new(),
            },
            options,
        }
    }

    /// The id used to tag blob frames belonging to this request.
    pub fn frame_id(&self) -> u32 {
        self.header.id as u32
    }
}

/// Header of a response line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeader {
    pub version: i64,
    pub id: i64,
    /// Empty on success.
    pub err: String,
}

/// One response line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub header: ResponseHeader,
    pub options: ImageOptions,
}

impl Response {
    /// A successful, header-only response echoing the request's version and id.
    pub fn reply_to(request: &RequestHeader) -> Self {
        Self {
            header: ResponseHeader {
                version: request.version,
                id: request.id,
                err: String::new(),
            },
            options: ImageOptions::default(),
        }
    }

    /// Set the error message, bounded to [`MAX_FIELD_CHARS`].
    pub fn with_error(mut self, err: impl Into<String>) -> Self {
        self.header.err = bound_field(err.into());
        self
    }

    /// Attach image geometry.
    pub fn with_options(mut self, options: ImageOptions) -> Self {
        self.options = options;
        self
    }

    /// True when the response line carries `data.options`.
    pub fn has_image_options(&self) -> bool {
        self.options.width > 0
    }

    pub fn is_error(&self) -> bool {
        !self.header.err.is_empty()
    }

    /// The id used to tag the output blob that follows this response.
    pub fn frame_id(&self) -> u32 {
        self.header.id as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_field_keeps_short_values() {
        assert_eq!(bound_field("decode".to_string()), "decode");
        assert_eq!(bound_field(String::new()), "");
    }

    #[test]
    fn bound_field_truncates_to_limit() {
        let long = "x".repeat(300);
        assert_eq!(bound_field(long).len(), MAX_FIELD_CHARS);

        let exact = "y".repeat(MAX_FIELD_CHARS);
        assert_eq!(bound_field(exact.clone()), exact);
    }

    #[test]
    fn bound_field_respects_char_boundaries() {
        let long = "é".repeat(300);
        let bounded = bound_field(long);
        assert_eq!(bounded.chars().count(), MAX_FIELD_CHARS);
        assert_eq!(bounded.len(), MAX_FIELD_CHARS * 2);
    }

    #[test]
    fn reply_copies_version_and_id() {
        let header = RequestHeader {
            version: 3,
            id: 42,
            command: "decode".to_string(),
            err: "ignored".to_string(),
        };
        let response = Response::reply_to(&header);
        assert_eq!(response.header.version, 3);
        assert_eq!(response.header.id, 42);
        assert!(!response.is_error());
        assert!(!response.has_image_options());
    }

    #[test]
    fn frame_id_wraps_to_u32() {
        let request = Request::new(-1, "config", ImageOptions::default());
        assert_eq!(request.frame_id(), u32::MAX);

        let request = Request::new(1 << 32 | 5, "config", ImageOptions::default());
        assert_eq!(request.frame_id(), 5);
    }
}
