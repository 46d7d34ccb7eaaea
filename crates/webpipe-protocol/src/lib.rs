//! JSON header lines for the webpipe request/response protocol.
//!
//! Every request is one JSON line followed by one blob frame; every response
//! is one JSON line optionally followed by one blob frame. This crate models
//! the lines only:
//!
//! - [`request`]: lenient request decoding (never fails the stream)
//! - [`response`]: structured response encoding with proper escaping
//! - [`message`]: the shared data model and bounded text fields

pub mod error;
pub mod message;
pub mod request;
pub mod response;

pub use error::{ProtocolError, Result};
pub use message::{
    bound_field, ImageOptions, Request, RequestHeader, Response, ResponseHeader,
    MAX_FIELD_CHARS, PROTOCOL_VERSION,
};
pub use request::{parse_request, try_parse_request};
pub use response::{format_response, parse_response};
