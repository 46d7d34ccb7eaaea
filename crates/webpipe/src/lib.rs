//! WebP codec gateway.
//!
//! A long-running process reads requests on stdin and answers on stdout.
//! Requests are a JSON header line followed by a `TAK35EM1` blob frame;
//! responses are a JSON line optionally followed by a blob frame.
//!
//! # Crate Structure
//!
//! - [`frame`]: blob frames and line reading over one buffered stream
//! - [`protocol`]: request and response JSON lines
//! - [`codec`]: the libwebp-backed image codec
//! - [`session`]: dispatcher, stream driver and host-side client

/// Re-export frame types.
pub mod frame {
    pub use webpipe_frame::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use webpipe_protocol::*;
}

/// Re-export codec types.
pub mod codec {
    pub use webpipe_codec::*;
}

/// Re-export session types.
pub mod session {
    pub use webpipe_session::*;
}
