//! Request handling for the webpipe codec gateway.
//!
//! The gateway reads requests from one byte stream and answers on another.
//! Each request is a JSON line followed by a blob frame; each reply is a JSON
//! line optionally followed by a blob frame. [`Session`] runs that loop on the
//! server side, [`Dispatcher`] executes a single request against an
//! [`ImageCodec`](webpipe_codec::ImageCodec), and [`Client`] / [`ChildClient`]
//! drive a gateway from the host side.

pub mod client;
pub mod dispatch;
pub mod driver;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ChildClient, Client, Reply};
pub use dispatch::{
    Command, Dispatcher, Outcome, ERR_CONFIG_INIT, ERR_DECODE, ERR_ENCODE_GRAY, ERR_ENCODE_NRGBA,
    ERR_GET_INFO,
};
pub use driver::{
    Session, SessionConfig, SessionStats, ERR_BAD_FRAME, ERR_BLOB_ALLOC, ERR_BLOB_TOO_LARGE,
};
pub use error::{ClientError, ClientResult, Result, SessionError};
