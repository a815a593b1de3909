//! Transport layer for checkplus.
//!
//! Provides an HTTP front over [`SessionCodec`](crate::SessionCodec) via axum.

pub mod http;

pub use http::{ServerConfig, serve, serve_on};
