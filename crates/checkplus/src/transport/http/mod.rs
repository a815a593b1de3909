//! HTTP transport.

mod pages;
mod routes;
mod server;

pub use routes::{AppState, routes};
pub use server::{ServerConfig, serve, serve_on};
