//! Courier - forwarding HTTP proxy
//!
//! Reads one request per client connection, forwards it to the origin named
//! by its Host header with `Connection: close` added, and streams the
//! response back byte for byte.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod proxy;
pub mod server;
