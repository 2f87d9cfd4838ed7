//! HTTP/1.x handling for the forwarding proxy.
//!
//! The proxy never builds a full request model. It parses just enough of the
//! client's bytes to find the upstream, rewrites the buffer in place, and
//! relays everything else untouched.
//!
//! - **`request`**: the bounded request buffer and the parsed request line
//! - **`parser`**: request line and Host header extraction
//! - **`rewriter`**: `Connection: close` injection and absolute-target rewrite
//! - **`response`**: the synthetic error responses the proxy sends itself
//! - **`writer`**: full-buffer writes and response serialization

pub mod parser;
pub mod request;
pub mod response;
pub mod rewriter;
pub mod writer;
