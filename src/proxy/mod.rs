//! Forwarding toward the origin server.
//!
//! Resolution of the client's Host header, the upstream connection, and the
//! byte relay that streams the response back.

pub mod relay;
pub mod resolver;
pub mod upstream;

pub use relay::forward_all;
pub use resolver::{Destination, DnsResolver, Resolve};
pub use upstream::{Connect, TcpConnector};
