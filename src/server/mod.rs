//! Client-facing side: the accept loop and per-connection sessions.
//!
//! ```text
//!   Accepted ──read──▶ Received ──parse──▶ Parsed ──resolve──▶ Resolved
//!                                                                  │
//!        Closed ◀──relay── Forwarded ◀──write── Rewritten ◀──connect/rewrite
//! ```
//!
//! Any step may fail; the session then answers with the error's synthetic
//! response (if it has one) and closes both connections.

pub mod listener;
pub mod session;
pub mod shutdown;

pub use session::{Session, SessionOutcome};
pub use shutdown::Shutdown;
