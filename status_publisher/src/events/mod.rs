//! Build lifecycle events raised by the build server.
//!
//! Each event arrives exactly once per real occurrence and is handled
//! by a publisher before the caller moves on.

pub mod lifecycle;
