//! espmon-host library
//!
//! Samples CPU and GPU sensors into a metric store and serves them to a
//! serial-attached display. Exposed as a library for the binaries and tests.

pub mod core;
pub mod hardware;
pub mod protocol;
