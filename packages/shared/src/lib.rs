//! Code shared between the hiroma chat server and its terminal client.
//!
//! - [`protocol`]: wire messages and the length-prefixed frame codec
//! - [`time`]: timestamps and the [`time::Clock`] abstraction
//! - [`logger`]: tracing subscriber setup for the binaries

pub mod logger;
pub mod protocol;
pub mod time;
