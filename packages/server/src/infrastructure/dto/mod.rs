//! Data Transfer Objects (DTOs).
//!
//! - `http`: status HTTP API response DTOs
//!
//! The TCP wire format lives in `hiroma_shared::protocol`.

pub mod http;
