//! Utility functions and helpers
//!
//! Timestamp encoding and file helpers used by the store.

pub mod fs;
pub mod time;

pub use time::{decode_timestamp, encode_timestamp, now};
