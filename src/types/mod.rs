//! Data types for the message store
//!
//! Session identity and the on-disk index line format.

mod header_entry;
mod session_id;

pub use header_entry::HeaderEntry;
pub use session_id::SessionId;
