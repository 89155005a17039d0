//! seqstore
//!
//! Durable persistence for sequence-numbered sessions (FIX-style): every
//! outbound message is logged for replay, and the next sender/target sequence
//! numbers survive restarts.
//!
//! # Features
//!
//! - **Append-only log**: payloads in `.body`, `seq,offset,length` index in `.header`
//! - **Fixed-width counters**: next sender/target sequence numbers rewritten in place
//! - **Epochs**: creation time recorded once per lifetime, renewed by `reset`
//! - **Replay**: ranges read on separate handles so writers are not blocked
//! - **Optional fsync** after every durable write (on by default)
//!
//! # Modules
//!
//! - `store`: `FileStore`, `MemoryStore`, factories, config and errors
//! - `types`: `SessionId` and the index line format
//! - `utils`: timestamp encoding and file helpers
//!
//! # Example
//!
//! ```no_run
//! use seqstore::{FileStore, FileStoreConfig, MessageStore, SessionId};
//!
//! fn main() -> seqstore::StoreResult<()> {
//!     let session = SessionId::new("FIX.4.4", "SENDER", "TARGET");
//!     let store = FileStore::open(session, FileStoreConfig::new("data/store"))?;
//!
//!     let seq = store.next_sender_msg_seq_num();
//!     store.save_message_and_incr_next_sender_msg_seq_num(seq, b"8=FIX.4.4\x01...")?;
//!
//!     for msg in store.get_messages(1, seq)? {
//!         println!("{} bytes", msg.len());
//!     }
//!     store.close()
//! }
//! ```

pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use store::{
    FileStore, FileStoreConfig, FileStoreFactory, MemoryStore, MemoryStoreFactory, MessageStore,
    MessageStoreFactory, StoreError, StoreResult, StoreSettings,
};
pub use types::{HeaderEntry, SessionId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
