//! Message Store Module
//!
//! Durable storage for a sequence-numbered session:
//! - `FileStore`: five files per session, recovered on open and refresh
//! - `MemoryStore`: in-memory store, also the fast-path cache of `FileStore`
//! - `MessageStore` / `MessageStoreFactory`: the contract the session layer uses
//!
//! # Architecture
//!
//! ```text
//! Write Path (under the store mutex):
//! ┌──────────────┐    ┌───────────────┐    ┌─────────────┐    ┌────────────┐
//! │ save_message │───►│ append header │───►│ append body │───►│ fsync both │
//! └──────────────┘    │ seq,off,len\n │    │ raw payload │    │ (if sync)  │
//!                     └───────────────┘    └─────────────┘    └────────────┘
//!
//! Replay Path (own read-only handles):
//! ┌──────────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │ sync + note header   │───►│ scan header from │───►│ read body range │───► visit
//! │ length (under mutex) │    │ start, filter    │    │ at offset       │
//! └──────────────────────┘    └──────────────────┘    └─────────────────┘
//!
//! Recovery (open / refresh):
//! ┌──────────────┐    ┌──────────────┐    ┌─────────────────┐
//! │ read session │───►│ read counter │───►│ reopen files,   │───► Ready!
//! │ + counters   │    │ into cache   │    │ re-assert state │
//! └──────────────┘    └──────────────┘    └─────────────────┘
//! ```

mod config;
mod counter;
mod error;
mod file;
mod memory;
mod paths;
mod replay;
mod traits;

pub use config::{
    parse_bool, FileStoreConfig, SessionSettings, StoreSettings, ENV_PATH, ENV_STRICT_REPLAY,
    ENV_SYNC,
};
pub use counter::{check_seq_num, format_seq_num, next_seq_num, parse_seq_num, SEQ_NUM_WIDTH};
pub use error::{StoreError, StoreResult};
pub use file::{FileStore, FileStoreFactory};
pub use memory::{MemoryStore, MemoryStoreFactory};
pub use paths::StorePaths;
pub use traits::{MessageStore, MessageStoreFactory, MessageVisitor};
