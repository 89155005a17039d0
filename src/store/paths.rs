//! Locations of the five files backing one session

use std::path::{Path, PathBuf};

use crate::types::SessionId;

pub const BODY_SUFFIX: &str = "body";
pub const HEADER_SUFFIX: &str = "header";
pub const SESSION_SUFFIX: &str = "session";
pub const SENDER_SEQ_NUMS_SUFFIX: &str = "senderseqnums";
pub const TARGET_SEQ_NUMS_SUFFIX: &str = "targetseqnums";

/// Paths of a session's store files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Concatenated message payloads
    pub body: PathBuf,
    /// `seq,offset,length` index into `body`
    pub header: PathBuf,
    /// Creation time of the current epoch
    pub session: PathBuf,
    pub sender_seq_nums: PathBuf,
    pub target_seq_nums: PathBuf,
}

impl StorePaths {
    pub fn new(dir: &Path, session_id: &SessionId) -> Self {
        let prefix = session_id.filename_prefix();
        let file = |suffix: &str| dir.join(format!("{}.{}", prefix, suffix));

        Self {
            body: file(BODY_SUFFIX),
            header: file(HEADER_SUFFIX),
            session: file(SESSION_SUFFIX),
            sender_seq_nums: file(SENDER_SEQ_NUMS_SUFFIX),
            target_seq_nums: file(TARGET_SEQ_NUMS_SUFFIX),
        }
    }

    /// All five files with their suffix
    pub fn entries(&self) -> [(&'static str, &Path); 5] {
        [
            (BODY_SUFFIX, &self.body),
            (HEADER_SUFFIX, &self.header),
            (SESSION_SUFFIX, &self.session),
            (SENDER_SEQ_NUMS_SUFFIX, &self.sender_seq_nums),
            (TARGET_SEQ_NUMS_SUFFIX, &self.target_seq_nums),
        ]
    }
}
