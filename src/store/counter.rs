//! Fixed-width sequence number files

use std::fs::File;
use std::path::Path;

use crate::utils::fs::overwrite;

use super::error::{StoreError, StoreResult};

/// Digits written for every counter value
pub const SEQ_NUM_WIDTH: usize = 19;

/// Reject 0, which is never a valid next sequence number
pub fn check_seq_num(next: u64) -> StoreResult<u64> {
    if next == 0 {
        return Err(StoreError::InvalidSeqNum(next));
    }
    Ok(next)
}

/// Successor of `current`, or `SeqNumOverflow` at `u64::MAX`
pub fn next_seq_num(current: u64) -> StoreResult<u64> {
    current
        .checked_add(1)
        .ok_or(StoreError::SeqNumOverflow(current))
}

/// Zero-padded decimal form, no newline
pub fn format_seq_num(seq_num: u64) -> String {
    format!("{:0width$}", seq_num, width = SEQ_NUM_WIDTH)
}

/// Parse a counter file's content; `None` when absent, malformed or zero
pub fn parse_seq_num(bytes: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(bytes).ok()?;
    let seq_num: u64 = text.trim_matches(['\r', '\n']).parse().ok()?;
    (seq_num > 0).then_some(seq_num)
}

/// Overwrite a counter file in place with `seq_num`
pub fn write_seq_num(file: &mut File, path: &Path, seq_num: u64, sync: bool) -> StoreResult<()> {
    overwrite(file, path, format_seq_num(seq_num).as_bytes(), sync)
}
