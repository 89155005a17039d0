//! Read side of the message log
//!
//! Replay runs on its own read-only handles so writers are not blocked while
//! a range is scanned. The caller passes the header length observed under the
//! store lock; lines written after that point are not visited.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use tracing::{debug, warn};

use crate::types::HeaderEntry;
use crate::utils::fs::open_read_only;

use super::error::{StoreError, StoreResult};
use super::paths::StorePaths;
use super::traits::MessageVisitor;

/// Parameters for one replay pass
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReplayScan<'a> {
    pub paths: &'a StorePaths,
    /// Bytes of the header file to consider
    pub header_len: u64,
    pub begin_seq_num: u64,
    pub end_seq_num: u64,
    /// Malformed lines before the last one are errors instead of end-of-log
    pub strict: bool,
}

impl ReplayScan<'_> {
    pub fn run(&self, visit: &mut MessageVisitor<'_>) -> StoreResult<()> {
        let header_path = &self.paths.header;
        let body_path = &self.paths.body;

        let (Some(header_file), Some(mut body_file)) =
            (open_read_only(header_path)?, open_read_only(body_path)?)
        else {
            debug!(path = %header_path.display(), "message log missing, nothing to replay");
            return Ok(());
        };
        let body_len = body_file
            .metadata()
            .map_err(|source| StoreError::io("reading metadata of", body_path, source))?
            .len();

        let mut reader = BufReader::new(header_file.take(self.header_len));
        let mut line = Vec::new();
        let mut line_number = 0usize;

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|source| StoreError::io("reading from", header_path, source))?;
            if read == 0 {
                break;
            }
            line_number += 1;

            let is_last = reader
                .fill_buf()
                .map_err(|source| StoreError::io("reading from", header_path, source))?
                .is_empty();

            let Some(content) = line.strip_suffix(b"\n") else {
                debug!(
                    path = %header_path.display(),
                    line = line_number,
                    "ignoring incomplete trailing header line"
                );
                break;
            };

            let Some(entry) = HeaderEntry::parse(content) else {
                if is_last {
                    debug!(
                        path = %header_path.display(),
                        line = line_number,
                        "ignoring malformed trailing header line"
                    );
                } else if self.strict {
                    return Err(StoreError::CorruptHeader {
                        path: header_path.clone(),
                        line: line_number,
                        content: String::from_utf8_lossy(content).into_owned(),
                    });
                } else {
                    warn!(
                        path = %header_path.display(),
                        line = line_number,
                        "malformed header line, treating it as the end of the log"
                    );
                }
                break;
            };

            if entry.seq_num > self.end_seq_num {
                break;
            }
            if entry.seq_num < self.begin_seq_num {
                continue;
            }

            if !entry.end().is_some_and(|end| end <= body_len) {
                if is_last {
                    debug!(
                        path = %body_path.display(),
                        seq_num = entry.seq_num,
                        "last header line points past the body, ignoring torn write"
                    );
                    break;
                }
                return Err(StoreError::DanglingEntry {
                    path: header_path.clone(),
                    line: line_number,
                    offset: entry.offset,
                    length: entry.length,
                    body_len,
                });
            }

            let msg = read_body(&mut body_file, &entry, body_path)?;
            visit(&msg)?;
        }

        Ok(())
    }
}

fn read_body(
    body_file: &mut File,
    entry: &HeaderEntry,
    body_path: &std::path::Path,
) -> StoreResult<Vec<u8>> {
    // Bounded by the body length checked by the caller
    let mut msg = vec![0u8; entry.length as usize];
    body_file
        .seek(SeekFrom::Start(entry.offset))
        .map_err(|source| StoreError::io("seeking in", body_path, source))?;
    body_file
        .read_exact(&mut msg)
        .map_err(|source| StoreError::io("reading from", body_path, source))?;
    Ok(msg)
}
