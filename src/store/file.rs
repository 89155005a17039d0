//! File Store - durable message store for one session
//!
//! Five files per session, all named after the session's filename prefix:
//!
//! ```text
//! <prefix>.body           raw payloads, appended back to back
//! <prefix>.header         "seq,offset,length\n" per saved message
//! <prefix>.session        RFC 3339 creation time of the current epoch
//! <prefix>.senderseqnums  next outbound seq, 19-digit zero padded
//! <prefix>.targetseqnums  next inbound seq, 19-digit zero padded
//! ```
//!
//! Every mutation goes to disk under one mutex before the in-memory cache is
//! updated. Reads of the counters and creation time only touch the cache.

use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::types::{HeaderEntry, SessionId};
use crate::utils::fs::{open_or_create, overwrite, read_optional, remove_if_exists, sync_file};
use crate::utils::time::{decode_timestamp, encode_timestamp};

use super::config::{FileStoreConfig, StoreSettings};
use super::counter::{check_seq_num, next_seq_num, parse_seq_num, write_seq_num};
use super::error::{StoreError, StoreResult};
use super::memory::MemoryStore;
use super::paths::StorePaths;
use super::replay::ReplayScan;
use super::traits::{MessageStore, MessageStoreFactory, MessageVisitor};

/// Open handles to the five store files
#[derive(Debug)]
struct StoreFiles {
    body: File,
    header: File,
    session: File,
    sender_seq_nums: File,
    target_seq_nums: File,
}

impl StoreFiles {
    fn open(paths: &StorePaths) -> StoreResult<Self> {
        Ok(Self {
            body: open_or_create(&paths.body)?,
            header: open_or_create(&paths.header)?,
            session: open_or_create(&paths.session)?,
            sender_seq_nums: open_or_create(&paths.sender_seq_nums)?,
            target_seq_nums: open_or_create(&paths.target_seq_nums)?,
        })
    }

    /// Sync every file, reporting the first failure
    fn sync_all(&self, paths: &StorePaths) -> StoreResult<()> {
        let mut first_error = None;
        for (file, path) in [
            (&self.body, &paths.body),
            (&self.header, &paths.header),
            (&self.session, &paths.session),
            (&self.sender_seq_nums, &paths.sender_seq_nums),
            (&self.target_seq_nums, &paths.target_seq_nums),
        ] {
            if let Err(e) = sync_file(file, path) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Which of the two counters an operation targets
#[derive(Debug, Clone, Copy)]
enum Counter {
    Sender,
    Target,
}

/// File-backed [`MessageStore`]
#[derive(Debug)]
pub struct FileStore {
    session_id: SessionId,
    config: FileStoreConfig,
    paths: StorePaths,
    cache: MemoryStore,
    files: Mutex<Option<StoreFiles>>,
}

impl FileStore {
    /// Open the store for `session_id`, creating the directory and files as
    /// needed and recovering any state already on disk.
    pub fn open(session_id: SessionId, config: FileStoreConfig) -> StoreResult<Self> {
        fs::create_dir_all(&config.path).map_err(|source| StoreError::CreateDir {
            path: config.path.clone(),
            source,
        })?;

        let paths = StorePaths::new(&config.path, &session_id);
        let store = Self {
            session_id,
            config,
            paths,
            cache: MemoryStore::new(),
            files: Mutex::new(None),
        };
        store.refresh()?;

        Ok(store)
    }

    /// Get the session this store belongs to
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Get the store configuration
    pub fn config(&self) -> &FileStoreConfig {
        &self.config
    }

    /// Get the paths of the five store files
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Whether the file handles are held (false after `close`)
    pub fn is_open(&self) -> bool {
        self.files.lock().is_some()
    }

    /// Load creation time and counters from disk into the cache.
    ///
    /// Missing or unparseable files leave the cache at its fresh values.
    /// Returns whether the creation time was recovered.
    fn populate_cache(&self) -> StoreResult<bool> {
        let creation_time = read_optional(&self.paths.session)
            .as_deref()
            .and_then(decode_timestamp);
        let recovered = match creation_time {
            Some(creation_time) => {
                self.cache.set_creation_time(creation_time);
                true
            }
            None => {
                debug!(session = %self.session_id, "no creation time on disk, starting new epoch");
                false
            }
        };

        for counter in [Counter::Sender, Counter::Target] {
            let path = self.counter_path(counter);
            match read_optional(path).as_deref().and_then(parse_seq_num) {
                Some(seq_num) => self.set_cached(counter, seq_num)?,
                None => debug!(path = %path.display(), "no sequence number on disk"),
            }
        }

        Ok(recovered)
    }

    fn counter_path(&self, counter: Counter) -> &std::path::Path {
        match counter {
            Counter::Sender => &self.paths.sender_seq_nums,
            Counter::Target => &self.paths.target_seq_nums,
        }
    }

    fn cached(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Sender => self.cache.next_sender_msg_seq_num(),
            Counter::Target => self.cache.next_target_msg_seq_num(),
        }
    }

    fn set_cached(&self, counter: Counter, seq_num: u64) -> StoreResult<()> {
        match counter {
            Counter::Sender => self.cache.set_next_sender_msg_seq_num(seq_num),
            Counter::Target => self.cache.set_next_target_msg_seq_num(seq_num),
        }
    }

    fn write_counter(&self, files: &mut StoreFiles, counter: Counter, seq_num: u64) -> StoreResult<()> {
        let file = match counter {
            Counter::Sender => &mut files.sender_seq_nums,
            Counter::Target => &mut files.target_seq_nums,
        };
        write_seq_num(file, self.counter_path(counter), seq_num, self.config.sync)
    }

    /// Run `f` with the file handles locked
    fn with_files<T>(&self, f: impl FnOnce(&mut StoreFiles) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.files.lock();
        let files = guard.as_mut().ok_or(StoreError::Closed)?;
        f(files)
    }

    /// Persist then cache a counter value
    fn set_counter(&self, counter: Counter, next: u64) -> StoreResult<()> {
        let next = check_seq_num(next)?;
        self.with_files(|files| {
            self.write_counter(files, counter, next)?;
            self.set_cached(counter, next)
        })
    }

    fn incr_counter(&self, counter: Counter) -> StoreResult<()> {
        self.with_files(|files| {
            // Checked before the file is touched so disk and cache stay equal
            let next = next_seq_num(self.cached(counter))?;
            self.write_counter(files, counter, next)?;
            self.set_cached(counter, next)
        })
    }

    fn sync_body_and_header(&self, files: &StoreFiles) -> StoreResult<()> {
        sync_file(&files.body, &self.paths.body)?;
        sync_file(&files.header, &self.paths.header)
    }
}

impl MessageStore for FileStore {
    fn next_sender_msg_seq_num(&self) -> u64 {
        self.cache.next_sender_msg_seq_num()
    }

    fn next_target_msg_seq_num(&self) -> u64 {
        self.cache.next_target_msg_seq_num()
    }

    fn set_next_sender_msg_seq_num(&self, next: u64) -> StoreResult<()> {
        self.set_counter(Counter::Sender, next)
    }

    fn set_next_target_msg_seq_num(&self, next: u64) -> StoreResult<()> {
        self.set_counter(Counter::Target, next)
    }

    /// Serialized against other store operations only; callers racing each
    /// other must order their increments themselves.
    fn incr_next_sender_msg_seq_num(&self) -> StoreResult<()> {
        self.incr_counter(Counter::Sender)
    }

    fn incr_next_target_msg_seq_num(&self) -> StoreResult<()> {
        self.incr_counter(Counter::Target)
    }

    fn creation_time(&self) -> DateTime<Utc> {
        self.cache.creation_time()
    }

    /// No-op: the creation time only changes through [`reset`](MessageStore::reset).
    fn set_creation_time(&self, _creation_time: DateTime<Utc>) {}

    fn save_message(&self, seq_num: u64, msg: &[u8]) -> StoreResult<()> {
        self.with_files(|files| {
            let offset = files
                .body
                .seek(SeekFrom::End(0))
                .map_err(|source| StoreError::io("seeking to end of", &self.paths.body, source))?;
            files
                .header
                .seek(SeekFrom::End(0))
                .map_err(|source| StoreError::io("seeking to end of", &self.paths.header, source))?;

            let entry = HeaderEntry::new(seq_num, offset, msg.len() as u64);
            files
                .header
                .write_all(entry.to_line().as_bytes())
                .map_err(|source| StoreError::io("writing to", &self.paths.header, source))?;
            files
                .body
                .write_all(msg)
                .map_err(|source| StoreError::io("writing to", &self.paths.body, source))?;

            if self.config.sync {
                self.sync_body_and_header(files)?;
            }

            trace!(session = %self.session_id, seq_num, offset, len = msg.len(), "saved message");
            Ok(())
        })
    }

    fn iterate_messages(
        &self,
        begin_seq_num: u64,
        end_seq_num: u64,
        visit: &mut MessageVisitor<'_>,
    ) -> StoreResult<()> {
        let header_len = self.with_files(|files| {
            self.sync_body_and_header(files)?;
            files
                .header
                .metadata()
                .map(|m| m.len())
                .map_err(|source| StoreError::io("reading metadata of", &self.paths.header, source))
        })?;

        ReplayScan {
            paths: &self.paths,
            header_len,
            begin_seq_num,
            end_seq_num,
            strict: self.config.strict_replay,
        }
        .run(visit)
    }

    /// Close, reload the cache from disk and reopen every file.
    fn refresh(&self) -> StoreResult<()> {
        self.cache.reset()?;
        self.close()?;

        let creation_time_recovered = self.populate_cache()?;
        let mut files = StoreFiles::open(&self.paths)?;

        if !creation_time_recovered {
            let encoded = encode_timestamp(&self.cache.creation_time());
            overwrite(&mut files.session, &self.paths.session, encoded.as_bytes(), self.config.sync)?;
        }

        // Re-assert both counters; this also primes the files of a new session
        for counter in [Counter::Sender, Counter::Target] {
            self.write_counter(&mut files, counter, self.cached(counter))?;
        }

        *self.files.lock() = Some(files);

        debug!(
            session = %self.session_id,
            dir = %self.config.path.display(),
            next_sender = self.next_sender_msg_seq_num(),
            next_target = self.next_target_msg_seq_num(),
            creation_time = %encode_timestamp(&self.creation_time()),
            recovered = creation_time_recovered,
            "store refreshed"
        );
        Ok(())
    }

    /// Delete every store file and start a new epoch.
    fn reset(&self) -> StoreResult<()> {
        info!(session = %self.session_id, "resetting store");

        self.cache.reset()?;
        self.close()?;
        for (_, path) in self.paths.entries() {
            remove_if_exists(path)?;
        }
        self.refresh()
    }

    /// Sync and release all handles. Safe to call repeatedly.
    fn close(&self) -> StoreResult<()> {
        let Some(files) = self.files.lock().take() else {
            return Ok(());
        };
        files.sync_all(&self.paths)
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(session = %self.session_id, error = %e, "failed to close store");
        }
    }
}

/// Creates [`FileStore`]s from [`StoreSettings`]
#[derive(Debug, Clone, Default)]
pub struct FileStoreFactory {
    settings: StoreSettings,
}

impl FileStoreFactory {
    pub fn new(settings: StoreSettings) -> Self {
        Self { settings }
    }

    /// Factory that opens every session with the same config
    pub fn with_config(config: FileStoreConfig) -> Self {
        Self::new(StoreSettings {
            default: config,
            dynamic_sessions: true,
            sessions: Vec::new(),
        })
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Config used for `session_id`.
    ///
    /// Sessions without an explicit entry fall back to the default config
    /// only when dynamic sessions are enabled.
    pub fn config_for(&self, session_id: &SessionId) -> StoreResult<&FileStoreConfig> {
        if let Some(entry) = self.settings.sessions.iter().find(|s| &s.session == session_id) {
            return Ok(&entry.store);
        }
        if self.settings.dynamic_sessions {
            return Ok(&self.settings.default);
        }
        Err(StoreError::UnknownSession(session_id.clone()))
    }

    pub fn open(&self, session_id: &SessionId) -> StoreResult<FileStore> {
        let config = self.config_for(session_id)?.clone();
        FileStore::open(session_id.clone(), config)
    }
}

impl MessageStoreFactory for FileStoreFactory {
    fn create(&self, session_id: &SessionId) -> StoreResult<Box<dyn MessageStore>> {
        Ok(Box::new(self.open(session_id)?))
    }
}
