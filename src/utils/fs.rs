//! File helpers shared by the store
//!
//! Every helper attaches the operation and path to its error so callers can
//! return it as-is.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Seek, SeekFrom, Write};
use std::path::Path;

use crate::store::{StoreError, StoreResult};

/// Permission bits for store files (owner and group read/write)
pub const STORE_FILE_MODE: u32 = 0o660;

/// Open `path` for reading and writing, creating it if absent
pub fn open_or_create(path: &Path) -> StoreResult<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(STORE_FILE_MODE);
    }

    options
        .open(path)
        .map_err(|source| StoreError::io("opening or creating", path, source))
}

/// Open an existing file read-only; `Ok(None)` when it does not exist
pub fn open_read_only(path: &Path) -> StoreResult<Option<File>> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::io("opening for read", path, source)),
    }
}

/// Read a whole file; `None` on any failure, missing file included
pub fn read_optional(path: &Path) -> Option<Vec<u8>> {
    fs::read(path).ok()
}

/// Delete `path`; a missing file is not an error
pub fn remove_if_exists(path: &Path) -> StoreResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::io("removing", path, source)),
    }
}

/// Flush a handle to disk before it is dropped
pub fn sync_file(file: &File, path: &Path) -> StoreResult<()> {
    file.sync_all()
        .map_err(|source| StoreError::io("syncing", path, source))
}

/// Replace the whole content of an open file: rewind, write, truncate to
/// the written length, then optionally fsync
pub fn overwrite(file: &mut File, path: &Path, content: &[u8], sync: bool) -> StoreResult<()> {
    file.seek(SeekFrom::Start(0))
        .map_err(|source| StoreError::io("rewinding", path, source))?;
    file.write_all(content)
        .map_err(|source| StoreError::io("writing to", path, source))?;
    file.set_len(content.len() as u64)
        .map_err(|source| StoreError::io("truncating", path, source))?;
    if sync {
        sync_file(file, path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_or_create_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("new.body");

        let file = open_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(file.metadata().unwrap().len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_open_or_create_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mode.header");
        open_or_create(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        // umask may only clear bits
        assert_eq!(mode & !STORE_FILE_MODE, 0);
    }

    #[test]
    fn test_open_or_create_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing_dir").join("x.body");

        let err = open_or_create(&path).unwrap_err();
        assert!(err.to_string().contains("x.body"));
    }

    #[test]
    fn test_remove_if_exists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.session");

        remove_if_exists(&path).unwrap();

        fs::write(&path, "x").unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("x.session");
        fs::write(&path, "a much longer previous content").unwrap();

        let mut file = open_or_create(&path).unwrap();
        overwrite(&mut file, &path, b"short", true).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_open_read_only_missing() {
        let temp_dir = TempDir::new().unwrap();
        assert!(open_read_only(&temp_dir.path().join("nope")).unwrap().is_none());
    }
}
