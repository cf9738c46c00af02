use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::cancel::Cancellation;
use crate::error::{Error, Result};

pub fn create_dir_all<P: AsRef<Path>>(dest_path: P) -> Result<()> {
    let dest_path = dest_path.as_ref();
    fs::create_dir_all(dest_path).map_err(Error::IoError)
}

/// Reads a file if it exists.
///
/// # Returns
/// * `Ok(None)` - The file does not exist
/// * `Ok(Some(bytes))` - The raw file content, whatever its encoding
/// * `Err(Error)` - The file exists but could not be read
pub fn read_existing<P: AsRef<Path>>(path: P) -> Result<Option<Vec<u8>>> {
    match fs::read(path.as_ref()) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::IoError(e)),
    }
}

/// Writes `content` to `dest_path` so readers observe either the old or the new file.
///
/// The content goes to a temporary file next to the destination which is
/// synced and then renamed over it. If `cancel` fires before the rename the
/// temporary file is removed and the destination is left untouched.
pub fn write_file_atomic<P: AsRef<Path>>(
    content: &str,
    dest_path: P,
    cancel: &Cancellation,
) -> Result<()> {
    let dest_path = dest_path.as_ref();
    let parent = match dest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    apply_target_permissions(&tmp, dest_path)?;
    tmp.as_file().sync_all()?;

    if cancel.is_cancelled() {
        // Dropping `tmp` deletes it.
        return Err(Error::Cancelled);
    }

    tmp.persist(dest_path).map_err(|e| Error::IoError(e.error))?;
    Ok(())
}

/// Gives the temporary file the destination's permissions, or 0644 for new files.
fn apply_target_permissions(tmp: &NamedTempFile, dest_path: &Path) -> Result<()> {
    match fs::metadata(dest_path) {
        Ok(metadata) => tmp.as_file().set_permissions(metadata.permissions())?,
        Err(e) if e.kind() == ErrorKind::NotFound => apply_default_permissions(tmp)?,
        Err(e) => return Err(Error::IoError(e)),
    }
    Ok(())
}

#[cfg(unix)]
fn apply_default_permissions(tmp: &NamedTempFile) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tmp.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn apply_default_permissions(_tmp: &NamedTempFile) -> Result<()> {
    Ok(())
}

/// Makes a user-supplied path absolute against the current directory.
pub fn absolutize<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_existing_returns_none_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_existing(dir.path().join("missing.rs")).unwrap(), None);
    }

    #[test]
    fn read_existing_accepts_any_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("latin.rs");
        fs::write(&target, b"caf\xe9\n").unwrap();
        assert_eq!(read_existing(&target).unwrap(), Some(b"caf\xe9\n".to_vec()));
    }

    #[test]
    fn atomic_write_creates_parents_and_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/deeper/out.rs");
        let cancel = Cancellation::new();

        write_file_atomic("first", &target, &cancel).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "first");

        write_file_atomic("second", &target, &cancel).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "second");

        let leftovers: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn cancelled_write_leaves_target_and_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.rs");
        fs::write(&target, "original").unwrap();

        let cancel = Cancellation::new();
        cancel.cancel();
        let result = write_file_atomic("replacement", &target, &cancel);

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(fs::read_to_string(&target).unwrap(), "original");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn new_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.rs");
        write_file_atomic("x", &target, &Cancellation::new()).unwrap();
        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
