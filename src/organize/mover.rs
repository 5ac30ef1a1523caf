//! Verified copy-then-delete relocation
//!
//! The source is removed only after every byte has been copied and flushed
//! to the destination. Each failure stage has its own error variant; the
//! post-copy removal failure in particular means the content now exists in
//! two places and callers must not treat it like an ordinary failed move.

use log::warn;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a move did not complete
#[derive(Error, Debug)]
pub enum MoveError {
    /// Source could not be opened; nothing changed
    #[error("couldn't open source file '{}': {source}", .path.display())]
    SourceOpen { path: PathBuf, source: io::Error },

    /// A file already occupies the destination; nothing changed
    #[error("destination '{}' already exists", .path.display())]
    DestinationExists { path: PathBuf },

    /// Destination could not be created; nothing changed
    #[error("couldn't open dest file '{}': {source}", .path.display())]
    DestinationOpen { path: PathBuf, source: io::Error },

    /// Copy failed part-way; source intact, partial destination discarded
    #[error("writing to '{}' failed: {source}", .path.display())]
    Copy { path: PathBuf, source: io::Error },

    /// Copy finished but the source could not be removed
    #[error("copied to '{}' but failed removing original '{}': {source}", .dest.display(), .path.display())]
    SourceRemoval {
        path: PathBuf,
        dest: PathBuf,
        source: io::Error,
    },
}

impl MoveError {
    /// True when the content now exists at both source and destination
    pub fn left_duplicate_on_disk(&self) -> bool {
        matches!(self, MoveError::SourceRemoval { .. })
    }
}

/// Move `source` to `dest` by copying then deleting.
///
/// Never overwrites an existing destination.
pub fn move_file(source: &Path, dest: &Path) -> Result<(), MoveError> {
    let input = File::open(source).map_err(|e| MoveError::SourceOpen {
        path: source.to_path_buf(),
        source: e,
    })?;

    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                MoveError::DestinationExists {
                    path: dest.to_path_buf(),
                }
            } else {
                MoveError::DestinationOpen {
                    path: dest.to_path_buf(),
                    source: e,
                }
            }
        })?;

    if let Err(e) = copy_contents(input, output) {
        discard_partial(dest);
        return Err(MoveError::Copy {
            path: dest.to_path_buf(),
            source: e,
        });
    }

    fs::remove_file(source).map_err(|e| MoveError::SourceRemoval {
        path: source.to_path_buf(),
        dest: dest.to_path_buf(),
        source: e,
    })
}

fn copy_contents(input: File, output: File) -> io::Result<()> {
    let mut reader = BufReader::new(input);
    let mut writer = BufWriter::new(output);
    io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    let output = writer.into_inner().map_err(|e| e.into_error())?;
    output.sync_all()
}

fn discard_partial(dest: &Path) {
    if let Err(e) = fs::remove_file(dest) {
        warn!(
            "Failed to remove partial destination {}: {}",
            dest.display(),
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_success() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in.jpg");
        let dest = temp_dir.path().join("out.jpg");
        fs::write(&source, b"picture bytes").unwrap();

        move_file(&source, &dest).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"picture bytes");
    }

    #[test]
    fn test_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("missing.jpg");
        let dest = temp_dir.path().join("out.jpg");

        let err = move_file(&source, &dest).unwrap_err();

        assert!(matches!(err, MoveError::SourceOpen { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_destination_directory_missing_keeps_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in.mp3");
        let dest = temp_dir.path().join("no-such-dir").join("in.mp3");
        fs::write(&source, b"song").unwrap();

        let err = move_file(&source, &dest).unwrap_err();

        assert!(matches!(err, MoveError::DestinationOpen { .. }));
        assert!(!err.left_duplicate_on_disk());
        assert_eq!(fs::read(&source).unwrap(), b"song");
    }

    #[test]
    fn test_existing_destination_is_not_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in.png");
        let dest = temp_dir.path().join("taken.png");
        fs::write(&source, b"new content").unwrap();
        fs::write(&dest, b"existing content").unwrap();

        let err = move_file(&source, &dest).unwrap_err();

        assert!(matches!(err, MoveError::DestinationExists { .. }));
        assert_eq!(fs::read(&source).unwrap(), b"new content");
        assert_eq!(fs::read(&dest).unwrap(), b"existing content");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_copy_failure_keeps_source_and_discards_partial() {
        let temp_dir = TempDir::new().unwrap();
        // Opening a directory succeeds on Linux but reading it fails
        let source = temp_dir.path().join("not-a-file");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("inner.txt"), b"inner").unwrap();
        let dest = temp_dir.path().join("out.bin");

        let err = move_file(&source, &dest).unwrap_err();

        assert!(matches!(err, MoveError::Copy { .. }));
        assert!(source.is_dir());
        assert_eq!(fs::read(source.join("inner.txt")).unwrap(), b"inner");
        assert!(!dest.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_source_in_read_only_directory_is_removal_error() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let inbox = temp_dir.path().join("inbox");
        fs::create_dir(&inbox).unwrap();
        let source = inbox.join("in.mov");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 253) as u8).collect();
        fs::write(&source, &data).unwrap();
        let dest = temp_dir.path().join("out.mov");
        fs::set_permissions(&inbox, fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores directory write bits; nothing to check then
        if fs::write(inbox.join(".writable-check"), b"").is_ok() {
            fs::set_permissions(&inbox, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = move_file(&source, &dest);
        fs::set_permissions(&inbox, fs::Permissions::from_mode(0o755)).unwrap();

        let err = result.unwrap_err();
        assert!(matches!(err, MoveError::SourceRemoval { .. }));
        assert!(err.left_duplicate_on_disk());
        assert_eq!(fs::read(&source).unwrap(), data);
        assert_eq!(fs::read(&dest).unwrap(), data);
    }

    #[test]
    fn test_source_removal_error_is_distinct() {
        let err = MoveError::SourceRemoval {
            path: PathBuf::from("/in/a.jpg"),
            dest: PathBuf::from("/out/a.jpg"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        assert!(err.left_duplicate_on_disk());
        let message = err.to_string();
        assert!(message.contains("/out/a.jpg"));
        assert!(message.contains("failed removing original"));
    }
}
