//! Transient audio storage
//!
//! Downloaded audio lives in the storage folder only for the duration of
//! playback; the session removes each file after playing it. These
//! helpers exist for the admin surface: inspecting what is currently on
//! disk and purging leftovers from crashed sessions.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extensions treated as downloaded audio
const AUDIO_EXTENSIONS: &[&str] = &["webm", "m4a", "opus", "ogg", "mp3", "aac", "wav", "flac"];

/// Create the storage folder if it does not exist
pub fn ensure_storage_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        info!("Creating storage folder: {}", dir.display());
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// List audio files currently in the storage folder, sorted by name
pub fn list_audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_audio_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Delete all audio files in the storage folder, returning how many were
/// removed
///
/// Non-audio files are left alone.
pub fn purge_audio_files(dir: &Path) -> Result<usize> {
    let files = list_audio_files(dir)?;
    let mut removed = 0;
    for path in files {
        debug!("Purging {}", path.display());
        std::fs::remove_file(&path)?;
        removed += 1;
    }
    info!("Purged {} audio file(s) from {}", removed, dir.display());
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_storage_dir_creates_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b");

        ensure_storage_dir(&target).unwrap();
        assert!(target.is_dir());

        // Idempotent
        ensure_storage_dir(&target).unwrap();
    }

    #[test]
    fn test_list_audio_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.webm"), b"x").unwrap();
        std::fs::write(dir.path().join("a.m4a"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("noext"), b"x").unwrap();

        let files = list_audio_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.m4a", "b.webm"]);
    }

    #[test]
    fn test_purge_removes_only_audio_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.opus"), b"x").unwrap();
        std::fs::write(dir.path().join("two.MP3"), b"x").unwrap();
        std::fs::write(dir.path().join("keep.txt"), b"x").unwrap();

        let removed = purge_audio_files(dir.path()).unwrap();
        assert_eq!(removed, 2);
        assert!(dir.path().join("keep.txt").exists());
        assert!(list_audio_files(dir.path()).unwrap().is_empty());
    }
}
