use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::jobs::{ObjectStore, SubtitleSink};

/// Object store backed by a directory: each subdirectory is a bucket, and
/// keys are paths relative to it.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }
}

impl ObjectStore for LocalStore {
    fn list_keys(&self, bucket: &str) -> Result<Vec<String>> {
        let dir = self.bucket_dir(bucket);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&dir) {
            let entry = entry.with_context(|| format!("listing bucket {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&dir) {
                keys.push(object_key(relative));
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self.bucket_dir(bucket).join(key).is_file())
    }

    fn read(&self, bucket: &str, key: &str) -> Result<String> {
        let path = self.bucket_dir(bucket).join(key);
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
    }
}

// Keys always use '/' whatever the platform separator is.
fn object_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Writes subtitle files into a directory, creating it on first use.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SubtitleSink for DirectorySink {
    fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating subtitle directory {}", parent.display()))?;
        }
        fs::write(&path, contents)
            .with_context(|| format!("writing subtitles to {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_nested_keys_per_bucket() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("videos/week1")).unwrap();
        fs::write(root.path().join("videos/intro.mp4"), b"x").unwrap();
        fs::write(root.path().join("videos/week1/lab.mp4"), b"x").unwrap();

        let store = LocalStore::new(root.path());
        assert_eq!(
            store.list_keys("videos").unwrap(),
            vec!["intro.mp4".to_string(), "week1/lab.mp4".to_string()]
        );
        assert!(store.list_keys("missing").unwrap().is_empty());
        assert!(store.exists("videos", "week1/lab.mp4").unwrap());
        assert!(!store.exists("videos", "week1").unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let root = tempfile::tempdir().unwrap();
        let bucket = root.path().join("videos");
        fs::create_dir_all(bucket.join("sub")).unwrap();
        fs::write(bucket.join("a.mp4"), b"x").unwrap();
        std::os::unix::fs::symlink(&bucket, bucket.join("sub/loop")).unwrap();

        let store = LocalStore::new(root.path());
        assert_eq!(store.list_keys("videos").unwrap(), vec!["a.mp4".to_string()]);
    }

    #[test]
    fn sink_creates_directory() {
        let root = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(root.path().join("subs"));

        let path = sink.write("intro_transcript_job.srt", "1\n").unwrap();
        assert_eq!(path, root.path().join("subs/intro_transcript_job.srt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "1\n");
    }
}
