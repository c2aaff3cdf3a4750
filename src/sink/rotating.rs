//! Size-rotating file sink
//!
//! Appends to a current file at a fixed path. When an incoming write would
//! push the file past its size limit, the sink renames the current file with
//! a timestamp suffix, opens a fresh file at the original path, and prunes
//! rotated files that are too old or too many. The lock is held across the
//! whole close/rename/reopen sequence, so no write interleaves with a
//! rotation.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

use super::Sink;
use crate::error::Result;
use crate::observe;

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

fn default_max_size_mb() -> u64 {
    500
}

fn default_max_backups() -> usize {
    3
}

fn default_max_age_days() -> i64 {
    28
}

/// Rotation policy for a [`RotatingFileSink`].
///
/// Every field is optional in configuration; omitted fields fall back to the
/// documented default.
#[derive(Debug, Clone, Deserialize)]
pub struct RotationConfig {
    /// Maximum size of the current file in megabytes before rotation
    /// (default 500).
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
    /// Number of rotated files to keep (default 3).
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
    /// Rotated files older than this many days are deleted (default 28).
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        RotationConfig {
            max_size_mb: default_max_size_mb(),
            max_backups: default_max_backups(),
            max_age_days: default_max_age_days(),
        }
    }
}

struct Inner {
    file: File,
    size: u64,
}

/// Appending file sink with size-based rotation.
pub struct RotatingFileSink {
    path: PathBuf,
    config: RotationConfig,
    inner: Mutex<Inner>,
}

impl RotatingFileSink {
    /// Open (or create) the current file at `path`. Parent directories are
    /// created as needed; an existing file is appended to, with its current
    /// size counted against the rotation limit.
    pub fn open(path: impl Into<PathBuf>, config: RotationConfig) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(RotatingFileSink {
            path,
            config,
            inner: Mutex::new(Inner { file, size }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn max_bytes(&self) -> u64 {
        self.config.max_size_mb.saturating_mul(1024 * 1024)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Close, rename and reopen under the already-held lock.
    fn rotate_locked(&self, inner: &mut Inner) -> io::Result<()> {
        inner.file.flush()?;
        let backup = self.backup_path(Utc::now());
        fs::rename(&self.path, &backup)?;
        inner.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        inner.size = 0;
        observe::record_rotation();
        if let Err(e) = self.prune_backups(Utc::now()) {
            warn!("failed to prune rotated log files: {}", e);
        }
        Ok(())
    }

    fn file_stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("log")
    }

    fn backup_path(&self, now: DateTime<Utc>) -> PathBuf {
        let stamp = now.format(BACKUP_TIME_FORMAT);
        let name = match self.path.extension().and_then(|s| s.to_str()) {
            Some(ext) => format!("{}-{}.{}", self.file_stem(), stamp, ext),
            None => format!("{}-{}", self.file_stem(), stamp),
        };
        self.path.with_file_name(name)
    }

    /// Parse the rotation timestamp back out of a backup file name, or None
    /// for files that are not backups of this sink.
    fn backup_timestamp(&self, file_name: &str) -> Option<DateTime<Utc>> {
        let prefix = format!("{}-", self.file_stem());
        let rest = file_name.strip_prefix(&prefix)?;
        let stamp = match self.path.extension().and_then(|s| s.to_str()) {
            Some(ext) => rest.strip_suffix(&format!(".{}", ext))?,
            None => rest,
        };
        NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Delete backups beyond `max_backups` or older than `max_age_days`.
    fn prune_backups(&self, now: DateTime<Utc>) -> io::Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut backups: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
        for entry in fs::read_dir(parent)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stamp) = self.backup_timestamp(name) {
                backups.push((entry.path(), stamp));
            }
        }
        // Newest first, so the keep window is a prefix.
        backups.sort_by(|a, b| b.1.cmp(&a.1));
        for (index, (path, stamp)) in backups.iter().enumerate() {
            let expired = (now - *stamp).num_days() > self.config.max_age_days;
            if index >= self.config.max_backups || expired {
                if let Err(e) = fs::remove_file(path) {
                    warn!("failed to remove rotated log file {}: {}", path.display(), e);
                }
            }
        }
        Ok(())
    }
}

impl Sink for RotatingFileSink {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        if inner.size > 0 && inner.size + buf.len() as u64 > self.max_bytes() {
            if let Err(e) = self.rotate_locked(&mut inner) {
                observe::record_write_error();
                return Err(e);
            }
        }
        match inner.file.write_all(buf) {
            Ok(()) => {
                inner.size += buf.len() as u64;
                observe::record_write_success(buf.len());
                observe::record_current_file_size(inner.size);
                Ok(buf.len())
            }
            Err(e) => {
                observe::record_write_error();
                Err(e)
            }
        }
    }

    fn flush(&self) -> io::Result<()> {
        let mut inner = self.lock();
        inner.file.flush()?;
        inner.file.sync_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn small_config(max_backups: usize) -> RotationConfig {
        RotationConfig {
            max_size_mb: 1,
            max_backups,
            max_age_days: 28,
        }
    }

    fn backups_in(dir: &Path, current: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path != current)
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_defaults_are_500_3_28() {
        let config = RotationConfig::default();
        assert_eq!(config.max_size_mb, 500);
        assert_eq!(config.max_backups, 3);
        assert_eq!(config.max_age_days, 28);
    }

    #[test]
    fn test_omitted_toml_fields_fall_back_to_defaults() {
        let config: RotationConfig = toml::from_str("max_size_mb = 10").unwrap();
        assert_eq!(config.max_size_mb, 10);
        assert_eq!(config.max_backups, 3);
        assert_eq!(config.max_age_days, 28);

        let config: RotationConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_size_mb, 500);
    }

    #[test]
    fn test_append_without_rotation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        let sink = RotatingFileSink::open(&path, RotationConfig::default()).unwrap();
        sink.write(b"first\n").unwrap();
        sink.write(b"second\n").unwrap();
        sink.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        assert!(backups_in(dir.path(), &path).is_empty());
    }

    #[test]
    fn test_rotation_preserves_all_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        let sink = RotatingFileSink::open(&path, small_config(3)).unwrap();

        // Two writes of 600 KiB against a 1 MiB limit: the second one
        // triggers exactly one rotation.
        let first = vec![b'a'; 600 * 1024];
        let second = vec![b'b'; 600 * 1024];
        sink.write(&first).unwrap();
        sink.write(&second).unwrap();
        sink.flush().unwrap();

        let backups = backups_in(dir.path(), &path);
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read(&backups[0]).unwrap(), first);
        assert_eq!(fs::read(&path).unwrap(), second);
    }

    #[test]
    fn test_backups_beyond_max_are_pruned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        let sink = RotatingFileSink::open(&path, small_config(1)).unwrap();

        let chunk = vec![b'x'; 700 * 1024];
        for _ in 0..4 {
            sink.write(&chunk).unwrap();
        }

        assert!(backups_in(dir.path(), &path).len() <= 1);
    }

    #[test]
    fn test_foreign_files_survive_pruning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        let other = dir.path().join("unrelated.txt");
        fs::write(&other, "keep me").unwrap();

        let sink = RotatingFileSink::open(&path, small_config(0)).unwrap();
        let chunk = vec![b'x'; 700 * 1024];
        sink.write(&chunk).unwrap();
        sink.write(&chunk).unwrap();

        assert!(other.exists());
    }

    #[test]
    fn test_backup_timestamp_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        let sink = RotatingFileSink::open(&path, RotationConfig::default()).unwrap();
        let now = Utc::now();
        let backup = sink.backup_path(now);
        let name = backup.file_name().unwrap().to_str().unwrap();
        let parsed = sink.backup_timestamp(name).unwrap();
        assert!((now - parsed).num_milliseconds().abs() < 1);
        assert!(sink.backup_timestamp("out.log").is_none());
        assert!(sink.backup_timestamp("unrelated.txt").is_none());
    }

    #[test]
    fn test_reopen_counts_existing_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        fs::write(&path, vec![b'a'; 900 * 1024]).unwrap();

        let sink = RotatingFileSink::open(&path, small_config(3)).unwrap();
        sink.write(&vec![b'b'; 200 * 1024]).unwrap();

        // The pre-existing bytes pushed the first write over the limit.
        assert_eq!(backups_in(dir.path(), &path).len(), 1);
        assert_eq!(fs::read(&path).unwrap().len(), 200 * 1024);
    }
}
