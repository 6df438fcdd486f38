//! Append-only JSON-lines log file with size-based rotation.
//!
//! Once the file grows past `max_file_size_bytes`, the next append renames it
//! with a timestamp suffix (e.g. `errors.log` → `errors-2025-01-15-120000-123.log`)
//! and opens a fresh file. Files are never truncated in place.
//!
//! Thread-safe: a `Mutex<WriterState>` covers both rotation and append, so a
//! writer can never hold a stale handle across a rename.

use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

// ── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RotatingLogConfig {
    /// Base file path, e.g. `logs/errors.log`.
    pub file_path: PathBuf,
    /// Size threshold past which the next append rotates.
    /// 0 = rotation disabled.
    pub max_file_size_bytes: u64,
    /// Rotated files to keep. 0 = keep all.
    pub max_rotated_files: usize,
}

// ── Writer ───────────────────────────────────────────────────────────────────

/// A rotating append-only log file.
///
/// Call [`RotatingLog::append`] with one serialized JSON entry per line.
pub struct RotatingLog {
    config: RotatingLogConfig,
    inner: Mutex<WriterState>,
}

struct WriterState {
    writer: BufWriter<File>,
    current_size: u64,
}

impl RotatingLog {
    /// Open (or create) the log file, creating parent directories as needed.
    pub fn open(config: RotatingLogConfig) -> io::Result<Self> {
        if let Some(parent) = config.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file_path)?;

        let current_size = file.metadata()?.len();

        Ok(Self {
            config,
            inner: Mutex::new(WriterState {
                writer: BufWriter::new(file),
                current_size,
            }),
        })
    }

    /// Append a single JSON line, rotating first if the file has outgrown
    /// the size threshold.
    pub fn append(&self, line: &str) -> io::Result<()> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("log writer lock poisoned"))?;

        if self.config.max_file_size_bytes > 0
            && state.current_size > self.config.max_file_size_bytes
        {
            self.rotate(&mut state)?;
        }

        let bytes = line.as_bytes();
        state.writer.write_all(bytes)?;
        state.writer.write_all(b"\n")?;
        state.writer.flush()?;
        state.current_size += bytes.len() as u64 + 1;

        Ok(())
    }

    /// Path of the live (unrotated) file.
    pub fn path(&self) -> &Path {
        &self.config.file_path
    }

    fn rotate(&self, state: &mut WriterState) -> io::Result<()> {
        state.writer.flush()?;

        let suffix = Utc::now().format("%Y-%m-%d-%H%M%S-%3f").to_string();
        let rotated_path = rotated_file_path(&self.config.file_path, &suffix);

        if self.config.file_path.exists() {
            if let Err(e) = fs::rename(&self.config.file_path, &rotated_path) {
                error!(
                    error = %e,
                    from = %self.config.file_path.display(),
                    to = %rotated_path.display(),
                    "Failed to rotate log file"
                );
            } else {
                info!(
                    from = %self.config.file_path.display(),
                    to = %rotated_path.display(),
                    "Rotated log file"
                );
            }
        }

        if self.config.max_rotated_files > 0 {
            if let Err(e) = prune_rotated_files(&self.config.file_path, self.config.max_rotated_files) {
                warn!(error = %e, "Failed to prune old rotated log files");
            }
        }

        let new_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.file_path)?;
        state.writer = BufWriter::new(new_file);
        state.current_size = 0;

        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Insert the suffix before the extension: `errors.log` → `errors-<suffix>.log`.
fn rotated_file_path(base: &Path, suffix: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}-{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{suffix}"),
    };
    base.with_file_name(name)
}

/// Remove old rotated siblings of `base_path`, keeping the newest `keep`.
fn prune_rotated_files(base_path: &Path, keep: usize) -> io::Result<()> {
    let parent = base_path.parent().unwrap_or(Path::new("."));
    let stem = base_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let base_name = base_path.file_name().unwrap_or_default().to_string_lossy().into_owned();
    let prefix = format!("{stem}-");

    let mut rotated: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(parent)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name != base_name && name.starts_with(&prefix) {
            rotated.push(entry.path());
        }
    }

    // Timestamp suffixes sort lexicographically — newest last.
    rotated.sort();

    if rotated.len() > keep {
        let to_remove = rotated.len() - keep;
        for path in rotated.iter().take(to_remove) {
            debug!(path = %path.display(), "Pruning old rotated log file");
            fs::remove_file(path)?;
        }
    }

    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_file(path: &Path) -> String {
        let mut content = String::new();
        File::open(path).unwrap().read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn rotated_file_path_inserts_suffix_before_extension() {
        let p = rotated_file_path(Path::new("/var/log/errors.log"), "2025-01-15-120000-000");
        assert_eq!(p, PathBuf::from("/var/log/errors-2025-01-15-120000-000.log"));
    }

    #[test]
    fn rotated_file_path_handles_no_extension() {
        let p = rotated_file_path(Path::new("errors"), "x");
        assert_eq!(p, PathBuf::from("errors-x"));
    }

    #[test]
    fn append_creates_file_and_writes_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.log");
        let log = RotatingLog::open(RotatingLogConfig {
            file_path: path.clone(),
            max_file_size_bytes: 0,
            max_rotated_files: 0,
        })
        .unwrap();
        log.append(r#"{"level":"error"}"#).unwrap();

        let content = read_file(&path);
        assert!(content.contains(r#"{"level":"error"}"#));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn append_preserves_line_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.log");
        let log = RotatingLog::open(RotatingLogConfig {
            file_path: path.clone(),
            max_file_size_bytes: 0,
            max_rotated_files: 0,
        })
        .unwrap();
        log.append("line1").unwrap();
        log.append("line2").unwrap();
        log.append("line3").unwrap();

        let lines: Vec<String> = read_file(&path).trim().lines().map(String::from).collect();
        assert_eq!(lines, vec!["line1", "line2", "line3"]);
    }

    #[test]
    fn growth_past_threshold_rotates_on_next_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.log");
        let log = RotatingLog::open(RotatingLogConfig {
            file_path: path.clone(),
            max_file_size_bytes: 10,
            max_rotated_files: 0,
        })
        .unwrap();

        log.append("abcdefghijklmnop").unwrap(); // exceeds 10 bytes
        log.append("after-rotation").unwrap(); // triggers rename + fresh file

        let content = read_file(&path);
        assert!(content.contains("after-rotation"));
        assert!(!content.contains("abcdefghijklmnop"));

        let rotated: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("errors-"))
            .collect();
        assert_eq!(rotated.len(), 1, "expected one rotated file");
        assert!(read_file(&rotated[0].path()).contains("abcdefghijklmnop"));
    }

    #[test]
    fn append_below_threshold_never_rotates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.log");
        let log = RotatingLog::open(RotatingLogConfig {
            file_path: path,
            max_file_size_bytes: 1024,
            max_rotated_files: 0,
        })
        .unwrap();
        for _ in 0..10 {
            log.append("short").unwrap();
        }

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().filter_map(|e| e.ok()).collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn prune_keeps_only_specified_count() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("errors.log");

        for i in 1..=5 {
            File::create(dir.path().join(format!("errors-2025-01-{i:02}-000000-000.log"))).unwrap();
        }

        prune_rotated_files(&base, 2).unwrap();

        let remaining: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("errors-"))
            .collect();
        assert_eq!(remaining.len(), 2);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join("errors.log");
        let log = RotatingLog::open(RotatingLogConfig {
            file_path: path.clone(),
            max_file_size_bytes: 0,
            max_rotated_files: 0,
        })
        .unwrap();
        log.append("nested").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn reopened_log_resumes_size_accounting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.log");
        let config = RotatingLogConfig {
            file_path: path.clone(),
            max_file_size_bytes: 10,
            max_rotated_files: 0,
        };

        let log = RotatingLog::open(config.clone()).unwrap();
        log.append("abcdefghijklmnop").unwrap();
        drop(log);

        // A fresh writer sees the oversized file and rotates on first append.
        let log = RotatingLog::open(config).unwrap();
        log.append("fresh").unwrap();
        assert_eq!(read_file(&path).trim(), "fresh");
    }
}
