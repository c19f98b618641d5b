//! Size-rotated log file writer
//!
//! The active file is renamed to `<name>.1` once the next record would push
//! it past the size limit; older backups shift up by one (`<name>.2`, ...).
//! Backups may be gzip-compressed (`<name>.1.gz`) and are pruned by count and
//! by age at rotation time.

use crate::core::{Result, ToolkitError};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Rotation settings for file outputs
///
/// # Examples
///
/// ```
/// use ops_toolkit::sinks::RotationConfig;
/// use std::time::Duration;
///
/// let rotation = RotationConfig::default()
///     .with_max_size_mb(50)
///     .with_max_backups(7)
///     .with_max_age(Duration::from_secs(7 * 24 * 3600))
///     .with_compression(true);
/// assert_eq!(rotation.max_bytes(), 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Size in megabytes that triggers rotation; 0 disables size rotation
    pub max_size_mb: u64,
    /// Backups older than this are deleted on rotation; zero keeps them
    #[serde(with = "crate::config::duration")]
    pub max_age: Duration,
    /// Number of backups kept; 0 keeps all
    pub max_backups: usize,
    /// Gzip rotated files
    pub compress: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size_mb: 100,
            max_age: Duration::ZERO,
            max_backups: 0,
            compress: false,
        }
    }
}

impl RotationConfig {
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_mb(mut self, size: u64) -> Self {
        self.max_size_mb = size;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = age;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }
}

/// Appending file writer with rotation
///
/// A single `write` call is never split across two files, so a record
/// written with one `write_all` lands entirely in one file.
///
/// # Examples
///
/// ```no_run
/// use ops_toolkit::sinks::{RotatingFileWriter, RotationConfig};
///
/// let writer = RotatingFileWriter::open("/var/log/app.log", RotationConfig::default()).unwrap();
/// ```
pub struct RotatingFileWriter {
    base_path: PathBuf,
    config: RotationConfig,
    size_limit: u64,
    writer: Option<BufWriter<File>>,
    current_size: u64,
}

impl RotatingFileWriter {
    /// Open (or create) the file for appending
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened
    pub fn open<P: AsRef<Path>>(path: P, config: RotationConfig) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        let (file, current_size) = open_append(&base_path)?;

        Ok(Self {
            size_limit: config.max_bytes(),
            base_path,
            config,
            writer: Some(BufWriter::new(file)),
            current_size,
        })
    }

    /// Override the size limit with an exact byte count
    #[must_use]
    pub fn with_size_limit(mut self, bytes: u64) -> Self {
        self.size_limit = bytes;
        self
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    fn should_rotate(&self, incoming: usize) -> bool {
        self.size_limit > 0
            && self.current_size > 0
            && self.current_size + incoming as u64 > self.size_limit
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                ToolkitError::io_operation(
                    "rotating log file",
                    format!("flush before rotation of '{}'", self.base_path.display()),
                    e,
                )
            })?;
        }

        // Shift existing backups up by one, highest index first
        let highest = self.highest_backup_index();
        for index in (1..=highest).rev() {
            for (old, new) in [
                (self.backup_path(index), self.backup_path(index + 1)),
                (self.compressed_path(index), self.compressed_path(index + 1)),
            ] {
                if old.exists() {
                    fs::rename(&old, &new).map_err(|e| {
                        ToolkitError::io_operation(
                            "rotating log file",
                            format!("rename '{}' to '{}'", old.display(), new.display()),
                            e,
                        )
                    })?;
                }
            }
        }

        let first_backup = self.backup_path(1);
        if self.base_path.exists() {
            fs::rename(&self.base_path, &first_backup).map_err(|e| {
                ToolkitError::io_operation(
                    "rotating log file",
                    format!("rename '{}'", self.base_path.display()),
                    e,
                )
            })?;

            if self.config.compress {
                compress_file(&first_backup, &self.compressed_path(1))?;
            }
        }

        self.prune_backups();

        let (file, size) = open_append(&self.base_path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;
        Ok(())
    }

    /// Delete backups beyond `max_backups` or older than `max_age`
    fn prune_backups(&self) {
        let highest = self.highest_backup_index();
        let now = SystemTime::now();

        for index in 1..=highest {
            let over_count = self.config.max_backups > 0 && index > self.config.max_backups;
            for path in [self.backup_path(index), self.compressed_path(index)] {
                if !path.exists() {
                    continue;
                }
                let expired = !self.config.max_age.is_zero()
                    && fs::metadata(&path)
                        .and_then(|m| m.modified())
                        .ok()
                        .and_then(|modified| now.duration_since(modified).ok())
                        .is_some_and(|age| age > self.config.max_age);

                if over_count || expired {
                    if let Err(e) = fs::remove_file(&path) {
                        eprintln!("[WARN] Failed to remove old backup {}: {}", path.display(), e);
                    }
                }
            }
        }
    }

    fn highest_backup_index(&self) -> usize {
        let mut index = 0;
        while self.backup_path(index + 1).exists() || self.compressed_path(index + 1).exists() {
            index += 1;
        }
        index
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log");
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }

    fn compressed_path(&self, index: usize) -> PathBuf {
        let mut path = self.backup_path(index).into_os_string();
        path.push(".gz");
        PathBuf::from(path)
    }

    /// Reopen the active file after a failed rotation left no writer
    fn ensure_writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            let (file, size) = open_append(&self.base_path)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            self.writer = Some(BufWriter::new(file));
            self.current_size = size;
        }
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file is not open"))
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.should_rotate(buf.len()) {
            if let Err(e) = self.rotate() {
                eprintln!("[WARN] Log rotation failed: {}. Continuing with current file.", e);
            }
        }

        self.ensure_writer()?.write_all(buf)?;
        self.current_size += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for RotatingFileWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

fn open_append(path: &Path) -> Result<(File, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ToolkitError::io_operation("opening log file", path.display().to_string(), e))?;
    let size = file
        .metadata()
        .map_err(|e| ToolkitError::io_operation("reading log file metadata", path.display().to_string(), e))?
        .len();
    Ok((file, size))
}

/// Gzip `source` into `target`, removing `source` only on success
fn compress_file(source: &Path, target: &Path) -> Result<()> {
    let temp = target.with_extension("gz.tmp");
    let fail = |message: String, e: io::Error| {
        let _ = fs::remove_file(&temp);
        ToolkitError::io_operation("compressing log file", message, e)
    };

    let input = File::open(source).map_err(|e| fail(format!("open '{}'", source.display()), e))?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);
    let output = File::create(&temp).map_err(|e| fail(format!("create '{}'", temp.display()), e))?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let mut chunk = vec![0u8; 64 * 1024];
    loop {
        let read = reader
            .read(&mut chunk)
            .map_err(|e| fail(format!("read '{}'", source.display()), e))?;
        if read == 0 {
            break;
        }
        encoder
            .write_all(&chunk[..read])
            .map_err(|e| fail("write compressed chunk".to_string(), e))?;
    }

    encoder
        .finish()
        .and_then(|mut out| out.flush())
        .map_err(|e| fail("finish compression".to_string(), e))?;
    fs::rename(&temp, target).map_err(|e| fail(format!("rename to '{}'", target.display()), e))?;

    if let Err(e) = fs::remove_file(source) {
        eprintln!(
            "[WARN] Compressed {} but failed to remove original: {}",
            source.display(),
            e
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    fn small_writer(dir: &TempDir, config: RotationConfig) -> RotatingFileWriter {
        RotatingFileWriter::open(dir.path().join("app.log"), config)
            .unwrap()
            .with_size_limit(64)
    }

    fn write_line(writer: &mut RotatingFileWriter, i: usize) {
        writer.write_all(format!("{:060}\n", i).as_bytes()).unwrap();
    }

    #[test]
    fn test_rotation_config_defaults() {
        let config = RotationConfig::default();
        assert_eq!(config.max_size_mb, 100);
        assert_eq!(config.max_backups, 0);
        assert!(config.max_age.is_zero());
        assert!(!config.compress);
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "existing\n").unwrap();

        let mut writer = RotatingFileWriter::open(&path, RotationConfig::default()).unwrap();
        assert_eq!(writer.current_size(), 9);
        writer.write_all(b"appended\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nappended\n");
    }

    #[test]
    fn test_size_rotation_keeps_records_whole() {
        let dir = TempDir::new().unwrap();
        let mut writer = small_writer(&dir, RotationConfig::default());
        let line = [b'x'; 39];

        for _ in 0..3 {
            writer.write_all(&line).unwrap();
            writer.write_all(b"\n").unwrap();
        }
        writer.flush().unwrap();

        let backup = fs::read_to_string(dir.path().join("app.log.1")).unwrap();
        assert!(backup.len() <= 64);
        assert!(dir.path().join("app.log.2").exists());
    }

    #[test]
    fn test_backup_limit() {
        let dir = TempDir::new().unwrap();
        let mut writer = small_writer(&dir, RotationConfig::default().with_max_backups(2));

        for i in 0..10 {
            write_line(&mut writer, i);
        }
        writer.flush().unwrap();

        assert!(dir.path().join("app.log.1").exists());
        assert!(dir.path().join("app.log.2").exists());
        assert!(!dir.path().join("app.log.3").exists());
    }

    #[test]
    fn test_compressed_backups() {
        let dir = TempDir::new().unwrap();
        let mut writer = small_writer(&dir, RotationConfig::default().with_compression(true));

        write_line(&mut writer, 1);
        write_line(&mut writer, 2);
        writer.flush().unwrap();

        let gz = dir.path().join("app.log.1.gz");
        assert!(gz.exists());
        assert!(!dir.path().join("app.log.1").exists());

        let mut decoded = String::new();
        GzDecoder::new(File::open(gz).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, format!("{:060}\n", 1));
    }

    #[test]
    fn test_zero_size_disables_rotation() {
        let dir = TempDir::new().unwrap();
        let mut writer = small_writer(&dir, RotationConfig::default()).with_size_limit(0);

        for i in 0..10 {
            write_line(&mut writer, i);
        }
        writer.flush().unwrap();

        assert!(!dir.path().join("app.log.1").exists());
        assert_eq!(writer.current_size(), 610);
    }
}
