//! Log sink: `tracing-subscriber` fmt layer writing to a size-rotated file
//!
//! `bot_logs.log` grows up to `MAX_BYTES`; then `bot_logs.log.N` shift to
//! `.N+1`, the live file becomes `.1` and a fresh one is opened. At most
//! `BACKUP_COUNT` backups are kept.

use parking_lot::{Mutex, MutexGuard};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{warn, Level};
use tracing_subscriber::fmt::MakeWriter;

pub const LOG_FILE: &str = "bot_logs.log";
pub const MAX_BYTES: u64 = 50_000_000;
pub const BACKUP_COUNT: usize = 5;

pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    state: Mutex<FileState>,
}

struct FileState {
    file: File,
    written: u64,
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path,
            max_bytes,
            backups,
            state: Mutex::new(FileState { file, written }),
        })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&self, state: &mut FileState) -> io::Result<()> {
        state.file.flush()?;

        if self.backups == 0 {
            state.file.set_len(0)?;
            state.written = 0;
            return Ok(());
        }

        match fs::remove_file(self.backup_path(self.backups)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }

        fs::rename(&self.path, self.backup_path(1))?;
        state.file = open_append(&self.path)?;
        state.written = 0;
        Ok(())
    }
}

/// Holds the file lock for the duration of one formatted event.
pub struct RotatingWriter<'a> {
    owner: &'a RotatingFile,
    state: MutexGuard<'a, FileState>,
}

impl Write for RotatingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.state.written;
        if written > 0 && written + buf.len() as u64 > self.owner.max_bytes {
            self.owner.rotate(&mut self.state)?;
        }

        let n = self.state.file.write(buf)?;
        self.state.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = RotatingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriter {
            owner: self,
            state: self.state.lock(),
        }
    }
}

/// Install the global subscriber. Falls back to stderr when the file can't be opened.
pub fn init(path: impl AsRef<Path>) {
    let path = path.as_ref();
    let builder = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_target(false);

    match RotatingFile::open(path, MAX_BYTES, BACKUP_COUNT) {
        Ok(file) => builder.with_writer(file).init(),
        Err(e) => {
            builder.with_writer(io::stderr).init();
            warn!("Cannot open log file {}: {}, logging to stderr", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_line(sink: &RotatingFile, line: &str) {
        let mut writer = sink.make_writer();
        writer.write_all(line.as_bytes()).unwrap();
        writer.flush().unwrap();
    }

    fn read(path: impl AsRef<Path>) -> String {
        fs::read_to_string(path).unwrap_or_default()
    }

    #[test]
    fn test_writes_below_limit_stay_in_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.log");
        let sink = RotatingFile::open(&path, 100, 2).unwrap();

        write_line(&sink, "first\n");
        write_line(&sink, "second\n");

        assert_eq!(read(&path), "first\nsecond\n");
        assert!(!dir.path().join("bot.log.1").exists());
    }

    #[test]
    fn test_rotation_shifts_backups_and_drops_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.log");
        let sink = RotatingFile::open(&path, 8, 2).unwrap();

        write_line(&sink, "aaaaaaa\n");
        write_line(&sink, "bbbbbbb\n");
        assert_eq!(read(&path), "bbbbbbb\n");
        assert_eq!(read(dir.path().join("bot.log.1")), "aaaaaaa\n");

        write_line(&sink, "ccccccc\n");
        write_line(&sink, "ddddddd\n");
        assert_eq!(read(&path), "ddddddd\n");
        assert_eq!(read(dir.path().join("bot.log.1")), "ccccccc\n");
        assert_eq!(read(dir.path().join("bot.log.2")), "bbbbbbb\n");
        assert!(!dir.path().join("bot.log.3").exists());
    }

    #[test]
    fn test_existing_file_size_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.log");
        fs::write(&path, "old-line\n").unwrap();

        let sink = RotatingFile::open(&path, 10, 1).unwrap();
        write_line(&sink, "new-line\n");

        assert_eq!(read(&path), "new-line\n");
        assert_eq!(read(dir.path().join("bot.log.1")), "old-line\n");
    }

    #[test]
    fn test_zero_backups_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.log");
        let sink = RotatingFile::open(&path, 4, 0).unwrap();

        write_line(&sink, "abcd");
        write_line(&sink, "efgh");

        assert_eq!(read(&path), "efgh");
        assert!(!dir.path().join("bot.log.1").exists());
    }
}
