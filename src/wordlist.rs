//! Wordlist output.
//!
//! Every discovered path is appended as its own line the moment it is found,
//! so an interrupted walk keeps everything written up to that point.
//!
//! - `EntrySink`: where the walker records paths
//! - `WordlistFile`: append-only file sink, created on the first line
//! - `encode_path`: percent-encoding applied with `--auto-url-encode`

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left untouched by `encode_path`: unreserved ones plus `/`.
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_SAFE).to_string()
}

pub trait EntrySink: Send {
    fn record(&mut self, path: &str) -> io::Result<()>;
}

impl EntrySink for Vec<String> {
    fn record(&mut self, path: &str) -> io::Result<()> {
        self.push(path.to_string());
        Ok(())
    }
}

pub struct WordlistFile {
    path: PathBuf,
    encode: bool,
    writer: Option<BufWriter<File>>,
    written: usize,
}

impl WordlistFile {
    /// Nothing touches the filesystem until the first `record`.
    pub fn new(path: impl Into<PathBuf>, encode: bool) -> Self {
        Self {
            path: path.into(),
            encode,
            writer: None,
            written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.writer = Some(BufWriter::new(file));
        }
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::other("wordlist writer unavailable"))
    }
}

impl EntrySink for WordlistFile {
    fn record(&mut self, path: &str) -> io::Result<()> {
        let line = if self.encode {
            encode_path(path)
        } else {
            path.to_string()
        };
        let writer = self.writer()?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        self.written += 1;
        Ok(())
    }
}

impl Drop for WordlistFile {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
