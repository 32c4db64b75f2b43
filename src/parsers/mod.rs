//! Streaming input for ClinVar variant_summary dumps.
//!
//! [`RecordScanner`] yields one decoded data line at a time from a plain or
//! compressed file, after skipping the header line. Invalid UTF-8 is
//! replaced, never rejected, so a stray byte cannot stop a multi-gigabyte
//! scan.

pub mod facts;
pub mod variant_summary;

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use xz2::read::XzDecoder;

use crate::error::{IndexError, Result};

pub use facts::FactExtractor;
pub use variant_summary::{Classification, LofClassifier, VariantSummaryColumns};

const READ_BUFFER_SIZE: usize = 1 << 16;

/// Compression of an input stream, detected from its leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Bzip2,
    Xz,
    None,
}

impl Compression {
    pub fn detect(magic: &[u8]) -> Self {
        if magic.starts_with(&[0x1f, 0x8b]) {
            Compression::Gzip
        } else if magic.starts_with(b"BZh") {
            Compression::Bzip2
        } else if magic.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Compression::Xz
        } else {
            Compression::None
        }
    }
}

/// Open a possibly compressed file as a buffered line reader
pub fn open_file(path: &Path) -> Result<Box<dyn BufRead>> {
    if !path.is_file() {
        return Err(IndexError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let io_err = |source: std::io::Error| IndexError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut raw = BufReader::new(file);
    let compression = Compression::detect(raw.fill_buf().map_err(io_err)?);
    debug!("Opening {} ({:?})", path.display(), compression);

    let decoded: Box<dyn Read> = match compression {
        Compression::Gzip => Box::new(MultiGzDecoder::new(raw)),
        Compression::Bzip2 => Box::new(MultiBzDecoder::new(raw)),
        Compression::Xz => Box::new(XzDecoder::new(raw)),
        Compression::None => Box::new(raw),
    };

    Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, decoded)))
}

/// Lazy sequence of data lines, header excluded.
///
/// A read failure is yielded once as [`IndexError::Io`] and ends the
/// sequence.
pub struct RecordScanner {
    reader: Box<dyn BufRead>,
    path: PathBuf,
    buf: Vec<u8>,
    line_number: u64,
    finished: bool,
}

impl RecordScanner {
    /// Open `path` and consume its header line
    pub fn open(path: &Path) -> Result<Self> {
        let reader = open_file(path)?;
        Self::from_reader(reader, path)
    }

    /// Wrap an already decoded reader; the first line is taken as the header
    pub fn from_reader(reader: Box<dyn BufRead>, path: &Path) -> Result<Self> {
        let mut scanner = Self {
            reader,
            path: path.to_path_buf(),
            buf: Vec::with_capacity(4096),
            line_number: 0,
            finished: false,
        };
        scanner.skip_header()?;
        Ok(scanner)
    }

    fn skip_header(&mut self) -> Result<()> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|source| IndexError::Io {
                path: self.path.clone(),
                source,
            })?;
        if read == 0 {
            self.finished = true;
        }
        Ok(())
    }

    /// Data lines read so far (1-based number of the last yielded line)
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for RecordScanner {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.finished = true;
                None
            }
            Ok(_) => {
                self.line_number += 1;
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(source) => {
                self.finished = true;
                Some(Err(IndexError::Io {
                    path: self.path.clone(),
                    source,
                }))
            }
        }
    }
}
