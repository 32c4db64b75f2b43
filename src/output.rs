//! Persistence of the finished index and the optional build reports.
//!
//! The index artifact is a fixed-int bincode stream: an [`IndexHeader`]
//! (8-byte magic and format version) followed by the gene entries in
//! first-encountered order. It is written to a temporary file beside the
//! destination and renamed into place, so readers only ever see a complete
//! index. Loading checks the header before touching the body and bounds every
//! length prefix by the file size.

use bincode::Options;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::analysis::BuildStats;
use crate::error::{IndexError, Result};
use crate::types::{GeneEntry, GeneIndex};

pub const INDEX_MAGIC: [u8; 8] = *b"CVLOFIDX";
pub const INDEX_VERSION: u32 = 1;

/// Default artifact name, placed beside the input file
pub const DEFAULT_INDEX_NAME: &str = "clinvar_lof_index.bin";

#[derive(Debug, Serialize, Deserialize)]
struct IndexHeader {
    magic: [u8; 8],
    version: u32,
}

/// Encoding shared by the writer and the loader
fn index_options() -> impl Options + Copy {
    bincode::DefaultOptions::new().with_fixint_encoding()
}

/// `clinvar_lof_index.bin` in the directory holding `input`
pub fn default_index_path(input: &Path) -> PathBuf {
    input
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(DEFAULT_INDEX_NAME)
}

/// Writes a finalized index to disk as one atomic unit
pub struct IndexWriter {
    path: PathBuf,
}

impl IndexWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Encode, write and rename into place; returns the artifact size in bytes
    pub fn write(&self, index: &GeneIndex) -> Result<u64> {
        let persist_err = |source: std::io::Error| IndexError::Persist {
            path: self.path.clone(),
            source,
        };
        let encode_err = |e: bincode::Error| match *e {
            bincode::ErrorKind::Io(source) => persist_err(source),
            other => IndexError::Encode(Box::new(other)),
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let temp = NamedTempFile::new_in(dir).map_err(persist_err)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            let header = IndexHeader {
                magic: INDEX_MAGIC,
                version: INDEX_VERSION,
            };
            index_options()
                .serialize_into(&mut writer, &header)
                .map_err(encode_err)?;
            index_options()
                .serialize_into(&mut writer, index.entries())
                .map_err(encode_err)?;
            writer.flush().map_err(persist_err)?;
        }
        temp.as_file().sync_all().map_err(persist_err)?;

        let file = temp.persist(&self.path).map_err(|e| persist_err(e.error))?;
        let size = file.metadata().map_err(persist_err)?.len();

        info!(
            "Index saved: {} ({} genes, {} bytes)",
            self.path.display(),
            index.len(),
            size
        );
        Ok(size)
    }
}

impl GeneIndex {
    /// Read an index written by [`IndexWriter`]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(IndexError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let io_err = |source: std::io::Error| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };
        let invalid = |e: bincode::Error| {
            IndexError::InvalidIndex(format!("{}: {}", path.display(), e))
        };

        let file = File::open(path).map_err(io_err)?;
        let file_len = file.metadata().map_err(io_err)?.len();
        let options = index_options().with_limit(file_len);
        let mut reader = BufReader::new(file);

        let header: IndexHeader = options.deserialize_from(&mut reader).map_err(invalid)?;
        if header.magic != INDEX_MAGIC {
            return Err(IndexError::InvalidIndex(format!(
                "{} is not a LOF index",
                path.display()
            )));
        }
        if header.version != INDEX_VERSION {
            return Err(IndexError::InvalidIndex(format!(
                "unsupported index version {} (expected {})",
                header.version, INDEX_VERSION
            )));
        }

        let genes: Vec<GeneEntry> = options.deserialize_from(&mut reader).map_err(invalid)?;
        Ok(GeneIndex::from_entries(genes))
    }
}

/// Machine-readable build summary
#[derive(Debug, Serialize)]
pub struct BuildReport<'a> {
    pub generated_at: String,
    pub input: &'a Path,
    pub output: &'a Path,
    pub index_bytes: u64,
    pub stats: &'a BuildStats,
}

impl<'a> BuildReport<'a> {
    pub fn new(input: &'a Path, output: &'a Path, index_bytes: u64, stats: &'a BuildStats) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input,
            output,
            index_bytes,
            stats,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| IndexError::Report {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(|source| IndexError::Persist {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn report_err(path: &Path, e: csv::Error) -> IndexError {
    match e.into_kind() {
        csv::ErrorKind::Io(source) => IndexError::Persist {
            path: path.to_path_buf(),
            source,
        },
        other => IndexError::Report {
            path: path.to_path_buf(),
            message: format!("{:?}", other),
        },
    }
}

/// One row per gene, tab separated
pub fn write_gene_table(index: &GeneIndex, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|e| report_err(path, e))?;

    writer
        .write_record([
            "gene",
            "variants",
            "positions",
            "distinct_positions",
            "exon_annotated",
            "min_position",
            "max_position",
        ])
        .map_err(|e| report_err(path, e))?;

    for entry in index.iter() {
        let fmt_pos = |p: Option<u32>| p.map(|p| p.to_string()).unwrap_or_default();
        writer
            .write_record([
                entry.symbol.clone(),
                entry.variant_count().to_string(),
                entry.positions.len().to_string(),
                entry.truncated_counts.len().to_string(),
                entry.exon_annotated().to_string(),
                fmt_pos(entry.min_position()),
                fmt_pos(entry.max_position()),
            ])
            .map_err(|e| report_err(path, e))?;
    }

    writer.flush().map_err(|source| IndexError::Persist {
        path: path.to_path_buf(),
        source,
    })
}
