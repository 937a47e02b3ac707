use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use time::format_description::well_known::Rfc3339;

pub const SUMMARY_VERSION: u32 = 1;

/// Size of an index at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub words: usize,
    pub documents: usize,
    pub positions: usize,
}

/// JSON record written after a build, for tooling that wants to know what was indexed.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuildSummary {
    #[serde(flatten)]
    pub stats: IndexStats,
    pub threads: usize,
    pub elapsed_ms: u64,
    pub created_at: String,
    pub version: u32,
}

impl BuildSummary {
    pub fn new(stats: IndexStats, threads: usize, elapsed_ms: u64) -> Self {
        let created_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        Self { stats, threads, elapsed_ms, created_at, version: SUMMARY_VERSION }
    }
}

pub fn write_summary(path: &Path, summary: &BuildSummary) -> Result<(), IndexError> {
    let output = |source| IndexError::Output { path: path.to_path_buf(), source };
    let mut out = BufWriter::new(File::create(path).map_err(output)?);
    serde_json::to_writer_pretty(&mut out, summary).map_err(|e| output(e.into()))?;
    out.write_all(b"\n").map_err(output)?;
    out.flush().map_err(output)
}
