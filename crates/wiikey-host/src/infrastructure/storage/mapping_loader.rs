//! Loads the key mapping file from disk into the live table.
//!
//! Parsing never aborts on a bad line (see
//! [`wiikey_core::keymap::mapping_file`]); every problem is logged and the
//! good lines are installed.  Only an unreadable file fails the load, and in
//! that case the table in effect is left untouched.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use wiikey_core::keymap::{parse_mapping_file, MappingLoadReport};
use wiikey_core::SharedMappingTable;

/// The mapping file could not be read at all.
#[derive(Debug, Error)]
pub enum MappingFileError {
    #[error("cannot read mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Counts reported after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingLoadSummary {
    pub remotes: usize,
    pub rejected_lines: usize,
}

/// Reads and parses `path` without installing it.
///
/// # Errors
///
/// Returns [`MappingFileError::Io`] if the file cannot be read.
pub async fn read_mapping_file(path: &Path) -> Result<MappingLoadReport, MappingFileError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| MappingFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_mapping_file(&text))
}

/// Reads `path` and replaces the contents of `shared` with it wholesale.
///
/// # Errors
///
/// Returns [`MappingFileError::Io`] if the file cannot be read; `shared` is
/// not modified.
pub async fn reload_mappings(
    shared: &SharedMappingTable,
    path: &Path,
) -> Result<MappingLoadSummary, MappingFileError> {
    let report = read_mapping_file(path).await?;
    for error in &report.errors {
        warn!(path = %path.display(), %error, "mapping line rejected");
    }

    let summary = MappingLoadSummary {
        remotes: report.table.len(),
        rejected_lines: report.errors.len(),
    };
    shared.replace(report.table);
    info!(
        path = %path.display(),
        remotes = summary.remotes,
        rejected = summary.rejected_lines,
        "mapping table loaded"
    );
    Ok(summary)
}
