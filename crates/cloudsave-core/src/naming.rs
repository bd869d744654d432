//! Remote archive filenames: `<timestamp>_<directory_name>.zip`.
//!
//! The timestamp never contains an underscore, so decoding splits on the
//! first one and the directory name keeps any underscores of its own.

use crate::error::{CloudSaveError, Result};
use crate::types::Timestamp;

pub const ARCHIVE_EXTENSION: &str = "zip";

/// Decoded form of a remote archive filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    pub timestamp: Timestamp,
    pub directory_name: String,
}

/// Build the remote filename for a directory snapshot.
pub fn encode(timestamp: Timestamp, directory_name: &str) -> String {
    format!("{timestamp}_{directory_name}.{ARCHIVE_EXTENSION}")
}

/// Parse a remote filename. Any leading `/`-separated path is ignored and the
/// extension is matched case-insensitively.
pub fn decode(remote_filename: &str) -> Result<ArchiveName> {
    let invalid = |reason: &str| CloudSaveError::ArchiveName {
        name: remote_filename.to_string(),
        reason: reason.to_string(),
    };

    let base = remote_filename.rsplit('/').next().unwrap_or(remote_filename);

    let stem = match base.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION) => stem,
        _ => return Err(invalid("missing .zip extension")),
    };

    let (timestamp, directory_name) = stem
        .split_once('_')
        .ok_or_else(|| invalid("missing '_' separator"))?;

    if directory_name.is_empty() {
        return Err(invalid("empty directory name"));
    }

    let timestamp = timestamp
        .parse::<Timestamp>()
        .map_err(|_| invalid("unparseable timestamp"))?;

    Ok(ArchiveName {
        timestamp,
        directory_name: directory_name.to_string(),
    })
}
