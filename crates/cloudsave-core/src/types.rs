use chrono::{NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CloudSaveError;

const TIMESTAMP_LEN: usize = 14;

/// Second-precision UTC instant that renders as `YYYYMMDDhhmmss`.
///
/// The textual form is fixed-width, so lexicographic order of the rendered
/// strings matches chronological order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now().naive_utc())
    }

    /// Truncates to whole seconds.
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self(datetime.with_nanosecond(0).unwrap_or(datetime))
    }

    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({self})")
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d%H%M%S"))
    }
}

impl std::str::FromStr for Timestamp {
    type Err = CloudSaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CloudSaveError::Timestamp(s.to_string());

        if s.len() != TIMESTAMP_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let field = |range: std::ops::Range<usize>| -> u32 {
            s[range].parse().unwrap_or(u32::MAX)
        };

        let year = s[0..4].parse::<i32>().map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(year, field(4..6), field(6..8))
            .and_then(|date| date.and_hms_opt(field(8..10), field(10..12), field(12..14)))
            .map(Timestamp)
            .ok_or_else(invalid)
    }
}

/// A raw entry as reported by a backend listing, before name decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Backend-specific handle (object key, file id, path).
    pub id: String,
    /// Remote filename, possibly with a leading path.
    pub name: String,
}

impl RemoteEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One archive on a backend: a single directory snapshot at one timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDescriptor {
    pub remote_id: String,
    pub directory_name: String,
    pub timestamp: Timestamp,
}

impl ArchiveDescriptor {
    /// Decode a listing entry; fails if its name is not an archive name.
    pub fn from_entry(entry: RemoteEntry) -> crate::error::Result<Self> {
        let name = crate::naming::decode(&entry.name)?;
        Ok(Self {
            remote_id: entry.id,
            directory_name: name.directory_name,
            timestamp: name.timestamp,
        })
    }

    /// The filename this archive is stored under.
    pub fn remote_filename(&self) -> String {
        crate::naming::encode(self.timestamp, &self.directory_name)
    }
}

/// All archives sharing one timestamp: one full backup snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionGroup {
    pub timestamp: Timestamp,
    /// Sorted by directory name.
    pub archives: Vec<ArchiveDescriptor>,
}

impl RevisionGroup {
    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    pub fn directory_names(&self) -> impl Iterator<Item = &str> {
        self.archives.iter().map(|a| a.directory_name.as_str())
    }
}

/// The registered storage backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    S3,
    /// S3-compatible: MinIO, Garage, Ceph RGW, etc.
    S3Compatible,
    Gcs,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::S3 => write!(f, "s3"),
            BackendKind::S3Compatible => write!(f, "s3compatible"),
            BackendKind::Gcs => write!(f, "gcs"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = CloudSaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "s3" => Ok(BackendKind::S3),
            "s3compatible" | "s3-compatible" | "minio" | "garage" => Ok(BackendKind::S3Compatible),
            "gcs" => Ok(BackendKind::Gcs),
            _ => Err(CloudSaveError::InvalidBackendKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_display_is_fixed_width() {
        let ts: Timestamp = "20240102093000".parse().unwrap();
        assert_eq!(ts.to_string(), "20240102093000");

        let early: Timestamp = "00010101000000".parse().unwrap();
        assert_eq!(early.to_string().len(), 14);
    }

    #[test]
    fn timestamp_rejects_malformed() {
        assert!("2024010209300".parse::<Timestamp>().is_err());
        assert!("202401020930000".parse::<Timestamp>().is_err());
        assert!("2024-1-02T0930".parse::<Timestamp>().is_err());
        assert!("20241302093000".parse::<Timestamp>().is_err());
        assert!("20240230093000".parse::<Timestamp>().is_err());
        assert!("20240102250000".parse::<Timestamp>().is_err());
    }

    #[test]
    fn timestamp_order_matches_string_order() {
        let a: Timestamp = "20231231235959".parse().unwrap();
        let b: Timestamp = "20240101000000".parse().unwrap();
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn timestamp_now_has_no_subseconds() {
        let now = Timestamp::now();
        assert_eq!(now.as_datetime().nanosecond(), 0);
        assert_eq!(now.to_string().parse::<Timestamp>().unwrap(), now);
    }

    #[test]
    fn backend_kind_parse() {
        assert_eq!("local".parse::<BackendKind>().unwrap(), BackendKind::Local);
        assert_eq!("S3".parse::<BackendKind>().unwrap(), BackendKind::S3);
        assert_eq!(
            "minio".parse::<BackendKind>().unwrap(),
            BackendKind::S3Compatible
        );
        assert_eq!("gcs".parse::<BackendKind>().unwrap(), BackendKind::Gcs);
        assert!("dropbox".parse::<BackendKind>().is_err());
    }
}
