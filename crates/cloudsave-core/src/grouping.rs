use std::collections::BTreeMap;

use crate::types::{ArchiveDescriptor, RevisionGroup, Timestamp};

/// Partition archives into revision groups, newest first.
///
/// Groups key on exact timestamp equality. Members are ordered by directory
/// name, then remote id, so the result does not depend on input order.
/// No filtering happens here: malformed names are dropped when decoding.
pub fn group_archives(archives: impl IntoIterator<Item = ArchiveDescriptor>) -> Vec<RevisionGroup> {
    let mut by_timestamp: BTreeMap<Timestamp, Vec<ArchiveDescriptor>> = BTreeMap::new();
    for archive in archives {
        by_timestamp.entry(archive.timestamp).or_default().push(archive);
    }

    by_timestamp
        .into_iter()
        .rev()
        .map(|(timestamp, mut archives)| {
            archives.sort_by(|a, b| {
                a.directory_name
                    .cmp(&b.directory_name)
                    .then_with(|| a.remote_id.cmp(&b.remote_id))
            });
            RevisionGroup {
                timestamp,
                archives,
            }
        })
        .collect()
}
