use crate::types::{ArchiveDescriptor, RevisionGroup};

/// Keep-last-N retention over revision groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    revisions_to_keep: usize,
}

impl RetentionPolicy {
    pub fn keep_last(revisions_to_keep: usize) -> Self {
        Self { revisions_to_keep }
    }

    pub fn revisions_to_keep(&self) -> usize {
        self.revisions_to_keep
    }

    /// Archives to delete. `groups` must be newest first, as produced by
    /// [`crate::grouping::group_archives`].
    pub fn select_for_deletion(&self, groups: &[RevisionGroup]) -> Vec<ArchiveDescriptor> {
        select_for_deletion(groups, self.revisions_to_keep)
    }
}

/// Flattened members of every group after the newest `revisions_to_keep`.
pub fn select_for_deletion(
    groups: &[RevisionGroup],
    revisions_to_keep: usize,
) -> Vec<ArchiveDescriptor> {
    groups
        .iter()
        .skip(revisions_to_keep)
        .flat_map(|group| group.archives.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group_archives;
    use crate::types::RemoteEntry;

    fn groups(names: &[&str]) -> Vec<RevisionGroup> {
        group_archives(
            names
                .iter()
                .map(|n| ArchiveDescriptor::from_entry(RemoteEntry::new(*n, *n)).unwrap()),
        )
    }

    fn ids(archives: &[ArchiveDescriptor]) -> Vec<&str> {
        archives.iter().map(|a| a.remote_id.as_str()).collect()
    }

    #[test]
    fn keep_one_deletes_older_revision_only() {
        let groups = groups(&[
            "20240101120000_Save1.zip",
            "20240102093000_Save1.zip",
            "20240102093000_Save2.zip",
        ]);
        let doomed = RetentionPolicy::keep_last(1).select_for_deletion(&groups);
        assert_eq!(ids(&doomed), vec!["20240101120000_Save1.zip"]);
    }

    #[test]
    fn nothing_deleted_when_within_limit() {
        let groups = groups(&["20240101000000_A.zip", "20240102000000_A.zip"]);
        assert!(select_for_deletion(&groups, 2).is_empty());
        assert!(select_for_deletion(&groups, 10).is_empty());
        assert!(select_for_deletion(&[], 0).is_empty());
    }

    #[test]
    fn deletes_exactly_groups_beyond_n() {
        let groups = groups(&[
            "20240104000000_A.zip",
            "20240104000000_B.zip",
            "20240103000000_A.zip",
            "20240102000000_A.zip",
            "20240102000000_B.zip",
            "20240101000000_A.zip",
        ]);
        assert_eq!(groups.len(), 4);

        let doomed = select_for_deletion(&groups, 2);
        assert_eq!(
            ids(&doomed),
            vec![
                "20240102000000_A.zip",
                "20240102000000_B.zip",
                "20240101000000_A.zip",
            ]
        );
    }

    #[test]
    fn keep_zero_deletes_everything() {
        let groups = groups(&["20240101000000_A.zip", "20240102000000_B.zip"]);
        assert_eq!(select_for_deletion(&groups, 0).len(), 2);
    }
}
