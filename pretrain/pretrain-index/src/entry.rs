//! Index entry type.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use pretrain_store::LeafPath;

/// One leaf record-collection's slice of the global sample range.
///
/// Entries own contiguous half-open ranges `[start, end)`; the index table
/// guarantees that consecutive entries meet exactly and that their union
/// covers `[0, total_samples)`.
///
/// # Example
///
/// ```
/// use pretrain_index::IndexEntry;
/// use pretrain_store::LeafPath;
///
/// let entry = IndexEntry::new(
///     "clips_000.vault",
///     LeafPath::new("clip_0007", "rgb", "frames"),
///     120,
///     180,
/// );
/// assert_eq!(entry.len(), 60);
/// assert!(entry.contains(120));
/// assert!(!entry.contains(180));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Container file owning the records.
    pub container: PathBuf,

    /// Outer grouping key inside the container.
    pub clip: String,

    /// Middle grouping key.
    pub variant: String,

    /// Leaf record-collection name.
    pub collection: String,

    /// First global position owned by this entry (inclusive).
    pub start: usize,

    /// One past the last global position owned by this entry.
    pub end: usize,
}

impl IndexEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(
        container: impl Into<PathBuf>,
        path: LeafPath,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            container: container.into(),
            clip: path.clip,
            variant: path.variant,
            collection: path.collection,
            start,
            end,
        }
    }

    /// Number of global positions this entry owns.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the entry owns no positions.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if `global` falls inside `[start, end)`.
    #[must_use]
    pub const fn contains(&self, global: usize) -> bool {
        self.start <= global && global < self.end
    }

    /// The leaf path addressing this entry's records in its container.
    #[must_use]
    pub fn leaf_path(&self) -> LeafPath {
        LeafPath::new(
            self.clip.clone(),
            self.variant.clone(),
            self.collection.clone(),
        )
    }
}
