//! The immutable sample index table.

use serde::{Deserialize, Serialize};

use crate::entry::IndexEntry;
use crate::error::{IndexError, IndexResult};

/// Ordered table of contiguous global sample ranges.
///
/// Built once by [`build_index`](crate::build_index) and never mutated
/// afterwards. Lookup is a binary search over entry starts, so resolving a
/// global position costs O(log k) in the number of leaf collections — a
/// linear scan degrades badly on stores with many small leaves.
///
/// # Example
///
/// ```
/// use pretrain_index::{IndexEntry, SampleIndex};
/// use pretrain_store::LeafPath;
///
/// let table = SampleIndex::from_entries(vec![
///     IndexEntry::new("a.vault", LeafPath::new("c0", "rgb", "frames"), 0, 5),
///     IndexEntry::new("b.vault", LeafPath::new("c1", "rgb", "frames"), 5, 12),
/// ])
/// .unwrap();
///
/// assert_eq!(table.len(), 12);
/// let (entry, local) = table.locate(9).unwrap();
/// assert_eq!(entry.clip, "c1");
/// assert_eq!(local, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SampleIndex {
    entries: Vec<IndexEntry>,
    total_samples: usize,
}

impl SampleIndex {
    /// Builds a table from entries, validating the range invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if the entries are not contiguous, sorted and
    /// non-empty, starting at zero.
    pub fn from_entries(entries: Vec<IndexEntry>) -> IndexResult<Self> {
        let total_samples = entries.last().map_or(0, |e| e.end);
        let table = Self {
            entries,
            total_samples,
        };
        table.validate()?;
        Ok(table)
    }

    /// Constructs a table whose invariants were upheld by the builder.
    pub(crate) fn from_parts(entries: Vec<IndexEntry>, total_samples: usize) -> Self {
        debug_assert_eq!(entries.last().map_or(0, |e| e.end), total_samples);
        Self {
            entries,
            total_samples,
        }
    }

    /// Total number of addressable samples.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.total_samples
    }

    /// Returns `true` if the table addresses no samples.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_samples == 0
    }

    /// Number of entries (leaf collections) in the table.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// The entries in canonical order.
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Resolves a global position to its owning entry and local offset.
    ///
    /// Returns `None` if `global` is past the end of the table. The search
    /// is a binary partition over entry ends; because ranges are contiguous
    /// and sorted, the first entry whose `end` exceeds `global` is the owner.
    #[must_use]
    pub fn locate(&self, global: usize) -> Option<(&IndexEntry, usize)> {
        if global >= self.total_samples {
            return None;
        }
        let idx = self.entries.partition_point(|e| e.end <= global);
        let entry = self.entries.get(idx)?;
        debug_assert!(entry.contains(global));
        Some((entry, global - entry.start))
    }

    /// Validates the range invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any entry is empty or has `start >= end`
    /// - Consecutive entries do not meet exactly
    /// - The first entry does not start at zero
    /// - The covered total disagrees with the recorded total
    pub fn validate(&self) -> IndexResult<()> {
        let mut expected_start = 0usize;
        for entry in &self.entries {
            if entry.start >= entry.end {
                return Err(IndexError::validation(format!(
                    "empty or inverted range [{}, {}) for {}",
                    entry.start,
                    entry.end,
                    entry.leaf_path()
                )));
            }
            if entry.start != expected_start {
                return Err(IndexError::validation(format!(
                    "range gap: expected start {}, got {} for {}",
                    expected_start,
                    entry.start,
                    entry.leaf_path()
                )));
            }
            expected_start = entry.end;
        }

        if expected_start != self.total_samples {
            return Err(IndexError::validation(format!(
                "covered total {} disagrees with recorded total {}",
                expected_start, self.total_samples
            )));
        }

        Ok(())
    }

    /// Serializes the table to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> IndexResult<String> {
        serde_json::to_string_pretty(self).map_err(IndexError::from)
    }

    /// Deserializes a table from JSON, validating it before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the parsed table violates the
    /// range invariants.
    pub fn from_json(json: &str) -> IndexResult<Self> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretrain_store::LeafPath;

    fn entry(container: &str, clip: &str, start: usize, end: usize) -> IndexEntry {
        IndexEntry::new(
            container,
            LeafPath::new(clip, "rgb", "frames"),
            start,
            end,
        )
    }

    fn three_entry_table() -> SampleIndex {
        SampleIndex::from_entries(vec![
            entry("a.vault", "c0", 0, 100),
            entry("b.vault", "c1", 100, 300),
            entry("b.vault", "c2", 300, 350),
        ])
        .unwrap()
    }

    #[test]
    fn locate_first_entry() {
        let table = three_entry_table();
        let (e, local) = table.locate(0).unwrap();
        assert_eq!(e.clip, "c0");
        assert_eq!(local, 0);

        let (e, local) = table.locate(99).unwrap();
        assert_eq!(e.clip, "c0");
        assert_eq!(local, 99);
    }

    #[test]
    fn locate_middle_and_last() {
        let table = three_entry_table();
        let (e, local) = table.locate(100).unwrap();
        assert_eq!(e.clip, "c1");
        assert_eq!(local, 0);

        let (e, local) = table.locate(299).unwrap();
        assert_eq!(e.clip, "c1");
        assert_eq!(local, 199);

        let (e, local) = table.locate(349).unwrap();
        assert_eq!(e.clip, "c2");
        assert_eq!(local, 49);
    }

    #[test]
    fn locate_out_of_bounds() {
        let table = three_entry_table();
        assert!(table.locate(350).is_none());
        assert!(table.locate(usize::MAX).is_none());
    }

    #[test]
    fn locate_on_empty_table() {
        let table = SampleIndex::default();
        assert!(table.is_empty());
        assert!(table.locate(0).is_none());
    }

    #[test]
    fn from_entries_rejects_gap() {
        let result = SampleIndex::from_entries(vec![
            entry("a.vault", "c0", 0, 5),
            entry("a.vault", "c1", 6, 10),
        ]);
        assert!(matches!(result, Err(IndexError::Validation { .. })));
    }

    #[test]
    fn from_entries_rejects_overlap() {
        let result = SampleIndex::from_entries(vec![
            entry("a.vault", "c0", 0, 5),
            entry("a.vault", "c1", 4, 10),
        ]);
        assert!(matches!(result, Err(IndexError::Validation { .. })));
    }

    #[test]
    fn from_entries_rejects_nonzero_start() {
        let result = SampleIndex::from_entries(vec![entry("a.vault", "c0", 1, 5)]);
        assert!(matches!(result, Err(IndexError::Validation { .. })));
    }

    #[test]
    fn from_entries_rejects_empty_entry() {
        let result = SampleIndex::from_entries(vec![
            entry("a.vault", "c0", 0, 5),
            entry("a.vault", "c1", 5, 5),
        ]);
        assert!(matches!(result, Err(IndexError::Validation { .. })));
    }

    #[test]
    fn json_roundtrip() {
        let table = three_entry_table();
        let json = table.to_json().unwrap();
        let parsed = SampleIndex::from_json(&json).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn from_json_rejects_corrupt_table() {
        let table = SampleIndex {
            entries: vec![entry("a.vault", "c0", 3, 9)],
            total_samples: 6,
        };
        let json = serde_json::to_string(&table).unwrap();
        assert!(matches!(
            SampleIndex::from_json(&json),
            Err(IndexError::Validation { .. })
        ));
    }
}
