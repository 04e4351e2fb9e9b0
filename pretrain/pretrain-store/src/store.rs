//! The storage contract the index and dataset layers depend on.

use crate::error::StoreResult;
use crate::record::{LeafPath, RawRecord};

/// Read access to a container of nested record-collections.
///
/// This is the full contract between the storage layer and everything above
/// it: enumerate child keys, query a leaf collection's record count without
/// touching payloads, and read a single record by integer offset. Index
/// construction uses only the first two operations, so indexing cost stays
/// proportional to metadata size, never payload size.
///
/// Implementations must return child keys in stable lexicographic order so
/// that index construction over an unmodified container is reproducible.
///
/// Implementations must also be safe to share across threads: `read_record`
/// takes `&self` and must not rely on a shared mutable cursor.
pub trait HierarchicalStore {
    /// Names of the outer (clip) groups, lexicographically sorted.
    fn clip_names(&self) -> Vec<String>;

    /// Names of the variant groups under `clip`, lexicographically sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if `clip` does not exist.
    fn variant_names(&self, clip: &str) -> StoreResult<Vec<String>>;

    /// Names of the leaf collections under `clip/variant`, lexicographically
    /// sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the group does not exist.
    fn collection_names(&self, clip: &str, variant: &str) -> StoreResult<Vec<String>>;

    /// Number of records in the leaf collection at `path`.
    ///
    /// This is a metadata-only query; implementations must not read record
    /// payloads to answer it.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not name a leaf collection.
    fn record_count(&self, path: &LeafPath) -> StoreResult<usize>;

    /// Reads the single record at `index` within the leaf collection at
    /// `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not name a leaf collection, if
    /// `index` is past the end of it, or if the underlying read fails.
    fn read_record(&self, path: &LeafPath, index: usize) -> StoreResult<RawRecord>;
}
