//! In-memory store for tests and synthetic pipelines.

use std::collections::BTreeMap;

use crate::error::{StoreError, StoreResult};
use crate::record::{LeafPath, RawRecord};
use crate::store::HierarchicalStore;

#[derive(Debug, Clone)]
struct MemoryLeaf {
    height: u32,
    width: u32,
    channels: u32,
    data: Vec<u8>,
}

impl MemoryLeaf {
    const fn record_size(&self) -> usize {
        (self.height as usize) * (self.width as usize) * (self.channels as usize)
    }
}

/// A [`HierarchicalStore`] held entirely in memory.
///
/// Useful for unit tests and synthetic data pipelines. Enumeration order
/// matches [`Vault`](crate::Vault): lexicographic at every level.
///
/// # Example
///
/// ```
/// use pretrain_store::{HierarchicalStore, LeafPath, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// store
///     .add_leaf("clip_a", "rgb", "frames", 1, 1, 3, vec![10, 20, 30])
///     .unwrap();
///
/// let path = LeafPath::new("clip_a", "rgb", "frames");
/// assert_eq!(store.record_count(&path).unwrap(), 1);
/// assert_eq!(store.read_record(&path, 0).unwrap().data, vec![10, 20, 30]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    clips: BTreeMap<String, BTreeMap<String, BTreeMap<String, MemoryLeaf>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a leaf collection of packed H×W×C records.
    ///
    /// # Errors
    ///
    /// Returns an error if any dimension is zero, `data` is not a whole
    /// number of records, or the leaf path was already added.
    #[allow(clippy::too_many_arguments)]
    pub fn add_leaf(
        &mut self,
        clip: impl Into<String>,
        variant: impl Into<String>,
        collection: impl Into<String>,
        height: u32,
        width: u32,
        channels: u32,
        data: Vec<u8>,
    ) -> StoreResult<()> {
        if height == 0 || width == 0 || channels == 0 {
            return Err(StoreError::InvalidShape {
                height,
                width,
                channels,
            });
        }

        let leaf = MemoryLeaf {
            height,
            width,
            channels,
            data,
        };
        if leaf.data.len() % leaf.record_size() != 0 {
            return Err(StoreError::invalid_payload(format!(
                "payload length {} is not a multiple of record size {}",
                leaf.data.len(),
                leaf.record_size()
            )));
        }

        let (clip, variant, collection) = (clip.into(), variant.into(), collection.into());
        let leaves = self
            .clips
            .entry(clip.clone())
            .or_default()
            .entry(variant.clone())
            .or_default();
        if leaves.contains_key(&collection) {
            return Err(StoreError::DuplicateKey {
                key: format!("{clip}/{variant}/{collection}"),
            });
        }
        leaves.insert(collection, leaf);
        Ok(())
    }

    fn leaf(&self, path: &LeafPath) -> StoreResult<&MemoryLeaf> {
        let variants = self
            .clips
            .get(&path.clip)
            .ok_or_else(|| StoreError::missing_key(&path.clip))?;
        let leaves = variants
            .get(&path.variant)
            .ok_or_else(|| StoreError::missing_key(format!("{}/{}", path.clip, path.variant)))?;
        leaves
            .get(&path.collection)
            .ok_or_else(|| StoreError::missing_key(path.to_string()))
    }
}

impl HierarchicalStore for MemoryStore {
    fn clip_names(&self) -> Vec<String> {
        self.clips.keys().cloned().collect()
    }

    fn variant_names(&self, clip: &str) -> StoreResult<Vec<String>> {
        let variants = self
            .clips
            .get(clip)
            .ok_or_else(|| StoreError::missing_key(clip))?;
        Ok(variants.keys().cloned().collect())
    }

    fn collection_names(&self, clip: &str, variant: &str) -> StoreResult<Vec<String>> {
        let variants = self
            .clips
            .get(clip)
            .ok_or_else(|| StoreError::missing_key(clip))?;
        let leaves = variants
            .get(variant)
            .ok_or_else(|| StoreError::missing_key(format!("{clip}/{variant}")))?;
        Ok(leaves.keys().cloned().collect())
    }

    fn record_count(&self, path: &LeafPath) -> StoreResult<usize> {
        let leaf = self.leaf(path)?;
        Ok(leaf.data.len() / leaf.record_size())
    }

    fn read_record(&self, path: &LeafPath, index: usize) -> StoreResult<RawRecord> {
        let leaf = self.leaf(path)?;
        let count = leaf.data.len() / leaf.record_size();
        if index >= count {
            return Err(StoreError::RecordOutOfRange { index, count });
        }

        let size = leaf.record_size();
        let start = index * size;
        Ok(RawRecord {
            height: leaf.height,
            width: leaf.width,
            channels: leaf.channels,
            data: leaf.data[start..start + size].to_vec(),
        })
    }
}
