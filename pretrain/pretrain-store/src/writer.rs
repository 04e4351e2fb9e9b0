//! Vault writer for ingest tooling and test fixtures.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{StoreError, StoreResult};
use crate::vault::{FORMAT_VERSION, MAGIC};

/// One buffered leaf collection awaiting serialization.
#[derive(Debug, Clone)]
struct PendingLeaf {
    height: u32,
    width: u32,
    channels: u32,
    data: Vec<u8>,
}

impl PendingLeaf {
    const fn record_size(&self) -> usize {
        (self.height as usize) * (self.width as usize) * (self.channels as usize)
    }

    fn record_count(&self) -> u64 {
        (self.data.len() / self.record_size()) as u64
    }
}

/// Buffered builder for vault container files.
///
/// Leaves are accumulated in memory and written in one pass by [`save`],
/// which lays the full table of contents at the front of the file followed
/// by the packed record payloads. Keys are written in lexicographic order
/// regardless of insertion order.
///
/// [`save`]: VaultWriter::save
///
/// # Example
///
/// ```no_run
/// use pretrain_store::VaultWriter;
///
/// let mut writer = VaultWriter::new();
/// // Two 2x2 RGB records.
/// writer
///     .add_leaf("clip_0000", "rgb", "frames", 2, 2, 3, vec![0u8; 24])
///     .unwrap();
/// writer.save("clips_000.vault").unwrap();
/// ```
#[derive(Debug, Default)]
pub struct VaultWriter {
    clips: BTreeMap<String, BTreeMap<String, BTreeMap<String, PendingLeaf>>>,
}

impl VaultWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a leaf collection of packed H×W×C records.
    ///
    /// `data` holds all records back to back; the record count is derived
    /// from its length.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any dimension is zero
    /// - `data` is not a whole number of records
    /// - The leaf path was already added
    /// - A group or collection name does not fit the format's length field
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
        let (clip, variant, collection) = (clip.into(), variant.into(), collection.into());
        for name in [&clip, &variant, &collection] {
            if name.len() > usize::from(u16::MAX) {
                return Err(StoreError::invalid_toc(format!(
                    "name too long for format: {} bytes",
                    name.len()
                )));
            }
        }

        if height == 0 || width == 0 || channels == 0 {
            return Err(StoreError::InvalidShape {
                height,
                width,
                channels,
            });
        }

        let leaf = PendingLeaf {
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

    /// Total number of buffered leaf collections.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.clips
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    /// Writes the vault to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> StoreResult<()> {
        let toc_size = self.toc_size();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(&MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        #[allow(clippy::cast_possible_truncation)]
        // Truncation: group and leaf counts are bounded far below u32::MAX
        {
            writer.write_all(&(self.clips.len() as u32).to_le_bytes())?;

            let mut payload_offset = toc_size as u64;
            for (clip_name, variants) in &self.clips {
                write_name(&mut writer, clip_name)?;
                writer.write_all(&(variants.len() as u32).to_le_bytes())?;
                for (variant_name, leaves) in variants {
                    write_name(&mut writer, variant_name)?;
                    writer.write_all(&(leaves.len() as u32).to_le_bytes())?;
                    for (leaf_name, leaf) in leaves {
                        write_name(&mut writer, leaf_name)?;
                        writer.write_all(&leaf.record_count().to_le_bytes())?;
                        writer.write_all(&leaf.height.to_le_bytes())?;
                        writer.write_all(&leaf.width.to_le_bytes())?;
                        writer.write_all(&leaf.channels.to_le_bytes())?;
                        writer.write_all(&payload_offset.to_le_bytes())?;
                        payload_offset += leaf.data.len() as u64;
                    }
                }
            }
        }

        for variants in self.clips.values() {
            for leaves in variants.values() {
                for leaf in leaves.values() {
                    writer.write_all(&leaf.data)?;
                }
            }
        }

        writer.flush()?;
        Ok(())
    }

    /// Byte size of the serialized table of contents.
    fn toc_size(&self) -> usize {
        // magic + version + clip count
        let mut size = 4 + 2 + 4;
        for (clip_name, variants) in &self.clips {
            size += 2 + clip_name.len() + 4;
            for (variant_name, leaves) in variants {
                size += 2 + variant_name.len() + 4;
                for leaf_name in leaves.keys() {
                    // name + record count + dims + payload offset
                    size += 2 + leaf_name.len() + 8 + 12 + 8;
                }
            }
        }
        size
    }
}

fn write_name<W: Write>(writer: &mut W, name: &str) -> StoreResult<()> {
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: name length is validated against u16::MAX in add_leaf
    writer.write_all(&(name.len() as u16).to_le_bytes())?;
    writer.write_all(name.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LeafPath;
    use crate::store::HierarchicalStore;
    use crate::vault::Vault;

    fn sequential_bytes(n: usize) -> Vec<u8> {
        (0..n).map(|i| u8::try_from(i % 256).unwrap()).collect()
    }

    #[test]
    fn roundtrip_single_leaf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.vault");

        let mut writer = VaultWriter::new();
        let data = sequential_bytes(5 * 2 * 2 * 3);
        writer
            .add_leaf("clip_a", "rgb", "frames", 2, 2, 3, data.clone())
            .unwrap();
        writer.save(&path).unwrap();

        let vault = Vault::open(&path).unwrap();
        assert_eq!(vault.clip_names(), vec!["clip_a"]);
        assert_eq!(vault.variant_names("clip_a").unwrap(), vec!["rgb"]);
        assert_eq!(
            vault.collection_names("clip_a", "rgb").unwrap(),
            vec!["frames"]
        );

        let leaf = LeafPath::new("clip_a", "rgb", "frames");
        assert_eq!(vault.record_count(&leaf).unwrap(), 5);

        let record = vault.read_record(&leaf, 2).unwrap();
        assert_eq!(record.shape(), [2, 2, 3]);
        assert_eq!(record.data, data[24..36]);
    }

    #[test]
    fn roundtrip_multiple_groups_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multi.vault");

        let mut writer = VaultWriter::new();
        // Inserted out of order; the file and reader are both sorted.
        writer
            .add_leaf("zebra", "rgb", "frames", 1, 1, 1, vec![9])
            .unwrap();
        writer
            .add_leaf("alpha", "rgb", "frames", 1, 1, 1, vec![1, 2])
            .unwrap();
        writer
            .add_leaf("alpha", "depth", "frames", 1, 1, 1, vec![3])
            .unwrap();
        writer.save(&path).unwrap();

        let vault = Vault::open(&path).unwrap();
        assert_eq!(vault.clip_names(), vec!["alpha", "zebra"]);
        assert_eq!(
            vault.variant_names("alpha").unwrap(),
            vec!["depth", "rgb"]
        );

        let record = vault
            .read_record(&LeafPath::new("alpha", "rgb", "frames"), 1)
            .unwrap();
        assert_eq!(record.data, vec![2]);
    }

    #[test]
    fn roundtrip_empty_vault() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.vault");

        VaultWriter::new().save(&path).unwrap();
        let vault = Vault::open(&path).unwrap();
        assert!(vault.clip_names().is_empty());
    }

    #[test]
    fn record_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.vault");

        let mut writer = VaultWriter::new();
        writer
            .add_leaf("clip_a", "rgb", "frames", 1, 1, 1, vec![0, 1, 2])
            .unwrap();
        writer.save(&path).unwrap();

        let vault = Vault::open(&path).unwrap();
        let leaf = LeafPath::new("clip_a", "rgb", "frames");
        let err = vault.read_record(&leaf, 3).unwrap_err();
        assert!(matches!(
            err,
            StoreError::RecordOutOfRange { index: 3, count: 3 }
        ));
    }

    #[test]
    fn rejects_partial_record_payload() {
        let mut writer = VaultWriter::new();
        let err = writer
            .add_leaf("clip_a", "rgb", "frames", 2, 2, 3, vec![0u8; 25])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload { .. }));
    }

    #[test]
    fn rejects_zero_dimension() {
        let mut writer = VaultWriter::new();
        let err = writer
            .add_leaf("clip_a", "rgb", "frames", 0, 2, 3, vec![])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidShape { .. }));
    }

    #[test]
    fn rejects_duplicate_leaf() {
        let mut writer = VaultWriter::new();
        writer
            .add_leaf("clip_a", "rgb", "frames", 1, 1, 1, vec![0])
            .unwrap();
        let err = writer
            .add_leaf("clip_a", "rgb", "frames", 1, 1, 1, vec![1])
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        assert_eq!(writer.leaf_count(), 1);
    }
}
