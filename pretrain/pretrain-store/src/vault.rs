//! Vault container format support.
//!
//! A vault is a single file holding a nested tree of named record
//! collections: outer *clip* groups, *variant* groups under them, and leaf
//! collections of fixed-shape 8-bit image records. The table of contents
//! lives entirely at the front of the file, so opening a vault reads
//! metadata only — record payloads are touched exclusively by
//! [`Vault::read_record`].
//!
//! # Binary Format
//!
//! All integers are little-endian. Names are a `u16` byte length followed by
//! UTF-8 bytes.
//!
//! ```text
//! UINT8[4]     – Magic "FVLT"
//! UINT16       – Format version (currently 1)
//! UINT32       – Clip group count
//! foreach clip
//!     NAME     – Clip name
//!     UINT32   – Variant group count
//!     foreach variant
//!         NAME     – Variant name
//!         UINT32   – Leaf collection count
//!         foreach leaf
//!             NAME   – Collection name
//!             UINT64 – Record count
//!             UINT32 – Height
//!             UINT32 – Width
//!             UINT32 – Channels
//!             UINT64 – Absolute payload offset
//! end
//! payload      – Tightly packed H×W×C u8 records; record i of a leaf
//!                starts at payload_offset + i * height*width*channels
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::{LeafPath, RawRecord};
use crate::store::HierarchicalStore;

/// File extension recognized as a vault container.
pub const VAULT_EXTENSION: &str = "vault";

/// Vault magic bytes.
pub(crate) const MAGIC: [u8; 4] = *b"FVLT";

/// Current format version.
pub(crate) const FORMAT_VERSION: u16 = 1;

/// Table-of-contents entry for one leaf collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafMeta {
    /// Number of records in the collection.
    pub record_count: u64,

    /// Record height in pixels.
    pub height: u32,

    /// Record width in pixels.
    pub width: u32,

    /// Number of channels per record.
    pub channels: u32,

    /// Absolute byte offset of the first record's payload.
    pub payload_offset: u64,
}

impl LeafMeta {
    /// Size of one record's payload in bytes.
    #[must_use]
    pub const fn record_size(&self) -> u64 {
        (self.height as u64) * (self.width as u64) * (self.channels as u64)
    }
}

type VariantMap = BTreeMap<String, BTreeMap<String, LeafMeta>>;

/// An open vault container.
///
/// Holds the parsed table of contents and the file path. Record reads open
/// an independent file handle per call and never share a cursor, so a
/// `Vault` can be used from multiple threads at once.
///
/// # Example
///
/// ```no_run
/// use pretrain_store::{HierarchicalStore, LeafPath, Vault};
///
/// let vault = Vault::open("clips_000.vault").unwrap();
/// let path = LeafPath::new("clip_0007", "rgb", "frames");
/// let n = vault.record_count(&path).unwrap();
/// println!("{n} frames");
/// ```
#[derive(Debug, Clone)]
pub struct Vault {
    path: PathBuf,
    clips: BTreeMap<String, VariantMap>,
}

impl Vault {
    /// Opens a vault and parses its table of contents.
    ///
    /// Record payloads are not read; the cost of `open` is proportional to
    /// the table of contents alone.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist or cannot be read
    /// - The magic bytes or format version are wrong
    /// - The table of contents is malformed, truncated, declares a
    ///   zero-dimension shape, or describes payloads past the end of file
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                StoreError::Io(e)
            }
        })?;
        let file_len = file.metadata()?.len();
        let mut reader = TocReader::new(BufReader::new(file));

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(StoreError::BadMagic { found: magic });
        }

        let version = reader.read_u16()?;
        if version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion { version });
        }

        let clip_count = reader.read_u32()?;
        let mut clips: BTreeMap<String, VariantMap> = BTreeMap::new();
        let mut leaf_total = 0usize;

        for _ in 0..clip_count {
            let clip_name = reader.read_name()?;
            let variant_count = reader.read_u32()?;
            let mut variants: VariantMap = BTreeMap::new();

            for _ in 0..variant_count {
                let variant_name = reader.read_name()?;
                let leaf_count = reader.read_u32()?;
                let mut leaves: BTreeMap<String, LeafMeta> = BTreeMap::new();

                for _ in 0..leaf_count {
                    let leaf_name = reader.read_name()?;
                    let meta = LeafMeta {
                        record_count: reader.read_u64()?,
                        height: reader.read_u32()?,
                        width: reader.read_u32()?,
                        channels: reader.read_u32()?,
                        payload_offset: reader.read_u64()?,
                    };

                    if meta.height == 0 || meta.width == 0 || meta.channels == 0 {
                        return Err(StoreError::InvalidShape {
                            height: meta.height,
                            width: meta.width,
                            channels: meta.channels,
                        });
                    }

                    let payload_len = meta
                        .record_count
                        .checked_mul(meta.record_size())
                        .ok_or_else(|| StoreError::invalid_toc("payload size overflows u64"))?;
                    let payload_end = meta.payload_offset.checked_add(payload_len).ok_or_else(
                        || StoreError::invalid_toc("payload offset overflows u64"),
                    )?;
                    if payload_end > file_len {
                        return Err(StoreError::invalid_toc(format!(
                            "leaf {clip_name}/{variant_name}/{leaf_name} payload extends past end of file"
                        )));
                    }

                    if leaves.insert(leaf_name.clone(), meta).is_some() {
                        return Err(StoreError::DuplicateKey {
                            key: format!("{clip_name}/{variant_name}/{leaf_name}"),
                        });
                    }
                    leaf_total += 1;
                }

                if variants.insert(variant_name.clone(), leaves).is_some() {
                    return Err(StoreError::DuplicateKey {
                        key: format!("{clip_name}/{variant_name}"),
                    });
                }
            }

            if clips.insert(clip_name.clone(), variants).is_some() {
                return Err(StoreError::DuplicateKey { key: clip_name });
            }
        }

        debug!(
            "opened vault {}: {} clips, {} leaf collections",
            path.display(),
            clips.len(),
            leaf_total
        );

        Ok(Self {
            path: path.to_path_buf(),
            clips,
        })
    }

    /// Path this vault was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Table-of-contents entry for the leaf collection at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingKey`] naming the first component of the
    /// path that does not exist.
    pub fn leaf_meta(&self, path: &LeafPath) -> StoreResult<&LeafMeta> {
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

impl HierarchicalStore for Vault {
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
        let meta = self.leaf_meta(path)?;
        usize::try_from(meta.record_count)
            .map_err(|_| StoreError::invalid_toc("record count exceeds addressable range"))
    }

    fn read_record(&self, path: &LeafPath, index: usize) -> StoreResult<RawRecord> {
        let meta = self.leaf_meta(path)?;
        let count = usize::try_from(meta.record_count)
            .map_err(|_| StoreError::invalid_toc("record count exceeds addressable range"))?;
        if index >= count {
            return Err(StoreError::RecordOutOfRange { index, count });
        }

        #[allow(clippy::cast_possible_truncation)]
        // Truncation: record_size is bounded by the file length check at open
        let record_size = meta.record_size() as usize;
        let offset = meta.payload_offset + (index as u64) * meta.record_size();

        // Independent handle per call; no shared cursor across readers.
        let mut file = File::open(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::FileNotFound {
                    path: self.path.clone(),
                }
            } else {
                StoreError::Io(e)
            }
        })?;
        file.seek(SeekFrom::Start(offset))?;

        let mut data = vec![0u8; record_size];
        file.read_exact(&mut data).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                StoreError::UnexpectedEof { position: offset }
            } else {
                StoreError::Io(e)
            }
        })?;

        Ok(RawRecord {
            height: meta.height,
            width: meta.width,
            channels: meta.channels,
            data,
        })
    }
}

/// Positioned reader over the table of contents.
struct TocReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> TocReader<R> {
    const fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> StoreResult<()> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                StoreError::UnexpectedEof {
                    position: self.position,
                }
            } else {
                StoreError::Io(e)
            }
        })?;
        self.position += buf.len() as u64;
        Ok(())
    }

    fn read_u16(&mut self) -> StoreResult<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32(&mut self) -> StoreResult<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_u64(&mut self) -> StoreResult<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn read_name(&mut self) -> StoreResult<String> {
        let len = self.read_u16()? as usize;
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}
