//! Random-access sample dataset over indexed vault containers.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use pretrain_index::{build_index, SampleIndex};
use pretrain_store::{HierarchicalStore, StoreError, Vault};

use crate::error::{DatasetError, Result};
use crate::image::{ChwImage, PairedImage};
use crate::transform::TwoViewTransform;

/// One dataset access result.
///
/// Which variant comes back is fixed at dataset construction: paired
/// datasets always return [`SampleView::Paired`], unpaired datasets always
/// return [`SampleView::Single`]. Callers can branch once on
/// [`ContrastiveDataset::has_transform`] instead of per sample.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleView {
    /// The canonical sample, untransformed; shape `[C, H, W]`.
    Single(ChwImage),

    /// Two independently transformed views; shape `[2, C, H, W]`.
    Paired(PairedImage),
}

impl SampleView {
    /// Returns `true` for the paired variant.
    #[must_use]
    pub const fn is_paired(&self) -> bool {
        matches!(self, Self::Paired(_))
    }

    /// Consumes the view, returning the canonical sample if unpaired.
    #[must_use]
    pub fn into_single(self) -> Option<ChwImage> {
        match self {
            Self::Single(image) => Some(image),
            Self::Paired(_) => None,
        }
    }

    /// Consumes the view, returning the stacked pair if paired.
    #[must_use]
    pub fn into_paired(self) -> Option<PairedImage> {
        match self {
            Self::Single(_) => None,
            Self::Paired(paired) => Some(paired),
        }
    }
}

/// Random-access dataset over a directory of vault containers.
///
/// Construction scans the containers once and builds an immutable
/// [`SampleIndex`]; every access resolves its global position through that
/// table, reads exactly one record from the owning container, converts it
/// to the canonical channel-first layout and — in paired mode — runs the
/// injected two-view transform.
///
/// Parsed container tables of contents are cached behind a mutex and
/// re-opened lazily after [`close`]. Record payload reads use independent
/// per-call file handles, so a shared dataset serves concurrent readers
/// without coordination beyond that cache lock.
///
/// [`close`]: ContrastiveDataset::close
///
/// # Example
///
/// ```no_run
/// use pretrain_dataset::{ContrastiveDataset, MirrorJitter};
///
/// let dataset =
///     ContrastiveDataset::open_paired("/data/clips", None, MirrorJitter::new(0.5, 2.0, Some(42)))
///         .unwrap();
///
/// let view = dataset.get(0).unwrap();
/// assert!(view.is_paired());
/// ```
pub struct ContrastiveDataset {
    index: SampleIndex,
    transform: Option<Box<dyn TwoViewTransform>>,
    vaults: Mutex<HashMap<PathBuf, Arc<Vault>>>,
}

impl ContrastiveDataset {
    /// Opens an unpaired dataset: accesses return the canonical sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the index build fails (unscannable root,
    /// unreadable or corrupt container).
    pub fn open<P: AsRef<Path>>(root: P, max_samples: Option<usize>) -> Result<Self> {
        Ok(Self::from_index(build_index(root, max_samples)?))
    }

    /// Opens a paired dataset: accesses return two transformed views.
    ///
    /// The pairing mode is fixed for the dataset's lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the index build fails.
    pub fn open_paired<P, T>(root: P, max_samples: Option<usize>, transform: T) -> Result<Self>
    where
        P: AsRef<Path>,
        T: TwoViewTransform + 'static,
    {
        Ok(Self::from_index_paired(
            build_index(root, max_samples)?,
            transform,
        ))
    }

    /// Wraps a pre-built index in an unpaired dataset.
    #[must_use]
    pub fn from_index(index: SampleIndex) -> Self {
        Self {
            index,
            transform: None,
            vaults: Mutex::new(HashMap::new()),
        }
    }

    /// Wraps a pre-built index in a paired dataset.
    #[must_use]
    pub fn from_index_paired<T: TwoViewTransform + 'static>(
        index: SampleIndex,
        transform: T,
    ) -> Self {
        Self {
            index,
            transform: Some(Box::new(transform)),
            vaults: Mutex::new(HashMap::new()),
        }
    }

    /// Total number of addressable samples.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the dataset addresses no samples.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if accesses return paired views.
    ///
    /// Fixed at construction; never changes per call.
    #[must_use]
    pub const fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    /// The underlying index table.
    #[must_use]
    pub const fn index(&self) -> &SampleIndex {
        &self.index
    }

    /// Retrieves the sample at `global_index`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `global_index` is past the end of the dataset (the index is never
    ///   clamped)
    /// - The owning container cannot be opened or the record read fails —
    ///   scoped to this access, the table stays valid
    /// - The record payload disagrees with its declared shape
    /// - The injected transform fails
    pub fn get(&self, global_index: usize) -> Result<SampleView> {
        let (entry, local_index) =
            self.index
                .locate(global_index)
                .ok_or(DatasetError::IndexOutOfRange {
                    index: global_index,
                    len: self.index.len(),
                })?;

        let vault = self.vault(&entry.container)?;
        let leaf = entry.leaf_path();
        let record = vault
            .read_record(&leaf, local_index)
            .map_err(|source| match source {
                StoreError::InvalidShape {
                    height,
                    width,
                    channels,
                } => DatasetError::record_shape(format!(
                    "{leaf} declares {height}x{width}x{channels}"
                )),
                source => DatasetError::RecordRead {
                    container: entry.container.clone(),
                    path: leaf.to_string(),
                    local_index,
                    source,
                },
            })?;

        let image = ChwImage::from_hwc(&record)?;
        match &self.transform {
            Some(transform) => {
                let (first, second) = transform.two_views(&image)?;
                Ok(SampleView::Paired(PairedImage::stack(first, second)?))
            }
            None => Ok(SampleView::Single(image)),
        }
    }

    /// Releases all cached container handles.
    ///
    /// Safe to call any number of times, including before the first access;
    /// later accesses lazily reopen what they need.
    pub fn close(&self) {
        let mut cache = self.vaults.lock().unwrap_or_else(PoisonError::into_inner);
        if !cache.is_empty() {
            debug!("releasing {} cached container handles", cache.len());
        }
        cache.clear();
    }

    /// Returns the cached handle for `container`, opening it on a miss.
    fn vault(&self, container: &Path) -> Result<Arc<Vault>> {
        let mut cache = self.vaults.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(vault) = cache.get(container) {
            return Ok(Arc::clone(vault));
        }

        debug!("opening container {}", container.display());
        let vault = Vault::open(container).map_err(|source| DatasetError::StoreOpen {
            container: container.to_path_buf(),
            source,
        })?;
        let vault = Arc::new(vault);
        cache.insert(container.to_path_buf(), Arc::clone(&vault));
        Ok(vault)
    }
}

impl fmt::Debug for ContrastiveDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContrastiveDataset")
            .field("samples", &self.index.len())
            .field("entries", &self.index.entry_count())
            .field("paired", &self.has_transform())
            .finish_non_exhaustive()
    }
}
