//! One-time index construction over a set of containers.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use pretrain_store::{
    HierarchicalStore, LeafPath, StoreError, StoreResult, Vault, VAULT_EXTENSION,
};

use crate::entry::IndexEntry;
use crate::error::{IndexError, IndexResult};
use crate::table::SampleIndex;

/// Lists the vault containers under `root`, lexicographically sorted.
///
/// Only regular files whose extension matches
/// [`VAULT_EXTENSION`] are returned; everything else in the directory is
/// ignored.
///
/// # Errors
///
/// Returns an error if `root` is not a directory or cannot be read.
pub fn discover_containers<P: AsRef<Path>>(root: P) -> IndexResult<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(IndexError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut containers = Vec::new();
    for dir_entry in std::fs::read_dir(root)? {
        let path = dir_entry?.path();
        if path.is_file() && path.extension().and_then(OsStr::to_str) == Some(VAULT_EXTENSION) {
            containers.push(path);
        }
    }
    containers.sort();
    Ok(containers)
}

/// Scans the vaults under `root` and builds the sample index.
///
/// Containers are visited in sorted-name order; within each container, clip
/// groups, variant groups and leaf collections are each visited in
/// lexicographic order. That enumeration order is the canonical global
/// ordering and is reproducible across builds of an unmodified store.
///
/// With `max_samples` set, the last admitted leaf collection is truncated to
/// fit the cap and enumeration stops immediately — containers past that
/// point are never opened, which keeps build cost bounded on large stores.
///
/// # Errors
///
/// Returns an error if `root` cannot be scanned or any visited container is
/// unreadable or corrupt. A bad container aborts the whole build; there is
/// no silent skipping.
///
/// # Example
///
/// ```no_run
/// use pretrain_index::build_index;
///
/// let index = build_index("/data/clips", Some(1_000_000)).unwrap();
/// println!("{} samples, {} entries", index.len(), index.entry_count());
/// ```
pub fn build_index<P: AsRef<Path>>(
    root: P,
    max_samples: Option<usize>,
) -> IndexResult<SampleIndex> {
    let containers = discover_containers(root)?;
    build_index_with(&containers, max_samples, |path| Vault::open(path))
}

/// Builds the sample index over explicit containers using a custom store.
///
/// `open` is called once per visited container. This is the generic form of
/// [`build_index`]; it carries the same enumeration order, cap and failure
/// semantics, and is what tests and alternative store backends drive.
///
/// # Errors
///
/// Returns [`IndexError::StoreOpen`] naming the container if `open` or any
/// metadata query on the opened store fails.
pub fn build_index_with<S, F>(
    containers: &[PathBuf],
    max_samples: Option<usize>,
    open: F,
) -> IndexResult<SampleIndex>
where
    S: HierarchicalStore,
    F: Fn(&Path) -> StoreResult<S>,
{
    let mut entries: Vec<IndexEntry> = Vec::new();
    let mut total = 0usize;

    'containers: for container in containers {
        if reached_cap(total, max_samples) {
            break;
        }

        let store = open(container).map_err(|source| store_open(container, source))?;

        for clip in store.clip_names() {
            let variants = store
                .variant_names(&clip)
                .map_err(|source| store_open(container, source))?;
            for variant in variants {
                let collections = store
                    .collection_names(&clip, &variant)
                    .map_err(|source| store_open(container, source))?;
                for collection in collections {
                    let path = LeafPath::new(clip.clone(), variant.clone(), collection);
                    let count = store
                        .record_count(&path)
                        .map_err(|source| store_open(container, source))?;
                    if count == 0 {
                        continue;
                    }

                    // The cap checks below guarantee total < cap here, so the
                    // admitted slice is never empty.
                    let take = match max_samples {
                        Some(cap) => count.min(cap - total),
                        None => count,
                    };
                    entries.push(IndexEntry::new(
                        container.clone(),
                        path,
                        total,
                        total + take,
                    ));
                    total += take;

                    if reached_cap(total, max_samples) {
                        debug!("sample cap reached at {total}, stopping enumeration");
                        break 'containers;
                    }
                }
            }
        }

        debug!("indexed container {}", container.display());
    }

    info!(
        "built sample index: {} samples across {} entries",
        total,
        entries.len()
    );
    Ok(SampleIndex::from_parts(entries, total))
}

fn reached_cap(total: usize, max_samples: Option<usize>) -> bool {
    max_samples.is_some_and(|cap| total >= cap)
}

fn store_open(container: &Path, source: StoreError) -> IndexError {
    IndexError::StoreOpen {
        container: container.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use std::io::Write;

    use pretrain_store::{MemoryStore, VaultWriter};

    /// Two containers: `a.vault` with one leaf of 5 records, `b.vault` with
    /// leaves of 3 and 4 records under one clip.
    fn two_container_fixture() -> BTreeMap<PathBuf, MemoryStore> {
        let mut a = MemoryStore::new();
        a.add_leaf("clip_a", "rgb", "frames", 1, 1, 1, vec![0; 5])
            .unwrap();

        let mut b = MemoryStore::new();
        b.add_leaf("clip_b", "rgb", "frames", 1, 1, 1, vec![0; 3])
            .unwrap();
        b.add_leaf("clip_b", "rgb", "masks", 1, 1, 1, vec![0; 4])
            .unwrap();

        let mut stores = BTreeMap::new();
        stores.insert(PathBuf::from("a.vault"), a);
        stores.insert(PathBuf::from("b.vault"), b);
        stores
    }

    fn opener<'a>(
        stores: &'a BTreeMap<PathBuf, MemoryStore>,
        opened: &'a Cell<usize>,
    ) -> impl Fn(&Path) -> StoreResult<MemoryStore> + 'a {
        move |path| {
            opened.set(opened.get() + 1);
            stores.get(path).cloned().ok_or(StoreError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
    }

    #[test]
    fn builds_contiguous_table() {
        let stores = two_container_fixture();
        let containers: Vec<PathBuf> = stores.keys().cloned().collect();
        let opened = Cell::new(0);

        let index = build_index_with(&containers, None, opener(&stores, &opened)).unwrap();

        assert_eq!(index.len(), 12);
        assert_eq!(index.entry_count(), 3);
        assert_eq!(opened.get(), 2);
        index.validate().unwrap();

        // b.vault's leaves enumerate lexicographically: frames before masks.
        let entries = index.entries();
        assert_eq!(entries[0].container, PathBuf::from("a.vault"));
        assert_eq!((entries[0].start, entries[0].end), (0, 5));
        assert_eq!(entries[1].collection, "frames");
        assert_eq!((entries[1].start, entries[1].end), (5, 8));
        assert_eq!(entries[2].collection, "masks");
        assert_eq!((entries[2].start, entries[2].end), (8, 12));
    }

    #[test]
    fn cap_truncates_and_stops_enumeration() {
        let stores = two_container_fixture();
        let containers: Vec<PathBuf> = stores.keys().cloned().collect();
        let opened = Cell::new(0);

        let index = build_index_with(&containers, Some(6), opener(&stores, &opened)).unwrap();

        assert_eq!(index.len(), 6);
        assert_eq!(index.entry_count(), 2);
        // b's first leaf is truncated from 3 records to 1.
        let last = &index.entries()[1];
        assert_eq!((last.start, last.end), (5, 6));
        index.validate().unwrap();
    }

    #[test]
    fn cap_skips_unvisited_containers() {
        let stores = two_container_fixture();
        // A third container that would fail to open — the cap must stop
        // enumeration before it is ever visited.
        let mut containers: Vec<PathBuf> = stores.keys().cloned().collect();
        containers.push(PathBuf::from("c_unreadable.vault"));
        let opened = Cell::new(0);

        let index = build_index_with(&containers, Some(12), opener(&stores, &opened)).unwrap();

        assert_eq!(index.len(), 12);
        assert_eq!(opened.get(), 2);
    }

    #[test]
    fn cap_of_zero_opens_nothing() {
        let stores = two_container_fixture();
        let containers: Vec<PathBuf> = stores.keys().cloned().collect();
        let opened = Cell::new(0);

        let index = build_index_with(&containers, Some(0), opener(&stores, &opened)).unwrap();

        assert!(index.is_empty());
        assert_eq!(index.entry_count(), 0);
        assert_eq!(opened.get(), 0);
    }

    #[test]
    fn unreadable_container_aborts_build() {
        let stores = two_container_fixture();
        let mut containers: Vec<PathBuf> = stores.keys().cloned().collect();
        containers.push(PathBuf::from("c_unreadable.vault"));
        let opened = Cell::new(0);

        let err = build_index_with(&containers, None, opener(&stores, &opened)).unwrap_err();
        assert!(
            matches!(err, IndexError::StoreOpen { container, .. }
                if container == PathBuf::from("c_unreadable.vault"))
        );
    }

    #[test]
    fn empty_leaves_produce_no_entries() {
        let mut store = MemoryStore::new();
        store
            .add_leaf("clip", "rgb", "empty", 1, 1, 1, Vec::new())
            .unwrap();
        store
            .add_leaf("clip", "rgb", "frames", 1, 1, 1, vec![0, 1])
            .unwrap();
        let mut stores = BTreeMap::new();
        stores.insert(PathBuf::from("a.vault"), store);
        let containers = vec![PathBuf::from("a.vault")];
        let opened = Cell::new(0);

        let index = build_index_with(&containers, None, opener(&stores, &opened)).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.entry_count(), 1);
        assert_eq!(index.entries()[0].collection, "frames");
    }

    #[test]
    fn no_containers_yields_empty_index() {
        let index = build_index_with(&[], None, |_: &Path| {
            Ok(MemoryStore::new())
        })
        .unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();

        let mut writer = VaultWriter::new();
        writer
            .add_leaf("clip", "rgb", "frames", 1, 1, 1, vec![0])
            .unwrap();
        writer.save(dir.path().join("zz_clips.vault")).unwrap();
        writer.save(dir.path().join("aa_clips.vault")).unwrap();

        // Ignored: wrong extension.
        let mut other = std::fs::File::create(dir.path().join("notes.txt")).unwrap();
        other.write_all(b"not a container").unwrap();

        let containers = discover_containers(dir.path()).unwrap();
        let names: Vec<_> = containers
            .iter()
            .filter_map(|p| p.file_name().and_then(OsStr::to_str))
            .collect();
        assert_eq!(names, vec!["aa_clips.vault", "zz_clips.vault"]);
    }

    #[test]
    fn discover_rejects_non_directory() {
        let result = discover_containers("no_such_dir_12345");
        assert!(matches!(result, Err(IndexError::NotADirectory { .. })));
    }

    #[test]
    fn file_backed_build_matches_memory_build() {
        let dir = tempfile::tempdir().unwrap();

        let mut writer = VaultWriter::new();
        writer
            .add_leaf("clip_a", "rgb", "frames", 1, 1, 1, vec![0; 5])
            .unwrap();
        writer.save(dir.path().join("a.vault")).unwrap();

        let mut writer = VaultWriter::new();
        writer
            .add_leaf("clip_b", "rgb", "frames", 1, 1, 1, vec![0; 3])
            .unwrap();
        writer
            .add_leaf("clip_b", "rgb", "masks", 1, 1, 1, vec![0; 4])
            .unwrap();
        writer.save(dir.path().join("b.vault")).unwrap();

        let index = build_index(dir.path(), None).unwrap();
        assert_eq!(index.len(), 12);
        assert_eq!(index.entry_count(), 3);
        index.validate().unwrap();
    }
}
