//! Flat random-access sample index over vault containers.
//!
//! This crate turns a directory of hierarchical array containers into one
//! zero-based addressable sequence of samples:
//!
//! # Index Construction
//!
//! - [`build_index`] - One-time scan producing the immutable table, with an
//!   optional sample cap and early-exit enumeration
//! - [`build_index_with`] - Generic form over any
//!   [`HierarchicalStore`](pretrain_store::HierarchicalStore)
//! - [`discover_containers`] - Sorted container discovery by extension
//!
//! # Lookup
//!
//! - [`SampleIndex`] - Ordered range table; binary-search [`locate`]
//! - [`IndexEntry`] - One leaf collection's `[start, end)` global range
//!
//! [`locate`]: SampleIndex::locate
//!
//! # Persistence
//!
//! Tables serialize to JSON ([`SampleIndex::to_json`] /
//! [`SampleIndex::from_json`]) so a scan can be reused across runs without
//! touching the containers again.
//!
//! # Example
//!
//! ```no_run
//! use pretrain_index::build_index;
//!
//! let index = build_index("/data/clips", None).unwrap();
//! let (entry, local) = index.locate(4_321).unwrap();
//! println!("{} record {local}", entry.leaf_path());
//! ```
//!
//! # Quality Standards
//!
//! - Zero clippy/doc warnings
//! - Zero `unwrap`/`expect` in library code

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod builder;
mod entry;
mod error;
mod table;

pub use builder::{build_index, build_index_with, discover_containers};
pub use entry::IndexEntry;
pub use error::{IndexError, IndexResult};
pub use table::SampleIndex;
