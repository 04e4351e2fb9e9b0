//! Hierarchical array container storage for pretraining pipelines.
//!
//! This crate provides the storage layer under the sample index:
//!
//! # Storage Contract
//!
//! - [`HierarchicalStore`] - The three-operation read contract: child-key
//!   enumeration, metadata-only record counts, single-record reads
//! - [`LeafPath`] - Address of one leaf record-collection inside a container
//! - [`RawRecord`] - One H×W×C 8-bit record exactly as stored
//!
//! # Vault Containers
//!
//! - [`Vault`] - On-disk container with a metadata-only table of contents
//! - [`VaultWriter`] - Builder for writing vault files
//! - [`LeafMeta`] - Table-of-contents entry for one leaf collection
//!
//! # Testing Support
//!
//! - [`MemoryStore`] - In-memory store with vault enumeration semantics
//!
//! # Design Philosophy
//!
//! Opening a container parses metadata only; record payloads are read one at
//! a time through independent per-call file handles, so stores can be shared
//! across worker threads without any coordination. Higher layers (index
//! construction, dataset access) depend on [`HierarchicalStore`] alone, not
//! on the vault format.
//!
//! # Quality Standards
//!
//! - Zero clippy/doc warnings
//! - Zero `unwrap`/`expect` in library code

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod memory;
mod record;
mod store;
mod vault;
mod writer;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use record::{LeafPath, RawRecord};
pub use store::HierarchicalStore;
pub use vault::{LeafMeta, Vault, VAULT_EXTENSION};
pub use writer::VaultWriter;
