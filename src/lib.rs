//! # Foldertree
//!
//! A folder hierarchy persisted in SQLite with a closure table, usable both as
//! a library and through the `foldertree` binary.
//!
//! Every ancestor/descendant pair is stored as a `paths` row together with its
//! depth, so ancestor, descendant, child and sibling lookups are single joins.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! foldertree = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use foldertree::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/folders.db").unwrap();
//! store.initialize().unwrap();
//!
//! let root = store.create_folder("Acme Adventures", None).unwrap();
//! let outdoors = store.create_folder("Outdoors", Some(root.id)).unwrap();
//! let ancestors = store.ancestors(outdoors.id).unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `foldertree` binary. Disable with `default-features = false`.

pub mod config;
pub mod error;
pub mod store;
pub mod types;
