pub mod name;
mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the folder hierarchy interface.
///
/// Every mutation keeps the closure table (`paths`) equal to the transitive
/// closure of the `parent_id` pointers, and runs as one transaction.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Folder operations
    fn create_folder(&self, name: &str, parent_id: Option<i64>) -> Result<Folder>;
    fn get_folder(&self, id: i64) -> Result<Option<Folder>>;
    fn list_roots(&self) -> Result<Vec<Folder>>;
    fn rename_folder(&self, id: i64, name: &str) -> Result<Folder>;
    /// Reparents the folder and its subtree. `None` makes it a root.
    fn move_folder(&self, id: i64, new_parent_id: Option<i64>) -> Result<Folder>;
    /// Returns `false` when the folder does not exist.
    fn delete_folder(&self, id: i64) -> Result<bool>;

    // Hierarchy queries
    fn children(&self, id: i64) -> Result<Vec<Folder>>;
    fn siblings(&self, id: i64) -> Result<Vec<Folder>>;
    /// Strict ancestors, root first.
    fn ancestors(&self, id: i64) -> Result<Vec<Folder>>;
    /// Strict descendants, nearest first.
    fn descendants(&self, id: i64) -> Result<Vec<Folder>>;
    fn depth(&self, id: i64) -> Result<i64>;

    // Closure table maintenance
    fn list_paths(&self) -> Result<Vec<PathEdge>>;
    fn rebuild_paths(&self) -> Result<usize>;

    fn close(&self) -> Result<()>;
}
