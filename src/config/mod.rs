mod hierarchy;

pub use hierarchy::{DeletePolicy, HierarchyConfig};
