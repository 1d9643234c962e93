use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

impl Folder {
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// One row of the closure table. `depth` is the number of parent links
/// between the two folders, 0 for the self row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathEdge {
    pub ancestor_id: i64,
    pub descendant_id: i64,
    pub depth: i64,
}

impl PathEdge {
    #[must_use]
    pub fn new(ancestor_id: i64, descendant_id: i64, depth: i64) -> Self {
        Self {
            ancestor_id,
            descendant_id,
            depth,
        }
    }

    #[must_use]
    pub fn is_self(&self) -> bool {
        self.depth == 0
    }
}
