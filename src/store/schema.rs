pub const SCHEMA: &str = r#"
-- Folder rows; parent_id is NULL for roots
CREATE TABLE IF NOT EXISTS folders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    parent_id INTEGER
);

-- Closure table: one row per ancestor/descendant pair, including (id, id, 0)
CREATE TABLE IF NOT EXISTS paths (
    ancestor_id INTEGER NOT NULL,
    descendant_id INTEGER NOT NULL,
    depth INTEGER NOT NULL,
    PRIMARY KEY (ancestor_id, descendant_id)
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_folders_parent ON folders(parent_id);
CREATE INDEX IF NOT EXISTS idx_paths_descendant ON paths(descendant_id);
"#;
