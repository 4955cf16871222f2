//! File entries derived from canonical project paths

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sentinel entry in a folder's allowed types that permits subfolders
pub const FOLDER_SENTINEL: &str = "folder";

/// A file touched during a traversal pass, derived from its canonical path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileEntry {
    /// Base name without extension
    pub name: String,
    /// Lowercase extension without the dot, empty when the file has none
    pub file_type: String,
    /// Base name plus lowercase extension, the string naming templates match against
    pub full_name: String,
    /// Canonical forward-slash path relative to the project root
    pub path: String,
    /// Canonical path of the owning folder
    pub folder: String,
}

impl FileEntry {
    /// Build an entry from a canonical (or backslash-separated) project path
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = normalize_path(path.as_ref());

        let (folder, file_name) = match path.rfind('/') {
            Some(index) => (path[..index].to_string(), path[index + 1..].to_string()),
            None => (String::new(), path.clone()),
        };

        let as_path = Path::new(&file_name);
        let name = as_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());
        let file_type = as_path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let full_name =
            if file_type.is_empty() { name.clone() } else { format!("{name}.{file_type}") };

        Self { name, file_type, full_name, path, folder }
    }

    /// Whether this entry carries an extension
    pub fn has_type(&self) -> bool {
        !self.file_type.is_empty()
    }
}

/// Normalize a project path to the canonical form used by folder rules
///
/// Backslashes become forward slashes, a leading `./` and trailing slashes are dropped
/// and repeated separators collapse.
pub fn normalize_path(path: &str) -> String {
    let replaced = path.replace('\\', "/");
    let trimmed = replaced.strip_prefix("./").unwrap_or(&replaced);

    trimmed
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Parent of a canonical path, `None` at the project root
pub fn parent_path(path: &str) -> Option<&str> {
    path.rfind('/').map(|index| &path[..index])
}

/// Iterate a canonical path and all of its ancestors, innermost first
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(path), |current| parent_path(current))
        .filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_from_canonical_path() {
        let entry = FileEntry::new("Assets/Scripts/SC_Player.cs");

        assert_eq!(entry.name, "SC_Player");
        assert_eq!(entry.file_type, "cs");
        assert_eq!(entry.full_name, "SC_Player.cs");
        assert_eq!(entry.folder, "Assets/Scripts");
        assert_eq!(entry.path, "Assets/Scripts/SC_Player.cs");
    }

    #[test]
    fn test_entry_lowercases_type() {
        let entry = FileEntry::new("Assets\\Art\\Hero.PNG");

        assert_eq!(entry.file_type, "png");
        assert_eq!(entry.full_name, "Hero.png");
        assert_eq!(entry.folder, "Assets/Art");
    }

    #[test]
    fn test_entry_without_extension() {
        let entry = FileEntry::new("Assets/LICENSE");
        assert!(!entry.has_type());
        assert_eq!(entry.full_name, "LICENSE");

        let dotfile = FileEntry::new("Assets/.gitkeep");
        assert_eq!(dotfile.name, ".gitkeep");
        assert_eq!(dotfile.file_type, "");
    }

    #[test]
    fn test_multi_dot_names_keep_inner_dots() {
        let entry = FileEntry::new("Assets/Data/level.backup.json");
        assert_eq!(entry.name, "level.backup");
        assert_eq!(entry.file_type, "json");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./Assets//Scripts/"), "Assets/Scripts");
        assert_eq!(normalize_path("Assets\\Scripts"), "Assets/Scripts");
        assert_eq!(normalize_path("Assets"), "Assets");
    }

    #[test]
    fn test_ancestors_innermost_first() {
        let chain: Vec<_> = ancestors("Assets/A/B").collect();
        assert_eq!(chain, vec!["Assets/A/B", "Assets/A", "Assets"]);
        assert_eq!(parent_path("Assets"), None);
    }
}
