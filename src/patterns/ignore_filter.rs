//! Ignore lists as a single queryable filter
//!
//! Architectural Principle: Service Layer - IgnoreFilter owns every exclusion decision
//! - Folder entries match as substrings, or as glob patterns when they carry wildcards
//! - File types and exact file names are checked independently of folder rules
//! - Built once per pass from the document and shared read-only across workers

use crate::config::{normalize_type, ConventionDocument};
use crate::domain::entry::{ancestors, FileEntry};
use crate::domain::violations::{ConventionError, ConventionResult};

/// Exclusions derived from the document's ignore lists
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    folders: Vec<FolderEntry>,
    file_types: Vec<String>,
    file_names: Vec<String>,
}

/// A single ignored-folder entry
#[derive(Debug, Clone)]
enum FolderEntry {
    /// Matches any path containing the text
    Substring(String),
    /// Matches a path or any of its ancestors
    Glob(glob::Pattern),
}

impl FolderEntry {
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Substring(text) => path.contains(text.as_str()),
            Self::Glob(pattern) => ancestors(path).any(|candidate| pattern.matches(candidate)),
        }
    }
}

impl IgnoreFilter {
    /// Build the filter from a document's ignore lists
    pub fn new(document: &ConventionDocument) -> ConventionResult<Self> {
        let mut folders = Vec::with_capacity(document.ignored_folders.len());

        for entry in &document.ignored_folders {
            if is_glob(entry) {
                let pattern = glob::Pattern::new(entry).map_err(|e| {
                    ConventionError::pattern(format!("Invalid ignored folder pattern '{entry}': {e}"))
                })?;
                folders.push(FolderEntry::Glob(pattern));
            } else {
                folders.push(FolderEntry::Substring(entry.clone()));
            }
        }

        Ok(Self {
            folders,
            file_types: document.ignored_file_types.clone(),
            file_names: document.ignored_file_names.clone(),
        })
    }

    /// Whether a canonical folder path is excluded
    pub fn is_folder_ignored(&self, path: &str) -> bool {
        self.folders.iter().any(|entry| entry.matches(path))
    }

    /// Whether a file type is excluded, case-insensitively
    pub fn is_type_ignored(&self, file_type: &str) -> bool {
        if file_type.is_empty() {
            return false;
        }
        let normalized = normalize_type(file_type);
        self.file_types.iter().any(|t| *t == normalized)
    }

    /// Whether an exact file name is excluded
    pub fn is_name_ignored(&self, full_name: &str) -> bool {
        self.file_names.iter().any(|name| name == full_name)
    }

    /// Whether a file is excluded by name or by type
    pub fn is_file_ignored(&self, entry: &FileEntry) -> bool {
        self.is_name_ignored(&entry.full_name) || self.is_type_ignored(&entry.file_type)
    }
}

fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use rstest::rstest;

    fn filter() -> IgnoreFilter {
        let document = ConfigBuilder::new()
            .ignore_folder("Plugins")
            .ignore_folder("Assets/*/Generated")
            .ignore_file_type(".META")
            .ignore_file_name("LICENSE")
            .build()
            .unwrap();
        IgnoreFilter::new(&document).unwrap()
    }

    #[rstest]
    #[case("Assets/Plugins", true)]
    #[case("Assets/Plugins/Vendor/Editor", true)]
    #[case("Assets/ThirdPartyPlugins", true)]
    #[case("Assets/Scripts", false)]
    #[case("Assets/Art/Generated", true)]
    #[case("Assets/Art/Generated/Meshes", true)]
    #[case("Assets/Generated", false)]
    fn test_folder_entries(#[case] path: &str, #[case] ignored: bool) {
        assert_eq!(filter().is_folder_ignored(path), ignored, "path {path}");
    }

    #[test]
    fn test_file_entries() {
        let filter = filter();

        assert!(filter.is_file_ignored(&FileEntry::new("Assets/Scripts/Player.cs.meta")));
        assert!(filter.is_file_ignored(&FileEntry::new("Assets/LICENSE")));
        assert!(filter.is_type_ignored("Meta"));
        assert!(!filter.is_file_ignored(&FileEntry::new("Assets/Scripts/Player.cs")));
        assert!(!filter.is_type_ignored(""));
    }

    #[test]
    fn test_invalid_glob_is_a_pattern_error() {
        let document = ConfigBuilder::new().ignore_folder("Assets/[Broken").build().unwrap();
        assert!(IgnoreFilter::new(&document).unwrap_err().is_configuration());
    }
}
