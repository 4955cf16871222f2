//! Workspace mapping canonical project paths onto disk
//!
//! Architecture: Infrastructure Adapter - The only module that touches the filesystem
//! - Canonical paths start with the root folder's name and use forward slashes
//! - Folder listings are sorted by file name so every pass sees the same order
//! - Delete and rename remediations are executed here

use crate::domain::entry::{normalize_path, FileEntry};
use crate::domain::violations::{ConventionError, ConventionResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Immediate contents of one folder, in listing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    pub files: Vec<FileEntry>,
    /// Canonical paths of immediate subfolders
    pub folders: Vec<String>,
}

/// A project tree rooted at one folder on disk
#[derive(Debug, Clone)]
pub struct Workspace {
    root_dir: PathBuf,
    root_name: String,
}

impl Workspace {
    /// Open a workspace; the root folder's own name becomes the first canonical segment
    pub fn new<P: AsRef<Path>>(root_dir: P) -> ConventionResult<Self> {
        let requested = root_dir.as_ref();
        let root_dir = fs::canonicalize(requested)
            .map_err(|e| ConventionError::filesystem(requested.display().to_string(), e))?;

        if !root_dir.is_dir() {
            return Err(ConventionError::filesystem(
                root_dir.display().to_string(),
                io::Error::new(io::ErrorKind::InvalidInput, "workspace root is not a directory"),
            ));
        }

        let root_name = root_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ConventionError::filesystem(
                    root_dir.display().to_string(),
                    io::Error::new(io::ErrorKind::InvalidInput, "workspace root has no name"),
                )
            })?;

        Ok(Self { root_dir, root_name })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Canonical path of the root folder
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Directory holding the root folder, where configuration usually lives
    pub fn project_dir(&self) -> &Path {
        self.root_dir.parent().unwrap_or(&self.root_dir)
    }

    /// Map an absolute or project-relative path to its canonical form
    ///
    /// Relative paths whose first segment is not the root name are taken as relative to
    /// the root folder.
    pub fn to_canonical(&self, path: &str) -> ConventionResult<String> {
        let as_path = Path::new(path);

        if as_path.is_absolute() {
            let relative = match as_path.strip_prefix(&self.root_dir) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => fs::canonicalize(as_path)
                    .ok()
                    .and_then(|resolved| resolved.strip_prefix(&self.root_dir).ok().map(Path::to_path_buf))
                    .ok_or_else(|| self.outside(path))?,
            };
            return Ok(self.join_root(&normalize_path(&relative.to_string_lossy())));
        }

        let normalized = normalize_path(path);
        let first = normalized.split('/').next().unwrap_or_default();
        if first == self.root_name {
            Ok(normalized)
        } else {
            Ok(self.join_root(&normalized))
        }
    }

    /// Disk location of a canonical path
    pub fn to_disk(&self, canonical: &str) -> ConventionResult<PathBuf> {
        let canonical = normalize_path(canonical);
        if canonical == self.root_name {
            return Ok(self.root_dir.clone());
        }

        canonical
            .strip_prefix(&self.root_name)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(|rest| self.root_dir.join(rest))
            .ok_or_else(|| self.outside(&canonical))
    }

    pub fn is_dir(&self, canonical: &str) -> bool {
        self.to_disk(canonical).map(|path| path.is_dir()).unwrap_or(false)
    }

    /// Immediate files and subfolders of a folder, sorted by name
    pub fn list(&self, canonical: &str) -> ConventionResult<FolderListing> {
        let dir = self.to_disk(canonical)?;
        if !dir.is_dir() {
            return Err(ConventionError::filesystem(
                canonical,
                io::Error::new(io::ErrorKind::NotFound, "folder does not exist"),
            ));
        }
        let mut listing = FolderListing::default();

        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| ConventionError::filesystem(canonical, io::Error::from(e)))?;
            let name = entry.file_name().to_string_lossy();
            let child = format!("{canonical}/{name}");

            if entry.file_type().is_dir() {
                listing.folders.push(child);
            } else {
                listing.files.push(FileEntry::new(child));
            }
        }

        tracing::debug!(
            path = %canonical,
            files = listing.files.len(),
            folders = listing.folders.len(),
            "Listed folder"
        );
        Ok(listing)
    }

    /// Remove a file or a whole folder
    pub fn delete(&self, canonical: &str) -> ConventionResult<()> {
        if normalize_path(canonical) == self.root_name {
            return Err(ConventionError::remediation("Refusing to delete the workspace root"));
        }

        let target = self.to_disk(canonical)?;
        let result = if target.is_dir() { fs::remove_dir_all(&target) } else { fs::remove_file(&target) };
        result.map_err(|e| ConventionError::filesystem(canonical, e))?;

        tracing::info!(path = %canonical, "Deleted");
        Ok(())
    }

    /// Rename a file in place, returning its new canonical path
    pub fn rename(&self, canonical: &str, new_name: &str) -> ConventionResult<String> {
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name.contains(['/', '\\']) || new_name == "." || new_name == ".." {
            return Err(ConventionError::remediation(format!(
                "'{new_name}' is not a bare file name"
            )));
        }

        let source = self.to_disk(canonical)?;
        let target = source.with_file_name(new_name);
        if target.exists() {
            return Err(ConventionError::remediation(format!(
                "Cannot rename '{canonical}': '{new_name}' already exists"
            )));
        }

        fs::rename(&source, &target).map_err(|e| ConventionError::filesystem(canonical, e))?;

        let entry = FileEntry::new(canonical);
        let renamed =
            if entry.folder.is_empty() { new_name.to_string() } else { format!("{}/{new_name}", entry.folder) };
        tracing::info!(from = %canonical, to = %renamed, "Renamed");
        Ok(renamed)
    }

    fn join_root(&self, relative: &str) -> String {
        if relative.is_empty() {
            self.root_name.clone()
        } else {
            format!("{}/{relative}", self.root_name)
        }
    }

    fn outside(&self, path: &str) -> ConventionError {
        ConventionError::filesystem(
            path,
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("path is outside the workspace rooted at '{}'", self.root_dir.display()),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, Workspace) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("Assets");
        fs::create_dir_all(root.join("Scripts/Utils")).unwrap();
        fs::create_dir_all(root.join("Art")).unwrap();
        fs::write(root.join("Scripts/b.cs"), "").unwrap();
        fs::write(root.join("Scripts/a.cs"), "").unwrap();
        fs::write(root.join("readme.md"), "").unwrap();

        let workspace = Workspace::new(&root).unwrap();
        (temp, workspace)
    }

    #[test]
    fn test_root_name_from_directory() {
        let (_temp, workspace) = workspace();
        assert_eq!(workspace.root_name(), "Assets");
    }

    #[test]
    fn test_listing_is_sorted_and_split() {
        let (_temp, workspace) = workspace();

        let root = workspace.list("Assets").unwrap();
        assert_eq!(root.folders, vec!["Assets/Art", "Assets/Scripts"]);
        assert_eq!(root.files.len(), 1);
        assert_eq!(root.files[0].path, "Assets/readme.md");

        let scripts = workspace.list("Assets/Scripts").unwrap();
        let names: Vec<_> = scripts.files.iter().map(|f| f.full_name.as_str()).collect();
        assert_eq!(names, vec!["a.cs", "b.cs"]);
        assert_eq!(scripts.folders, vec!["Assets/Scripts/Utils"]);
    }

    #[test]
    fn test_canonical_mapping() {
        let (_temp, workspace) = workspace();
        let absolute = workspace.root_dir().join("Scripts").join("a.cs");

        assert_eq!(workspace.to_canonical(&absolute.to_string_lossy()).unwrap(), "Assets/Scripts/a.cs");
        assert_eq!(workspace.to_canonical("Assets\\Scripts\\a.cs").unwrap(), "Assets/Scripts/a.cs");
        assert_eq!(workspace.to_canonical("Scripts/a.cs").unwrap(), "Assets/Scripts/a.cs");
        assert_eq!(workspace.to_disk("Assets/Scripts").unwrap(), workspace.root_dir().join("Scripts"));
        assert!(workspace.to_disk("Other/Scripts").is_err());
    }

    #[test]
    fn test_listing_missing_folder_is_filesystem_error() {
        let (_temp, workspace) = workspace();
        let error = workspace.list("Assets/Missing").unwrap_err();
        assert!(matches!(error, ConventionError::Filesystem { .. }));
    }

    #[test]
    fn test_rename_and_delete() {
        let (_temp, workspace) = workspace();

        let renamed = workspace.rename("Assets/Scripts/a.cs", "SC_A.cs").unwrap();
        assert_eq!(renamed, "Assets/Scripts/SC_A.cs");
        assert!(workspace.to_disk(&renamed).unwrap().is_file());

        assert!(workspace.rename("Assets/Scripts/b.cs", "../b.cs").is_err());
        assert!(workspace.rename("Assets/Scripts/b.cs", "SC_A.cs").is_err());

        workspace.delete("Assets/Scripts/Utils").unwrap();
        assert!(!workspace.is_dir("Assets/Scripts/Utils"));
        assert!(workspace.delete("Assets").is_err());
    }
}
