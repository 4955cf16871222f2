//! Core domain models for convention states, violations and validation results
//!
//! Architecture: Rich Domain Models - Violations are entities with behavior, not just data
//! - Violations know which remediation actions resolve them
//! - OverviewReport acts as an aggregate root over folder and file violations
//! - CheckOutcome captures a single interactive pass that stops at the first conflict

use crate::domain::entry::{FileEntry, FOLDER_SENTINEL};
use crate::domain::remediation::{IgnoreTarget, RemediationAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Convention state of a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderState {
    /// Declared (or inherited) by the convention
    Valid,
    /// Inside an ignored folder
    Ignored,
    /// Not covered by the convention
    NotValid,
}

impl FolderState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Ignored => "ignored",
            Self::NotValid => "not_valid",
        }
    }
}

/// Convention state of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// Allowed type and a matching name
    Valid,
    /// Ignored by name or type
    Ignored,
    /// Allowed type, but no naming template matches
    WrongFileName,
    /// Type not allowed in this folder, or no naming spec for it
    NotValid,
}

impl FileState {
    /// Whether this state needs remediation
    pub fn is_violation(self) -> bool {
        matches!(self, Self::WrongFileName | Self::NotValid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Ignored => "ignored",
            Self::WrongFileName => "wrong_file_name",
            Self::NotValid => "not_valid",
        }
    }
}

/// Reason codes attached to a folder violation, in detection order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderReason {
    /// The folder is not covered by the convention
    NotValid,
    /// Files exist but no file types are allowed here
    UnknownFiles,
    /// Subfolders exist but the folder does not permit them
    NoFoldersAllowed,
}

impl FolderReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotValid => "not_valid",
            Self::UnknownFiles => "unknown_files",
            Self::NoFoldersAllowed => "no_folders_allowed",
        }
    }
}

/// A folder-level violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderViolation {
    /// Canonical folder path
    pub path: String,
    /// Ordered reason codes
    pub reasons: Vec<FolderReason>,
    /// Files present when no file types are allowed
    pub unknown_files: Vec<FileEntry>,
    /// Subfolders present when subfolders are not allowed
    pub subfolders: Vec<String>,
}

impl FolderViolation {
    fn empty(path: impl Into<String>) -> Self {
        Self { path: path.into(), reasons: Vec::new(), unknown_files: Vec::new(), subfolders: Vec::new() }
    }

    /// Folder not covered by the convention
    pub fn not_in_convention(path: impl Into<String>) -> Self {
        let mut violation = Self::empty(path);
        violation.reasons.push(FolderReason::NotValid);
        violation
    }

    /// Folder holding files while no file types are allowed
    pub fn unknown_files(path: impl Into<String>, files: Vec<FileEntry>) -> Self {
        let mut violation = Self::empty(path);
        violation.add_unknown_files(files);
        violation
    }

    /// Folder holding subfolders while subfolders are not allowed
    pub fn no_folders_allowed(path: impl Into<String>, subfolders: Vec<String>) -> Self {
        let mut violation = Self::empty(path);
        violation.add_subfolders(subfolders);
        violation
    }

    pub(crate) fn add_unknown_files(&mut self, files: Vec<FileEntry>) {
        self.reasons.push(FolderReason::UnknownFiles);
        self.unknown_files = files;
    }

    pub(crate) fn add_subfolders(&mut self, subfolders: Vec<String>) {
        self.reasons.push(FolderReason::NoFoldersAllowed);
        self.subfolders = subfolders;
    }

    pub fn has_reason(&self, reason: FolderReason) -> bool {
        self.reasons.contains(&reason)
    }

    /// Distinct types of the unknown files, in first-seen order
    pub fn unknown_types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for file in &self.unknown_files {
            if !types.contains(&file.file_type) {
                types.push(file.file_type.clone());
            }
        }
        types
    }

    /// Actions that resolve this violation, grouped by reason
    pub fn remediation_choices(&self) -> Vec<RemediationAction> {
        let mut choices = Vec::new();

        for reason in &self.reasons {
            let offered = match reason {
                FolderReason::NotValid => vec![
                    RemediationAction::AddFolder { path: self.path.clone(), types: Vec::new() },
                    RemediationAction::Ignore { target: IgnoreTarget::Folder(self.path.clone()) },
                    RemediationAction::Delete { paths: vec![self.path.clone()] },
                ],
                FolderReason::UnknownFiles => vec![
                    RemediationAction::AddFolder {
                        path: self.path.clone(),
                        types: self.unknown_types(),
                    },
                    RemediationAction::Delete {
                        paths: self.unknown_files.iter().map(|f| f.path.clone()).collect(),
                    },
                    RemediationAction::NoOp,
                ],
                FolderReason::NoFoldersAllowed => vec![
                    RemediationAction::AddFolder {
                        path: self.path.clone(),
                        types: vec![FOLDER_SENTINEL.to_string()],
                    },
                    RemediationAction::Delete { paths: self.subfolders.clone() },
                    RemediationAction::NoOp,
                ],
            };

            for action in offered {
                if !choices.contains(&action) {
                    choices.push(action);
                }
            }
        }

        choices
    }

    pub fn describe(&self) -> String {
        let details: Vec<String> = self
            .reasons
            .iter()
            .map(|reason| match reason {
                FolderReason::NotValid => "is not in the convention".to_string(),
                FolderReason::UnknownFiles => format!(
                    "has files whose types are not in the convention: {}",
                    self.unknown_types().join(", ")
                ),
                FolderReason::NoFoldersAllowed => format!(
                    "does not allow folders and contains {} folder{}",
                    self.subfolders.len(),
                    if self.subfolders.len() == 1 { "" } else { "s" }
                ),
            })
            .collect();

        format!("The path \"{}\" {}", self.path, details.join("; "))
    }
}

/// A file-level violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileViolation {
    pub entry: FileEntry,
    pub state: FileState,
    /// Naming templates that would have been accepted for this file type
    pub templates: Vec<String>,
}

impl FileViolation {
    pub fn new(entry: FileEntry, state: FileState, templates: Vec<String>) -> Self {
        Self { entry, state, templates }
    }

    /// Offered actions; the rename carries the current name for the prompt to edit
    pub fn remediation_choices(&self) -> Vec<RemediationAction> {
        let entry = &self.entry;
        match self.state {
            FileState::WrongFileName => vec![
                RemediationAction::Rename {
                    path: entry.path.clone(),
                    new_name: entry.full_name.clone(),
                },
                RemediationAction::Ignore { target: IgnoreTarget::FileName(entry.full_name.clone()) },
                RemediationAction::Delete { paths: vec![entry.path.clone()] },
                RemediationAction::NoOp,
            ],
            FileState::NotValid => vec![
                RemediationAction::AddFolder {
                    path: entry.folder.clone(),
                    types: vec![entry.file_type.clone()],
                },
                RemediationAction::Ignore { target: IgnoreTarget::FileType(entry.file_type.clone()) },
                RemediationAction::Delete { paths: vec![entry.path.clone()] },
            ],
            FileState::Valid | FileState::Ignored => Vec::new(),
        }
    }

    pub fn describe(&self) -> String {
        match self.state {
            FileState::WrongFileName if self.templates.is_empty() => {
                format!("The file \"{}\" does not match the convention criteria", self.entry.full_name)
            }
            FileState::WrongFileName => format!(
                "The file \"{}\" does not match the convention criteria; expected one of: {}",
                self.entry.full_name,
                self.templates.join(", ")
            ),
            _ => format!(
                "The file \"{}\" is not following the convention. Is it in the right folder?",
                self.entry.full_name
            ),
        }
    }
}

/// A single violation, folder- or file-level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum ViolationRecord {
    Folder(FolderViolation),
    File(FileViolation),
}

impl ViolationRecord {
    /// Canonical path of the offending folder or file
    pub fn path(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.path,
            Self::File(file) => &file.entry.path,
        }
    }

    pub fn remediation_choices(&self) -> Vec<RemediationAction> {
        match self {
            Self::Folder(folder) => folder.remediation_choices(),
            Self::File(file) => file.remediation_choices(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Folder(folder) => folder.describe(),
            Self::File(file) => file.describe(),
        }
    }
}

/// Result of one interactive pass, which stops at the first violation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// The violation that halted the pass, if any
    pub violation: Option<ViolationRecord>,
    /// Folders classified during the pass
    pub folders_checked: usize,
    /// Files classified during the pass
    pub files_checked: usize,
    /// Whether the convention document was active
    pub active: bool,
}

impl CheckOutcome {
    pub fn inactive() -> Self {
        Self { violation: None, folders_checked: 0, files_checked: 0, active: false }
    }

    pub fn is_clean(&self) -> bool {
        self.violation.is_none()
    }

    pub fn halted(&self) -> bool {
        self.violation.is_some()
    }
}

/// Summary statistics for an overview report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverviewSummary {
    /// Folders classified
    pub folders_checked: usize,
    /// Files classified
    pub files_checked: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// Timestamp when validation was performed
    pub validated_at: DateTime<Utc>,
}

/// Batch report of every folder and file violation in a tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewReport {
    pub folder_violations: Vec<FolderViolation>,
    pub file_violations: Vec<FileViolation>,
    pub summary: OverviewSummary,
    /// Fingerprint of the document used for this report
    pub config_fingerprint: Option<String>,
}

impl OverviewReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            folder_violations: Vec::new(),
            file_violations: Vec::new(),
            summary: OverviewSummary { validated_at: Utc::now(), ..Default::default() },
            config_fingerprint: None,
        }
    }

    pub fn add_folder_violation(&mut self, violation: FolderViolation) {
        self.folder_violations.push(violation);
    }

    pub fn add_file_violation(&mut self, violation: FileViolation) {
        self.file_violations.push(violation);
    }

    pub fn has_violations(&self) -> bool {
        !self.folder_violations.is_empty() || !self.file_violations.is_empty()
    }

    pub fn total_violations(&self) -> usize {
        self.folder_violations.len() + self.file_violations.len()
    }

    /// All violations as records, folders first
    pub fn records(&self) -> Vec<ViolationRecord> {
        self.folder_violations
            .iter()
            .cloned()
            .map(ViolationRecord::Folder)
            .chain(self.file_violations.iter().cloned().map(ViolationRecord::File))
            .collect()
    }

    /// Append another report's violations and counts, keeping order
    pub fn merge(&mut self, other: OverviewReport) {
        self.folder_violations.extend(other.folder_violations);
        self.file_violations.extend(other.file_violations);
        self.summary.folders_checked += other.summary.folders_checked;
        self.summary.files_checked += other.summary.files_checked;
    }

    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    pub fn set_config_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.config_fingerprint = Some(fingerprint.into());
    }
}

impl Default for OverviewReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types that can occur during validation
#[derive(Debug, thiserror::Error)]
pub enum ConventionError {
    /// Configuration document could not be loaded, parsed or is inconsistent
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A rule expression names a function missing from the regex dictionary
    #[error("Configuration error: no rule function '{function}' for rule '{expression}'")]
    UnknownRuleFunction { function: String, expression: String },

    /// A compiled naming template is not a valid pattern
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// A directory could not be listed or a filesystem effect failed
    #[error("Filesystem error at {path}: {source}")]
    Filesystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A remediation action could not be applied
    #[error("Remediation error: {message}")]
    Remediation { message: String },
}

impl ConventionError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create an unknown rule function error
    pub fn unknown_function(function: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::UnknownRuleFunction { function: function.into(), expression: expression.into() }
    }

    /// Create a pattern error
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern { message: message.into() }
    }

    /// Create a filesystem error for a path
    pub fn filesystem(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Filesystem { path: path.into(), source }
    }

    /// Create a remediation error
    pub fn remediation(message: impl Into<String>) -> Self {
        Self::Remediation { message: message.into() }
    }

    /// Whether this error comes from a broken convention document
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::UnknownRuleFunction { .. } | Self::Pattern { .. }
        )
    }
}

/// Result type for convention operations
pub type ConventionResult<T> = Result<T, ConventionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_state_violation_flags() {
        assert!(FileState::WrongFileName.is_violation());
        assert!(FileState::NotValid.is_violation());
        assert!(!FileState::Valid.is_violation());
        assert!(!FileState::Ignored.is_violation());
    }

    #[test]
    fn test_not_in_convention_choices() {
        let violation = FolderViolation::not_in_convention("Assets/Temp");
        let choices = violation.remediation_choices();

        assert_eq!(choices.len(), 3);
        assert_eq!(
            choices[0],
            RemediationAction::AddFolder { path: "Assets/Temp".into(), types: vec![] }
        );
        assert_eq!(
            choices[1],
            RemediationAction::Ignore { target: IgnoreTarget::Folder("Assets/Temp".into()) }
        );
        assert!(matches!(choices[2], RemediationAction::Delete { .. }));
    }

    #[test]
    fn test_unknown_files_offers_bulk_registration() {
        let violation = FolderViolation::unknown_files(
            "Assets/Art",
            vec![
                FileEntry::new("Assets/Art/a.png"),
                FileEntry::new("Assets/Art/b.png"),
                FileEntry::new("Assets/Art/c.psd"),
            ],
        );

        assert_eq!(violation.unknown_types(), vec!["png", "psd"]);
        let choices = violation.remediation_choices();
        assert_eq!(
            choices[0],
            RemediationAction::AddFolder {
                path: "Assets/Art".into(),
                types: vec!["png".into(), "psd".into()]
            }
        );
        assert_eq!(
            choices[1],
            RemediationAction::Delete {
                paths: vec![
                    "Assets/Art/a.png".into(),
                    "Assets/Art/b.png".into(),
                    "Assets/Art/c.psd".into()
                ]
            }
        );
        assert_eq!(choices[2], RemediationAction::NoOp);
    }

    #[test]
    fn test_combined_reasons_offer_single_noop() {
        let mut violation =
            FolderViolation::unknown_files("Assets/Art", vec![FileEntry::new("Assets/Art/a.png")]);
        violation.add_subfolders(vec!["Assets/Art/Old".into()]);

        let choices = violation.remediation_choices();
        let noops = choices.iter().filter(|c| **c == RemediationAction::NoOp).count();
        assert_eq!(noops, 1);
        assert!(violation.describe().contains("does not allow folders"));
    }

    #[test]
    fn test_wrong_file_name_choices_start_with_rename() {
        let violation = FileViolation::new(
            FileEntry::new("Assets/Scripts/Player.cs"),
            FileState::WrongFileName,
            vec!["{Prefix}{Name}.cs".into()],
        );

        let choices = violation.remediation_choices();
        assert_eq!(
            choices[0],
            RemediationAction::Rename {
                path: "Assets/Scripts/Player.cs".into(),
                new_name: "Player.cs".into()
            }
        );
        assert!(violation.describe().contains("{Prefix}{Name}.cs"));
    }

    #[test]
    fn test_report_merge_keeps_order() {
        let mut first = OverviewReport::new();
        first.add_folder_violation(FolderViolation::not_in_convention("Assets/A"));
        first.summary.folders_checked = 2;

        let mut second = OverviewReport::new();
        second.add_folder_violation(FolderViolation::not_in_convention("Assets/B"));
        second.summary.folders_checked = 3;

        first.merge(second);
        assert_eq!(first.folder_violations[0].path, "Assets/A");
        assert_eq!(first.folder_violations[1].path, "Assets/B");
        assert_eq!(first.summary.folders_checked, 5);
        assert_eq!(first.total_violations(), 2);
    }

    #[test]
    fn test_configuration_error_classification() {
        assert!(ConventionError::unknown_function("prefx", "prefx(SC_)").is_configuration());
        assert!(ConventionError::config("broken").is_configuration());
        assert!(!ConventionError::remediation("nope").is_configuration());

        let message = ConventionError::unknown_function("prefx", "prefx(SC_)").to_string();
        assert!(message.contains("prefx"));
    }
}
