//! Remediation actions offered for convention violations
//!
//! Architecture: Tagged Results - The engine never calls back into a UI
//! - Each violation lists the actions that would resolve it
//! - An external prompt picks one and hands it back to the session for execution

use crate::domain::violations::ViolationRecord;
use serde::{Deserialize, Serialize};

/// What an ignore remediation adds to the document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreTarget {
    /// Ignore a folder path (and everything containing it)
    Folder(String),
    /// Ignore a file type everywhere
    FileType(String),
    /// Ignore an exact file name everywhere
    FileName(String),
}

impl IgnoreTarget {
    pub fn value(&self) -> &str {
        match self {
            Self::Folder(value) | Self::FileType(value) | Self::FileName(value) => value,
        }
    }
}

/// A remediation the engine offers and an external collaborator executes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RemediationAction {
    /// Register the folder in the convention and allow the given types there
    AddFolder { path: String, types: Vec<String> },
    /// Add an entry to one of the ignore lists
    Ignore { target: IgnoreTarget },
    /// Delete files or folders from disk
    Delete { paths: Vec<String> },
    /// Rename a file in place; `new_name` is a bare file name
    Rename { path: String, new_name: String },
    /// Leave everything as it is
    NoOp,
}

impl RemediationAction {
    /// Short button-style label
    pub fn label(&self) -> &'static str {
        match self {
            Self::AddFolder { types, .. } if types.is_empty() => "Add folder to convention",
            Self::AddFolder { types, .. }
                if types.len() == 1 && types[0] == crate::domain::FOLDER_SENTINEL =>
            {
                "Allow subfolders here"
            }
            Self::AddFolder { .. } => "Allow file types here",
            Self::Ignore { target: IgnoreTarget::Folder(_) } => "Ignore folder",
            Self::Ignore { target: IgnoreTarget::FileType(_) } => "Ignore file type",
            Self::Ignore { target: IgnoreTarget::FileName(_) } => "Ignore file",
            Self::Delete { .. } => "Delete",
            Self::Rename { .. } => "Rename",
            Self::NoOp => "Do nothing right now",
        }
    }

    /// Whether applying this action changes the convention document
    pub fn mutates_config(&self) -> bool {
        matches!(self, Self::AddFolder { .. } | Self::Ignore { .. })
    }

    /// Whether applying this action changes files on disk
    pub fn touches_filesystem(&self) -> bool {
        matches!(self, Self::Delete { .. } | Self::Rename { .. })
    }

    /// One-line description for reports and prompts
    pub fn describe(&self) -> String {
        match self {
            Self::AddFolder { path, types } if types.is_empty() => {
                format!("add \"{path}\" to the convention")
            }
            Self::AddFolder { path, types } => {
                format!("allow [{}] in \"{path}\"", types.join(", "))
            }
            Self::Ignore { target } => match target {
                IgnoreTarget::Folder(path) => format!("ignore folder \"{path}\""),
                IgnoreTarget::FileType(file_type) => format!("ignore file type \"{file_type}\""),
                IgnoreTarget::FileName(name) => format!("ignore file \"{name}\""),
            },
            Self::Delete { paths } if paths.len() == 1 => format!("delete \"{}\"", paths[0]),
            Self::Delete { paths } => format!("delete {} entries", paths.len()),
            Self::Rename { path, new_name } => format!("rename \"{path}\" to \"{new_name}\""),
            Self::NoOp => "leave as is".to_string(),
        }
    }
}

/// External surface that decides how to resolve a violation
///
/// Returning `None` dismisses the prompt, which ends an interactive fix loop the same
/// way as choosing [`RemediationAction::NoOp`].
pub trait RemediationPrompt {
    fn choose(
        &mut self,
        violation: &ViolationRecord,
        choices: &[RemediationAction],
    ) -> Option<RemediationAction>;
}

/// Prompt that replays a fixed list of answers, then dismisses
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: std::collections::VecDeque<RemediationAction>,
    /// Violations presented so far, in order
    pub seen: Vec<ViolationRecord>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = RemediationAction>) -> Self {
        Self { answers: answers.into_iter().collect(), seen: Vec::new() }
    }
}

impl RemediationPrompt for ScriptedPrompt {
    fn choose(
        &mut self,
        violation: &ViolationRecord,
        _choices: &[RemediationAction],
    ) -> Option<RemediationAction> {
        self.seen.push(violation.clone());
        self.answers.pop_front()
    }
}

/// What applying a remediation changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionEffect {
    pub config_changed: bool,
    pub filesystem_changed: bool,
}

impl ActionEffect {
    pub fn changed(self) -> bool {
        self.config_changed || self.filesystem_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_classification() {
        let add = RemediationAction::AddFolder { path: "Assets/Art".into(), types: vec![] };
        assert!(add.mutates_config());
        assert!(!add.touches_filesystem());
        assert_eq!(add.label(), "Add folder to convention");

        let delete = RemediationAction::Delete { paths: vec!["Assets/Art".into()] };
        assert!(delete.touches_filesystem());
        assert!(!delete.mutates_config());

        assert!(!RemediationAction::NoOp.mutates_config());
    }

    #[test]
    fn test_subfolder_grant_label() {
        let grant = RemediationAction::AddFolder {
            path: "Assets/Scripts".into(),
            types: vec!["folder".into()],
        };
        assert_eq!(grant.label(), "Allow subfolders here");
        assert_eq!(grant.describe(), "allow [folder] in \"Assets/Scripts\"");
    }

    #[test]
    fn test_action_serializes_with_tag() {
        let action = RemediationAction::Ignore { target: IgnoreTarget::FileType("psd".into()) };
        let json = serde_json::to_value(&action).unwrap();

        assert_eq!(json["action"], "ignore");
        assert_eq!(json["target"]["file_type"], "psd");
    }
}
