//! Allowed file types and naming templates at a folder path

use crate::config::ConventionDocument;
use crate::domain::entry::{ancestors, parent_path, FOLDER_SENTINEL};
use serde::{Deserialize, Serialize};

/// How folder rules apply to folders below them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InheritanceStrategy {
    /// Only the rule declared at exactly the folder's path applies
    #[default]
    ExactMatch,
    /// Rules on the folder and every ancestor apply, merged
    RootInheriting,
}

/// Resolves folder rules for a path under one strategy
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    document: &'a ConventionDocument,
    strategy: InheritanceStrategy,
}

impl<'a> TypeResolver<'a> {
    pub fn new(document: &'a ConventionDocument, strategy: InheritanceStrategy) -> Self {
        Self { document, strategy }
    }

    pub fn strategy(&self) -> InheritanceStrategy {
        self.strategy
    }

    /// Allowed types at `path`, `None` when no rule applies
    pub fn allowed_types(&self, path: &str) -> Option<Vec<String>> {
        match self.strategy {
            InheritanceStrategy::ExactMatch => {
                self.document.folder_rule(path).map(|rule| rule.allowed_types.clone())
            }
            InheritanceStrategy::RootInheriting => {
                let mut merged: Option<Vec<String>> = None;
                for rule in ancestors(path).filter_map(|p| self.document.folder_rule(p)) {
                    let types = merged.get_or_insert_with(Vec::new);
                    for file_type in &rule.allowed_types {
                        if !types.contains(file_type) {
                            types.push(file_type.clone());
                        }
                    }
                }
                merged
            }
        }
    }

    /// Whether `path` is covered by the convention
    ///
    /// Under root inheritance a folder without its own rule is valid only when an
    /// ancestor above it grants subfolders.
    pub fn folder_is_valid(&self, path: &str) -> bool {
        if self.document.folder_rule(path).is_some() {
            return true;
        }

        match self.strategy {
            InheritanceStrategy::ExactMatch => false,
            InheritanceStrategy::RootInheriting => parent_path(path)
                .map(|parent| {
                    ancestors(parent)
                        .filter_map(|p| self.document.folder_rule(p))
                        .any(|rule| rule.allows_subfolders())
                })
                .unwrap_or(false),
        }
    }

    /// Whether subfolders may exist under `path`
    pub fn allows_subfolders(&self, path: &str) -> bool {
        self.allowed_types(path)
            .is_some_and(|types| types.iter().any(|t| t == FOLDER_SENTINEL))
    }

    /// Naming templates for a file type, `None` when the type has no naming spec
    pub fn naming_templates(&self, file_type: &str) -> Option<&'a [String]> {
        self.document.naming_spec_for(file_type).map(|spec| spec.templates.as_slice())
    }
}

/// Whether an allowed set permits at least one real file type
pub fn has_file_types(allowed: Option<&[String]>) -> bool {
    allowed.is_some_and(|types| types.iter().any(|t| t != FOLDER_SENTINEL))
}
