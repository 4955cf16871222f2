//! Convention status of a folder or a file
//!
//! CDD Principle: Domain Services - The classifier answers one question per path
//! - Folder status depends only on ignore entries and folder rules
//! - File status layers ignore lists, allowed types and naming templates in a fixed order
//! - Both are pure functions of the document and the analysis options

use crate::analyzer::resolver::{has_file_types, TypeResolver};
use crate::analyzer::AnalysisOptions;
use crate::config::ConventionDocument;
use crate::domain::entry::FileEntry;
use crate::domain::violations::{ConventionResult, FileState, FolderState};
use crate::patterns::{IgnoreFilter, RuleCompiler};

/// Classifies folders and files against one document
pub struct PathClassifier<'a> {
    resolver: TypeResolver<'a>,
    compiler: RuleCompiler<'a>,
    ignore: IgnoreFilter,
}

impl<'a> PathClassifier<'a> {
    pub fn new(document: &'a ConventionDocument, options: &AnalysisOptions) -> ConventionResult<Self> {
        Ok(Self {
            resolver: TypeResolver::new(document, options.strategy),
            compiler: RuleCompiler::new(document, options.template_mode),
            ignore: IgnoreFilter::new(document)?,
        })
    }

    pub fn resolver(&self) -> &TypeResolver<'a> {
        &self.resolver
    }

    pub fn compiler(&self) -> &RuleCompiler<'a> {
        &self.compiler
    }

    pub fn ignore_filter(&self) -> &IgnoreFilter {
        &self.ignore
    }

    pub fn classify_folder(&self, path: &str) -> FolderState {
        let state = if self.ignore.is_folder_ignored(path) {
            FolderState::Ignored
        } else if self.resolver.folder_is_valid(path) {
            FolderState::Valid
        } else {
            FolderState::NotValid
        };

        tracing::debug!(path = %path, state = state.as_str(), "Classified folder");
        state
    }

    pub fn classify_file(&self, file: &FileEntry) -> ConventionResult<FileState> {
        let allowed = self.resolver.allowed_types(&file.folder);
        let state = self.file_state(file, allowed.as_deref())?;

        tracing::debug!(path = %file.path, state = state.as_str(), "Classified file");
        Ok(state)
    }

    /// Naming templates that apply to a file's type
    pub fn templates_for(&self, file: &FileEntry) -> Vec<String> {
        self.resolver.naming_templates(&file.file_type).map(<[String]>::to_vec).unwrap_or_default()
    }

    fn file_state(&self, file: &FileEntry, allowed: Option<&[String]>) -> ConventionResult<FileState> {
        if self.ignore.is_file_ignored(file) {
            return Ok(FileState::Ignored);
        }

        let Some(allowed) = allowed.filter(|_| has_file_types(allowed)) else {
            return Ok(FileState::NotValid);
        };

        if !allowed.iter().any(|t| *t == file.file_type) {
            return Ok(FileState::NotValid);
        }

        let Some(templates) = self.resolver.naming_templates(&file.file_type) else {
            return Ok(FileState::NotValid);
        };

        if self.compiler.matches(templates, &file.full_name)? {
            Ok(FileState::Valid)
        } else {
            Ok(FileState::WrongFileName)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::resolver::InheritanceStrategy;
    use crate::config::ConfigBuilder;
    use rstest::rstest;

    fn document() -> ConventionDocument {
        ConfigBuilder::new()
            .folder("Scripts", &["cs"])
            .folder("Art", &["png", "psd"])
            .folder("Empty", &[])
            .ignore_folder("Plugins")
            .ignore_file_type("meta")
            .ignore_file_type("psd")
            .ignore_file_name("Readme.cs")
            .naming(&["cs"], &["{Prefix}{Name}.cs", "{Name}Tests.cs"])
            .rule_key("Prefix", &["prefix(SC_)"])
            .rule_key("Name", &["word()"])
            .rule_function("prefix", "KEY[A-Za-z]+")
            .rule_function("word", "[A-Za-z]*")
            .build()
            .unwrap()
    }

    #[rstest]
    #[case("Scripts/SC_Player.cs", FileState::Valid)]
    #[case("Scripts/PlayerTests.cs", FileState::Valid)]
    #[case("Scripts/Player.cs", FileState::WrongFileName)]
    #[case("Scripts/Player.png", FileState::NotValid)]
    #[case("Scripts/Readme.cs", FileState::Ignored)]
    #[case("Scripts/Player.cs.meta", FileState::Ignored)]
    #[case("Art/Hero.png", FileState::NotValid)]
    #[case("Art/Hero.psd", FileState::Ignored)]
    #[case("Empty/Anything.cs", FileState::NotValid)]
    #[case("Unknown/SC_Player.cs", FileState::NotValid)]
    fn test_classify_file(#[case] path: &str, #[case] expected: FileState) {
        let document = document();
        let classifier = PathClassifier::new(&document, &AnalysisOptions::default()).unwrap();

        assert_eq!(classifier.classify_file(&FileEntry::new(path)).unwrap(), expected);
    }

    #[rstest]
    #[case("Scripts", FolderState::Valid)]
    #[case("Scripts/Plugins", FolderState::Ignored)]
    #[case("Plugins", FolderState::Ignored)]
    #[case("Audio", FolderState::NotValid)]
    fn test_classify_folder(#[case] path: &str, #[case] expected: FolderState) {
        let document = document();
        let classifier = PathClassifier::new(&document, &AnalysisOptions::default()).unwrap();

        assert_eq!(classifier.classify_folder(path), expected);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let document = document();
        let classifier = PathClassifier::new(&document, &AnalysisOptions::default()).unwrap();
        let entry = FileEntry::new("Scripts/Player.cs");

        let first = classifier.classify_file(&entry).unwrap();
        let second = classifier.classify_file(&entry).unwrap();
        assert_eq!(first, second);
        assert_eq!(classifier.classify_folder("Audio"), classifier.classify_folder("Audio"));
    }

    #[test]
    fn test_ignored_type_wins_over_missing_allowance() {
        let document = document();
        let classifier = PathClassifier::new(&document, &AnalysisOptions::default()).unwrap();

        // psd is allowed in Art but ignored, and not allowed in Scripts
        assert_eq!(classifier.classify_file(&FileEntry::new("Scripts/Concept.psd")).unwrap(), FileState::Ignored);
    }

    #[test]
    fn test_inherited_types_apply_to_files() {
        let document = ConfigBuilder::new()
            .folder("A", &["folder", "txt"])
            .naming(&["txt"], &["{Name}.txt"])
            .rule_key("Name", &["word()"])
            .rule_function("word", "[a-z]+")
            .build()
            .unwrap();

        let inheriting = AnalysisOptions { strategy: InheritanceStrategy::RootInheriting, ..Default::default() };
        let classifier = PathClassifier::new(&document, &inheriting).unwrap();
        assert_eq!(classifier.classify_folder("A/B"), FolderState::Valid);
        assert_eq!(classifier.classify_file(&FileEntry::new("A/B/notes.txt")).unwrap(), FileState::Valid);

        let exact = PathClassifier::new(&document, &AnalysisOptions::default()).unwrap();
        assert_eq!(exact.classify_folder("A/B"), FolderState::NotValid);
        assert_eq!(exact.classify_file(&FileEntry::new("A/B/notes.txt")).unwrap(), FileState::NotValid);
    }

    #[test]
    fn test_templates_for_file() {
        let document = document();
        let classifier = PathClassifier::new(&document, &AnalysisOptions::default()).unwrap();

        assert_eq!(classifier.templates_for(&FileEntry::new("Scripts/Player.cs")).len(), 2);
        assert!(classifier.templates_for(&FileEntry::new("Art/Hero.png")).is_empty());
    }
}
