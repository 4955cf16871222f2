//! Tree traversal for Convention Guardian
//!
//! CDD Principle: Domain Services - Analyzer orchestrates convention passes over a tree
//! - Interactive passes walk depth-first with an explicit stack and halt at the first violation
//! - Overview passes never halt, visit every subfolder and accumulate every violation
//! - Sibling subtrees of an overview pass may run in parallel and merge back in listing order

pub mod classifier;
pub mod resolver;

use crate::config::ConventionDocument;
use crate::domain::entry::FileEntry;
use crate::domain::violations::{
    CheckOutcome, ConventionResult, FileState, FileViolation, FolderState, FolderViolation,
    OverviewReport, ViolationRecord,
};
use crate::workspace::{FolderListing, Workspace};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;

pub use classifier::PathClassifier;
pub use resolver::{InheritanceStrategy, TypeResolver};

/// Options for customizing analysis behavior
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    /// How folder rules apply to folders below them
    pub strategy: InheritanceStrategy,
    /// How literal text in naming templates is treated
    pub template_mode: crate::patterns::TemplateMode,
    /// Whether overview passes process sibling subtrees in parallel
    pub parallel: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            strategy: InheritanceStrategy::default(),
            template_mode: crate::patterns::TemplateMode::default(),
            parallel: true,
        }
    }
}

/// Convention status of a single changed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCheck {
    /// Canonical path that was checked
    pub path: String,
    /// State of the folder itself, or of the file's owning folder
    pub folder_state: FolderState,
    /// State of the file, `None` when the path is a folder
    pub file_state: Option<FileState>,
    pub violation: Option<ViolationRecord>,
}

impl PathCheck {
    pub fn is_clean(&self) -> bool {
        self.violation.is_none()
    }
}

/// Result of processing one folder before descending
enum FolderStep {
    /// Nothing more to do below this folder
    Skip,
    /// Violation found; interactive passes stop here
    Halt(ViolationRecord),
    /// Folder is fine, continue with these subfolders
    Descend(Vec<String>),
}

/// Runs convention passes over a workspace
pub struct Analyzer<'a> {
    document: &'a ConventionDocument,
    workspace: &'a Workspace,
    classifier: PathClassifier<'a>,
    options: AnalysisOptions,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        document: &'a ConventionDocument,
        workspace: &'a Workspace,
        options: AnalysisOptions,
    ) -> ConventionResult<Self> {
        Ok(Self { document, workspace, classifier: PathClassifier::new(document, &options)?, options })
    }

    pub fn classifier(&self) -> &PathClassifier<'a> {
        &self.classifier
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Interactive pass from `start`, halting at the first violation
    pub fn check(&self, start: &str) -> ConventionResult<CheckOutcome> {
        let mut outcome = CheckOutcome { violation: None, folders_checked: 0, files_checked: 0, active: true };
        let mut stack = vec![start.to_string()];

        while let Some(path) = stack.pop() {
            outcome.folders_checked += 1;

            match self.check_folder(&path, &mut outcome.files_checked)? {
                FolderStep::Skip => {}
                FolderStep::Halt(violation) => {
                    tracing::debug!(path = %violation.path(), "Interactive pass halted");
                    outcome.violation = Some(violation);
                    break;
                }
                FolderStep::Descend(subfolders) => stack.extend(subfolders.into_iter().rev()),
            }
        }

        Ok(outcome)
    }

    /// Overview pass from `start`, accumulating every violation
    pub fn overview(&self, start: &str) -> ConventionResult<OverviewReport> {
        let start_time = Instant::now();

        let mut report = self.overview_folder(start)?;
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.set_config_fingerprint(self.document.fingerprint());

        tracing::info!(
            folders = report.summary.folders_checked,
            files = report.summary.files_checked,
            violations = report.total_violations(),
            "Overview complete"
        );
        Ok(report)
    }

    /// Classify one changed file or folder
    pub fn check_path(&self, canonical: &str) -> ConventionResult<PathCheck> {
        if self.workspace.is_dir(canonical) {
            let folder_state = self.classifier.classify_folder(canonical);
            let violation = (folder_state == FolderState::NotValid)
                .then(|| ViolationRecord::Folder(FolderViolation::not_in_convention(canonical)));
            return Ok(PathCheck { path: canonical.to_string(), folder_state, file_state: None, violation });
        }

        let entry = FileEntry::new(canonical);
        let folder_state = self.classifier.classify_folder(&entry.folder);

        let (file_state, violation) = match folder_state {
            FolderState::Ignored => (FileState::Ignored, None),
            FolderState::NotValid => (
                FileState::NotValid,
                Some(ViolationRecord::Folder(FolderViolation::not_in_convention(&entry.folder))),
            ),
            FolderState::Valid => {
                let state = self.classifier.classify_file(&entry)?;
                let violation = state.is_violation().then(|| self.file_violation(entry.clone(), state));
                (state, violation)
            }
        };

        Ok(PathCheck { path: entry.path, folder_state, file_state: Some(file_state), violation })
    }

    fn check_folder(&self, path: &str, files_checked: &mut usize) -> ConventionResult<FolderStep> {
        match self.classifier.classify_folder(path) {
            FolderState::Ignored => return Ok(FolderStep::Skip),
            FolderState::NotValid => {
                return Ok(FolderStep::Halt(ViolationRecord::Folder(FolderViolation::not_in_convention(
                    path,
                ))))
            }
            FolderState::Valid => {}
        }

        let (files, listing) = self.visible_contents(path)?;
        let allowed = self.classifier.resolver().allowed_types(path);

        if !files.is_empty() {
            if !resolver::has_file_types(allowed.as_deref()) {
                return Ok(FolderStep::Halt(ViolationRecord::Folder(FolderViolation::unknown_files(
                    path, files,
                ))));
            }

            for file in files {
                *files_checked += 1;
                let state = self.classifier.classify_file(&file)?;
                if state.is_violation() {
                    return Ok(FolderStep::Halt(self.file_violation(file, state)));
                }
            }
        }

        if !listing.folders.is_empty() && !self.classifier.resolver().allows_subfolders(path) {
            return Ok(FolderStep::Halt(ViolationRecord::Folder(FolderViolation::no_folders_allowed(
                path,
                listing.folders,
            ))));
        }

        Ok(FolderStep::Descend(listing.folders))
    }

    fn overview_folder(&self, path: &str) -> ConventionResult<OverviewReport> {
        let mut report = OverviewReport::new();
        report.summary.folders_checked = 1;

        match self.classifier.classify_folder(path) {
            FolderState::Ignored => return Ok(report),
            FolderState::NotValid => {
                report.add_folder_violation(FolderViolation::not_in_convention(path));

                let (files, listing) = self.visible_contents(path)?;
                let ignore = self.classifier.ignore_filter();
                for file in files.into_iter().filter(|file| !ignore.is_file_ignored(file)) {
                    report.summary.files_checked += 1;
                    let templates = self.classifier.templates_for(&file);
                    report.add_file_violation(FileViolation::new(file, FileState::NotValid, templates));
                }

                self.overview_subfolders(&listing.folders, &mut report)?;
                return Ok(report);
            }
            FolderState::Valid => {}
        }

        let (files, listing) = self.visible_contents(path)?;
        let allowed = self.classifier.resolver().allowed_types(path);
        let mut folder_violation: Option<FolderViolation> = None;

        if !files.is_empty() {
            if resolver::has_file_types(allowed.as_deref()) {
                for file in files {
                    report.summary.files_checked += 1;
                    let state = self.classifier.classify_file(&file)?;
                    if state.is_violation() {
                        let templates = self.classifier.templates_for(&file);
                        report.add_file_violation(FileViolation::new(file, state, templates));
                    }
                }
            } else {
                folder_violation = Some(FolderViolation::unknown_files(path, files));
            }
        }

        if !listing.folders.is_empty() && !self.classifier.resolver().allows_subfolders(path) {
            match folder_violation.as_mut() {
                Some(violation) => violation.add_subfolders(listing.folders.clone()),
                None => {
                    folder_violation = Some(FolderViolation::no_folders_allowed(path, listing.folders.clone()))
                }
            }
        }

        if let Some(violation) = folder_violation {
            report.add_folder_violation(violation);
        }

        self.overview_subfolders(&listing.folders, &mut report)?;
        Ok(report)
    }

    /// Overview every subfolder and merge the results in listing order
    fn overview_subfolders(&self, folders: &[String], report: &mut OverviewReport) -> ConventionResult<()> {
        let children: Vec<OverviewReport> = if self.options.parallel && folders.len() > 1 {
            folders
                .par_iter()
                .map(|child| self.overview_folder(child))
                .collect::<ConventionResult<Vec<_>>>()?
        } else {
            folders.iter().map(|child| self.overview_folder(child)).collect::<ConventionResult<Vec<_>>>()?
        };

        for child in children {
            report.merge(child);
        }
        Ok(())
    }

    /// Files whose type is not ignored, plus the raw listing
    fn visible_contents(&self, path: &str) -> ConventionResult<(Vec<FileEntry>, FolderListing)> {
        let mut listing = self.workspace.list(path)?;
        let ignore = self.classifier.ignore_filter();
        let files = std::mem::take(&mut listing.files)
            .into_iter()
            .filter(|file| !ignore.is_type_ignored(&file.file_type))
            .collect();
        Ok((files, listing))
    }

    fn file_violation(&self, entry: FileEntry, state: FileState) -> ViolationRecord {
        let templates = self.classifier.templates_for(&entry);
        ViolationRecord::File(FileViolation::new(entry, state, templates))
    }
}

/// Counts describing a loaded document
#[derive(Debug, Default, Clone, Serialize)]
pub struct ConventionStats {
    pub folder_rules: usize,
    pub folders_allowing_subfolders: usize,
    pub naming_specs: usize,
    pub naming_templates: usize,
    pub rule_keys: usize,
    pub rule_functions: usize,
    pub ignore_entries: usize,
}

impl ConventionStats {
    pub fn from_document(document: &ConventionDocument) -> Self {
        Self {
            folder_rules: document.folder_rules.len(),
            folders_allowing_subfolders: document
                .folder_rules
                .iter()
                .filter(|rule| rule.allows_subfolders())
                .count(),
            naming_specs: document.naming_specs.len(),
            naming_templates: document.naming_specs.iter().map(|spec| spec.templates.len()).sum(),
            rule_keys: document.rule_keys.len(),
            rule_functions: document.rule_functions.len(),
            ignore_entries: document.ignored_folders.len()
                + document.ignored_file_types.len()
                + document.ignored_file_names.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::domain::violations::{ConventionError, FolderReason};
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[&str], folders: &[&str]) -> (TempDir, Workspace) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("Scripts");
        fs::create_dir_all(&root).unwrap();
        for folder in folders {
            fs::create_dir_all(root.join(folder)).unwrap();
        }
        for file in files {
            fs::write(root.join(file), "").unwrap();
        }
        let workspace = Workspace::new(&root).unwrap();
        (temp, workspace)
    }

    fn document() -> ConventionDocument {
        ConfigBuilder::new()
            .folder("Scripts", &["cs"])
            .naming(&["cs"], &["{Prefix}{Name}.cs"])
            .rule_key("Prefix", &["prefix(SC_)"])
            .rule_function("prefix", "KEY[A-Za-z]+")
            .ignore_file_type("meta")
            .build()
            .unwrap()
    }

    #[test]
    fn test_interactive_stops_at_first_invalid_file() {
        let (_temp, workspace) = tree(&["Alpha.cs", "Beta.cs", "SC_Gamma.cs"], &[]);
        let document = document();
        let analyzer = Analyzer::new(&document, &workspace, AnalysisOptions::default()).unwrap();

        let outcome = analyzer.check("Scripts").unwrap();
        match outcome.violation {
            Some(ViolationRecord::File(violation)) => {
                assert_eq!(violation.entry.full_name, "Alpha.cs");
                assert_eq!(violation.state, FileState::WrongFileName);
            }
            other => panic!("expected a file violation, got {other:?}"),
        }
        assert_eq!(outcome.files_checked, 1);
    }

    #[test]
    fn test_overview_collects_every_invalid_file() {
        let (_temp, workspace) = tree(&["Alpha.cs", "Beta.cs", "SC_Gamma.cs", "Alpha.cs.meta"], &[]);
        let document = document();
        let analyzer = Analyzer::new(&document, &workspace, AnalysisOptions::default()).unwrap();

        let report = analyzer.overview("Scripts").unwrap();
        let names: Vec<_> = report.file_violations.iter().map(|v| v.entry.full_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha.cs", "Beta.cs"]);
        assert_eq!(report.summary.files_checked, 3);
        assert!(report.config_fingerprint.is_some());
    }

    #[test]
    fn test_subfolder_without_grant_is_reported() {
        let (_temp, workspace) = tree(&["SC_Player.cs"], &["Utils"]);
        let document = document();
        let analyzer = Analyzer::new(&document, &workspace, AnalysisOptions::default()).unwrap();

        let outcome = analyzer.check("Scripts").unwrap();
        match outcome.violation {
            Some(ViolationRecord::Folder(violation)) => {
                assert_eq!(violation.reasons, vec![FolderReason::NoFoldersAllowed]);
                assert_eq!(violation.subfolders, vec!["Scripts/Utils"]);
            }
            other => panic!("expected a folder violation, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_files_without_types() {
        let (_temp, workspace) = tree(&["a.png", "b.png", "Utils/x.txt"], &["Utils"]);
        let document = ConfigBuilder::new().folder("Scripts", &["folder"]).build().unwrap();
        let analyzer = Analyzer::new(&document, &workspace, AnalysisOptions::default()).unwrap();

        let outcome = analyzer.check("Scripts").unwrap();
        match outcome.violation {
            Some(ViolationRecord::Folder(violation)) => {
                assert_eq!(violation.reasons, vec![FolderReason::UnknownFiles]);
                assert_eq!(violation.unknown_types(), vec!["png"]);
            }
            other => panic!("expected unknown files, got {other:?}"),
        }

        let report = analyzer.overview("Scripts").unwrap();
        let paths: Vec<_> = report.folder_violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["Scripts", "Scripts/Utils"]);
        assert_eq!(report.folder_violations[1].reasons, vec![FolderReason::NotValid]);
    }

    #[test]
    fn test_overview_descends_into_invalid_folders() {
        let (_temp, workspace) = tree(&["A/stray.cs", "A/B/bad.png", "A/B/notes.meta"], &["A/B"]);
        let document = ConfigBuilder::new()
            .folder("Scripts", &["folder"])
            .folder("Scripts/A/B", &["cs"])
            .ignore_file_type("meta")
            .build()
            .unwrap();

        for parallel in [true, false] {
            let options = AnalysisOptions { parallel, ..Default::default() };
            let analyzer = Analyzer::new(&document, &workspace, options).unwrap();

            let report = analyzer.overview("Scripts").unwrap();
            let folders: Vec<_> = report.folder_violations.iter().map(|v| v.path.as_str()).collect();
            assert_eq!(folders, vec!["Scripts/A"]);

            let files: Vec<_> =
                report.file_violations.iter().map(|v| (v.entry.path.as_str(), v.state)).collect();
            assert_eq!(
                files,
                vec![("Scripts/A/stray.cs", FileState::NotValid), ("Scripts/A/B/bad.png", FileState::NotValid)]
            );
            assert_eq!(report.summary.folders_checked, 3);
        }
    }

    #[test]
    fn test_unknown_rule_function_aborts_both_passes() {
        let (_temp, workspace) = tree(&["SC_Player.cs"], &[]);
        let document = ConfigBuilder::new()
            .folder("Scripts", &["cs"])
            .naming(&["cs"], &["{Prefix}{Name}.cs"])
            .rule_key("Prefix", &["prefx(SC_)"])
            .rule_function("prefix", "KEY[A-Za-z]+")
            .build()
            .unwrap();
        let analyzer = Analyzer::new(&document, &workspace, AnalysisOptions::default()).unwrap();

        match analyzer.check("Scripts") {
            Err(ConventionError::UnknownRuleFunction { function, .. }) => assert_eq!(function, "prefx"),
            other => panic!("expected unknown function error, got {other:?}"),
        }
        match analyzer.overview("Scripts") {
            Err(ConventionError::UnknownRuleFunction { function, .. }) => assert_eq!(function, "prefx"),
            other => panic!("expected unknown function error, got {other:?}"),
        }
    }

    #[test]
    fn test_parallel_overview_keeps_listing_order() {
        let folders = ["A", "B", "C", "D", "E", "F"];
        let (_temp, workspace) = tree(&[], &folders);
        let document = ConfigBuilder::new().folder("Scripts", &["folder"]).build().unwrap();
        let analyzer = Analyzer::new(&document, &workspace, AnalysisOptions::default()).unwrap();

        let report = analyzer.overview("Scripts").unwrap();
        let paths: Vec<_> = report.folder_violations.iter().map(|v| v.path.clone()).collect();
        let expected: Vec<_> = folders.iter().map(|f| format!("Scripts/{f}")).collect();
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_ignored_root_produces_nothing() {
        let (_temp, workspace) = tree(&["Player.cs"], &[]);
        let document = ConfigBuilder::new().ignore_folder("Scripts").build().unwrap();
        let analyzer = Analyzer::new(&document, &workspace, AnalysisOptions::default()).unwrap();

        assert!(analyzer.check("Scripts").unwrap().is_clean());
        assert!(!analyzer.overview("Scripts").unwrap().has_violations());
    }

    #[test]
    fn test_check_path_for_file_and_folder() {
        let (_temp, workspace) = tree(&["Player.cs", "Other/x.cs"], &["Other"]);
        let document = document();
        let analyzer = Analyzer::new(&document, &workspace, AnalysisOptions::default()).unwrap();

        let file = analyzer.check_path("Scripts/Player.cs").unwrap();
        assert_eq!(file.folder_state, FolderState::Valid);
        assert_eq!(file.file_state, Some(FileState::WrongFileName));
        assert!(!file.is_clean());

        let folder = analyzer.check_path("Scripts/Other").unwrap();
        assert_eq!(folder.folder_state, FolderState::NotValid);
        assert_eq!(folder.file_state, None);

        let nested = analyzer.check_path("Scripts/Other/x.cs").unwrap();
        assert_eq!(nested.file_state, Some(FileState::NotValid));
        assert_eq!(nested.violation.map(|v| v.path().to_string()), Some("Scripts/Other".to_string()));
    }

    #[test]
    fn test_stats_from_document() {
        let stats = ConventionStats::from_document(&document());
        assert_eq!(stats.folder_rules, 1);
        assert_eq!(stats.naming_templates, 1);
        assert_eq!(stats.rule_functions, 1);
        assert_eq!(stats.ignore_entries, 1);
    }
}
