//! Convention Guardian - Folder placement and file naming enforcement for project trees
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Pure domain logic separated from infrastructure concerns
//! - The session object owns the convention document for its whole lifetime
//! - Host integrations call in with changed paths and receive violations with remediation choices

pub mod analyzer;
pub mod config;
pub mod domain;
pub mod patterns;
pub mod report;
pub mod workspace;

// Re-export main types for convenient access
pub use domain::entry::{FileEntry, FOLDER_SENTINEL};
pub use domain::remediation::{
    ActionEffect, IgnoreTarget, RemediationAction, RemediationPrompt, ScriptedPrompt,
};
pub use domain::violations::{
    CheckOutcome, ConventionError, ConventionResult, FileState, FileViolation, FolderReason,
    FolderState, FolderViolation, OverviewReport, OverviewSummary, ViolationRecord,
};

pub use config::{ConfigBuilder, ConventionDocument, FolderRule, NamingSpec, RuleExpression};

pub use analyzer::{AnalysisOptions, Analyzer, ConventionStats, InheritanceStrategy, PathCheck};

pub use patterns::{IgnoreFilter, RuleCompiler, TemplateMode};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use workspace::Workspace;

use std::path::{Path, PathBuf};

/// Upper bound on prompt rounds in one interactive fix session
pub const DEFAULT_MAX_FIX_ROUNDS: usize = 64;

/// Main validation session owning the convention document
pub struct ConventionValidator {
    document: ConventionDocument,
    workspace: Workspace,
    options: AnalysisOptions,
    config_path: Option<PathBuf>,
    report_formatter: ReportFormatter,
}

/// Result of an interactive fix loop
#[derive(Debug, Clone, Default)]
pub struct FixSummary {
    /// Prompt rounds taken
    pub rounds: usize,
    /// Actions applied, in order
    pub applied: Vec<RemediationAction>,
    /// Violation still open when the loop ended
    pub remaining: Option<ViolationRecord>,
    /// Whether the document changed and may need saving
    pub config_changed: bool,
}

impl FixSummary {
    pub fn is_clean(&self) -> bool {
        self.remaining.is_none()
    }
}

impl ConventionValidator {
    /// Create a session over a workspace with the given document
    pub fn new(document: ConventionDocument, workspace: Workspace) -> Self {
        tracing::info!(
            root = %workspace.root_name(),
            active = document.active,
            "Convention session started"
        );
        Self {
            document,
            workspace,
            options: AnalysisOptions::default(),
            config_path: None,
            report_formatter: ReportFormatter::default(),
        }
    }

    /// Create a session loading the document from a file
    pub fn from_config_file<C: AsRef<Path>, R: AsRef<Path>>(config: C, root: R) -> ConventionResult<Self> {
        let document = ConventionDocument::load_from_file(&config)?;
        let workspace = Workspace::new(root)?;
        let mut validator = Self::new(document, workspace);
        validator.config_path = Some(config.as_ref().to_path_buf());
        Ok(validator)
    }

    /// Open a workspace, discovering its configuration in the root folder or its parent
    pub fn open<R: AsRef<Path>>(root: R) -> ConventionResult<Self> {
        let workspace = Workspace::new(root)?;
        let config = ConventionDocument::discover(workspace.root_dir())
            .or_else(|| ConventionDocument::discover(workspace.project_dir()))
            .ok_or_else(|| {
                ConventionError::config(format!(
                    "No configuration file found in '{}' or '{}'",
                    workspace.root_dir().display(),
                    workspace.project_dir().display()
                ))
            })?;

        let document = ConventionDocument::load_from_file(&config)?;
        let mut validator = Self::new(document, workspace);
        validator.config_path = Some(config);
        Ok(validator)
    }

    /// Set analysis options
    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    pub fn document(&self) -> &ConventionDocument {
        &self.document
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.document.active
    }

    /// Replace the document with a fresh load from its file
    pub fn reload(&mut self) -> ConventionResult<()> {
        let path = self
            .config_path
            .clone()
            .ok_or_else(|| ConventionError::config("Session has no configuration file to reload"))?;
        self.document = ConventionDocument::load_from_file(&path)?;
        tracing::info!(path = %path.display(), "Convention document reloaded");
        Ok(())
    }

    /// Replace the document with one supplied by the caller
    pub fn reload_with(&mut self, document: ConventionDocument) {
        self.document = document;
        tracing::info!("Convention document replaced");
    }

    /// Drop all rule data; the session stays inert until reloaded
    pub fn clear(&mut self) {
        self.document = ConventionDocument::inactive();
        tracing::info!("Convention document cleared");
    }

    /// Persist the document to its configuration file
    pub fn save(&self) -> ConventionResult<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or_else(|| ConventionError::config("Session has no configuration file to save to"))?;
        self.document.save_to_file(path)
    }

    /// Validate one changed file or folder, as reported by a host import hook
    pub fn validate_path(&self, path: &str) -> ConventionResult<PathCheck> {
        let canonical = self.workspace.to_canonical(path)?;

        if !self.is_active() {
            let file_state = (!self.workspace.is_dir(&canonical)).then_some(FileState::Ignored);
            return Ok(PathCheck {
                path: canonical,
                folder_state: FolderState::Ignored,
                file_state,
                violation: None,
            });
        }

        self.analyzer()?.check_path(&canonical)
    }

    /// Validate the imported and moved paths of one host notification, in that order
    pub fn validate_changed_paths<S: AsRef<str>>(
        &self,
        imported: &[S],
        moved: &[S],
    ) -> ConventionResult<Vec<PathCheck>> {
        if !self.is_active() {
            return Ok(Vec::new());
        }

        imported
            .iter()
            .chain(moved.iter())
            .map(|path| self.validate_path(path.as_ref()))
            .collect()
    }

    /// Interactive pass over the whole tree, stopping at the first violation
    pub fn check_tree(&self) -> ConventionResult<CheckOutcome> {
        self.check_from(self.workspace.root_name())
    }

    /// Interactive pass starting at a folder
    pub fn check_from(&self, start: &str) -> ConventionResult<CheckOutcome> {
        if !self.is_active() {
            return Ok(CheckOutcome::inactive());
        }
        let start = self.workspace.to_canonical(start)?;
        self.analyzer()?.check(&start)
    }

    /// Batch pass over the whole tree, collecting every violation
    pub fn overview(&self) -> ConventionResult<OverviewReport> {
        self.overview_from(self.workspace.root_name())
    }

    /// Batch pass starting at a folder
    pub fn overview_from(&self, start: &str) -> ConventionResult<OverviewReport> {
        if !self.is_active() {
            return Ok(OverviewReport::new());
        }
        let start = self.workspace.to_canonical(start)?;
        self.analyzer()?.overview(&start)
    }

    /// Execute a remediation chosen by the external prompt
    pub fn apply(&mut self, action: &RemediationAction) -> ConventionResult<ActionEffect> {
        let mut effect = ActionEffect::default();

        match action {
            RemediationAction::AddFolder { path, types } => {
                if path.trim().is_empty() {
                    return Err(ConventionError::remediation("Cannot add a folder rule without a path"));
                }
                let path = self.workspace.to_canonical(path)?;
                effect.config_changed = self.document.allow_types(&path, types);
            }
            RemediationAction::Ignore { target } => {
                if target.value().trim().is_empty() {
                    return Err(ConventionError::remediation("Cannot ignore an empty entry"));
                }
                effect.config_changed = self.document.ignore(target);
            }
            RemediationAction::Delete { paths } => {
                for path in paths {
                    let canonical = self.workspace.to_canonical(path)?;
                    self.workspace.delete(&canonical)?;
                    effect.filesystem_changed = true;
                }
            }
            RemediationAction::Rename { path, new_name } => {
                let canonical = self.workspace.to_canonical(path)?;
                if FileEntry::new(&canonical).full_name == new_name.trim() {
                    tracing::debug!(path = %canonical, "Rename keeps the current name; nothing to do");
                } else {
                    self.workspace.rename(&canonical, new_name)?;
                    effect.filesystem_changed = true;
                }
            }
            RemediationAction::NoOp => {}
        }

        tracing::info!(action = %action.describe(), changed = effect.changed(), "Applied remediation");
        Ok(effect)
    }

    /// Run passes and ask `prompt` about each violation until the tree is clean
    ///
    /// The loop ends when a pass is clean, the prompt is dismissed or answers `NoOp`, or
    /// `max_rounds` prompts have been answered. Every applied action is followed by a fresh pass.
    pub fn run_interactive(
        &mut self,
        prompt: &mut dyn RemediationPrompt,
        max_rounds: usize,
    ) -> ConventionResult<FixSummary> {
        let mut summary = FixSummary::default();

        loop {
            let outcome = self.check_tree()?;
            let Some(violation) = outcome.violation else {
                return Ok(summary);
            };

            if summary.rounds >= max_rounds {
                tracing::warn!(rounds = summary.rounds, "Interactive fix loop reached its round limit");
                summary.remaining = Some(violation);
                return Ok(summary);
            }

            let choices = violation.remediation_choices();
            summary.rounds += 1;

            let chosen = match prompt.choose(&violation, &choices) {
                Some(action) if action != RemediationAction::NoOp => action,
                _ => {
                    summary.remaining = Some(violation);
                    return Ok(summary);
                }
            };

            let effect = self.apply(&chosen)?;
            summary.config_changed |= effect.config_changed;
            summary.applied.push(chosen);

            if !effect.changed() {
                summary.remaining = Some(violation);
                return Ok(summary);
            }
        }
    }

    /// Compiled patterns for a file type's naming templates
    pub fn explain(&self, file_type: &str) -> ConventionResult<Vec<(String, String)>> {
        let file_type = config::normalize_type(file_type);
        let Some(spec) = self.document.naming_spec_for(&file_type) else {
            return Ok(Vec::new());
        };

        let compiler = RuleCompiler::new(&self.document, self.options.template_mode);
        spec.templates
            .iter()
            .map(|template| Ok((template.clone(), compiler.compile(template)?.as_str().to_string())))
            .collect()
    }

    /// Format an overview report
    pub fn format_report(&self, report: &OverviewReport, format: OutputFormat) -> ConventionResult<String> {
        self.report_formatter.format_report(report, format)
    }

    /// Format the result of an interactive pass
    pub fn format_check(&self, outcome: &CheckOutcome, format: OutputFormat) -> ConventionResult<String> {
        self.report_formatter.format_check(outcome, format)
    }

    /// Counts describing the loaded document
    pub fn statistics(&self) -> ConventionStats {
        ConventionStats::from_document(&self.document)
    }

    fn analyzer(&self) -> ConventionResult<Analyzer<'_>> {
        Analyzer::new(&self.document, &self.workspace, self.options)
    }
}
