//! Report generation with multiple output formats
//!
//! CDD Principle: Anti-Corruption Layer - Formatters translate domain objects to external formats
//! - OverviewReport (domain) is converted to various external representations
//! - Each formatter encapsulates the rules for its specific output format
//! - Domain logic remains pure while supporting multiple presentation needs

use crate::domain::remediation::RemediationAction;
use crate::domain::violations::{
    CheckOutcome, ConventionError, ConventionResult, OverviewReport, ViolationRecord,
};
use serde_json::Value as JsonValue;

/// Supported output formats for validation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable format with colors
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// JUnit XML format for CI/CD integration
    Junit,
    /// GitHub Actions annotations
    #[value(name = "github")]
    GitHub,
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Whether to list the remediation choices under each violation
    pub show_choices: bool,
    /// Maximum number of violations to include
    pub max_violations: Option<usize>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { use_colors: true, show_choices: true, max_violations: None }
    }
}

#[derive(Debug, Clone, Copy)]
enum Style {
    Error,
    Success,
    Dim,
    Bold,
    Hint,
}

/// Main report formatter that dispatches to specific formatters
pub struct ReportFormatter {
    options: ReportOptions,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format an overview report in the specified format
    pub fn format_report(&self, report: &OverviewReport, format: OutputFormat) -> ConventionResult<String> {
        let mut records = report.records();
        if let Some(max) = self.options.max_violations {
            records.truncate(max);
        }

        match format {
            OutputFormat::Human => Ok(self.format_human(report, &records)),
            OutputFormat::Json => self.format_json(report, &records),
            OutputFormat::Junit => Ok(self.format_junit(report, &records)),
            OutputFormat::GitHub => Ok(self.format_github(&records)),
        }
    }

    /// Format the result of an interactive pass
    pub fn format_check(&self, outcome: &CheckOutcome, format: OutputFormat) -> ConventionResult<String> {
        self.format_report(&report_from_check(outcome), format)
    }

    /// Format report in human-readable format
    fn format_human(&self, report: &OverviewReport, records: &[ViolationRecord]) -> String {
        let mut output = String::new();

        if records.is_empty() {
            output.push_str(&format!("✅ {}\n", self.paint("No convention violations found", Style::Success)));
        } else {
            output.push_str(&format!("❌ {}\n\n", self.paint("Convention Violations Found", Style::Error)));

            for record in records {
                let icon = match record {
                    ViolationRecord::Folder(_) => "📁",
                    ViolationRecord::File(_) => "📄",
                };
                output.push_str(&format!("{icon} {}\n", record.path()));
                output.push_str(&format!(
                    "  [{}] {}\n",
                    self.paint(&rule_id(record), Style::Dim),
                    record.describe()
                ));

                if self.options.show_choices {
                    for choice in record.remediation_choices() {
                        output.push_str(&format!(
                            "    {}\n",
                            self.paint(&format!("💡 {}: {}", choice.label(), choice.describe()), Style::Hint)
                        ));
                    }
                }
                output.push('\n');
            }
        }

        output.push_str(&self.format_summary(report));
        output
    }

    /// Format report in JSON format
    fn format_json(&self, report: &OverviewReport, records: &[ViolationRecord]) -> ConventionResult<String> {
        let json_violations: Vec<JsonValue> = records
            .iter()
            .map(|record| {
                let level = match record {
                    ViolationRecord::Folder(_) => "folder",
                    ViolationRecord::File(_) => "file",
                };
                serde_json::json!({
                    "level": level,
                    "rule_id": rule_id(record),
                    "path": record.path(),
                    "message": record.describe(),
                    "choices": record.remediation_choices().iter().map(choice_json).collect::<Vec<_>>(),
                })
            })
            .collect();

        let json_report = serde_json::json!({
            "violations": json_violations,
            "summary": {
                "folder_violations": report.folder_violations.len(),
                "file_violations": report.file_violations.len(),
                "folders_checked": report.summary.folders_checked,
                "files_checked": report.summary.files_checked,
                "execution_time_ms": report.summary.execution_time_ms,
                "validated_at": report.summary.validated_at.to_rfc3339()
            },
            "config_fingerprint": report.config_fingerprint
        });

        serde_json::to_string_pretty(&json_report)
            .map_err(|e| ConventionError::config(format!("JSON serialization failed: {e}")))
    }

    /// Format report in JUnit XML format
    fn format_junit(&self, report: &OverviewReport, records: &[ViolationRecord]) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;
        xml.push_str(&format!(
            "<testsuite name=\"convention-guardian\" tests=\"{}\" failures=\"{}\" errors=\"0\" time=\"{:.3}\">\n",
            records.len(),
            records.len(),
            execution_time
        ));

        for record in records {
            xml.push_str(&format!(
                "  <testcase classname=\"{}\" name=\"{}\">\n",
                escape_xml(&rule_id(record)),
                escape_xml(record.path())
            ));
            xml.push_str(&format!("    <failure message=\"{}\">\n", escape_xml(&record.describe())));
            for choice in record.remediation_choices() {
                xml.push_str(&format!("      Fix: {}\n", escape_xml(&choice.describe())));
            }
            xml.push_str("    </failure>\n");
            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        xml
    }

    /// Format report for GitHub Actions
    fn format_github(&self, records: &[ViolationRecord]) -> String {
        records
            .iter()
            .map(|record| {
                format!("::error file={},title={}::{}\n", record.path(), rule_id(record), record.describe())
            })
            .collect()
    }

    /// Format the summary section
    fn format_summary(&self, report: &OverviewReport) -> String {
        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;
        let total = report.total_violations();

        let counts = if total == 0 {
            self.paint("0 violations", Style::Success)
        } else {
            self.paint(
                &format!(
                    "{} violation{} ({} folder, {} file)",
                    total,
                    if total == 1 { "" } else { "s" },
                    report.folder_violations.len(),
                    report.file_violations.len()
                ),
                Style::Error,
            )
        };

        format!(
            "📊 {} {} in {} folders, {} files ({:.1}s)\n",
            self.paint("Summary:", Style::Bold),
            counts,
            report.summary.folders_checked,
            report.summary.files_checked,
            execution_time
        )
    }

    #[cfg(feature = "colors")]
    fn paint(&self, text: &str, style: Style) -> String {
        use colored::Colorize;

        if !self.options.use_colors {
            return text.to_string();
        }
        match style {
            Style::Error => text.red().to_string(),
            Style::Success => text.green().to_string(),
            Style::Dim => text.dimmed().to_string(),
            Style::Bold => text.bold().to_string(),
            Style::Hint => text.cyan().to_string(),
        }
    }

    #[cfg(not(feature = "colors"))]
    fn paint(&self, text: &str, _style: Style) -> String {
        text.to_string()
    }
}

/// Overview-shaped report holding the single violation of an interactive pass
pub fn report_from_check(outcome: &CheckOutcome) -> OverviewReport {
    let mut report = OverviewReport::new();
    report.summary.folders_checked = outcome.folders_checked;
    report.summary.files_checked = outcome.files_checked;

    match &outcome.violation {
        Some(ViolationRecord::Folder(folder)) => report.add_folder_violation(folder.clone()),
        Some(ViolationRecord::File(file)) => report.add_file_violation(file.clone()),
        None => {}
    }
    report
}

/// Stable identifier for the kind of violation
pub fn rule_id(record: &ViolationRecord) -> String {
    match record {
        ViolationRecord::Folder(folder) => {
            let reasons: Vec<_> = folder.reasons.iter().map(|reason| reason.as_str()).collect();
            format!("folder/{}", reasons.join("+"))
        }
        ViolationRecord::File(file) => format!("file/{}", file.state.as_str()),
    }
}

fn choice_json(choice: &RemediationAction) -> JsonValue {
    serde_json::json!({
        "label": choice.label(),
        "description": choice.describe(),
        "action": serde_json::to_value(choice).unwrap_or(JsonValue::Null),
    })
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::FileEntry;
    use crate::domain::violations::{FileState, FileViolation, FolderViolation};

    fn create_test_report() -> OverviewReport {
        let mut report = OverviewReport::new();
        report.add_folder_violation(FolderViolation::not_in_convention("Assets/Temp"));
        report.add_file_violation(FileViolation::new(
            FileEntry::new("Assets/Scripts/Player.cs"),
            FileState::WrongFileName,
            vec!["{Prefix}{Name}.cs".into()],
        ));
        report.summary.folders_checked = 4;
        report.summary.files_checked = 10;
        report.set_execution_time(1200);
        report
    }

    fn plain() -> ReportFormatter {
        ReportFormatter::new(ReportOptions { use_colors: false, ..Default::default() })
    }

    #[test]
    fn test_human_format() {
        let output = plain().format_report(&create_test_report(), OutputFormat::Human).unwrap();

        assert!(output.contains("Convention Violations Found"));
        assert!(output.contains("Assets/Temp"));
        assert!(output.contains("[file/wrong_file_name]"));
        assert!(output.contains("Add folder to convention"));
        assert!(output.contains("2 violations (1 folder, 1 file) in 4 folders, 10 files"));
    }

    #[test]
    fn test_json_format() {
        let output = plain().format_report(&create_test_report(), OutputFormat::Json).unwrap();

        let json: JsonValue = serde_json::from_str(&output).unwrap();
        assert_eq!(json["violations"].as_array().unwrap().len(), 2);
        assert_eq!(json["violations"][0]["rule_id"], "folder/not_valid");
        assert_eq!(json["violations"][1]["path"], "Assets/Scripts/Player.cs");
        assert_eq!(json["violations"][1]["choices"][0]["action"]["action"], "rename");
        assert_eq!(json["summary"]["files_checked"], 10);
    }

    #[test]
    fn test_junit_format() {
        let output = plain().format_report(&create_test_report(), OutputFormat::Junit).unwrap();

        assert!(output.contains("<?xml version=\"1.0\""));
        assert!(output.contains("tests=\"2\" failures=\"2\""));
        assert!(output.contains("&quot;Assets/Temp&quot;"));
    }

    #[test]
    fn test_github_format() {
        let output = plain().format_report(&create_test_report(), OutputFormat::GitHub).unwrap();

        assert!(output.contains("::error file=Assets/Temp,title=folder/not_valid::"));
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_empty_report() {
        let output = plain().format_report(&OverviewReport::new(), OutputFormat::Human).unwrap();
        assert!(output.contains("No convention violations found"));
    }

    #[test]
    fn test_max_violations_limit() {
        let formatter = ReportFormatter::new(ReportOptions {
            use_colors: false,
            max_violations: Some(1),
            ..Default::default()
        });

        let output = formatter.format_report(&create_test_report(), OutputFormat::GitHub).unwrap();
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_check_outcome_formatting() {
        let outcome = CheckOutcome {
            violation: Some(ViolationRecord::Folder(FolderViolation::not_in_convention("Assets/Temp"))),
            folders_checked: 3,
            files_checked: 5,
            active: true,
        };

        let output = plain().format_check(&outcome, OutputFormat::Human).unwrap();
        assert!(output.contains("Assets/Temp"));
        assert!(output.contains("in 3 folders, 5 files"));
    }
}
