//! Convention Guardian CLI - Command-line interface for folder and naming convention checks
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to session operations
//! - Handles external concerns like process exit codes and terminal output
//! - Keeps the session free of argument parsing and printing

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use convention_guardian::{
    config, AnalysisOptions, ConventionDocument, ConventionValidator, InheritanceStrategy,
    OutputFormat, PathCheck, ReportFormatter, ReportOptions, TemplateMode,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

/// Exit code for a clean tree
const EXIT_CLEAN: i32 = 0;
/// Exit code when violations were found
const EXIT_VIOLATIONS: i32 = 1;
/// Exit code for configuration, pattern or filesystem errors
const EXIT_ERROR: i32 = 2;

/// Convention Guardian - Folder placement and file naming enforcement
#[derive(Parser)]
#[command(name = "convention-guardian")]
#[command(version)]
#[command(about = "Checks a project tree against a declarative folder and naming convention")]
#[command(long_about = "Convention Guardian verifies that every folder is declared in the convention document, that each folder only holds the file types it allows, and that file names match the naming templates registered for their type.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Configuration file path (discovered in the root folder or its parent when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root folder of the project tree
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// How folder rules apply to the folders below them
    #[arg(long, global = true, value_enum, default_value = "exact-match")]
    strategy: InheritanceStrategy,

    /// How literal text in naming templates is treated
    #[arg(long, global = true, value_enum, default_value = "literal")]
    template_mode: TemplateMode,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the tree and stop at the first violation
    Check {
        /// Folder to start from (defaults to the root)
        #[arg(long)]
        from: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Walk the whole tree and report every violation
    Overview {
        /// Folder to start from (defaults to the root)
        #[arg(long)]
        from: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Maximum number of violations to report
        #[arg(long)]
        max_violations: Option<usize>,

        /// Disable parallel processing
        #[arg(long)]
        no_parallel: bool,
    },

    /// Validate individual changed files or folders
    File {
        /// Paths, absolute or relative to the root folder
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Validate the configuration file, including every rule function reference
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },

    /// Show the compiled naming patterns for a file type
    Explain {
        /// File type, with or without the leading dot
        file_type: String,
    },

    /// List folder rules, naming templates and rule keys
    Rules,
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_json);

    match run_command(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(EXIT_ERROR);
        }
    }
}

fn run_command(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Check { from, format } => run_check(&cli, from.as_deref(), *format),
        Commands::Overview { from, format, max_violations, no_parallel } => {
            run_overview(&cli, from.as_deref(), *format, *max_violations, *no_parallel)
        }
        Commands::File { paths } => run_file(&cli, paths),
        Commands::ValidateConfig { config_file } => {
            let path = config_file.clone().or_else(|| cli.config.clone());
            run_validate_config(path, &cli.root)
        }
        Commands::Explain { file_type } => run_explain(&cli, file_type),
        Commands::Rules => run_list_rules(&cli),
    }
}

/// Open a session for the CLI's root and configuration
fn open_session(cli: &Cli, parallel: bool, max_violations: Option<usize>) -> Result<ConventionValidator> {
    let validator = match &cli.config {
        Some(config) => ConventionValidator::from_config_file(config, &cli.root)
            .with_context(|| format!("Failed to load configuration '{}'", config.display()))?,
        None => ConventionValidator::open(&cli.root)
            .with_context(|| format!("Failed to open project '{}'", cli.root.display()))?,
    };

    let options = AnalysisOptions { strategy: cli.strategy, template_mode: cli.template_mode, parallel };
    let formatter = ReportFormatter::new(ReportOptions {
        use_colors: !cli.no_color,
        max_violations,
        ..Default::default()
    });

    Ok(validator.with_options(options).with_report_formatter(formatter))
}

fn run_check(cli: &Cli, from: Option<&str>, format: OutputFormat) -> Result<i32> {
    let validator = open_session(cli, false, None)?;

    let outcome = match from {
        Some(start) => validator.check_from(start),
        None => validator.check_tree(),
    }
    .context("Interactive pass failed")?;

    println!("{}", validator.format_check(&outcome, format)?);

    Ok(if outcome.is_clean() { EXIT_CLEAN } else { EXIT_VIOLATIONS })
}

fn run_overview(
    cli: &Cli,
    from: Option<&str>,
    format: OutputFormat,
    max_violations: Option<usize>,
    no_parallel: bool,
) -> Result<i32> {
    let validator = open_session(cli, !no_parallel, max_violations)?;

    let report = match from {
        Some(start) => validator.overview_from(start),
        None => validator.overview(),
    }
    .context("Overview pass failed")?;

    println!("{}", validator.format_report(&report, format)?);

    Ok(if report.has_violations() { EXIT_VIOLATIONS } else { EXIT_CLEAN })
}

fn run_file(cli: &Cli, paths: &[String]) -> Result<i32> {
    let validator = open_session(cli, false, None)?;
    let checks = validator.validate_changed_paths(paths, &[])?;

    let mut exit_code = EXIT_CLEAN;
    for check in &checks {
        println!("{}", describe_check(check));
        if !check.is_clean() {
            exit_code = EXIT_VIOLATIONS;
        }
    }

    Ok(exit_code)
}

fn describe_check(check: &PathCheck) -> String {
    let state = match check.file_state {
        Some(state) => state.as_str(),
        None => check.folder_state.as_str(),
    };

    match &check.violation {
        Some(violation) => format!("{} [{}]: {}", check.path, state, violation.describe()),
        None => format!("{} [{}]", check.path, state),
    }
}

fn run_validate_config(config_path: Option<PathBuf>, root: &Path) -> Result<i32> {
    let config_path = match config_path {
        Some(path) => path,
        None => ConventionDocument::discover(root)
            .or_else(|| root.parent().and_then(ConventionDocument::discover))
            .unwrap_or_else(|| PathBuf::from(config::CONFIG_FILE_NAMES[0])),
    };

    println!("Validating configuration: {}", config_path.display());

    let document = match ConventionDocument::load_from_file(&config_path)
        .and_then(|document| document.verify_rule_catalogue().map(|_| document))
    {
        Ok(document) => document,
        Err(e) if e.is_configuration() => {
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_VIOLATIONS);
        }
        Err(e) => return Err(e).context("Configuration could not be checked"),
    };

    println!("Configuration is valid");
    if !document.active {
        println!("  (document is inactive)");
        return Ok(EXIT_CLEAN);
    }

    let stats = convention_guardian::ConventionStats::from_document(&document);
    println!("Configuration summary:");
    println!(
        "  Folder rules: {} ({} allow subfolders)",
        stats.folder_rules, stats.folders_allowing_subfolders
    );
    println!("  Naming specs: {} ({} templates)", stats.naming_specs, stats.naming_templates);
    println!("  Rule keys: {}, rule functions: {}", stats.rule_keys, stats.rule_functions);
    println!("  Ignore entries: {}", stats.ignore_entries);
    println!("  Fingerprint: {}", document.fingerprint());

    Ok(EXIT_CLEAN)
}

fn run_explain(cli: &Cli, file_type: &str) -> Result<i32> {
    let validator = open_session(cli, false, None)?;
    let explained = validator.explain(file_type)?;

    if explained.is_empty() {
        eprintln!("No naming templates registered for '{}'", config::normalize_type(file_type));
        return Ok(EXIT_VIOLATIONS);
    }

    println!("Naming templates for '{}':", config::normalize_type(file_type));
    for (template, pattern) in explained {
        println!("  {template}");
        println!("    {pattern}");
    }

    Ok(EXIT_CLEAN)
}

fn run_list_rules(cli: &Cli) -> Result<i32> {
    let validator = open_session(cli, false, None)?;
    let document = validator.document();

    if !document.active {
        println!("Convention document is inactive");
        return Ok(EXIT_CLEAN);
    }

    println!("Folder rules");
    for rule in &document.folder_rules {
        println!("  {} [{}]", rule.path, rule.allowed_types.join(", "));
    }

    println!("\nNaming templates");
    for spec in &document.naming_specs {
        println!("  {} -> {}", spec.types.join(", "), spec.templates.join(" | "));
    }

    println!("\nRule keys");
    for key in &document.rule_keys {
        let rules: Vec<_> = key.rules.iter().map(|rule| rule.source.as_str()).collect();
        println!("  {{{}}} = {}", key.name, rules.join(", "));
    }

    println!("\nRule functions");
    for function in &document.rule_functions {
        println!("  {}() = {}", function.function, function.pattern);
    }

    if !document.ignored_folders.is_empty()
        || !document.ignored_file_types.is_empty()
        || !document.ignored_file_names.is_empty()
    {
        println!("\nIgnored");
        println!("  folders: {}", document.ignored_folders.join(", "));
        println!("  file types: {}", document.ignored_file_types.join(", "));
        println!("  files: {}", document.ignored_file_names.join(", "));
    }

    Ok(EXIT_CLEAN)
}

fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
