//! Configuration loading and management for Convention Guardian
//!
//! Architecture: Anti-Corruption Layer - Configuration translates the external JSON document
//! - Raw serde structures mirror the camelCase document shape exactly
//! - They are converted once into a typed, normalized `ConventionDocument`
//! - The document acts as a repository for folder rules, naming specs and rule functions

use crate::domain::entry::{normalize_path, FOLDER_SENTINEL};
use crate::domain::remediation::IgnoreTarget;
use crate::domain::violations::{ConventionError, ConventionResult};
use crate::patterns::{RuleCompiler, TemplateMode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// File names tried, in order, when no configuration path is given
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "convention_guardian.json",
    ".convention_guardian.json",
    "convention_guardian.yaml",
    "convention_guardian.yml",
];

/// Raw document shape as written on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default)]
    folder_structure: RawFolderStructure,
    #[serde(default)]
    naming_convention: RawNamingConvention,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFolderStructure {
    #[serde(default)]
    check: RawCheck,
    #[serde(default)]
    ignore: RawIgnore,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawCheck {
    #[serde(default)]
    folders: Vec<RawFolderRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFolderRule {
    path: String,
    #[serde(default)]
    file_types_allowed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIgnore {
    #[serde(default)]
    folders: Vec<String>,
    #[serde(default)]
    file_types: Vec<String>,
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNamingConvention {
    #[serde(default)]
    file_types: Vec<RawNamingSpec>,
    #[serde(default)]
    convention_key_rules: Vec<RawKeyRules>,
    #[serde(default)]
    regex_dictionary: Vec<RawRuleFunction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawNamingSpec {
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    conventions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawKeyRules {
    key: String,
    #[serde(default)]
    rules: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawRuleFunction {
    function: String,
    regex: String,
}

/// A declared folder and the file types allowed directly inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRule {
    /// Canonical forward-slash path
    pub path: String,
    /// Lowercase types; the `folder` sentinel permits subfolders
    pub allowed_types: Vec<String>,
}

impl FolderRule {
    pub fn new(path: impl AsRef<str>, types: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let mut rule = Self { path: normalize_path(path.as_ref()), allowed_types: Vec::new() };
        for file_type in types {
            rule.add_type(file_type.as_ref());
        }
        rule
    }

    /// Add a type, returning whether it was new
    pub fn add_type(&mut self, file_type: &str) -> bool {
        let normalized = normalize_type(file_type);
        if normalized.is_empty() || self.allowed_types.contains(&normalized) {
            return false;
        }
        self.allowed_types.push(normalized);
        true
    }

    pub fn allows(&self, file_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == file_type)
    }

    pub fn allows_subfolders(&self) -> bool {
        self.allows(FOLDER_SENTINEL)
    }
}

/// Naming templates shared by one or more file types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingSpec {
    pub types: Vec<String>,
    /// Ordered templates; a name is valid if any of them matches
    pub templates: Vec<String>,
}

/// A parsed `function(argument)` rule expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleExpression {
    pub function: String,
    pub argument: String,
    /// Expression exactly as declared
    pub source: String,
}

impl RuleExpression {
    /// Split an expression into function name and argument
    ///
    /// The argument is the text between the first `(` and the final `)`. An expression
    /// without parentheses is a function with an empty argument.
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        let (function, argument) = match trimmed.find('(') {
            Some(open) => {
                let rest = &trimmed[open + 1..];
                let argument = match rest.rfind(')') {
                    Some(close) => &rest[..close],
                    None => rest,
                };
                (trimmed[..open].trim(), argument)
            }
            None => (trimmed, ""),
        };

        Self {
            function: function.to_string(),
            argument: argument.to_string(),
            source: source.to_string(),
        }
    }
}

/// A named bundle of rule expressions referenced by template placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleKey {
    /// Key name without braces
    pub name: String,
    pub rules: Vec<RuleExpression>,
}

/// A rule function and its pattern template containing `KEY`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFunction {
    pub function: String,
    pub pattern: String,
}

/// Typed, normalized convention document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDocument", into = "RawDocument")]
pub struct ConventionDocument {
    /// Global switch; an inactive document carries no rule data
    pub active: bool,
    pub folder_rules: Vec<FolderRule>,
    /// Folder entries, matched as substrings (or globs when they contain wildcards)
    pub ignored_folders: Vec<String>,
    /// Lowercase types without a dot
    pub ignored_file_types: Vec<String>,
    /// Exact file names
    pub ignored_file_names: Vec<String>,
    pub naming_specs: Vec<NamingSpec>,
    pub rule_keys: Vec<RuleKey>,
    pub rule_functions: Vec<RuleFunction>,
}

impl Default for ConventionDocument {
    fn default() -> Self {
        Self {
            active: true,
            folder_rules: Vec::new(),
            ignored_folders: Vec::new(),
            ignored_file_types: Vec::new(),
            ignored_file_names: Vec::new(),
            naming_specs: Vec::new(),
            rule_keys: Vec::new(),
            rule_functions: Vec::new(),
        }
    }
}

impl TryFrom<RawDocument> for ConventionDocument {
    type Error = ConventionError;

    fn try_from(raw: RawDocument) -> ConventionResult<Self> {
        if !raw.active {
            return Ok(Self::inactive());
        }

        let mut document = Self::default();

        for raw_rule in raw.folder_structure.check.folders {
            let rule = FolderRule::new(&raw_rule.path, &raw_rule.file_types_allowed);
            if document.folder_rule(&rule.path).is_some() {
                return Err(ConventionError::config(format!(
                    "Duplicate folder rule for path '{}'",
                    rule.path
                )));
            }
            document.folder_rules.push(rule);
        }

        let ignore = raw.folder_structure.ignore;
        for folder in ignore.folders {
            push_unique(&mut document.ignored_folders, normalize_path(folder.trim()));
        }
        for file_type in ignore.file_types {
            push_unique(&mut document.ignored_file_types, normalize_type(&file_type));
        }
        for name in ignore.files {
            push_unique(&mut document.ignored_file_names, name.trim().to_string());
        }

        let naming = raw.naming_convention;
        for spec in naming.file_types {
            let mut types = Vec::new();
            for file_type in &spec.types {
                push_unique(&mut types, normalize_type(file_type));
            }
            document.naming_specs.push(NamingSpec { types, templates: spec.conventions });
        }

        for key_rules in naming.convention_key_rules {
            let name = normalize_key(&key_rules.key);
            if document.rule_key(&name).is_some() {
                tracing::warn!(key = %name, "Rule key declared more than once; the first declaration wins");
                continue;
            }
            let rules = key_rules.rules.iter().map(|rule| RuleExpression::parse(rule)).collect();
            document.rule_keys.push(RuleKey { name, rules });
        }

        for entry in naming.regex_dictionary {
            let function = entry.function.trim().to_string();
            if document.rule_function(&function).is_some() {
                tracing::warn!(function = %function, "Rule function declared more than once; the first declaration wins");
                continue;
            }
            document.rule_functions.push(RuleFunction { function, pattern: entry.regex });
        }

        document.validate()?;
        Ok(document)
    }
}

impl From<ConventionDocument> for RawDocument {
    fn from(document: ConventionDocument) -> Self {
        RawDocument {
            active: document.active,
            folder_structure: RawFolderStructure {
                check: RawCheck {
                    folders: document
                        .folder_rules
                        .into_iter()
                        .map(|rule| RawFolderRule {
                            path: rule.path,
                            file_types_allowed: rule.allowed_types,
                        })
                        .collect(),
                },
                ignore: RawIgnore {
                    folders: document.ignored_folders,
                    file_types: document.ignored_file_types,
                    files: document.ignored_file_names,
                },
            },
            naming_convention: RawNamingConvention {
                file_types: document
                    .naming_specs
                    .into_iter()
                    .map(|spec| RawNamingSpec { types: spec.types, conventions: spec.templates })
                    .collect(),
                convention_key_rules: document
                    .rule_keys
                    .into_iter()
                    .map(|key| RawKeyRules {
                        key: key.name,
                        rules: key.rules.into_iter().map(|rule| rule.source).collect(),
                    })
                    .collect(),
                regex_dictionary: document
                    .rule_functions
                    .into_iter()
                    .map(|f| RawRuleFunction { function: f.function, regex: f.pattern })
                    .collect(),
            },
        }
    }
}

impl ConventionDocument {
    /// An inert document with no rule data
    pub fn inactive() -> Self {
        Self { active: false, ..Self::default() }
    }

    /// Load a document from a JSON or YAML file, chosen by extension
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConventionResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ConventionError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let parsed = if is_yaml {
            serde_yaml::from_str::<Self>(&contents).map_err(|e| e.to_string())
        } else {
            serde_json::from_str::<Self>(&contents).map_err(|e| e.to_string())
        };

        let document = parsed.map_err(|e| {
            ConventionError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            active = document.active,
            folders = document.folder_rules.len(),
            "Loaded convention document"
        );
        Ok(document)
    }

    /// Load a document from JSON text
    pub fn load_from_str(content: &str) -> ConventionResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| ConventionError::config(format!("Failed to parse config: {e}")))
    }

    /// Load a document from YAML text
    pub fn load_from_yaml_str(content: &str) -> ConventionResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ConventionError::config(format!("Failed to parse config: {e}")))
    }

    /// Find the first known configuration file in `dir`
    pub fn discover<P: AsRef<Path>>(dir: P) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.as_ref().join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Check structural invariants
    pub fn validate(&self) -> ConventionResult<()> {
        for (index, rule) in self.folder_rules.iter().enumerate() {
            if rule.path.is_empty() {
                return Err(ConventionError::config("Folder rule with an empty path"));
            }
            if self.folder_rules[..index].iter().any(|other| other.path == rule.path) {
                return Err(ConventionError::config(format!(
                    "Duplicate folder rule for path '{}'",
                    rule.path
                )));
            }
        }

        for key in &self.rule_keys {
            if key.name.is_empty() {
                return Err(ConventionError::config("Rule key with an empty name"));
            }
            if let Some(rule) = key.rules.iter().find(|rule| rule.function.is_empty()) {
                return Err(ConventionError::config(format!(
                    "Rule '{}' in key '{}' has no function name",
                    rule.source, key.name
                )));
            }
        }

        if let Some(function) = self.rule_functions.iter().find(|f| f.function.is_empty()) {
            return Err(ConventionError::config(format!(
                "Rule function with an empty name maps to '{}'",
                function.pattern
            )));
        }

        Ok(())
    }

    /// Check that every rule names a known function and every template compiles
    pub fn verify_rule_catalogue(&self) -> ConventionResult<()> {
        for key in &self.rule_keys {
            for rule in &key.rules {
                if self.rule_function(&rule.function).is_none() {
                    return Err(ConventionError::unknown_function(&rule.function, &rule.source));
                }
            }
        }

        let compiler = RuleCompiler::new(self, TemplateMode::default());
        for spec in &self.naming_specs {
            for template in &spec.templates {
                compiler.compile(template)?;
            }
        }

        Ok(())
    }

    /// Rule declared exactly at `path`
    pub fn folder_rule(&self, path: &str) -> Option<&FolderRule> {
        self.folder_rules.iter().find(|rule| rule.path == path)
    }

    /// First naming spec listing `file_type`
    pub fn naming_spec_for(&self, file_type: &str) -> Option<&NamingSpec> {
        self.naming_specs.iter().find(|spec| spec.types.iter().any(|t| t == file_type))
    }

    /// Rule bundle for a key, with or without surrounding braces
    pub fn rule_key(&self, name: &str) -> Option<&RuleKey> {
        let name = normalize_key(name);
        self.rule_keys.iter().find(|key| key.name == name)
    }

    /// Pattern template for a rule function
    pub fn rule_function(&self, function: &str) -> Option<&str> {
        self.rule_functions
            .iter()
            .find(|f| f.function == function)
            .map(|f| f.pattern.as_str())
    }

    /// Register `path` and allow `types` there, returning whether anything changed
    pub fn allow_types(&mut self, path: &str, types: &[String]) -> bool {
        let path = normalize_path(path);
        let mut changed = false;

        let index = match self.folder_rules.iter().position(|rule| rule.path == path) {
            Some(index) => index,
            None => {
                self.folder_rules.push(FolderRule::new(&path, Vec::<String>::new()));
                changed = true;
                self.folder_rules.len() - 1
            }
        };

        for file_type in types {
            changed |= self.folder_rules[index].add_type(file_type);
        }

        if changed {
            tracing::info!(path = %path, types = ?types, "Folder rule updated");
        }
        changed
    }

    /// Add an ignore entry, returning whether it was new
    pub fn ignore(&mut self, target: &IgnoreTarget) -> bool {
        let changed = match target {
            IgnoreTarget::Folder(path) => push_unique(&mut self.ignored_folders, normalize_path(path)),
            IgnoreTarget::FileType(file_type) => {
                push_unique(&mut self.ignored_file_types, normalize_type(file_type))
            }
            IgnoreTarget::FileName(name) => {
                push_unique(&mut self.ignored_file_names, name.trim().to_string())
            }
        };

        if changed {
            tracing::info!(target = ?target, "Ignore entry added");
        }
        changed
    }

    /// Serialize to pretty JSON in the document shape
    pub fn to_json(&self) -> ConventionResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConventionError::config(format!("Failed to serialize config: {e}")))
    }

    /// Write the document as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConventionResult<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, json + "\n")
            .map_err(|e| ConventionError::filesystem(path.display().to_string(), e))?;
        tracing::info!(path = %path.display(), "Saved convention document");
        Ok(())
    }

    /// Stable fingerprint of the document contents
    pub fn fingerprint(&self) -> String {
        let serialized = serde_json::to_string(self).unwrap_or_default();
        let digest = Sha256::digest(serialized.as_bytes());
        digest.iter().take(8).map(|byte| format!("{byte:02x}")).collect()
    }
}

/// Builder for programmatic construction
pub struct ConfigBuilder {
    raw: RawDocument,
}

impl ConfigBuilder {
    /// Create a builder for an empty, active document
    pub fn new() -> Self {
        Self { raw: RawDocument { active: true, ..Default::default() } }
    }

    pub fn active(mut self, active: bool) -> Self {
        self.raw.active = active;
        self
    }

    /// Declare a folder and its allowed types
    pub fn folder(mut self, path: impl Into<String>, types: &[&str]) -> Self {
        self.raw.folder_structure.check.folders.push(RawFolderRule {
            path: path.into(),
            file_types_allowed: types.iter().map(|t| t.to_string()).collect(),
        });
        self
    }

    pub fn ignore_folder(mut self, folder: impl Into<String>) -> Self {
        self.raw.folder_structure.ignore.folders.push(folder.into());
        self
    }

    pub fn ignore_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.raw.folder_structure.ignore.file_types.push(file_type.into());
        self
    }

    pub fn ignore_file_name(mut self, name: impl Into<String>) -> Self {
        self.raw.folder_structure.ignore.files.push(name.into());
        self
    }

    /// Declare naming templates for a set of types
    pub fn naming(mut self, types: &[&str], templates: &[&str]) -> Self {
        self.raw.naming_convention.file_types.push(RawNamingSpec {
            types: types.iter().map(|t| t.to_string()).collect(),
            conventions: templates.iter().map(|t| t.to_string()).collect(),
        });
        self
    }

    /// Declare a rule key and its expressions
    pub fn rule_key(mut self, key: impl Into<String>, rules: &[&str]) -> Self {
        self.raw.naming_convention.convention_key_rules.push(RawKeyRules {
            key: key.into(),
            rules: rules.iter().map(|r| r.to_string()).collect(),
        });
        self
    }

    /// Map a rule function to its pattern template
    pub fn rule_function(mut self, function: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.raw.naming_convention.regex_dictionary.push(RawRuleFunction {
            function: function.into(),
            regex: pattern.into(),
        });
        self
    }

    /// Build the final document
    pub fn build(self) -> ConventionResult<ConventionDocument> {
        ConventionDocument::try_from(self.raw)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_true() -> bool {
    true
}

/// Lowercase a file type and strip a leading dot
pub fn normalize_type(file_type: &str) -> String {
    file_type.trim().trim_start_matches('.').to_lowercase()
}

/// Strip surrounding braces from a rule key name
pub fn normalize_key(key: &str) -> String {
    key.trim().trim_start_matches('{').trim_end_matches('}').to_string()
}

fn push_unique(list: &mut Vec<String>, value: String) -> bool {
    if value.is_empty() || list.contains(&value) {
        return false;
    }
    list.push(value);
    true
}
