//! Rule compiler turning naming templates into full-match matchers
//!
//! Architectural Principle: Service Layer - RuleCompiler orchestrates rule expansion
//! - Rule expressions resolve through the document's rule function dictionary
//! - Compatible consecutive rules collapse into one alternation group
//! - Compiled matchers are cached for the lifetime of one validation pass

pub mod ignore_filter;

use crate::config::{normalize_key, ConventionDocument, RuleExpression};
use crate::domain::violations::{ConventionError, ConventionResult};
use regex::Regex;
use std::sync::{Arc, Mutex, OnceLock};

pub use ignore_filter::IgnoreFilter;

/// Token in a rule function pattern replaced by the rule argument
pub const KEY_TOKEN: &str = "KEY";

#[cfg(feature = "cache")]
const MATCHER_CACHE_CAPACITY: usize = 256;

/// How literal text between placeholders is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TemplateMode {
    /// Keep literal text, regex-escaped
    #[default]
    Literal,
    /// Drop everything except placeholders
    PlaceholdersOnly,
}

#[cfg(feature = "cache")]
type MatcherCache = lru::LruCache<String, Arc<Regex>>;

#[cfg(not(feature = "cache"))]
type MatcherCache = std::collections::HashMap<String, Arc<Regex>>;

/// Compiles rule expressions and naming templates against one document
pub struct RuleCompiler<'a> {
    document: &'a ConventionDocument,
    mode: TemplateMode,
    cache: Mutex<MatcherCache>,
}

impl<'a> RuleCompiler<'a> {
    pub fn new(document: &'a ConventionDocument, mode: TemplateMode) -> Self {
        #[cfg(feature = "cache")]
        let cache = lru::LruCache::new(
            std::num::NonZeroUsize::new(MATCHER_CACHE_CAPACITY)
                .expect("MATCHER_CACHE_CAPACITY is non-zero"),
        );
        #[cfg(not(feature = "cache"))]
        let cache = std::collections::HashMap::new();

        Self { document, mode, cache: Mutex::new(cache) }
    }

    pub fn mode(&self) -> TemplateMode {
        self.mode
    }

    /// Resolve one rule expression to a pattern fragment
    ///
    /// Every `KEY` token in the function's pattern is replaced by the argument. When the
    /// argument names a rule key, that key's group pattern is substituted instead.
    pub fn resolve_function_pattern(&self, expression: &RuleExpression) -> ConventionResult<String> {
        self.resolve_expression(expression, &mut Vec::new())
    }

    /// Combine a rule bundle into grouped alternations, `None` when the bundle is empty
    pub fn build_group_pattern(&self, rules: &[RuleExpression]) -> ConventionResult<Option<String>> {
        self.build_groups(rules, &mut Vec::new())
    }

    /// Expand a naming template into a pattern body, without anchors
    pub fn expand_template(&self, template: &str) -> ConventionResult<String> {
        let mut body = String::new();
        let mut discarded = String::new();
        let mut cursor = 0;

        for capture in placeholder_regex().captures_iter(template) {
            let (Some(whole), Some(key)) = (capture.get(0), capture.get(1)) else {
                continue;
            };

            self.push_literal(&template[cursor..whole.start()], &mut body, &mut discarded);
            cursor = whole.end();

            let key = key.as_str();
            match self.document.rule_key(key) {
                Some(bundle) => {
                    let mut trail = vec![bundle.name.clone()];
                    if let Some(group) = self.build_groups(&bundle.rules, &mut trail)? {
                        body.push_str(&group);
                    }
                }
                None => {
                    tracing::warn!(
                        template = %template,
                        key = %key,
                        "Naming template references an undefined rule key; it contributes nothing"
                    );
                }
            }
        }
        self.push_literal(&template[cursor..], &mut body, &mut discarded);

        if !discarded.is_empty() {
            tracing::warn!(
                template = %template,
                discarded = %discarded,
                "Literal template text discarded in placeholders-only mode"
            );
        }

        Ok(body)
    }

    /// Compile a template into an anchored matcher, reusing cached matchers
    pub fn compile(&self, template: &str) -> ConventionResult<Arc<Regex>> {
        if let Some(cached) = self.cached(template) {
            return Ok(cached);
        }

        let body = self.expand_template(template)?;
        let regex = Regex::new(&format!("^(?:{body})$")).map_err(|e| {
            ConventionError::pattern(format!(
                "Naming template '{template}' compiled to an invalid pattern '{body}': {e}"
            ))
        })?;
        tracing::debug!(template = %template, pattern = %regex.as_str(), "Compiled naming template");

        let regex = Arc::new(regex);
        self.store(template, Arc::clone(&regex));
        Ok(regex)
    }

    /// First template matching `full_name`, if any
    pub fn matching_template<'t>(
        &self,
        templates: &'t [String],
        full_name: &str,
    ) -> ConventionResult<Option<&'t str>> {
        for template in templates {
            if self.compile(template)?.is_match(full_name) {
                return Ok(Some(template.as_str()));
            }
        }
        Ok(None)
    }

    /// Whether any template matches `full_name`
    pub fn matches(&self, templates: &[String], full_name: &str) -> ConventionResult<bool> {
        Ok(self.matching_template(templates, full_name)?.is_some())
    }

    fn push_literal(&self, literal: &str, body: &mut String, discarded: &mut String) {
        if literal.is_empty() {
            return;
        }
        match self.mode {
            TemplateMode::Literal => body.push_str(&regex::escape(literal)),
            TemplateMode::PlaceholdersOnly => discarded.push_str(literal),
        }
    }

    fn resolve_expression(
        &self,
        expression: &RuleExpression,
        trail: &mut Vec<String>,
    ) -> ConventionResult<String> {
        let pattern = self
            .document
            .rule_function(&expression.function)
            .ok_or_else(|| ConventionError::unknown_function(&expression.function, &expression.source))?;

        if !pattern.contains(KEY_TOKEN) {
            return Ok(pattern.to_string());
        }

        let argument = match self.argument_key(&expression.argument) {
            Some(key) => {
                if trail.contains(&key) {
                    return Err(ConventionError::config(format!(
                        "Rule key '{}' refers to itself through '{}'",
                        key,
                        trail.join(" -> ")
                    )));
                }
                let bundle = self.document.rule_key(&key).map(|bundle| bundle.rules.as_slice());
                trail.push(key);
                let group = self.build_groups(bundle.unwrap_or_default(), trail)?;
                trail.pop();
                group.map(|g| format!("(?:{g})")).unwrap_or_default()
            }
            None => expression.argument.clone(),
        };

        Ok(pattern.replace(KEY_TOKEN, &argument))
    }

    /// Rule key named by an argument, if the argument is one
    fn argument_key(&self, argument: &str) -> Option<String> {
        if argument.is_empty() {
            return None;
        }
        self.document.rule_key(argument).map(|_| normalize_key(argument))
    }

    fn build_groups(
        &self,
        rules: &[RuleExpression],
        trail: &mut Vec<String>,
    ) -> ConventionResult<Option<String>> {
        match rules {
            [] => return Ok(None),
            [single] => return self.resolve_expression(single, trail).map(Some),
            _ => {}
        }

        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut previous: Option<&str> = None;

        for rule in rules {
            let fragment = self.resolve_expression(rule, trail)?;
            match (previous, groups.last_mut()) {
                (Some(last), Some(group)) if compatible(last, &rule.function) => group.push(fragment),
                _ => groups.push(vec![fragment]),
            }
            previous = Some(&rule.function);
        }

        Ok(Some(groups.iter().map(|group| format!("({})", group.join("|"))).collect()))
    }

    fn cached(&self, template: &str) -> Option<Arc<Regex>> {
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.get(template).cloned()
    }

    fn store(&self, template: &str, regex: Arc<Regex>) {
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        #[cfg(feature = "cache")]
        cache.put(template.to_string(), regex);
        #[cfg(not(feature = "cache"))]
        cache.insert(template.to_string(), regex);
    }
}

/// Whether two consecutive rule functions share one alternation group
pub fn compatible(first: &str, second: &str) -> bool {
    first == second || (is_positional(first) && is_positional(second))
}

fn is_positional(function: &str) -> bool {
    matches!(function, "prefix" | "suffix" | "sufix")
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{(\w+)\}").expect("placeholder pattern is a valid literal regex")
    })
}
