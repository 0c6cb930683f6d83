//! Contract schema definitions for contractlint.
//!
//! A contract is a declarative table of named checks. Each check names the
//! files it inspects and the matcher that decides whether it passes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::matchers::MatchMode;

/// Default location of the persisted report, relative to the project root.
pub const DEFAULT_REPORT_PATH: &str = "contract_verification_report.md";

/// Top-level contract definition.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Contract {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Identifier matching for interface and field checks (default: literal)
    #[serde(default)]
    pub identifier_matching: MatchMode,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

impl Contract {
    /// Parse a contract from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| Error::ContractParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a contract from YAML text (used for built-in templates).
    pub fn parse_str(name: &str, content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|source| Error::ContractParse {
            path: name.into(),
            source,
        })
    }

    /// Report path relative to the project root.
    pub fn report_path(&self) -> &str {
        self.report.path.as_deref().unwrap_or(DEFAULT_REPORT_PATH)
    }

    /// Report title, falling back to the contract name.
    pub fn report_title(&self) -> String {
        match &self.report.title {
            Some(t) => t.clone(),
            None if !self.name.is_empty() => format!("{} verification report", self.name),
            None => "Contract verification report".to_string(),
        }
    }

    pub fn check(&self, name: &str) -> Option<&CheckSpec> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// Settings for the persisted report.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ReportConfig {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Named interfaces whose status is listed in their own report section.
    #[serde(default)]
    pub key_interfaces: Vec<KeyInterface>,
}

/// A report label backed by the result of one check.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyInterface {
    pub label: String,
    pub check: String,
}

/// One named check.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Reported, but left out of the pass rate and the exit status.
    #[serde(default)]
    pub informational: bool,
    #[serde(flatten)]
    pub matcher: Matcher,
}

impl CheckSpec {
    /// Whether the result counts towards the pass rate. Measurements never do.
    pub fn is_gating(&self) -> bool {
        !self.informational && !matches!(self.matcher, Matcher::Count { .. })
    }

    /// Report label: the description when set, else the name.
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }

    /// Explicitly named files this check reads. Directory walks are resolved
    /// at run time and are not included. Measurements skip unreadable files
    /// instead of failing, so they list none.
    pub fn required_files(&self) -> Vec<&str> {
        match &self.matcher {
            Matcher::Exists { paths } => paths.iter().map(String::as_str).collect(),
            Matcher::Interface {
                declaration,
                implementation,
                ..
            } => vec![declaration.as_str(), implementation.as_str()],
            Matcher::Fields { file, .. }
            | Matcher::Paired { file, .. }
            | Matcher::Threshold { file, .. }
            | Matcher::Regex { file, .. } => vec![file.as_str()],
            Matcher::Forbidden { files, .. } => match files {
                FileSet::Paths(paths) => paths.iter().map(String::as_str).collect(),
                FileSet::Walk { .. } => Vec::new(),
            },
            Matcher::Count { .. } => Vec::new(),
            Matcher::Tokens { rules } => {
                let mut seen = Vec::new();
                for r in rules {
                    if !seen.contains(&r.file.as_str()) {
                        seen.push(r.file.as_str());
                    }
                }
                seen
            }
        }
    }
}

/// Matcher kind and its parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Matcher {
    /// Every path exists and is non-empty.
    Exists { paths: Vec<String> },
    /// Every method is declared in one file and called in another.
    Interface {
        interface: String,
        declaration: String,
        implementation: String,
        methods: Vec<String>,
    },
    /// Every field appears in the declaration file, optionally under an owner.
    Fields {
        file: String,
        #[serde(default)]
        owner: Option<String>,
        fields: Vec<String>,
    },
    /// Begin and end tokens occur equally often.
    Paired {
        file: String,
        begin: String,
        end: String,
        #[serde(default)]
        require_usage: bool,
    },
    /// Summed token occurrences strictly exceed `min`.
    Threshold {
        file: String,
        tokens: Vec<String>,
        #[serde(default)]
        min: usize,
    },
    /// A token that must not appear in any inspected file.
    Forbidden {
        token: String,
        files: FileSet,
        /// Tokens every inspected file must use instead.
        #[serde(default)]
        require: Vec<String>,
        /// Pass when the file set resolves to no files (default: false)
        #[serde(default)]
        allow_empty: bool,
    },
    /// Substring-set rules, each with alternatives and a minimum count.
    Tokens { rules: Vec<TokenRule> },
    /// Regular expressions that must each match at least `min_count` times.
    Regex {
        file: String,
        patterns: Vec<String>,
        #[serde(default = "default_min_count")]
        min_count: usize,
    },
    /// A measurement: token occurrences (or files holding a token) across a
    /// file set. Never fails a run.
    Count {
        files: FileSet,
        tokens: Vec<String>,
        #[serde(default)]
        unit: CountUnit,
    },
}

impl Matcher {
    pub fn kind(&self) -> &'static str {
        match self {
            Matcher::Exists { .. } => "exists",
            Matcher::Interface { .. } => "interface",
            Matcher::Fields { .. } => "fields",
            Matcher::Paired { .. } => "paired",
            Matcher::Threshold { .. } => "threshold",
            Matcher::Forbidden { .. } => "forbidden",
            Matcher::Tokens { .. } => "tokens",
            Matcher::Regex { .. } => "regex",
            Matcher::Count { .. } => "count",
        }
    }
}

/// Files a check inspects: explicit paths or a directory walk.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FileSet {
    Paths(Vec<String>),
    Walk {
        dir: String,
        #[serde(default = "default_glob")]
        glob: String,
    },
}

/// What a count measurement adds up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountUnit {
    /// Summed occurrences of every token.
    #[default]
    Occurrences,
    /// Files containing at least one of the tokens.
    Files,
}

/// One substring-set rule: the alternatives' summed count reaches `min_count`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TokenRule {
    pub file: String,
    pub any_of: Vec<String>,
    #[serde(default = "default_min_count")]
    pub min_count: usize,
}

impl TokenRule {
    /// Short human label, e.g. `"A" or "B"` or `"X" x6`.
    pub fn label(&self) -> String {
        let alts: Vec<String> = self.any_of.iter().map(|a| format!("{:?}", a)).collect();
        let joined = alts.join(" or ");
        if self.min_count > 1 {
            format!("{} x{}", joined, self.min_count)
        } else {
            joined
        }
    }
}

fn default_min_count() -> usize {
    1
}

fn default_glob() -> String {
    "*".to_string()
}

/// Validate a contract for correctness.
pub fn validate(contract: &Contract) -> Result<()> {
    let invalid = |msg: String| -> Result<()> { Err(Error::ContractInvalid(msg)) };

    let mut names = HashSet::new();
    for check in &contract.checks {
        if check.name.trim().is_empty() {
            return invalid("check with empty name".to_string());
        }
        if !names.insert(check.name.as_str()) {
            return invalid(format!("duplicate check name {:?}", check.name));
        }
        validate_matcher(&check.name, &check.matcher)?;
    }

    for key in &contract.report.key_interfaces {
        if !names.contains(key.check.as_str()) {
            return invalid(format!(
                "key interface {:?} refers to unknown check {:?}",
                key.label, key.check
            ));
        }
    }

    Ok(())
}

fn validate_matcher(name: &str, matcher: &Matcher) -> Result<()> {
    let empty = |what: &str| -> Result<()> {
        Err(Error::ContractInvalid(format!(
            "check {:?}: {} must not be empty",
            name, what
        )))
    };

    match matcher {
        Matcher::Exists { paths } if paths.is_empty() => empty("paths"),
        Matcher::Interface { methods, .. } if methods.is_empty() => empty("methods"),
        Matcher::Fields { fields, .. } if fields.is_empty() => empty("fields"),
        Matcher::Paired { begin, end, .. } if begin.is_empty() || end.is_empty() => {
            empty("begin/end tokens")
        }
        Matcher::Threshold { tokens, .. } if tokens.is_empty() => empty("tokens"),
        Matcher::Forbidden { token, .. } if token.is_empty() => empty("token"),
        Matcher::Count { tokens, .. } if tokens.iter().all(|t| t.is_empty()) => empty("tokens"),
        Matcher::Forbidden { files, .. } | Matcher::Count { files, .. } => {
            validate_file_set(name, files)
        }
        Matcher::Tokens { rules } if rules.is_empty() => empty("rules"),
        Matcher::Tokens { rules } => {
            if rules.iter().any(|r| r.any_of.is_empty()) {
                return empty("any_of");
            }
            Ok(())
        }
        Matcher::Regex { patterns, .. } if patterns.is_empty() => empty("patterns"),
        Matcher::Regex { patterns, .. } => {
            for p in patterns {
                regex::Regex::new(p).map_err(|e| {
                    Error::ContractInvalid(format!("check {:?}: invalid pattern {:?}: {}", name, p, e))
                })?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn validate_file_set(name: &str, files: &FileSet) -> Result<()> {
    match files {
        FileSet::Paths(_) => Ok(()),
        FileSet::Walk { glob, .. } => {
            globset::Glob::new(glob).map_err(|e| {
                Error::ContractInvalid(format!("check {:?}: invalid glob {:?}: {}", name, glob, e))
            })?;
            Ok(())
        }
    }
}
