//! Evaluation of a single check against the corpus.

use std::sync::Arc;

use regex::Regex;

use crate::contract::{CheckSpec, CountUnit, FileSet, Matcher, TokenRule};
use crate::corpus::{Corpus, LoadError};
use crate::matchers::{self, MatchMode, Tally};

use super::{CheckResult, IssueKind};

/// Evaluate one check. Never fails: every problem becomes part of the result.
pub fn evaluate(spec: &CheckSpec, corpus: &Corpus, mode: MatchMode) -> CheckResult {
    evaluate_matcher(spec, corpus, mode).informational(!spec.is_gating())
}

fn evaluate_matcher(spec: &CheckSpec, corpus: &Corpus, mode: MatchMode) -> CheckResult {
    let name = spec.name.as_str();
    let kind = spec.matcher.kind();

    // Any missing required file short-circuits the check. Existence checks
    // report missing files themselves.
    if !matches!(spec.matcher, Matcher::Exists { .. }) {
        let missing: Vec<LoadError> = spec
            .required_files()
            .into_iter()
            .filter_map(|path| corpus.load(path).err())
            .collect();
        if !missing.is_empty() {
            return missing_files(name, kind, &missing);
        }
    }

    match &spec.matcher {
        Matcher::Exists { paths } => check_exists(name, kind, paths, corpus),
        Matcher::Interface {
            interface,
            declaration,
            implementation,
            methods,
        } => {
            let decl = text(corpus, declaration);
            let imp = text(corpus, implementation);
            let tally = matchers::dual_presence_all(&decl, &imp, methods, mode);
            check_interface(name, kind, interface, tally)
        }
        Matcher::Fields {
            file,
            owner,
            fields,
        } => {
            let decl = text(corpus, file);
            let tally = matchers::fields_present(&decl, owner.as_deref(), fields, mode);
            let absent_owner = owner.as_deref().filter(|o| !decl.contains(o));
            check_fields(name, kind, file, absent_owner, tally)
        }
        Matcher::Paired {
            file,
            begin,
            end,
            require_usage,
        } => {
            let (b, e) = matchers::paired_counts(&text(corpus, file), begin, end);
            check_paired(name, kind, file, begin, end, b, e, *require_usage)
        }
        Matcher::Threshold { file, tokens, min } => {
            let total = matchers::occurrences(&text(corpus, file), tokens);
            check_threshold(name, kind, file, tokens, total, *min)
        }
        Matcher::Forbidden {
            token,
            files,
            require,
            allow_empty,
        } => check_forbidden(name, kind, corpus, token, files, require, *allow_empty),
        Matcher::Tokens { rules } => check_tokens(name, kind, corpus, rules),
        Matcher::Regex {
            file,
            patterns,
            min_count,
        } => check_regex(name, kind, &text(corpus, file), file, patterns, *min_count),
        Matcher::Count {
            files,
            tokens,
            unit,
        } => check_count(name, kind, corpus, files, tokens, *unit),
    }
}

/// Paths named by a file set. A walk over a missing directory yields
/// `NotFound`; a walk that hits an unreadable entry yields `Unreadable`.
fn resolve_files(corpus: &Corpus, files: &FileSet) -> Result<Vec<String>, LoadError> {
    match files {
        FileSet::Paths(paths) => Ok(paths.clone()),
        FileSet::Walk { dir, glob } => corpus.discover(dir, glob),
    }
}

/// Text of a file the missing-file short-circuit already confirmed loadable.
fn text(corpus: &Corpus, path: &str) -> Arc<str> {
    corpus.load(path).unwrap_or_else(|_| Arc::from(""))
}

fn missing_files(name: &str, kind: &str, missing: &[LoadError]) -> CheckResult {
    let paths: Vec<&str> = missing.iter().map(LoadError::path).collect();
    let mut result = CheckResult::fail(name, kind, format!("file not found: {}", paths.join(", ")));
    for e in missing {
        result = result.issue(IssueKind::MissingResource, e.to_string());
    }
    result
}

fn check_exists(name: &str, kind: &str, paths: &[String], corpus: &Corpus) -> CheckResult {
    let missing: Vec<&String> = paths.iter().filter(|p| !corpus.exists(p)).collect();
    let tally = Tally {
        found: paths.len() - missing.len(),
        required: paths.len(),
        missing: missing.iter().map(|p| p.to_string()).collect(),
    };

    if missing.is_empty() {
        return CheckResult::pass(name, kind, format!("all {} files present", paths.len()))
            .with_tally(tally);
    }

    let mut result = CheckResult::fail(
        name,
        kind,
        format!("missing {} of {} files", missing.len(), paths.len()),
    )
    .with_tally(tally);
    for p in missing {
        result = result.issue(IssueKind::MissingResource, format!("file not found: {}", p));
    }
    result
}

fn check_interface(name: &str, kind: &str, interface: &str, tally: Tally) -> CheckResult {
    if tally.is_complete() {
        return CheckResult::pass(name, kind, format!("all {} methods implemented", tally.required))
            .with_tally(tally);
    }

    let mut result = CheckResult::fail(
        name,
        kind,
        format!(
            "found {} methods, missing {}",
            tally.found,
            tally.missing.len()
        ),
    );
    for method in &tally.missing {
        result = result.issue(
            IssueKind::PartialMatch,
            format!("{}::{} is not both declared and implemented", interface, method),
        );
    }
    result.with_tally(tally)
}

fn check_fields(
    name: &str,
    kind: &str,
    file: &str,
    absent_owner: Option<&str>,
    tally: Tally,
) -> CheckResult {
    if tally.is_complete() {
        return CheckResult::pass(name, kind, format!("all {} fields present", tally.required))
            .with_tally(tally);
    }

    let mut result = CheckResult::fail(
        name,
        kind,
        format!("found {} of {} fields", tally.found, tally.required),
    );
    if let Some(owner) = absent_owner {
        result = result.issue(
            IssueKind::PartialMatch,
            format!("{}: {:?} not found", file, owner),
        );
    }
    for field in &tally.missing {
        result = result.issue(
            IssueKind::PartialMatch,
            format!("{}: field {:?} missing", file, field),
        );
    }
    result.with_tally(tally)
}

#[allow(clippy::too_many_arguments)]
fn check_paired(
    name: &str,
    kind: &str,
    file: &str,
    begin: &str,
    end: &str,
    b: usize,
    e: usize,
    require_usage: bool,
) -> CheckResult {
    let pair = format!("{}/{}", begin, end);
    if matchers::paired_balanced(b, e, require_usage) {
        return CheckResult::pass(name, kind, format!("{} balanced ({} vs {})", pair, b, e));
    }

    if b != e {
        CheckResult::fail(name, kind, format!("{} mismatch ({} vs {})", pair, b, e)).issue(
            IssueKind::Imbalance,
            format!("{}: {} mismatch ({} vs {})", file, pair, b, e),
        )
    } else {
        CheckResult::fail(name, kind, format!("{} never used", pair))
            .issue(IssueKind::Imbalance, format!("{}: no {} calls", file, pair))
    }
}

fn check_threshold(
    name: &str,
    kind: &str,
    file: &str,
    tokens: &[String],
    total: usize,
    min: usize,
) -> CheckResult {
    let joined = tokens.join("/");
    if matchers::exceeds(total, min) {
        return CheckResult::pass(name, kind, format!("found {} {} calls", total, joined));
    }

    let detail = if total == 0 {
        format!("{}: {} not used", file, joined)
    } else {
        format!("{}: {} used {} times, need more than {}", file, joined, total, min)
    };
    CheckResult::fail(name, kind, format!("found {} {} calls, need more than {}", total, joined, min))
        .issue(IssueKind::ConventionViolation, detail)
}

fn check_forbidden(
    name: &str,
    kind: &str,
    corpus: &Corpus,
    token: &str,
    files: &FileSet,
    require: &[String],
    allow_empty: bool,
) -> CheckResult {
    let paths = match resolve_files(corpus, files) {
        Ok(paths) => paths,
        Err(LoadError::NotFound(_)) if allow_empty => Vec::new(),
        Err(e) => return missing_files(name, kind, &[e]),
    };

    if paths.is_empty() {
        return if allow_empty {
            CheckResult::pass(name, kind, "no files to inspect")
        } else {
            CheckResult::fail(name, kind, "no files to inspect")
                .issue(IssueKind::MissingResource, "file set resolved to no files")
        };
    }

    let mut result = CheckResult::pass(name, kind, "");
    let mut occurrences = 0;
    let mut unreadable = 0;
    for path in &paths {
        // Walked files bypass the up-front existence check.
        let content = match corpus.load(path) {
            Ok(content) => content,
            Err(e) => {
                unreadable += 1;
                result = result.issue(IssueKind::MissingResource, e.to_string());
                continue;
            }
        };

        let n = matchers::count(&content, token);
        if n > 0 {
            occurrences += n;
            result = result.issue_weighted(
                IssueKind::ConventionViolation,
                format!("{} uses {} {} times", path, token, n),
                n,
            );
        }

        for required in require {
            if matchers::count(&content, required) == 0 {
                result = result.issue(
                    IssueKind::ConventionViolation,
                    format!("{} does not use {}", path, required),
                );
            }
        }
    }

    result.passed = result.issues.is_empty();
    result.message = if occurrences > 0 {
        format!("{} found {} times in {} files", token, occurrences, paths.len())
    } else if unreadable > 0 {
        format!("could not read {} of {} files", unreadable, paths.len())
    } else if !result.passed {
        format!("required calls missing in {} files", paths.len())
    } else {
        format!("{} absent from {} files", token, paths.len())
    };
    result
}

fn check_count(
    name: &str,
    kind: &str,
    corpus: &Corpus,
    files: &FileSet,
    tokens: &[String],
    unit: CountUnit,
) -> CheckResult {
    let paths = match resolve_files(corpus, files) {
        Ok(paths) => paths,
        Err(LoadError::NotFound(dir)) => {
            return CheckResult::pass(name, kind, format!("0 (no directory {})", dir)).with_value(0)
        }
        Err(e) => return missing_files(name, kind, &[e]).with_value(0),
    };

    let mut result = CheckResult::pass(name, kind, "");
    let mut value = 0;
    let mut read = 0;
    for path in &paths {
        let content = match corpus.load(path) {
            Ok(content) => content,
            Err(e) => {
                result = result.issue(IssueKind::MissingResource, e.to_string());
                continue;
            }
        };
        read += 1;
        let n = matchers::occurrences(&content, tokens);
        value += match unit {
            CountUnit::Occurrences => n,
            CountUnit::Files => usize::from(n > 0),
        };
    }

    result.passed = result.issues.is_empty();
    result.message = match unit {
        CountUnit::Occurrences => format!("{} occurrences in {} files", value, read),
        CountUnit::Files => format!("{} of {} files", value, read),
    };
    result.with_value(value)
}

fn check_tokens(name: &str, kind: &str, corpus: &Corpus, rules: &[TokenRule]) -> CheckResult {
    let mut tally = Tally {
        required: rules.len(),
        ..Default::default()
    };
    let mut details = Vec::new();

    for rule in rules {
        let n = matchers::occurrences(&text(corpus, &rule.file), &rule.any_of);
        if n >= rule.min_count {
            tally.found += 1;
        } else {
            tally.missing.push(rule.label());
            details.push(format!("{}: {} found {} times", rule.file, rule.label(), n));
        }
    }

    if tally.is_complete() {
        return CheckResult::pass(name, kind, format!("all {} token rules satisfied", tally.required))
            .with_tally(tally);
    }

    let mut result = CheckResult::fail(
        name,
        kind,
        format!("incomplete: {}", tally.missing.join(", ")),
    );
    for d in details {
        result = result.issue(IssueKind::PartialMatch, d);
    }
    result.with_tally(tally)
}

fn check_regex(
    name: &str,
    kind: &str,
    content: &str,
    file: &str,
    patterns: &[String],
    min_count: usize,
) -> CheckResult {
    let mut tally = Tally {
        required: patterns.len(),
        ..Default::default()
    };
    let mut result = CheckResult::pass(name, kind, "");

    for p in patterns {
        let n = match Regex::new(p) {
            Ok(re) => matchers::regex_count(content, &re),
            Err(e) => {
                tally.missing.push(p.clone());
                result = result.issue(IssueKind::PartialMatch, format!("invalid pattern {:?}: {}", p, e));
                continue;
            }
        };
        if n >= min_count {
            tally.found += 1;
        } else {
            tally.missing.push(p.clone());
            result = result.issue(
                IssueKind::PartialMatch,
                format!("{}: pattern {:?} matched {} times, need {}", file, p, n, min_count),
            );
        }
    }

    result.passed = tally.is_complete();
    result.message = if result.passed {
        format!("all {} patterns matched", tally.required)
    } else {
        format!("matched {} of {} patterns", tally.found, tally.required)
    };
    result.with_tally(tally)
}
