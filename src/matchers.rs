//! Pattern matchers.
//!
//! Every function here is a pure function of its inputs: text in, boolean or
//! count out. Matching is literal substring or regular-expression matching,
//! never tokenization, so results are deliberately permissive. An identifier
//! that is a substring of another identifier matches it (`Reset` is satisfied
//! by `ResetAll`) unless [`MatchMode::Word`] is selected.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// How identifiers are located in text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Plain substring search. Accepts false positives on shared prefixes.
    #[default]
    Literal,
    /// Identifier must stand on word boundaries.
    Word,
}

/// Found/required counts for set-style checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub found: usize,
    pub required: usize,
    /// Required items that were not found, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl Tally {
    pub fn is_complete(&self) -> bool {
        self.found == self.required && self.missing.is_empty()
    }
}

/// True iff a file resolved and has content.
pub fn exists(text: Option<&str>) -> bool {
    text.map(|t| !t.is_empty()).unwrap_or(false)
}

/// Non-overlapping literal occurrences of `token` in `text`.
///
/// An empty token never matches.
pub fn count(text: &str, token: &str) -> usize {
    if token.is_empty() {
        return 0;
    }
    text.matches(token).count()
}

/// Summed occurrences of several tokens.
pub fn occurrences<S: AsRef<str>>(text: &str, tokens: &[S]) -> usize {
    tokens.iter().map(|t| count(text, t.as_ref())).sum()
}

/// Whether `ident` appears in `text` under the given mode.
pub fn contains_identifier(text: &str, ident: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Literal => !ident.is_empty() && text.contains(ident),
        MatchMode::Word => !ident.is_empty() && word_regex(ident).is_match(text),
    }
}

/// Whether `text` holds a call-shaped occurrence of `ident`.
///
/// Literal mode accepts any call token containing the identifier
/// (`Foo` matches `Foo (`, `FooBar(` and `XFoo(`). Word mode requires the
/// identifier itself to be called (`\bFoo\s*\(`).
pub fn has_call(text: &str, ident: &str, mode: MatchMode) -> bool {
    !ident.is_empty() && call_regex(ident, mode).is_match(text)
}

/// Identifier declared in `declaration` and called in `implementation`.
pub fn dual_presence(declaration: &str, implementation: &str, ident: &str, mode: MatchMode) -> bool {
    contains_identifier(declaration, ident, mode) && has_call(implementation, ident, mode)
}

/// Apply [`dual_presence`] to an ordered set of identifiers.
pub fn dual_presence_all<S: AsRef<str>>(
    declaration: &str,
    implementation: &str,
    idents: &[S],
    mode: MatchMode,
) -> Tally {
    let mut tally = Tally {
        required: idents.len(),
        ..Default::default()
    };
    for ident in idents {
        let ident = ident.as_ref();
        if dual_presence(declaration, implementation, ident, mode) {
            tally.found += 1;
        } else {
            tally.missing.push(ident.to_string());
        }
    }
    tally
}

/// Every field name present in the declaration text.
///
/// When `owner` is given and absent from the text, nothing counts as found:
/// the fields cannot belong to a type that is not there.
pub fn fields_present<S: AsRef<str>>(
    declaration: &str,
    owner: Option<&str>,
    fields: &[S],
    mode: MatchMode,
) -> Tally {
    let owner_present = owner
        .map(|o| declaration.contains(o))
        .unwrap_or(true);

    let mut tally = Tally {
        required: fields.len(),
        ..Default::default()
    };
    for field in fields {
        let field = field.as_ref();
        if owner_present && contains_identifier(declaration, field, mode) {
            tally.found += 1;
        } else {
            tally.missing.push(field.to_string());
        }
    }
    tally
}

/// Occurrence counts of a begin and end token.
pub fn paired_counts(text: &str, begin: &str, end: &str) -> (usize, usize) {
    (count(text, begin), count(text, end))
}

/// Paired-count invariant: counts equal, and non-zero when usage is required.
pub fn paired_balanced(begin: usize, end: usize, require_usage: bool) -> bool {
    begin == end && (!require_usage || begin > 0)
}

/// Threshold rule: the sum strictly exceeds `min`.
pub fn exceeds(total: usize, min: usize) -> bool {
    total > min
}

/// Number of regex matches in `text`.
pub fn regex_count(text: &str, re: &Regex) -> usize {
    re.find_iter(text).count()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Escaped identifier with `\b` only on the sides that begin or end with a
/// word character; `\b` next to `+` or `~` would never match.
fn bounded(ident: &str, trailing: bool) -> String {
    let mut pattern = String::new();
    if ident.chars().next().is_some_and(is_word_char) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(ident));
    if trailing && ident.chars().last().is_some_and(is_word_char) {
        pattern.push_str(r"\b");
    }
    pattern
}

fn word_regex(ident: &str) -> Regex {
    // Escaped input always yields a valid pattern.
    Regex::new(&bounded(ident, true)).expect("escaped identifier")
}

fn call_regex(ident: &str, mode: MatchMode) -> Regex {
    let pattern = match mode {
        MatchMode::Literal => format!(r"{}\w*\s*\(", regex::escape(ident)),
        MatchMode::Word => format!(r"{}\s*\(", bounded(ident, false)),
    };
    Regex::new(&pattern).expect("escaped identifier")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exists() {
        assert!(exists(Some("x")));
        assert!(!exists(Some("")));
        assert!(!exists(None));
    }

    #[test]
    fn test_dual_presence_basic() {
        let decl = "class Provider { void Foo(); };";
        let imp = "void Provider::Foo() {}";
        assert!(dual_presence(decl, imp, "Foo", MatchMode::Literal));
        assert!(dual_presence(decl, imp, "Foo", MatchMode::Word));
    }

    #[test]
    fn test_dual_presence_whitespace_before_paren() {
        assert!(dual_presence("Foo", "Foo  \n(", "Foo", MatchMode::Literal));
    }

    #[test]
    fn test_dual_presence_requires_call_shape() {
        // Mentioned but never called.
        assert!(!dual_presence("Foo", "// Foo is documented here", "Foo", MatchMode::Literal));
        // Declared nowhere.
        assert!(!dual_presence("Bar", "Foo()", "Foo", MatchMode::Literal));
    }

    #[test]
    fn test_literal_mode_accepts_longer_identifier() {
        // Accepted false positive: substring of a longer call token.
        assert!(dual_presence("Foo", "FooBar()", "Foo", MatchMode::Literal));
        assert!(dual_presence("ResetAll", "ResetAll()", "Reset", MatchMode::Literal));
    }

    #[test]
    fn test_word_mode_rejects_longer_identifier() {
        assert!(!dual_presence("Foo", "FooBar()", "Foo", MatchMode::Word));
        assert!(!dual_presence("ResetAll", "ResetAll()", "Reset", MatchMode::Word));
    }

    #[test]
    fn test_dual_presence_all_counts() {
        let decl = "A(); B(); C();";
        let imp = "A() {} B() {}";
        let tally = dual_presence_all(decl, imp, &["A", "B", "C"], MatchMode::Literal);
        assert_eq!(tally.found, 2);
        assert_eq!(tally.required, 3);
        assert_eq!(tally.missing, vec!["C".to_string()]);
        assert!(!tally.is_complete());
    }

    #[test]
    fn test_identifier_with_regex_metacharacters() {
        assert!(has_call("operator+(a, b)", "operator+", MatchMode::Literal));
    }

    #[test]
    fn test_word_mode_operator_and_destructor() {
        let decl = "class Vec2 { Vec2 operator+(const Vec2&); ~Vec2(); };";
        let imp = "Vec2 Vec2::operator+(const Vec2& o) {}\nVec2::~Vec2() {}";
        assert!(contains_identifier(decl, "operator+", MatchMode::Word));
        assert!(dual_presence(decl, imp, "operator+", MatchMode::Word));
        assert!(dual_presence(decl, imp, "~Vec2", MatchMode::Word));
        // The word-character side still needs a boundary.
        assert!(!contains_identifier("xoperator+", "operator+", MatchMode::Word));
    }

    #[test]
    fn test_fields_present_with_owner() {
        let decl = "struct DCStreamInfo { int width_; int height_; };";
        let tally = fields_present(decl, Some("struct DCStreamInfo"), &["width_", "height_"], MatchMode::Literal);
        assert!(tally.is_complete());

        let tally = fields_present(decl, Some("struct Other"), &["width_"], MatchMode::Literal);
        assert_eq!(tally.found, 0);
        assert_eq!(tally.missing, vec!["width_".to_string()]);
    }

    #[test]
    fn test_fields_present_without_owner() {
        let tally = fields_present("index_ size_", None, &["index_", "size_", "virAddr_"], MatchMode::Literal);
        assert_eq!(tally.found, 2);
        assert_eq!(tally.missing, vec!["virAddr_".to_string()]);
    }

    #[test]
    fn test_paired_counts() {
        let text = "StartX StopX StartX StopX StartX StopX";
        let (b, e) = paired_counts(text, "StartX", "StopX");
        assert_eq!((b, e), (3, 3));
        assert!(paired_balanced(b, e, true));

        let (b, e) = paired_counts("StartX StartX StartX StopX StopX", "StartX", "StopX");
        assert_eq!((b, e), (3, 2));
        assert!(!paired_balanced(b, e, false));
    }

    #[test]
    fn test_paired_zero_usage() {
        assert!(paired_balanced(0, 0, false));
        assert!(!paired_balanced(0, 0, true));
    }

    #[test]
    fn test_occurrences_and_threshold() {
        let text = "DHLOGI(a); DHLOGE(b); DHLOGI(c);";
        let total = occurrences(text, &["DHLOGI", "DHLOGW", "DHLOGE"]);
        assert_eq!(total, 3);
        assert!(exceeds(total, 0));
        assert!(!exceeds(total, 3));
        assert!(!exceeds(0, 0));
    }

    #[test]
    fn test_count_forbidden_token() {
        assert_eq!(count("std::cout << a; std::cout << b;", "std::cout"), 2);
        assert_eq!(count("anything", ""), 0);
    }

    #[test]
    fn test_regex_count() {
        let re = Regex::new(r"Test_\w+").unwrap();
        assert_eq!(regex_count("Test_A(); Test_B();", &re), 2);
    }
}
