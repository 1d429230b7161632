//! Field predicates.
//!
//! A [`Predicate`] is the condition attached to one named field in a
//! [`Filter`](crate::Filter): a function, a regular expression [`Pattern`], a
//! text literal (matched exactly, as a glob or as a regex depending on the
//! filter flags) or any other literal compared for equality.

use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::error::Result;

/// Function predicate. Returning an error is an evaluation failure, handled
/// according to the `on_error` policy.
pub type PredicateFn = Arc<dyn Fn(&Value) -> anyhow::Result<bool> + Send + Sync>;

/// The condition for a single field.
#[derive(Clone)]
pub enum Predicate {
    /// Called with the field value.
    Func(PredicateFn),
    /// Regular expression, full match against string values. Its own flags
    /// apply; the filter's `case_sensitive` does not.
    Pattern(Pattern),
    /// Text literal.
    Text(String),
    /// Any other literal, compared for equality.
    Literal(Value),
}

impl Predicate {
    /// Wraps a function predicate.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Predicate::Func(Arc::new(f))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Func(_) => f.write_str("Func(..)"),
            Predicate::Pattern(p) => f.debug_tuple("Pattern").field(&p.as_str()).finish(),
            Predicate::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Predicate::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
        }
    }
}

impl From<&str> for Predicate {
    fn from(s: &str) -> Self {
        Predicate::Text(s.to_string())
    }
}

impl From<String> for Predicate {
    fn from(s: String) -> Self {
        Predicate::Text(s)
    }
}

impl From<Pattern> for Predicate {
    fn from(pattern: Pattern) -> Self {
        Predicate::Pattern(pattern)
    }
}

/// Only the source text of a compiled `Regex` is available, so inline flags
/// (`(?i)`) carry over and `RegexBuilder` options do not. Use [`Pattern`] for
/// those.
impl From<Regex> for Predicate {
    fn from(re: Regex) -> Self {
        Predicate::Pattern(Pattern::new(re.as_str()))
    }
}

impl From<Value> for Predicate {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => Predicate::Text(s),
            other => Predicate::Literal(other),
        }
    }
}

macro_rules! literal_from {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Predicate {
                fn from(v: $ty) -> Self {
                    Predicate::Literal(Value::from(v))
                }
            }
        )+
    };
}

literal_from!(bool, i32, i64, u32, u64, f64);

/// A regular expression source and the flags it is compiled with.
///
/// Patterns always match the whole string. The flags are applied to the
/// anchored expression, so they behave as they would on the bare source.
///
/// ```
/// use serde_json::json;
/// use treepick::{Filter, Pattern, Picker};
///
/// let picker = Picker::new(json!([{"city": "Auckland"}, {"city": "Berlin"}]));
/// let pattern = Pattern::new("a.*D").case_insensitive(true);
/// let found = picker.filter(&Filter::new().field("city", pattern)).unwrap();
/// assert_eq!(found.get(), &json!([{"city": "Auckland"}]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pattern {
    source: String,
    case_insensitive: bool,
    multi_line: bool,
    dot_matches_new_line: bool,
    ignore_whitespace: bool,
    swap_greed: bool,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        Pattern {
            source: source.into(),
            ..Pattern::default()
        }
    }

    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    pub fn multi_line(mut self, yes: bool) -> Self {
        self.multi_line = yes;
        self
    }

    pub fn dot_matches_new_line(mut self, yes: bool) -> Self {
        self.dot_matches_new_line = yes;
        self
    }

    pub fn ignore_whitespace(mut self, yes: bool) -> Self {
        self.ignore_whitespace = yes;
        self
    }

    pub fn swap_greed(mut self, yes: bool) -> Self {
        self.swap_greed = yes;
        self
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Compiles the full-match expression.
    ///
    /// The source must compile on its own first: an unbalanced group would
    /// otherwise close the anchoring group early and leave an alternation
    /// anchored on one side only.
    pub(crate) fn compile(&self) -> Result<Regex> {
        self.build(&self.source)?;
        self.build(&format!(r"\A(?:{})\z", self.source))
            .or_else(|err| {
                // A trailing verbose-mode comment swallows the closing anchor
                // unless a newline ends it.
                self.build(&format!("\\A(?:{}\n)\\z", self.source))
                    .map_err(|_| err)
            })
    }

    fn build(&self, pattern: &str) -> Result<Regex> {
        Ok(RegexBuilder::new(pattern)
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .ignore_whitespace(self.ignore_whitespace)
            .swap_greed(self.swap_greed)
            .build()?)
    }
}

/// Translates a shell-style wildcard pattern into an anchored regex.
///
/// Supports `*`, `?`, `[seq]` and `[!seq]`; an unterminated `[` matches
/// itself. Matching is case-sensitive and `*` spans newlines.
pub(crate) fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from(r"(?s)\A(?:");
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                while i < chars.len() && chars[i] == '*' {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => out.push('.'),
            '[' => {
                let mut j = i;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str(r"\[");
                } else {
                    out.push_str(&glob_class(&chars[i..j]));
                    i = j + 1;
                }
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    out.push_str(r")\z");
    out
}

// Reversed ranges such as `z-a` are dropped. A class left with nothing in
// it never matches, or matches any character when negated.
fn glob_class(body: &[char]) -> String {
    let (negated, body) = match body.split_first() {
        Some(('!', rest)) => (true, rest),
        _ => (false, body),
    };

    let mut members = String::new();
    let mut idx = 0;
    while idx < body.len() {
        if idx + 2 < body.len() && body[idx + 1] == '-' {
            let (lo, hi) = (body[idx], body[idx + 2]);
            if lo <= hi {
                push_class_char(&mut members, lo);
                members.push('-');
                push_class_char(&mut members, hi);
            }
            idx += 3;
        } else {
            push_class_char(&mut members, body[idx]);
            idx += 1;
        }
    }

    match (members.is_empty(), negated) {
        (true, false) => String::from(r"[^\s\S]"),
        (true, true) => String::from("."),
        (false, false) => format!("[{members}]"),
        (false, true) => format!("[^{members}]"),
    }
}

fn push_class_char(out: &mut String, c: char) {
    if matches!(c, '\\' | '[' | ']' | '^' | '&' | '~' | '-') {
        out.push('\\');
    }
    out.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PickerError;

    fn glob(pattern: &str, text: &str) -> bool {
        Regex::new(&glob_to_regex(pattern)).unwrap().is_match(text)
    }

    #[test]
    fn glob_star_and_question() {
        assert!(glob("A*", "Atlanta GA"));
        assert!(glob("A*", "A"));
        assert!(!glob("A*", "Berlin"));
        assert!(!glob("a*", "Atlanta GA"));
        assert!(glob("A*d", "Auckland"));
        assert!(!glob("A*D", "Auckland"));
        assert!(glob("?slo", "Oslo"));
        assert!(!glob("?slo", "Osloo"));
    }

    #[test]
    fn glob_classes() {
        assert!(glob("[AB]*", "Berlin"));
        assert!(!glob("[AB]*", "Cairo"));
        assert!(glob("[!AB]*", "Cairo"));
        assert!(glob("[a-c]x", "bx"));
        assert!(!glob("[a-c]x", "dx"));
        assert!(glob("[-a]x", "-x"));
    }

    #[test]
    fn glob_reversed_ranges_never_match() {
        assert!(!glob("[z-a]*", "abc"));
        assert!(!glob("[z-a]*", "z"));
        assert!(glob("[z-ax]*", "xyz"));
        assert!(!glob("[z-ax]*", "abc"));
        assert!(glob("[!z-a]", "q"));
        assert!(!glob("[!z-a]", "qq"));
    }

    #[test]
    fn glob_literals_are_escaped() {
        assert!(glob("St. Louis*", "St. Louis MO"));
        assert!(!glob("St. Louis", "StX Louis"));
        assert!(glob("[abc", "[abc"));
        assert!(glob("a+b", "a+b"));
        assert!(!glob("a+b", "aab"));
    }

    #[test]
    fn patterns_match_whole_strings() {
        let re = Pattern::new("a|ab").compile().unwrap();
        assert!(re.is_match("ab"));
        assert!(re.is_match("a"));
        assert!(!re.is_match("abc"));
        assert!(!Pattern::new("b").compile().unwrap().is_match("abc"));
    }

    #[test]
    fn unbalanced_patterns_are_rejected() {
        for source in ["a)|(b", "a)|(?:b", "(abc", "a)"] {
            assert!(
                matches!(Pattern::new(source).compile(), Err(PickerError::Pattern(_))),
                "{source} should not compile"
            );
        }
    }

    #[test]
    fn pattern_flags_survive_anchoring() {
        let insensitive = Pattern::new("a.*D").case_insensitive(true).compile().unwrap();
        assert!(insensitive.is_match("Auckland"));
        assert!(!Pattern::new("a.*D").compile().unwrap().is_match("Auckland"));

        let dotall = Pattern::new("a.b").dot_matches_new_line(true).compile().unwrap();
        assert!(dotall.is_match("a\nb"));

        let lazy = Pattern::new("a+").swap_greed(true).compile().unwrap();
        assert!(lazy.is_match("aaa"));
    }

    #[test]
    fn verbose_comments_keep_the_anchor() {
        let flagged = Pattern::new("a b # two letters").ignore_whitespace(true);
        let re = flagged.compile().unwrap();
        assert!(re.is_match("ab"));
        assert!(!re.is_match("abc"));

        let inline = Pattern::new("(?x) a b # two letters").compile().unwrap();
        assert!(inline.is_match("ab"));
        assert!(!inline.is_match("xab"));
    }

    #[test]
    fn predicate_conversions() {
        assert!(matches!(Predicate::from("x"), Predicate::Text(_)));
        assert!(matches!(Predicate::from(53i64), Predicate::Literal(_)));
        assert!(matches!(Predicate::from(Value::from("x")), Predicate::Text(_)));
        assert!(matches!(Predicate::from(Value::Null), Predicate::Literal(_)));
        assert!(matches!(
            Predicate::from(Regex::new("a").unwrap()),
            Predicate::Pattern(_)
        ));
    }
}
