//! Filter builder and predicate evaluation.
//!
//! A [`Filter`] holds named field predicates plus the flags that decide how
//! text literals are compared. Before a filter runs it is compiled once, so a
//! malformed pattern fails before any candidate is visited. Each field then
//! evaluates to a [`FieldOutcome`], and the outcomes are combined under
//! [`How::All`] or [`How::Any`] with short-circuiting.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde_json::Value;

use crate::error::{PickerError, Result};
use crate::kind::ValueKind;
use crate::number::loose_eq;
use crate::options::{OnError, OnMissing, PickerOptions};
use crate::predicate::{glob_to_regex, Pattern, Predicate, PredicateFn};

/// How per-field results are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum How {
    /// Every field must match.
    #[default]
    All,
    /// At least one field must match.
    Any,
}

impl How {
    pub fn as_str(self) -> &'static str {
        match self {
            How::All => "all",
            How::Any => "any",
        }
    }
}

impl fmt::Display for How {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for How {
    type Err = PickerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(How::All),
            "any" => Ok(How::Any),
            other => Err(PickerError::config(format!(
                "`how` must be one of all, any (got `{other}`)"
            ))),
        }
    }
}

/// A set of field predicates.
///
/// # Example
///
/// ```
/// use treepick::{Filter, How};
///
/// let filter = Filter::new()
///     .field("city", "A*")
///     .field_fn("id", |v| Ok(v.as_i64().is_some_and(|id| id > 100)))
///     .how(How::Any)
///     .case_sensitive(false);
/// assert_eq!(filter.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Filter {
    predicates: Vec<(String, Predicate)>,
    how: How,
    allow_wildcards: bool,
    case_sensitive: bool,
    regex: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Filter {
            predicates: Vec::new(),
            how: How::All,
            allow_wildcards: true,
            case_sensitive: true,
            regex: false,
        }
    }
}

impl Filter {
    /// Creates an empty filter. Applying it returns the node unchanged.
    pub fn new() -> Self {
        Filter::default()
    }

    /// Adds a predicate for `name`. Predicates are evaluated in insertion order.
    pub fn field(mut self, name: impl Into<String>, predicate: impl Into<Predicate>) -> Self {
        self.predicates.push((name.into(), predicate.into()));
        self
    }

    /// Adds a function predicate for `name`.
    pub fn field_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.field(name, Predicate::func(f))
    }

    pub fn how(mut self, how: How) -> Self {
        self.how = how;
        self
    }

    /// Treat `*`, `?` and `[...]` in text literals as wildcards (default `true`).
    pub fn allow_wildcards(mut self, allow: bool) -> Self {
        self.allow_wildcards = allow;
        self
    }

    /// Compare text literals case-sensitively (default `true`).
    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = sensitive;
        self
    }

    /// Interpret text literals as regular expressions (default `false`).
    pub fn regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    pub fn predicates(&self) -> &[(String, Predicate)] {
        &self.predicates
    }

    pub fn get_how(&self) -> How {
        self.how
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Compiles the predicates. Fails with [`PickerError::Pattern`] on a
    /// malformed regular expression, whatever the `on_error` policy.
    pub(crate) fn compile(&self) -> Result<CompiledFilter> {
        let fields = self
            .predicates
            .iter()
            .map(|(name, predicate)| {
                Ok(CompiledField {
                    name: name.clone(),
                    matcher: self.matcher(predicate)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledFilter {
            fields,
            how: self.how,
        })
    }

    fn matcher(&self, predicate: &Predicate) -> Result<Matcher> {
        let matcher = match predicate {
            Predicate::Func(f) => Matcher::Func(f.clone()),
            Predicate::Pattern(pattern) => Matcher::Pattern(pattern.compile()?),
            Predicate::Literal(v) => Matcher::Literal(v.clone()),
            Predicate::Text(text) if self.regex => Matcher::Regex(
                Pattern::new(text.as_str())
                    .case_insensitive(!self.case_sensitive)
                    .compile()?,
            ),
            Predicate::Text(text) => {
                let text = if self.case_sensitive {
                    text.clone()
                } else {
                    text.to_lowercase()
                };
                if self.allow_wildcards {
                    Matcher::Glob {
                        re: Regex::new(&glob_to_regex(&text))?,
                        lowercase: !self.case_sensitive,
                    }
                } else {
                    Matcher::Exact {
                        text,
                        lowercase: !self.case_sensitive,
                    }
                }
            }
        };
        Ok(matcher)
    }
}

/// Result of evaluating one field against one candidate.
#[derive(Debug)]
pub(crate) enum FieldOutcome {
    Matched,
    NotMatched,
    Errored(anyhow::Error),
}

impl From<bool> for FieldOutcome {
    fn from(matched: bool) -> Self {
        if matched {
            FieldOutcome::Matched
        } else {
            FieldOutcome::NotMatched
        }
    }
}

#[derive(Clone)]
enum Matcher {
    Func(PredicateFn),
    Pattern(Regex),
    Regex(Regex),
    Glob { re: Regex, lowercase: bool },
    Exact { text: String, lowercase: bool },
    Literal(Value),
}

impl Matcher {
    fn test(&self, value: &Value) -> FieldOutcome {
        match self {
            Matcher::Func(f) => match f(value) {
                Ok(matched) => matched.into(),
                Err(err) => FieldOutcome::Errored(err),
            },
            Matcher::Literal(expected) => loose_eq(expected, value).into(),
            Matcher::Exact {
                text,
                lowercase: false,
            } => (value.as_str() == Some(text.as_str())).into(),
            Matcher::Exact {
                text,
                lowercase: true,
            } => match value.as_str() {
                Some(s) => (s.to_lowercase() == *text).into(),
                None => not_a_string(value),
            },
            Matcher::Glob { re, lowercase } => match value.as_str() {
                Some(s) if *lowercase => re.is_match(&s.to_lowercase()).into(),
                Some(s) => re.is_match(s).into(),
                None => not_a_string(value),
            },
            Matcher::Pattern(re) | Matcher::Regex(re) => match value.as_str() {
                Some(s) => re.is_match(s).into(),
                None => not_a_string(value),
            },
        }
    }
}

fn not_a_string(value: &Value) -> FieldOutcome {
    FieldOutcome::Errored(anyhow::anyhow!(
        "expected a string value, got {}",
        ValueKind::of(value)
    ))
}

#[derive(Clone)]
struct CompiledField {
    name: String,
    matcher: Matcher,
}

/// A filter ready to be evaluated against candidates.
#[derive(Clone)]
pub(crate) struct CompiledFilter {
    fields: Vec<CompiledField>,
    how: How,
}

impl CompiledFilter {
    /// Evaluates every field against `candidate` and combines the results.
    ///
    /// An absent field is a [`PickerError::MissingField`] under
    /// [`OnMissing::Raise`] and `false` otherwise. A failing comparison is a
    /// [`PickerError::Predicate`] under [`OnError::Raise`] and `false`
    /// otherwise.
    pub(crate) fn matches(&self, candidate: &Value, options: &PickerOptions) -> Result<bool> {
        for field in &self.fields {
            let outcome = match candidate.as_object().and_then(|map| map.get(&field.name)) {
                Some(value) => field.matcher.test(value),
                None if options.get_on_missing() == OnMissing::Raise => {
                    return Err(PickerError::missing(&field.name));
                }
                None => FieldOutcome::NotMatched,
            };

            let matched = match outcome {
                FieldOutcome::Matched => true,
                FieldOutcome::NotMatched => false,
                FieldOutcome::Errored(source) if options.get_on_error() == OnError::Raise => {
                    return Err(PickerError::Predicate {
                        field: field.name.clone(),
                        source,
                    });
                }
                FieldOutcome::Errored(err) => {
                    tracing::trace!(field = %field.name, error = %err, "predicate failed, treating as no match");
                    false
                }
            };

            match (self.how, matched) {
                (How::Any, true) => return Ok(true),
                (How::All, false) => return Ok(false),
                _ => {}
            }
        }

        Ok(self.how == How::All)
    }
}
