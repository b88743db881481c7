//! Structural search over the hierarchy.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::entities::{AttrValue, Group, GroupKey};
use crate::domain::error::{DomainError, DomainResult};

/// How the free-text query is compared against kind and name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    /// Case-insensitive substring
    #[default]
    #[serde(rename = "inclusive")]
    Inclusive,
    /// Case-sensitive equality
    #[serde(rename = "exact")]
    Exact,
    /// Case-insensitive pattern whose first match must cover the whole text
    #[serde(rename = "regular expression", alias = "regex")]
    RegularExpression,
}

impl FromStr for MatchType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inclusive" => Ok(Self::Inclusive),
            "exact" => Ok(Self::Exact),
            "regular expression" | "regex" => Ok(Self::RegularExpression),
            other => Err(DomainError::InvalidArgument(format!(
                "invalid match type: {other}. Must be 'inclusive', 'exact', or 'regular expression'"
            ))),
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inclusive => "inclusive",
            Self::Exact => "exact",
            Self::RegularExpression => "regular expression",
        };
        write!(f, "{}", s)
    }
}

/// Condition on one effective attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrFilter {
    /// Case-insensitive text equality; numeric values never match
    Exact(String),
    /// Inclusive numeric range
    Range(f64, f64),
    Lt(f64),
    Lte(f64),
    Gt(f64),
    Gte(f64),
}

impl AttrFilter {
    /// Build a filter from an operator name and its raw operand.
    ///
    /// `range` takes `low..high` or `low,high`.
    pub fn parse(op: &str, value: &str) -> DomainResult<Self> {
        let number = |raw: &str| {
            raw.trim().parse::<f64>().map_err(|_| {
                DomainError::InvalidArgument(format!("filter '{op}' needs a number, got '{raw}'"))
            })
        };
        match op {
            "exact" => Ok(Self::Exact(value.to_string())),
            "range" => {
                let (low, high) = value
                    .split_once("..")
                    .or_else(|| value.split_once(','))
                    .ok_or_else(|| {
                        DomainError::InvalidArgument(format!(
                            "range filter needs 'low..high', got '{value}'"
                        ))
                    })?;
                Ok(Self::Range(number(low)?, number(high)?))
            }
            "lt" => Ok(Self::Lt(number(value)?)),
            "lte" => Ok(Self::Lte(number(value)?)),
            "gt" => Ok(Self::Gt(number(value)?)),
            "gte" => Ok(Self::Gte(number(value)?)),
            other => Err(DomainError::InvalidArgument(format!(
                "invalid filter operator: {other}. Must be one of exact, range, lt, lte, gt, gte"
            ))),
        }
    }

    pub fn matches(&self, value: &AttrValue) -> bool {
        match self {
            Self::Exact(expected) => value
                .as_text()
                .is_some_and(|s| s.to_lowercase() == expected.to_lowercase()),
            Self::Range(low, high) => value.as_number().is_some_and(|n| *low <= n && n <= *high),
            Self::Lt(bound) => value.as_number().is_some_and(|n| n < *bound),
            Self::Lte(bound) => value.as_number().is_some_and(|n| n <= *bound),
            Self::Gt(bound) => value.as_number().is_some_and(|n| n > *bound),
            Self::Gte(bound) => value.as_number().is_some_and(|n| n >= *bound),
        }
    }
}

/// Search parameters. Every active predicate must hold (logical AND).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    /// Only groups whose parent is exactly this key
    pub superset: Option<GroupKey>,
    /// Text compared against kind and name; empty means no text predicate
    pub query: Option<String>,
    pub match_type: MatchType,
    /// Attribute name to condition; the attribute must be present
    pub filters: BTreeMap<String, AttrFilter>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn within(mut self, superset: GroupKey) -> Self {
        self.superset = Some(superset);
        self
    }

    pub fn matching(mut self, query: impl Into<String>, match_type: MatchType) -> Self {
        self.query = Some(query.into());
        self.match_type = match_type;
        self
    }

    pub fn filter(mut self, attribute: impl Into<String>, filter: AttrFilter) -> Self {
        self.filters.insert(attribute.into(), filter);
        self
    }

    pub(crate) fn compile(&self) -> CompiledQuery<'_> {
        let text = match self.query.as_deref().filter(|q| !q.is_empty()) {
            None => TextMatcher::Any,
            Some(q) => match self.match_type {
                MatchType::Inclusive => TextMatcher::Inclusive(q.to_lowercase()),
                MatchType::Exact => TextMatcher::Exact(q),
                MatchType::RegularExpression => {
                    match RegexBuilder::new(q).case_insensitive(true).build() {
                        Ok(re) => TextMatcher::Pattern(Some(re)),
                        Err(e) => {
                            warn!("Regular expression error: {}", e);
                            TextMatcher::Pattern(None)
                        }
                    }
                }
            },
        };
        CompiledQuery { query: self, text }
    }
}

enum TextMatcher<'a> {
    Any,
    Inclusive(String),
    Exact(&'a str),
    /// None when the pattern failed to compile
    Pattern(Option<Regex>),
}

impl TextMatcher<'_> {
    fn accepts(&self, key: &GroupKey) -> bool {
        match self {
            Self::Any => true,
            Self::Inclusive(needle) => {
                key.kind.to_lowercase().contains(needle.as_str())
                    || key.name.to_lowercase().contains(needle.as_str())
            }
            Self::Exact(q) => *q == key.kind || *q == key.name,
            Self::Pattern(None) => false,
            Self::Pattern(Some(re)) => {
                let covers = |text: &str| re.find(text).is_some_and(|m| m.as_str() == text);
                covers(&key.kind) || covers(&key.name)
            }
        }
    }
}

/// A query with its text matcher prepared once per search.
pub(crate) struct CompiledQuery<'a> {
    query: &'a SearchQuery,
    text: TextMatcher<'a>,
}

impl CompiledQuery<'_> {
    pub(crate) fn accepts(&self, group: &Group) -> bool {
        if let Some(superset) = &self.query.superset {
            if group.parent.as_ref() != Some(superset) {
                return false;
            }
        }
        if !self.text.accepts(&group.key) {
            return false;
        }
        self.query.filters.iter().all(|(attr, filter)| {
            group
                .effective_attributes
                .get(attr)
                .is_some_and(|value| filter.matches(value))
        })
    }
}
