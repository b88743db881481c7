//! Domain entities: core data structures

use std::collections::BTreeMap;
use std::fmt;

/// Rank of hierarchy roots. Only groups of this kind may lack a parent.
pub const ROOT_KIND: &str = "Life";

/// Terminal rank. Groups of this kind are always leaves.
pub const TERMINAL_KIND: &str = "Species";

pub const AGE_KEY: &str = "Age";
pub const WEIGHT_KEY: &str = "Weight";
pub const SIZE_KEY: &str = "Size";

/// Width of the dashed info header, excluding the leading `--`.
const INFO_HEADER_WIDTH: usize = 28;

/// Identifier of a group: the `(kind, name)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub kind: String,
    pub name: String,
}

impl GroupKey {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn is_root_kind(&self) -> bool {
        self.kind == ROOT_KIND
    }

    pub fn is_terminal_kind(&self) -> bool {
        self.kind == TERMINAL_KIND
    }

    /// Label used by the tree projection: `name (kind)`.
    pub fn tree_label(&self) -> String {
        format!("{} ({})", self.name, self.kind)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

impl<K: Into<String>, N: Into<String>> From<(K, N)> for GroupKey {
    fn from((kind, name): (K, N)) -> Self {
        Self::new(kind, name)
    }
}

/// Attribute value: free text or a number.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
}

impl AttrValue {
    /// Numbers stay numbers, everything else becomes text.
    pub fn parse_loose(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for AttrValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

/// Attribute map keyed by attribute name.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Mandatory numeric traits of a species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesMeasures {
    pub age: f64,
    pub weight: f64,
    pub size: f64,
}

impl SpeciesMeasures {
    pub fn new(age: f64, weight: f64, size: f64) -> Self {
        Self { age, weight, size }
    }

    /// Fold the measures into an attribute map under their fixed keys.
    pub fn fold_into(&self, attributes: &mut Attributes) {
        attributes.insert(AGE_KEY.to_string(), AttrValue::Number(self.age));
        attributes.insert(WEIGHT_KEY.to_string(), AttrValue::Number(self.weight));
        attributes.insert(SIZE_KEY.to_string(), AttrValue::Number(self.size));
    }

    /// True for `Age`, `Weight` and `Size`.
    pub fn is_measure_key(key: &str) -> bool {
        matches!(key, AGE_KEY | WEIGHT_KEY | SIZE_KEY)
    }

    /// Overwrite the measure stored under `key`. Returns false for any other key.
    pub fn set(&mut self, key: &str, value: f64) -> bool {
        match key {
            AGE_KEY => self.age = value,
            WEIGHT_KEY => self.weight = value,
            SIZE_KEY => self.size = value,
            _ => return false,
        }
        true
    }
}

/// Rank-specific part of a group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupPayload {
    /// Any non-terminal rank; may own children.
    Branch,
    /// Terminal rank; never owns children.
    Species(SpeciesMeasures),
}

/// A node of the tree of life.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: GroupKey,
    /// Parent identifier, `None` only for roots
    pub parent: Option<GroupKey>,
    pub description: Option<String>,
    pub payload: GroupPayload,
    /// Attributes set on this group itself
    pub own_attributes: Attributes,
    /// Own attributes merged over every ancestor's, closer ancestors winning
    pub effective_attributes: Attributes,
}

impl Group {
    pub fn kind(&self) -> &str {
        &self.key.kind
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn is_species(&self) -> bool {
        matches!(self.payload, GroupPayload::Species(_))
    }

    /// Human readable summary.
    ///
    /// Every line ends in a comma except the last one, which ends in a period:
    /// ```text
    /// --Species----------------------
    /// Name: Lion,
    /// Super Group: Domain,
    /// Brief Info: big cat,
    /// Age: 10,
    /// Diet: Carnivore.
    /// ```
    pub fn info(&self) -> String {
        let kind = self.kind();
        let mut out = format!(
            "--{}{}\nName: {},",
            kind,
            "-".repeat(INFO_HEADER_WIDTH.saturating_sub(kind.chars().count())),
            self.name()
        );
        if let Some(parent) = &self.parent {
            out.push_str(&format!("\nSuper Group: {},", parent.kind));
        }
        if let Some(description) = &self.description {
            out.push_str(&format!("\nBrief Info: {},", description));
        }
        for (key, value) in &self.effective_attributes {
            out.push_str(&format!("\n{}: {},", key, value));
        }
        if let Some(pos) = out.rfind(',') {
            out.replace_range(pos..pos + 1, ".");
        }
        out
    }
}
