//! Line-oriented group records.
//!
//! One group per line, fields in any order:
//! ```text
//! type="Domain", name="Eukarya", superSet=("Life", "Earth"), info="cells with a nucleus"
//! type="Species", name="Lion", superSet=("Domain", "Eukarya"), age=10, weight=190, size=1.8, extraAttr=(Diet="Carnivore")
//! ```
//! Blank lines and `#` comments are skipped.

use regex::Regex;

use crate::domain::{
    Attributes, AttrValue, DomainResult, Group, GroupKey, HierarchyStore, SpeciesMeasures,
    ROOT_KIND, TERMINAL_KIND,
};

/// Parsed form of one record line, ready to be handed to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRecord {
    pub kind: String,
    pub name: String,
    pub parent: Option<GroupKey>,
    pub description: Option<String>,
    pub attributes: Attributes,
    /// Present exactly for species records
    pub measures: Option<SpeciesMeasures>,
}

impl GroupRecord {
    /// Create the group described by this record.
    pub fn apply(self, store: &mut HierarchyStore) -> DomainResult<&Group> {
        match (self.measures, self.parent) {
            (Some(measures), Some(parent)) => store.create_species(
                &self.name,
                parent,
                measures,
                self.description,
                self.attributes,
            ),
            (_, parent) => store.create(
                &self.kind,
                &self.name,
                parent,
                self.description,
                self.attributes,
            ),
        }
    }
}

/// Error parsing a record line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordParseError {
    pub message: String,
}

impl RecordParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Record parser with its patterns compiled once.
pub struct RecordParser {
    kind: Regex,
    name: Regex,
    info: Regex,
    superset: Regex,
    extra: Regex,
    extra_item: Regex,
    age: Regex,
    weight: Regex,
    size: Regex,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

fn quoted_field(field: &str) -> Regex {
    Regex::new(&format!(r#"\b{field}\s*=\s*"([^"]*)""#)).unwrap()
}

fn numeric_field(field: &str) -> Regex {
    Regex::new(&format!(r"\b{field}\s*=\s*([^,\s)]+)")).unwrap()
}

impl RecordParser {
    pub fn new() -> Self {
        Self {
            kind: quoted_field("type"),
            name: quoted_field("name"),
            info: quoted_field("info"),
            superset: Regex::new(r#"\bsuperSet\s*=\s*\(\s*"([^"]*)"\s*,\s*"([^"]*)"\s*\)"#)
                .unwrap(),
            extra: Regex::new(r"\bextraAttr\s*=\s*\(([^)]*)\)").unwrap(),
            extra_item: Regex::new(r#"(\w+)\s*=\s*(?:"([^"]*)"|([^,\s]+))"#).unwrap(),
            age: numeric_field("age"),
            weight: numeric_field("weight"),
            size: numeric_field("size"),
        }
    }

    /// Parse one line. Returns `Ok(None)` for blank and comment lines.
    pub fn parse_line(&self, line: &str) -> Result<Option<GroupRecord>, RecordParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        // Extra attributes are cut out first so their keys cannot shadow fields
        let (head, attributes) = match self.extra.captures(trimmed) {
            Some(caps) => {
                let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
                let body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let mut head = trimmed.to_string();
                head.replace_range(whole, "");
                (head, self.parse_extra(body)?)
            }
            None => (trimmed.to_string(), Attributes::new()),
        };

        // Free text in info may mention other field names
        let description = capture(&self.info, &head);
        let head = self.info.replace(&head, "").into_owned();

        let kind = capture(&self.kind, &head)
            .ok_or_else(|| RecordParseError::new("missing type=\"...\""))?;
        let name = capture(&self.name, &head)
            .ok_or_else(|| RecordParseError::new("missing name=\"...\""))?;
        let parent = self
            .superset
            .captures(&head)
            .map(|caps| GroupKey::new(&caps[1], &caps[2]));

        if parent.is_none() && kind != ROOT_KIND {
            return Err(RecordParseError::new(format!(
                "{kind} '{name}' needs superSet=(\"type\", \"name\")"
            )));
        }

        let measures = if kind == TERMINAL_KIND {
            Some(SpeciesMeasures::new(
                self.measure(&self.age, "age", &head)?,
                self.measure(&self.weight, "weight", &head)?,
                self.measure(&self.size, "size", &head)?,
            ))
        } else {
            None
        };

        Ok(Some(GroupRecord {
            kind,
            name,
            parent,
            description,
            attributes,
            measures,
        }))
    }

    fn parse_extra(&self, body: &str) -> Result<Attributes, RecordParseError> {
        let mut attributes = Attributes::new();
        for caps in self.extra_item.captures_iter(body) {
            let key = caps[1].to_string();
            let value = match (caps.get(2), caps.get(3)) {
                (Some(text), _) => AttrValue::Text(text.as_str().to_string()),
                (None, Some(raw)) => raw
                    .as_str()
                    .parse::<f64>()
                    .map(AttrValue::Number)
                    .map_err(|_| {
                        RecordParseError::new(format!(
                            "extraAttr {key}: '{}' is neither quoted nor a number",
                            raw.as_str()
                        ))
                    })?,
                (None, None) => continue,
            };
            attributes.insert(key, value);
        }
        Ok(attributes)
    }

    fn measure(&self, re: &Regex, field: &str, line: &str) -> Result<f64, RecordParseError> {
        let raw = capture(re, line)
            .ok_or_else(|| RecordParseError::new(format!("{TERMINAL_KIND} needs {field}=...")))?;
        raw.parse::<f64>()
            .map_err(|_| RecordParseError::new(format!("{field}: '{raw}' is not a number")))
    }
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
