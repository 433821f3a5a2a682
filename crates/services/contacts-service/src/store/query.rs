//! Query conditions and projections.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde_json::{Map, Value};

use domain::ID_FIELD;

use super::document::{Document, RAW_ID_FIELD};

/// Field-equality condition map.
///
/// A document matches when every listed field equals the given value. The
/// `id` key matches the document identifier, and an array field matches
/// when it contains the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    fields: BTreeMap<String, Value>,
}

impl Condition {
    /// Empty condition, matching every document
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality constraint
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Constrained fields and their expected values
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(field, value)| (field.as_str(), value))
    }

    /// Evaluate the condition against a stored document.
    pub fn matches(&self, id: &str, body: &Map<String, Value>) -> bool {
        self.fields.iter().all(|(field, expected)| {
            if field == ID_FIELD || field == RAW_ID_FIELD {
                return expected.as_str() == Some(id);
            }
            match body.get(field) {
                Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
                Some(actual) => actual == expected,
                None => expected.is_null(),
            }
        })
    }
}

/// Field selection applied to returned documents. `id` is always kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Include(BTreeSet<String>),
    Exclude(BTreeSet<String>),
}

impl Projection {
    /// Keep only the listed fields
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Include(fields.into_iter().map(Into::into).collect())
    }

    /// Drop the listed fields
    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Exclude(fields.into_iter().map(Into::into).collect())
    }

    pub fn apply(&self, mut document: Document) -> Document {
        match self {
            Projection::Include(keep) => document.fields.retain(|k, _| keep.contains(k)),
            Projection::Exclude(drop) => document.fields.retain(|k, _| !drop.contains(k)),
        }
        document
    }
}

/// Parses space separated field lists: `"name email"` includes,
/// `"-passwordHash -contacts"` excludes. Mixing both is rejected.
impl FromStr for Projection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens.is_empty() {
            return Err("projection must name at least one field".to_string());
        }

        let excluded: Vec<&str> = tokens.iter().filter_map(|t| t.strip_prefix('-')).collect();
        if excluded.is_empty() {
            Ok(Projection::include(tokens))
        } else if excluded.len() == tokens.len() {
            Ok(Projection::exclude(excluded))
        } else {
            Err(format!("cannot mix inclusion and exclusion in projection '{}'", s))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_condition_matches_fields_and_id() {
        let doc = body(json!({ "idGroup": "g1", "idContact": "c1" }));

        assert!(Condition::new().matches("row1", &doc));
        assert!(Condition::new().eq("idGroup", "g1").matches("row1", &doc));
        assert!(Condition::new()
            .eq("idGroup", "g1")
            .eq("idContact", "c1")
            .matches("row1", &doc));
        assert!(!Condition::new()
            .eq("idGroup", "g1")
            .eq("idContact", "c2")
            .matches("row1", &doc));
        assert!(Condition::new().eq("id", "row1").matches("row1", &doc));
        assert!(!Condition::new().eq("id", "row2").matches("row1", &doc));
    }

    #[test]
    fn test_condition_matches_array_membership() {
        let doc = body(json!({ "contacts": ["c1", "c2"] }));

        assert!(Condition::new().eq("contacts", "c2").matches("u1", &doc));
        assert!(!Condition::new().eq("contacts", "c3").matches("u1", &doc));
    }

    #[test]
    fn test_projection_parse() {
        assert_eq!(
            "name email".parse::<Projection>().unwrap(),
            Projection::include(["name", "email"])
        );
        assert_eq!(
            "-passwordHash".parse::<Projection>().unwrap(),
            Projection::exclude(["passwordHash"])
        );
        assert!("name -email".parse::<Projection>().is_err());
        assert!("".parse::<Projection>().is_err());
    }

    #[test]
    fn test_projection_keeps_id() {
        let doc = Document {
            id: "g1".to_string(),
            fields: body(json!({ "name": "Friends", "description": "d" })),
        };

        let projected = Projection::include(["name"]).apply(doc);
        assert_eq!(projected.id, "g1");
        assert_eq!(projected.to_value(), json!({ "id": "g1", "name": "Friends" }));
    }
}
