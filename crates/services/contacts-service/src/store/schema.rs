//! Schema descriptors and registered models.
//!
//! A schema is an explicit field map (field name -> kind, defaults and
//! validators). Static entity shapes provide one through [`DocumentShape`];
//! dynamic collections build one at runtime. Both are registered the same
//! way and produce a [`Model`].

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};

use domain::rules::{self, FieldRule};

use super::document::is_reserved_field;

/// Value kind a field holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    /// RFC 3339 timestamp or `YYYY-MM-DD` string
    Date,
    StringArray,
    /// Identifier of a document in another collection
    Reference { collection: String },
    /// Identifiers of documents in another collection
    ReferenceArray { collection: String },
}

impl FieldKind {
    pub fn reference(collection: impl Into<String>) -> Self {
        FieldKind::Reference {
            collection: collection.into(),
        }
    }

    pub fn reference_array(collection: impl Into<String>) -> Self {
        FieldKind::ReferenceArray {
            collection: collection.into(),
        }
    }

    /// Collection a reference field points into
    pub fn reference_target(&self) -> Option<&str> {
        match self {
            FieldKind::Reference { collection } | FieldKind::ReferenceArray { collection } => {
                Some(collection)
            }
            _ => None,
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::String | FieldKind::Reference { .. } => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Date => value.as_str().is_some_and(rules::is_valid_date),
            FieldKind::StringArray | FieldKind::ReferenceArray { .. } => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Date => "a valid date",
            FieldKind::StringArray => "an array of strings",
            FieldKind::Reference { .. } => "a reference id",
            FieldKind::ReferenceArray { .. } => "an array of reference ids",
        }
    }
}

/// Constraint checked on a field value.
#[derive(Debug, Clone)]
pub enum FieldValidator {
    /// String value must match
    Pattern { pattern: Regex, message: String },
    /// Every element of a string array must match
    EachPattern { pattern: Regex, message: String },
    /// Array must hold at least `min` elements
    MinItems { min: usize, message: String },
}

impl FieldValidator {
    pub fn rule(rule: &FieldRule) -> Self {
        FieldValidator::Pattern {
            pattern: rule.pattern().clone(),
            message: rule.message().to_string(),
        }
    }

    pub fn each_rule(rule: &FieldRule) -> Self {
        FieldValidator::EachPattern {
            pattern: rule.pattern().clone(),
            message: rule.message().to_string(),
        }
    }

    pub fn min_items(min: usize, message: impl Into<String>) -> Self {
        FieldValidator::MinItems {
            min,
            message: message.into(),
        }
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        let ok = match self {
            FieldValidator::Pattern { pattern, .. } => {
                value.as_str().is_some_and(|s| pattern.is_match(s))
            }
            FieldValidator::EachPattern { pattern, .. } => value.as_array().is_some_and(|items| {
                items
                    .iter()
                    .all(|item| item.as_str().is_some_and(|s| pattern.is_match(s)))
            }),
            FieldValidator::MinItems { min, .. } => {
                value.as_array().is_some_and(|items| items.len() >= *min)
            }
        };

        if ok {
            Ok(())
        } else {
            Err(self.message().to_string())
        }
    }

    fn message(&self) -> &str {
        match self {
            FieldValidator::Pattern { message, .. }
            | FieldValidator::EachPattern { message, .. }
            | FieldValidator::MinItems { message, .. } => message,
        }
    }
}

// Regex has no PartialEq; patterns compare by source text.
impl PartialEq for FieldValidator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                FieldValidator::Pattern { pattern: a, message: ma },
                FieldValidator::Pattern { pattern: b, message: mb },
            )
            | (
                FieldValidator::EachPattern { pattern: a, message: ma },
                FieldValidator::EachPattern { pattern: b, message: mb },
            ) => a.as_str() == b.as_str() && ma == mb,
            (
                FieldValidator::MinItems { min: a, message: ma },
                FieldValidator::MinItems { min: b, message: mb },
            ) => a == b && ma == mb,
            _ => false,
        }
    }
}

/// Declaration of a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
    pub default: Option<Value>,
    pub validators: Vec<FieldValidator>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            unique: false,
            default: None,
            validators: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub fn string_array() -> Self {
        Self::new(FieldKind::StringArray)
    }

    pub fn reference(collection: impl Into<String>) -> Self {
        Self::new(FieldKind::reference(collection))
    }

    pub fn reference_array(collection: impl Into<String>) -> Self {
        Self::new(FieldKind::reference_array(collection))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// No two documents of the collection may share a value
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn validate(mut self, validator: FieldValidator) -> Self {
        self.validators.push(validator);
        self
    }

    fn check(&self, name: &str, value: &Value) -> Result<(), String> {
        if value.is_null() {
            return if self.required {
                Err(format!("Path `{}` is required.", name))
            } else {
                Ok(())
            };
        }
        if !self.kind.accepts(value) {
            return Err(format!("Path `{}` must be {}.", name, self.kind.describe()));
        }
        self.validators.iter().try_for_each(|v| v.check(value))
    }
}

/// Field map describing a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDescriptor {
    fields: BTreeMap<String, FieldSpec>,
}

impl SchemaDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a field
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldSpec)> {
        self.fields.iter()
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Collection referenced by a field, if it is a reference field
    pub fn relation_target(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|spec| spec.kind.reference_target())
    }

    /// Reject descriptors that cannot be registered.
    pub(crate) fn check_definition(&self) -> Result<(), String> {
        for (name, spec) in &self.fields {
            if name.is_empty() {
                return Err("field names cannot be empty".to_string());
            }
            if is_reserved_field(name) {
                return Err(format!("field `{}` is reserved by the store", name));
            }
            if let Some(default) = &spec.default {
                if !spec.kind.accepts(default) {
                    return Err(format!(
                        "default of `{}` must be {}",
                        name,
                        spec.kind.describe()
                    ));
                }
            }
        }
        Ok(())
    }

    /// Drop fields the schema does not declare.
    pub(crate) fn retain_known(&self, body: &mut Map<String, Value>) {
        body.retain(|name, _| self.fields.contains_key(name));
    }

    pub(crate) fn apply_defaults(&self, body: &mut Map<String, Value>) {
        for (name, spec) in &self.fields {
            let missing = body.get(name).map_or(true, Value::is_null);
            if let (true, Some(default)) = (missing, &spec.default) {
                body.insert(name.clone(), default.clone());
            }
        }
    }

    /// Validate a complete document about to be inserted.
    pub(crate) fn validate_document(&self, body: &Map<String, Value>) -> Result<(), String> {
        self.fields
            .iter()
            .try_for_each(|(name, spec)| spec.check(name, body.get(name).unwrap_or(&Value::Null)))
    }

    /// Validate only the fields a patch touches.
    pub(crate) fn validate_patch(&self, patch: &Map<String, Value>) -> Result<(), String> {
        patch.iter().try_for_each(|(name, value)| match self.fields.get(name) {
            Some(spec) => spec.check(name, value),
            None => Ok(()),
        })
    }

    pub(crate) fn unique_fields(&self) -> impl Iterator<Item = &String> {
        self.fields
            .iter()
            .filter(|(_, spec)| spec.unique)
            .map(|(name, _)| name)
    }
}

/// A statically known entity shape that can be registered as a model.
pub trait DocumentShape {
    /// Collection name
    const NAME: &'static str;

    fn schema() -> SchemaDescriptor;
}

/// A registered collection.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    schema: Arc<SchemaDescriptor>,
}

impl Model {
    pub(crate) fn new(name: String, schema: SchemaDescriptor) -> Self {
        Self {
            name,
            schema: Arc::new(schema),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn sample() -> SchemaDescriptor {
        SchemaDescriptor::new()
            .field(
                "name",
                FieldSpec::string()
                    .required()
                    .validate(FieldValidator::rule(&rules::GROUP_NAME)),
            )
            .field("maxContacts", FieldSpec::number().default_value(50))
            .field(
                "numbers",
                FieldSpec::string_array()
                    .validate(FieldValidator::min_items(1, "at least one number"))
                    .validate(FieldValidator::each_rule(&rules::PHONE_NUMBER)),
            )
            .field("idUser", FieldSpec::reference("users"))
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let mut doc = body(json!({ "name": "Friends" }));
        sample().apply_defaults(&mut doc);
        assert_eq!(doc["maxContacts"], json!(50));
    }

    #[test]
    fn test_required_field_missing() {
        let err = sample().validate_document(&body(json!({}))).unwrap_err();
        assert_eq!(err, "Path `name` is required.");
    }

    #[test]
    fn test_kind_mismatch() {
        let err = sample()
            .validate_document(&body(json!({ "name": "Friends", "maxContacts": "lots" })))
            .unwrap_err();
        assert_eq!(err, "Path `maxContacts` must be a number.");
    }

    #[test]
    fn test_validators_run_in_order() {
        let schema = sample();
        assert_eq!(
            schema
                .validate_document(&body(json!({ "name": "Friends", "numbers": [] })))
                .unwrap_err(),
            "at least one number"
        );
        assert!(schema
            .validate_document(&body(json!({ "name": "Friends", "numbers": ["bogus"] })))
            .is_err());
        assert!(schema
            .validate_document(&body(json!({ "name": "Friends", "numbers": ["555 123 4567"] })))
            .is_ok());
    }

    #[test]
    fn test_patch_checks_only_present_fields() {
        let schema = sample();
        assert!(schema.validate_patch(&body(json!({ "maxContacts": 10 }))).is_ok());
        assert!(schema.validate_patch(&body(json!({ "name": null }))).is_err());
        assert!(schema.validate_patch(&body(json!({ "name": "Bad!" }))).is_err());
    }

    #[test]
    fn test_reserved_and_bad_defaults_rejected() {
        let reserved = SchemaDescriptor::new().field("_id", FieldSpec::string());
        assert!(reserved.check_definition().is_err());

        let bad_default = SchemaDescriptor::new().field("n", FieldSpec::number().default_value("x"));
        assert!(bad_default.check_definition().is_err());

        assert!(sample().check_definition().is_ok());
    }

    #[test]
    fn test_relation_target() {
        let schema = sample();
        assert_eq!(schema.relation_target("idUser"), Some("users"));
        assert_eq!(schema.relation_target("name"), None);
        assert_eq!(schema.relation_target("missing"), None);
    }

    #[test]
    fn test_schemas_compare_by_pattern_source() {
        assert_eq!(sample(), sample());
        assert_ne!(
            sample(),
            sample().field("name", FieldSpec::string().required())
        );
    }
}
