use serde_json::{Map, Value};

use crate::database::Document;

/// Conjunction of field equalities, e.g. `{ id: .., user_id: .. }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match every document in the collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        // Later conditions on the same field replace earlier ones
        self.conditions.retain(|(f, _)| f != &field);
        self.conditions.push((field, value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }

    /// JSON object form, used as a JSONB containment operand.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self.conditions.iter().cloned().collect();
        Value::Object(map)
    }
}

/// Ordered set of field assignments applied by `update_one`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    set: Vec<(String, Value)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        self.set.retain(|(f, _)| f != &field);
        self.set.push((field, value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.set.iter().map(|(f, _)| f.as_str())
    }

    /// Apply to a document in place; returns true when any value changed.
    pub fn apply(&self, doc: &mut Document) -> bool {
        let mut changed = false;
        for (field, value) in &self.set {
            if doc.get(field) != Some(value) {
                doc.insert(field.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self.set.iter().cloned().collect();
        Value::Object(map)
    }
}
