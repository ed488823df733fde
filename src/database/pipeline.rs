//! Typed aggregation pipeline stages.
//!
//! A pipeline is rooted at one collection and transforms its documents
//! stage by stage. Backends either compile it (Postgres) or evaluate it
//! directly (memory); both must produce the same documents in the same order.

use serde_json::Value;

use crate::database::store::{Collection, Document};
use crate::filter::Filter;

/// Left join: attach every document of `from` whose `foreign_field` equals
/// this document's `local_field`, as an array under `as_field`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub from: Collection,
    pub local_field: String,
    pub foreign_field: String,
    pub as_field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Length of an array field; 0 when the field is missing or not an array.
    Size(String),
}

impl Expr {
    pub fn size(field: impl Into<String>) -> Self {
        Expr::Size(field.into())
    }

    pub fn evaluate(&self, doc: &Document) -> Value {
        match self {
            Expr::Size(field) => {
                let len = doc.get(field).and_then(Value::as_array).map_or(0, Vec::len);
                Value::from(len as u64)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Computed {
    pub name: String,
    pub expr: Expr,
}

impl Computed {
    pub fn new(name: impl Into<String>, expr: Expr) -> Self {
        Self { name: name.into(), expr }
    }
}

/// Inclusion projection. `id` is always kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub include: Vec<String>,
    pub computed: Vec<Computed>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, field: impl Into<String>) -> Self {
        self.include.push(field.into());
        self
    }

    pub fn computed(mut self, name: impl Into<String>, expr: Expr) -> Self {
        self.computed.push(Computed::new(name, expr));
        self
    }

    pub fn apply(&self, doc: &Document) -> Document {
        let mut out = Document::new();
        if let Some(id) = doc.get("id") {
            out.insert("id".to_string(), id.clone());
        }
        for field in &self.include {
            if let Some(v) = doc.get(field) {
                out.insert(field.clone(), v.clone());
            }
        }
        for c in &self.computed {
            out.insert(c.name.clone(), c.expr.evaluate(doc));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    Lookup(Lookup),
    AddFields(Vec<Computed>),
    Project(Projection),
    Skip(u64),
    Limit(u64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn match_filter(mut self, filter: Filter) -> Self {
        self.stages.push(Stage::Match(filter));
        self
    }

    pub fn lookup(
        mut self,
        from: Collection,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        self.stages.push(Stage::Lookup(Lookup {
            from,
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            as_field: as_field.into(),
        }));
        self
    }

    pub fn add_field(mut self, name: impl Into<String>, expr: Expr) -> Self {
        let computed = Computed::new(name, expr);
        // Consecutive add_field calls share one stage
        match self.stages.last_mut() {
            Some(Stage::AddFields(fields)) => fields.push(computed),
            _ => self.stages.push(Stage::AddFields(vec![computed])),
        }
        self
    }

    pub fn project(mut self, projection: Projection) -> Self {
        self.stages.push(Stage::Project(projection));
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.stages.push(Stage::Skip(n));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.stages.push(Stage::Limit(n));
        self
    }
}
