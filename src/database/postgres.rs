//! Postgres backend: one JSONB table per collection.
//!
//! Tables carry a `seq BIGSERIAL` column that defines natural order. Field
//! names never reach the SQL text; they are bound as `text` parameters and
//! used through the `->` operator.

use async_trait::async_trait;
use futures::{future, TryStreamExt};
use serde_json::Value;
use sqlx::{postgres::PgArguments, postgres::PgRow, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::database::pipeline::{Computed, Expr, Pipeline, Stage};
use crate::database::store::{document_id, Collection, Document, DocumentStore, StoreError};
use crate::filter::{DeleteResult, Filter, FindOptions, Patch, UpdateResult};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

/// Accumulates bound parameters and hands out their placeholders.
#[derive(Debug, Default)]
struct SqlParams {
    params: Vec<SqlParam>,
}

impl SqlParams {
    fn json(&mut self, value: Value) -> String {
        self.params.push(SqlParam::Json(value));
        format!("${}::jsonb", self.params.len())
    }

    fn text(&mut self, value: &str) -> String {
        self.params.push(SqlParam::Text(value.to_string()));
        format!("${}::text", self.params.len())
    }

    fn finish(self, query: String) -> SqlResult {
        SqlResult { query, params: self.params }
    }
}

fn table(collection: Collection) -> String {
    format!("\"{}\"", collection.name())
}

fn expr_sql(expr: &Expr, source: &str, params: &mut SqlParams) -> String {
    match expr {
        Expr::Size(field) => {
            let f = params.text(field);
            format!(
                "(CASE WHEN jsonb_typeof({src}.doc -> {f}) = 'array' THEN jsonb_array_length({src}.doc -> {f}) ELSE 0 END)",
                src = source,
                f = f
            )
        }
    }
}

fn computed_pairs(fields: &[Computed], source: &str, params: &mut SqlParams) -> Vec<String> {
    fields
        .iter()
        .map(|c| {
            let name = params.text(&c.name);
            let value = expr_sql(&c.expr, source, params);
            format!("{}, {}", name, value)
        })
        .collect()
}

/// Compile a pipeline into one statement returning a single `doc` column in
/// pipeline order.
pub fn compile_pipeline(root: Collection, pipeline: &Pipeline) -> SqlResult {
    let mut params = SqlParams::default();
    let mut current = format!("SELECT seq, doc FROM {}", table(root));

    for stage in pipeline.stages() {
        current = match stage {
            Stage::Match(filter) => {
                let p = params.json(filter.to_json());
                format!("SELECT s.seq, s.doc FROM ({}) s WHERE s.doc @> {}", current, p)
            }
            Stage::Lookup(lookup) => {
                let as_field = params.text(&lookup.as_field);
                let foreign = params.text(&lookup.foreign_field);
                let local = params.text(&lookup.local_field);
                format!(
                    "SELECT s.seq, s.doc || jsonb_build_object({as_field}, COALESCE((SELECT jsonb_agg(f.doc ORDER BY f.seq) FROM {from} f WHERE f.doc -> {foreign} = s.doc -> {local}), '[]'::jsonb)) AS doc FROM ({current}) s",
                    as_field = as_field,
                    from = table(lookup.from),
                    foreign = foreign,
                    local = local,
                    current = current,
                )
            }
            Stage::AddFields(fields) => {
                let pairs = computed_pairs(fields, "s", &mut params);
                format!(
                    "SELECT s.seq, s.doc || jsonb_build_object({}) AS doc FROM ({}) s",
                    pairs.join(", "),
                    current
                )
            }
            Stage::Project(projection) => {
                let mut pairs = vec!["'id', s.doc -> 'id'".to_string()];
                for field in &projection.include {
                    let f = params.text(field);
                    pairs.push(format!("{f}, s.doc -> {f}", f = f));
                }
                pairs.extend(computed_pairs(&projection.computed, "s", &mut params));
                // Missing included fields come back as JSON null; strip them like an inclusion projection
                format!(
                    "SELECT s.seq, jsonb_strip_nulls(jsonb_build_object({})) AS doc FROM ({}) s",
                    pairs.join(", "),
                    current
                )
            }
            Stage::Skip(n) => format!("SELECT s.seq, s.doc FROM ({}) s ORDER BY s.seq OFFSET {}", current, n),
            Stage::Limit(n) => format!("SELECT s.seq, s.doc FROM ({}) s ORDER BY s.seq LIMIT {}", current, n),
        };
    }

    params.finish(format!("SELECT s.doc FROM ({}) s ORDER BY s.seq", current))
}

pub fn compile_find(collection: Collection, filter: &Filter, options: &FindOptions) -> SqlResult {
    let mut params = SqlParams::default();
    let mut query = format!("SELECT doc FROM {}", table(collection));

    if !filter.is_empty() {
        let p = params.json(filter.to_json());
        query.push_str(&format!(" WHERE doc @> {}", p));
    }

    let mut order: Vec<String> = options
        .sort
        .iter()
        .map(|key| {
            let f = params.text(&key.field);
            format!("doc -> {} {}", f, key.direction.to_sql())
        })
        .collect();
    order.push("seq ASC".to_string());
    query.push_str(&format!(" ORDER BY {}", order.join(", ")));

    if let Some(limit) = options.limit {
        query.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(skip) = options.skip {
        query.push_str(&format!(" OFFSET {}", skip));
    }

    params.finish(query)
}

fn compile_update_one(collection: Collection, filter: &Filter, patch: &Patch) -> SqlResult {
    let mut params = SqlParams::default();
    let f = params.json(filter.to_json());
    let p = params.json(patch.to_json());
    let t = table(collection);
    let query = format!(
        "WITH target AS (SELECT seq, doc FROM {t} WHERE doc @> {f} ORDER BY seq LIMIT 1 FOR UPDATE) \
         UPDATE {t} AS u SET doc = u.doc || {p} FROM target WHERE u.seq = target.seq \
         RETURNING (target.doc IS DISTINCT FROM u.doc) AS modified",
        t = t,
        f = f,
        p = p
    );
    params.finish(query)
}

fn compile_delete_one(collection: Collection, filter: &Filter) -> SqlResult {
    let mut params = SqlParams::default();
    let f = params.json(filter.to_json());
    let t = table(collection);
    let query = format!(
        "DELETE FROM {t} WHERE seq = (SELECT seq FROM {t} WHERE doc @> {f} ORDER BY seq LIMIT 1 FOR UPDATE)",
        t = t,
        f = f
    );
    params.finish(query)
}

fn bind_params(
    mut q: sqlx::query::Query<'_, sqlx::Postgres, PgArguments>,
    params: Vec<SqlParam>,
) -> sqlx::query::Query<'_, sqlx::Postgres, PgArguments> {
    for p in params {
        q = match p {
            SqlParam::Json(v) => q.bind(v),
            SqlParam::Text(s) => q.bind(s),
        };
    }
    q
}

fn row_document(row: &PgRow) -> Result<Document, StoreError> {
    match row.try_get::<Value, _>("doc")? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!("expected object, got {}", other))),
    }
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create collection tables and foreign-key indexes if missing.
    pub async fn bootstrap(&self) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            let t = table(collection);
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (seq BIGSERIAL PRIMARY KEY, id UUID NOT NULL UNIQUE, doc JSONB NOT NULL)",
                t
            ))
            .execute(&self.pool)
            .await?;
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS \"{name}_doc_idx\" ON {t} USING GIN (doc jsonb_path_ops)",
                name = collection.name(),
                t = t
            ))
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn fetch_documents(&self, sql: SqlResult) -> Result<Vec<Document>, StoreError> {
        bind_params(sqlx::query(&sql.query), sql.params)
            .fetch(&self.pool)
            .map_err(StoreError::from)
            .and_then(|row| future::ready(row_document(&row)))
            .try_collect()
            .await
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<Uuid, StoreError> {
        let id = document_id(&doc)?;
        sqlx::query(&format!("INSERT INTO {} (id, doc) VALUES ($1, $2::jsonb)", table(collection)))
            .bind(id)
            .bind(Value::Object(doc))
            .execute(&self.pool)
            .await?;
        debug!("postgres store: inserted {} into {}", id, collection);
        Ok(id)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.fetch_documents(compile_find(collection, filter, options)).await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<UpdateResult, StoreError> {
        let sql = compile_update_one(collection, filter, patch);
        let row = bind_params(sqlx::query(&sql.query), sql.params)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => {
                let modified: bool = row.try_get("modified")?;
                UpdateResult { matched: 1, modified: u64::from(modified) }
            }
            None => UpdateResult::default(),
        })
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult, StoreError> {
        let sql = compile_delete_one(collection, filter);
        let result = bind_params(sqlx::query(&sql.query), sql.params)
            .execute(&self.pool)
            .await?;
        Ok(DeleteResult { deleted: result.rows_affected() })
    }

    async fn aggregate(&self, collection: Collection, pipeline: &Pipeline) -> Result<Vec<Document>, StoreError> {
        self.fetch_documents(compile_pipeline(collection, pipeline)).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
