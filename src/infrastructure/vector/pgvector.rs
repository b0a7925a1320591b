//! PostgreSQL + pgvector backend

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::filter::{FilterCondition, FilterExpression, FilterOperator, FilterValue};
use crate::domain::index::{DistanceMetric, IndexDescriptor};
use crate::domain::vector::{
    KnowledgeRecord, Metadata, NewRecord, QueryMatch, RecordUpdate, VectorBackend, VectorQuery,
};
use crate::domain::DomainError;

const BACKEND: &str = "pgvector";

/// Connection settings for the pgvector backend
#[derive(Debug, Clone)]
pub struct PgvectorConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl PgvectorConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            connect_timeout_secs: 10,
        }
    }
}

/// pgvector operator whose ascending order is best-first
fn distance_operator(metric: DistanceMetric) -> &'static str {
    match metric {
        DistanceMetric::Cosine => "<=>",
        DistanceMetric::Euclidean => "<->",
        DistanceMetric::Dot => "<#>",
    }
}

/// Convert a pgvector distance to a higher-is-better score
fn to_similarity(metric: DistanceMetric, distance: f64) -> f32 {
    match metric {
        DistanceMetric::Cosine => (1.0 - distance) as f32,
        DistanceMetric::Euclidean => (1.0 / (1.0 + distance)) as f32,
        // `<#>` returns the negated inner product
        DistanceMetric::Dot => (-distance) as f32,
    }
}

/// Vector backend over two tables: an index registry and the records
#[derive(Debug, Clone)]
pub struct PgvectorBackend {
    pool: PgPool,
}

impl PgvectorBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and make sure the schema exists
    pub async fn connect(config: &PgvectorConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| {
                DomainError::backend(BACKEND, format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        let backend = Self::new(pool);
        backend.ensure_schema().await?;
        Ok(backend)
    }

    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        let statements = [
            "CREATE EXTENSION IF NOT EXISTS vector",
            r#"
            CREATE TABLE IF NOT EXISTS vector_indexes (
                name VARCHAR(63) PRIMARY KEY,
                dimension INTEGER NOT NULL,
                metric VARCHAR(16) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS vector_records (
                index_name VARCHAR(63) NOT NULL REFERENCES vector_indexes(name) ON DELETE CASCADE,
                id VARCHAR(64) NOT NULL,
                embedding vector NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{}',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (index_name, id)
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Failed to create schema", e))?;
        }

        Ok(())
    }

    async fn require_index(&self, name: &str) -> Result<IndexDescriptor, DomainError> {
        self.get_index(name)
            .await?
            .ok_or_else(|| DomainError::IndexNotFound {
                name: name.to_string(),
            })
    }
}

fn db_error(context: &str, error: sqlx::Error) -> DomainError {
    DomainError::backend(BACKEND, format!("{}: {}", context, error))
}

fn row_to_descriptor(row: &PgRow) -> Result<IndexDescriptor, DomainError> {
    let name: String = row.get("name");
    let dimension: i32 = row.get("dimension");
    let metric: String = row.get("metric");

    Ok(IndexDescriptor::new(
        name,
        usize::try_from(dimension)
            .map_err(|_| DomainError::backend(BACKEND, "Negative index dimension"))?,
        metric.parse()?,
    ))
}

fn check_dimension(descriptor: &IndexDescriptor, vector: &[f32]) -> Result<(), DomainError> {
    if vector.len() != descriptor.dimension {
        return Err(DomainError::validation(format!(
            "Vector has {} dimensions, index '{}' expects {}",
            vector.len(),
            descriptor.name,
            descriptor.dimension
        )));
    }

    Ok(())
}

fn metadata_from(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        _ => Metadata::new(),
    }
}

#[async_trait]
impl VectorBackend for PgvectorBackend {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn create_index(&self, descriptor: &IndexDescriptor) -> Result<(), DomainError> {
        let dimension = i32::try_from(descriptor.dimension)
            .map_err(|_| DomainError::validation("Index dimension too large"))?;

        let result = sqlx::query(
            "INSERT INTO vector_indexes (name, dimension, metric) VALUES ($1, $2, $3)
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(&descriptor.name)
        .bind(dimension)
        .bind(descriptor.metric.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create index", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::IndexAlreadyExists {
                name: descriptor.name.clone(),
            });
        }

        Ok(())
    }

    async fn get_index(&self, name: &str) -> Result<Option<IndexDescriptor>, DomainError> {
        let row = sqlx::query("SELECT name, dimension, metric FROM vector_indexes WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to read index", e))?;

        row.as_ref().map(row_to_descriptor).transpose()
    }

    async fn list_indexes(&self) -> Result<Vec<IndexDescriptor>, DomainError> {
        let rows = sqlx::query("SELECT name, dimension, metric FROM vector_indexes ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list indexes", e))?;

        rows.iter().map(row_to_descriptor).collect()
    }

    async fn upsert(
        &self,
        index: &str,
        records: Vec<NewRecord>,
    ) -> Result<Vec<String>, DomainError> {
        let descriptor = self.require_index(index).await?;

        for record in &records {
            check_dimension(&descriptor, &record.vector)?;
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to start transaction", e))?;
        let mut ids = Vec::with_capacity(records.len());

        for record in records {
            let id = Uuid::new_v4().to_string();

            sqlx::query(
                "INSERT INTO vector_records (index_name, id, embedding, metadata)
                 VALUES ($1, $2, $3::vector, $4)",
            )
            .bind(index)
            .bind(&id)
            .bind(vector_literal(&record.vector))
            .bind(Value::Object(record.metadata))
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to insert record", e))?;

            ids.push(id);
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit records", e))?;

        Ok(ids)
    }

    async fn get_vector(
        &self,
        index: &str,
        id: &str,
    ) -> Result<Option<KnowledgeRecord>, DomainError> {
        self.require_index(index).await?;

        let row = sqlx::query(
            "SELECT id, embedding::text AS embedding, metadata FROM vector_records
             WHERE index_name = $1 AND id = $2",
        )
        .bind(index)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to read record", e))?;

        row.map(|row| {
            let embedding: String = row.get("embedding");
            Ok(KnowledgeRecord {
                id: row.get("id"),
                vector: parse_pgvector(&embedding)?,
                metadata: metadata_from(row.get("metadata")),
            })
        })
        .transpose()
    }

    async fn update_vector(
        &self,
        index: &str,
        id: &str,
        update: RecordUpdate,
    ) -> Result<(), DomainError> {
        let descriptor = self.require_index(index).await?;

        if let Some(vector) = &update.vector {
            check_dimension(&descriptor, vector)?;
        }

        let result = sqlx::query(
            "UPDATE vector_records
             SET embedding = COALESCE($3::vector, embedding),
                 metadata = metadata || COALESCE($4::jsonb, '{}'::jsonb),
                 updated_at = NOW()
             WHERE index_name = $1 AND id = $2",
        )
        .bind(index)
        .bind(id)
        .bind(update.vector.as_deref().map(vector_literal))
        .bind(update.metadata.map(Value::Object))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update record", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::record_not_found(index, id));
        }

        Ok(())
    }

    async fn delete_vector(&self, index: &str, id: &str) -> Result<bool, DomainError> {
        self.require_index(index).await?;

        let result = sqlx::query("DELETE FROM vector_records WHERE index_name = $1 AND id = $2")
            .bind(index)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete record", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(
        &self,
        index: &str,
        query: &VectorQuery,
    ) -> Result<Vec<QueryMatch>, DomainError> {
        let descriptor = self.require_index(index).await?;
        check_dimension(&descriptor, &query.vector)?;

        let filter_sql = query
            .filter
            .as_ref()
            .map(|f| format!(" AND {}", filter_to_sql(f)))
            .unwrap_or_default();

        let sql = format!(
            r#"
            SELECT id, metadata, embedding::text AS embedding,
                   (embedding {} $2::vector)::float8 AS distance
            FROM vector_records
            WHERE index_name = $1{}
            ORDER BY distance, id
            LIMIT $3
            "#,
            distance_operator(descriptor.metric),
            filter_sql
        );

        tracing::debug!(index = index, filter_sql = %filter_sql, top_k = query.top_k, "Querying pgvector");

        let rows = sqlx::query(&sql)
            .bind(index)
            .bind(vector_literal(&query.vector))
            .bind(query.top_k as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Query failed", e))?;

        rows.iter()
            .map(|row| {
                let distance: f64 = row.get("distance");
                let vector = if query.include_vector {
                    let embedding: String = row.get("embedding");
                    Some(parse_pgvector(&embedding)?)
                } else {
                    None
                };

                Ok(QueryMatch {
                    id: row.get("id"),
                    score: to_similarity(descriptor.metric, distance),
                    metadata: metadata_from(row.get("metadata")),
                    vector,
                })
            })
            .collect()
    }
}

/// Translate a canonical filter tree into a JSONB `WHERE` fragment
///
/// Keys and values are inlined as escaped literals.
fn filter_to_sql(filter: &FilterExpression) -> String {
    match filter {
        FilterExpression::Condition(condition) => condition_to_sql(condition),
        FilterExpression::And(filters) => join_sql(filters, " AND "),
        FilterExpression::Or(filters) => join_sql(filters, " OR "),
    }
}

fn join_sql(filters: &[FilterExpression], connector: &str) -> String {
    let clauses: Vec<String> = filters.iter().map(filter_to_sql).collect();
    format!("({})", clauses.join(connector))
}

fn condition_to_sql(condition: &FilterCondition) -> String {
    let key = quote_literal(&condition.key);
    let field = format!("metadata -> {}", key);

    match (condition.operator, &condition.value) {
        (FilterOperator::Eq, value) => contains_sql(&field, value),
        (FilterOperator::Ne, value) => format!("NOT {}", contains_sql(&field, value)),
        (FilterOperator::In, FilterValue::List(items)) => any_contains_sql(&field, items),
        (FilterOperator::Nin, FilterValue::List(items)) => {
            format!("NOT {}", any_contains_sql(&field, items))
        }
        (FilterOperator::Exists, FilterValue::Boolean(true)) => format!("metadata ? {}", key),
        (FilterOperator::Exists, FilterValue::Boolean(false)) => {
            format!("NOT (metadata ? {})", key)
        }
        (op @ (FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte), value) => {
            let sql_op = match op {
                FilterOperator::Gt => ">",
                FilterOperator::Gte => ">=",
                FilterOperator::Lt => "<",
                _ => "<=",
            };
            format!(
                "(CASE WHEN jsonb_typeof({field}) = 'number' THEN ({field_text})::numeric {sql_op} {bound} ELSE false END)",
                field = field,
                field_text = format!("metadata ->> {}", key),
                sql_op = sql_op,
                bound = numeric_literal(value),
            )
        }
        _ => "false".to_string(),
    }
}

/// Scalar equality, or membership when the stored value is an array
fn contains_sql(field: &str, value: &FilterValue) -> String {
    format!(
        "COALESCE({} @> {}::jsonb, false)",
        field,
        quote_literal(&value.to_json().to_string())
    )
}

fn any_contains_sql(field: &str, items: &[FilterValue]) -> String {
    let clauses: Vec<String> = items.iter().map(|item| contains_sql(field, item)).collect();
    format!("({})", clauses.join(" OR "))
}

fn numeric_literal(value: &FilterValue) -> String {
    match value {
        FilterValue::Integer(n) => n.to_string(),
        FilterValue::Float(f) if f.is_finite() => f.to_string(),
        _ => "NULL".to_string(),
    }
}

fn quote_literal(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

fn vector_literal(vector: &[f32]) -> String {
    let values: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

/// Parse a pgvector text representation back to a `Vec<f32>`
fn parse_pgvector(s: &str) -> Result<Vec<f32>, DomainError> {
    let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']');

    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DomainError::backend(BACKEND, format!("Failed to parse vector: {}", e)))
}
