//! In-memory vector backend for development and testing

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::filter::{FilterCondition, FilterExpression, FilterOperator, FilterValue};
use crate::domain::index::IndexDescriptor;
use crate::domain::vector::{
    rank_matches, KnowledgeRecord, Metadata, NewRecord, QueryMatch, RecordUpdate, VectorBackend,
    VectorQuery,
};
use crate::domain::DomainError;

/// Vector backend holding every index in process memory
#[derive(Debug, Default)]
pub struct InMemoryVectorBackend {
    indexes: RwLock<HashMap<String, StoredIndex>>,
}

#[derive(Debug)]
struct StoredIndex {
    descriptor: IndexDescriptor,
    records: BTreeMap<String, StoredRecord>,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    vector: Vec<f32>,
    metadata: Metadata,
}

impl InMemoryVectorBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in an index, if it exists
    pub async fn record_count(&self, index: &str) -> Option<usize> {
        self.indexes
            .read()
            .await
            .get(index)
            .map(|stored| stored.records.len())
    }
}

fn index_not_found(name: &str) -> DomainError {
    DomainError::IndexNotFound {
        name: name.to_string(),
    }
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

#[async_trait]
impl VectorBackend for InMemoryVectorBackend {
    fn backend_name(&self) -> &'static str {
        "in_memory"
    }

    async fn create_index(&self, descriptor: &IndexDescriptor) -> Result<(), DomainError> {
        let mut indexes = self.indexes.write().await;

        if indexes.contains_key(&descriptor.name) {
            return Err(DomainError::IndexAlreadyExists {
                name: descriptor.name.clone(),
            });
        }

        indexes.insert(
            descriptor.name.clone(),
            StoredIndex {
                descriptor: descriptor.clone(),
                records: BTreeMap::new(),
            },
        );

        Ok(())
    }

    async fn get_index(&self, name: &str) -> Result<Option<IndexDescriptor>, DomainError> {
        Ok(self
            .indexes
            .read()
            .await
            .get(name)
            .map(|stored| stored.descriptor.clone()))
    }

    async fn list_indexes(&self) -> Result<Vec<IndexDescriptor>, DomainError> {
        let mut descriptors: Vec<IndexDescriptor> = self
            .indexes
            .read()
            .await
            .values()
            .map(|stored| stored.descriptor.clone())
            .collect();

        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(descriptors)
    }

    async fn upsert(
        &self,
        index: &str,
        records: Vec<NewRecord>,
    ) -> Result<Vec<String>, DomainError> {
        let mut indexes = self.indexes.write().await;
        let stored = indexes.get_mut(index).ok_or_else(|| index_not_found(index))?;

        for record in &records {
            check_dimension(&stored.descriptor, &record.vector)?;
        }

        let ids = records
            .into_iter()
            .map(|record| {
                let id = Uuid::new_v4().to_string();
                stored.records.insert(
                    id.clone(),
                    StoredRecord {
                        vector: record.vector,
                        metadata: record.metadata,
                    },
                );
                id
            })
            .collect();

        Ok(ids)
    }

    async fn get_vector(
        &self,
        index: &str,
        id: &str,
    ) -> Result<Option<KnowledgeRecord>, DomainError> {
        let indexes = self.indexes.read().await;
        let stored = indexes.get(index).ok_or_else(|| index_not_found(index))?;

        Ok(stored.records.get(id).map(|record| KnowledgeRecord {
            id: id.to_string(),
            vector: record.vector.clone(),
            metadata: record.metadata.clone(),
        }))
    }

    async fn update_vector(
        &self,
        index: &str,
        id: &str,
        update: RecordUpdate,
    ) -> Result<(), DomainError> {
        let mut indexes = self.indexes.write().await;
        let stored = indexes.get_mut(index).ok_or_else(|| index_not_found(index))?;

        if let Some(vector) = &update.vector {
            check_dimension(&stored.descriptor, vector)?;
        }

        let record = stored
            .records
            .get_mut(id)
            .ok_or_else(|| DomainError::record_not_found(index, id))?;

        if let Some(vector) = update.vector {
            record.vector = vector;
        }

        if let Some(metadata) = update.metadata {
            record.metadata.extend(metadata);
        }

        Ok(())
    }

    async fn delete_vector(&self, index: &str, id: &str) -> Result<bool, DomainError> {
        let mut indexes = self.indexes.write().await;
        let stored = indexes.get_mut(index).ok_or_else(|| index_not_found(index))?;

        Ok(stored.records.remove(id).is_some())
    }

    async fn query(
        &self,
        index: &str,
        query: &VectorQuery,
    ) -> Result<Vec<QueryMatch>, DomainError> {
        let indexes = self.indexes.read().await;
        let stored = indexes.get(index).ok_or_else(|| index_not_found(index))?;

        check_dimension(&stored.descriptor, &query.vector)?;

        let metric = stored.descriptor.metric;
        let mut matches: Vec<QueryMatch> = stored
            .records
            .iter()
            .filter(|(_, record)| {
                query
                    .filter
                    .as_ref()
                    .map_or(true, |filter| matches_filter(&record.metadata, filter))
            })
            .map(|(id, record)| QueryMatch {
                id: id.clone(),
                score: metric.score(&query.vector, &record.vector),
                metadata: record.metadata.clone(),
                vector: query.include_vector.then(|| record.vector.clone()),
            })
            .collect();

        rank_matches(&mut matches);
        matches.truncate(query.top_k);

        Ok(matches)
    }
}

/// Check if record metadata matches a filter tree
fn matches_filter(metadata: &Metadata, filter: &FilterExpression) -> bool {
    match filter {
        FilterExpression::Condition(condition) => matches_condition(metadata, condition),
        FilterExpression::And(filters) => filters.iter().all(|f| matches_filter(metadata, f)),
        FilterExpression::Or(filters) => filters.iter().any(|f| matches_filter(metadata, f)),
    }
}

fn matches_condition(metadata: &Metadata, condition: &FilterCondition) -> bool {
    let value = metadata.get(&condition.key);

    match (condition.operator, &condition.value) {
        (FilterOperator::Eq, expected) => compare_eq(value, expected),
        (FilterOperator::Ne, expected) => !compare_eq(value, expected),
        (FilterOperator::Gt, bound) => compare_ord(value, bound, |a, b| a > b),
        (FilterOperator::Gte, bound) => compare_ord(value, bound, |a, b| a >= b),
        (FilterOperator::Lt, bound) => compare_ord(value, bound, |a, b| a < b),
        (FilterOperator::Lte, bound) => compare_ord(value, bound, |a, b| a <= b),
        (FilterOperator::In, FilterValue::List(items)) => {
            items.iter().any(|item| compare_eq(value, item))
        }
        (FilterOperator::Nin, FilterValue::List(items)) => {
            !items.iter().any(|item| compare_eq(value, item))
        }
        (FilterOperator::Exists, FilterValue::Boolean(expected)) => value.is_some() == *expected,
        _ => false,
    }
}

/// Equality; array-valued metadata matches when any element is equal
fn compare_eq(value: Option<&Value>, expected: &FilterValue) -> bool {
    match value {
        Some(Value::Array(items)) => items.iter().any(|item| scalar_eq(item, expected)),
        Some(item) => scalar_eq(item, expected),
        None => false,
    }
}

fn scalar_eq(value: &Value, expected: &FilterValue) -> bool {
    match (value, expected) {
        (Value::String(s), FilterValue::String(e)) => s == e,
        (Value::Bool(b), FilterValue::Boolean(e)) => b == e,
        (Value::Number(n), FilterValue::Integer(_) | FilterValue::Float(_)) => {
            match (n.as_f64(), expected.as_f64()) {
                (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
                _ => false,
            }
        }
        _ => false,
    }
}

fn compare_ord<F>(value: Option<&Value>, bound: &FilterValue, cmp: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (value.and_then(Value::as_f64), bound.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}
