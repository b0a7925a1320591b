//! Canonical metadata filter tree

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

/// Leaf comparison operators accepted by the filter language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Exists,
}

impl FilterOperator {
    /// Wire name of the operator (`$eq`, `$in`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::In => "$in",
            Self::Nin => "$nin",
            Self::Exists => "$exists",
        }
    }

    /// Look up a leaf operator by wire name
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "$eq" => Some(Self::Eq),
            "$ne" => Some(Self::Ne),
            "$gt" => Some(Self::Gt),
            "$gte" => Some(Self::Gte),
            "$lt" => Some(Self::Lt),
            "$lte" => Some(Self::Lte),
            "$in" => Some(Self::In),
            "$nin" => Some(Self::Nin),
            "$exists" => Some(Self::Exists),
            _ => None,
        }
    }

}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated operand of a leaf predicate
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Non-empty list of scalars (for `$in` / `$nin`)
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Numeric view of the operand, if it is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Integer(n) => json!(n),
            Self::Float(f) => json!(f),
            Self::Boolean(b) => Value::Bool(*b),
            Self::List(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
        }
    }
}

/// A single predicate over one metadata key
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub key: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl FilterCondition {
    pub fn new(key: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            key: key.into(),
            operator,
            value,
        }
    }

    /// Canonical JSON form; equality uses the `{key: value}` shorthand
    pub fn to_json(&self) -> Value {
        let operand = match self.operator {
            FilterOperator::Eq => self.value.to_json(),
            op => {
                let mut inner = Map::new();
                inner.insert(op.as_str().to_string(), self.value.to_json());
                Value::Object(inner)
            }
        };

        let mut object = Map::new();
        object.insert(self.key.clone(), operand);
        Value::Object(object)
    }
}

/// Normalized filter tree handed to vector backends
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    And(Vec<FilterExpression>),
    Or(Vec<FilterExpression>),
    Condition(FilterCondition),
}

impl FilterExpression {
    /// Canonical JSON (`$and` / `$or` / `{key: {$op: operand}}`)
    pub fn to_json(&self) -> Value {
        match self {
            Self::And(filters) => {
                json!({ "$and": filters.iter().map(|f| f.to_json()).collect::<Vec<_>>() })
            }
            Self::Or(filters) => {
                json!({ "$or": filters.iter().map(|f| f.to_json()).collect::<Vec<_>>() })
            }
            Self::Condition(condition) => condition.to_json(),
        }
    }

}

impl Serialize for FilterExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
