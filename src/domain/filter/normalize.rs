//! Validation and normalization of raw JSON metadata filters

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Number, Value};

use super::expression::{FilterCondition, FilterExpression, FilterOperator, FilterValue};
use crate::domain::DomainError;

/// Metadata key holding chunk text; never filterable
pub const CONTENT_KEY: &str = "content";

/// Operators that are recognised but rejected
pub const FORBIDDEN_OPERATORS: &[&str] =
    &["$not", "$nor", "$regex", "$all", "$elemMatch", "$size", "$text"];

const DATE_KEY: &str = "$date";

/// Turns untyped filter input into a canonical [`FilterExpression`]
///
/// Rules:
/// - an object with two or more entries is an implicit `$and` of one-entry
///   objects, in insertion order
/// - `$and` / `$or` take non-empty arrays of sub-filters
/// - `{key: value}` is shorthand for `{key: {$eq: value}}`
/// - `{key: {$gte: 1, $lte: 9}}` is an `$and` of two leaves
/// - `{$op: {key: operand}}` is accepted for leaf operators
/// - range operands may be date-like and are converted to epoch milliseconds
#[derive(Debug, Clone)]
pub struct FilterNormalizer {
    non_filterable_keys: Vec<String>,
}

impl Default for FilterNormalizer {
    fn default() -> Self {
        Self::new(vec![CONTENT_KEY.to_string()])
    }
}

impl FilterNormalizer {
    pub fn new(non_filterable_keys: Vec<String>) -> Self {
        Self {
            non_filterable_keys,
        }
    }

    pub fn non_filterable_keys(&self) -> &[String] {
        &self.non_filterable_keys
    }

    /// Validate and normalize a raw filter
    pub fn normalize(&self, raw: &Value) -> Result<FilterExpression, DomainError> {
        self.parse_filter(raw)
    }

    fn parse_filter(&self, raw: &Value) -> Result<FilterExpression, DomainError> {
        let object = raw.as_object().ok_or_else(|| {
            DomainError::invalid_operand(
                "filter",
                format!("expected an object, got {}", type_name(raw)),
            )
        })?;

        let mut entries = object.iter();

        match (entries.next(), object.len()) {
            (None, _) => Err(DomainError::invalid_operand("filter", "empty filter object")),
            (Some((key, value)), 1) => self.parse_entry(key, value),
            _ => {
                let children = object
                    .iter()
                    .map(|(key, value)| self.parse_entry(key, value))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FilterExpression::And(children))
            }
        }
    }

    fn parse_entry(&self, key: &str, value: &Value) -> Result<FilterExpression, DomainError> {
        if !key.starts_with('$') {
            return self.parse_field(key, value);
        }

        match key {
            "$and" => Ok(FilterExpression::And(self.parse_logical(key, value)?)),
            "$or" => Ok(FilterExpression::Or(self.parse_logical(key, value)?)),
            _ => match FilterOperator::from_wire(key) {
                Some(operator) => self.parse_operator_first(operator, value),
                None => Err(DomainError::unsupported_operator(key)),
            },
        }
    }

    fn parse_logical(
        &self,
        operator: &str,
        value: &Value,
    ) -> Result<Vec<FilterExpression>, DomainError> {
        let items = value.as_array().ok_or_else(|| {
            DomainError::invalid_operand(
                operator,
                format!("expected an array of filters, got {}", type_name(value)),
            )
        })?;

        if items.is_empty() {
            return Err(DomainError::invalid_operand(
                operator,
                "expected a non-empty array of filters",
            ));
        }

        items.iter().map(|item| self.parse_filter(item)).collect()
    }

    /// `{$op: {key: operand, ...}}`
    fn parse_operator_first(
        &self,
        operator: FilterOperator,
        value: &Value,
    ) -> Result<FilterExpression, DomainError> {
        let fields = value
            .as_object()
            .filter(|fields| !fields.is_empty())
            .ok_or_else(|| {
                DomainError::invalid_operand(
                    operator.as_str(),
                    "expected an object mapping metadata keys to operands",
                )
            })?;

        let mut leaves = fields
            .iter()
            .map(|(key, operand)| self.parse_leaf(key, operator, operand))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(collapse(&mut leaves))
    }

    /// `{key: value}` or `{key: {$op: operand, ...}}`
    fn parse_field(&self, key: &str, value: &Value) -> Result<FilterExpression, DomainError> {
        let Value::Object(operators) = value else {
            return self.parse_leaf(key, FilterOperator::Eq, value);
        };

        if operators.is_empty() {
            return Err(DomainError::invalid_operand(
                key,
                "empty operator object",
            ));
        }

        let mut leaves = Vec::with_capacity(operators.len());

        for (name, operand) in operators {
            if !name.starts_with('$') {
                return Err(DomainError::invalid_operand(
                    key,
                    format!("nested field '{}' is not supported; use an operator object", name),
                ));
            }

            let operator = FilterOperator::from_wire(name)
                .ok_or_else(|| DomainError::unsupported_operator(name.as_str()))?;

            leaves.push(self.parse_leaf(key, operator, operand)?);
        }

        Ok(collapse(&mut leaves))
    }

    fn parse_leaf(
        &self,
        key: &str,
        operator: FilterOperator,
        operand: &Value,
    ) -> Result<FilterExpression, DomainError> {
        if key.is_empty() || key.starts_with('$') {
            return Err(DomainError::invalid_operand(
                operator.as_str(),
                format!("'{}' is not a metadata key", key),
            ));
        }

        let value = parse_operand(operator, operand)?;

        if self.non_filterable_keys.iter().any(|k| k == key) {
            return Err(DomainError::non_filterable(key));
        }

        Ok(FilterExpression::Condition(FilterCondition::new(
            key, operator, value,
        )))
    }
}

fn collapse(leaves: &mut Vec<FilterExpression>) -> FilterExpression {
    if leaves.len() == 1 {
        leaves.remove(0)
    } else {
        FilterExpression::And(std::mem::take(leaves))
    }
}

fn parse_operand(operator: FilterOperator, operand: &Value) -> Result<FilterValue, DomainError> {
    let op = operator.as_str();

    match operator {
        FilterOperator::Eq | FilterOperator::Ne => scalar(operand).ok_or_else(|| {
            DomainError::invalid_operand(
                op,
                format!("expected string, number or boolean, got {}", type_name(operand)),
            )
        }),
        FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
            match operand {
                Value::Number(n) => Ok(number(n)),
                other => date_millis(other).map(FilterValue::Integer).ok_or_else(|| {
                    DomainError::invalid_operand(
                        op,
                        format!("expected a number or date, got {}", type_name(other)),
                    )
                }),
            }
        }
        FilterOperator::In | FilterOperator::Nin => {
            let items = operand.as_array().ok_or_else(|| {
                DomainError::invalid_operand(
                    op,
                    format!("expected an array, got {}", type_name(operand)),
                )
            })?;

            if items.is_empty() {
                return Err(DomainError::invalid_operand(op, "expected a non-empty array"));
            }

            items
                .iter()
                .map(|item| {
                    scalar(item)
                        .or_else(|| date_object_millis(item).map(FilterValue::Integer))
                        .ok_or_else(|| {
                            DomainError::invalid_operand(
                                op,
                                format!(
                                    "array elements must be string, number or boolean, got {}",
                                    type_name(item)
                                ),
                            )
                        })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FilterValue::List)
        }
        FilterOperator::Exists => operand.as_bool().map(FilterValue::Boolean).ok_or_else(|| {
            DomainError::invalid_operand(
                op,
                format!("expected a boolean, got {}", type_name(operand)),
            )
        }),
    }
}

fn scalar(value: &Value) -> Option<FilterValue> {
    match value {
        Value::String(s) => Some(FilterValue::String(s.clone())),
        Value::Number(n) => Some(number(n)),
        Value::Bool(b) => Some(FilterValue::Boolean(*b)),
        _ => None,
    }
}

fn number(n: &Number) -> FilterValue {
    match n.as_i64() {
        Some(i) => FilterValue::Integer(i),
        None => FilterValue::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

/// Date-like operand for range comparisons: RFC 3339, `YYYY-MM-DD` or `{"$date": ...}`
fn date_millis(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => parse_date_string(s),
        Value::Object(_) => date_object_millis(value),
        _ => None,
    }
}

/// `{"$date": "<rfc3339>"}` or `{"$date": <epoch ms>}`
fn date_object_millis(value: &Value) -> Option<i64> {
    let object: &Map<String, Value> = value.as_object()?;

    if object.len() != 1 {
        return None;
    }

    match object.get(DATE_KEY)? {
        Value::String(s) => parse_date_string(s),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn parse_date_string(s: &str) -> Option<i64> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
        return Some(datetime.timestamp_millis());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc().timestamp_millis())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(raw: Value) -> Result<FilterExpression, DomainError> {
        FilterNormalizer::default().normalize(&raw)
    }

    #[test]
    fn test_implicit_and_is_rewritten() {
        let filter = normalize(json!({"a": 1, "b": 2})).unwrap();

        assert_eq!(
            filter,
            FilterExpression::And(vec![
                FilterCondition::eq("a", 1i64).into(),
                FilterCondition::eq("b", 2i64).into(),
            ])
        );
        assert_eq!(filter.to_json(), json!({"$and": [{"a": 1}, {"b": 2}]}));
        assert_eq!(filter, normalize(json!({"$and": [{"a": 1}, {"b": 2}]})).unwrap());
    }

    #[test]
    fn test_implicit_and_preserves_insertion_order() {
        let filter = normalize(json!({"zeta": 1, "alpha": 2, "mid": 3})).unwrap();
        assert_eq!(filter.keys(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_single_key_is_plain_leaf() {
        let filter = normalize(json!({"genre": "doc"})).unwrap();
        assert_eq!(filter, FilterCondition::eq("genre", "doc").into());
    }

    #[test]
    fn test_multiple_operators_on_one_key() {
        let filter = normalize(json!({"price": {"$gte": 100, "$lte": 1000}})).unwrap();

        assert_eq!(
            filter,
            FilterExpression::And(vec![
                FilterCondition::gte("price", 100i64).into(),
                FilterCondition::lte("price", 1000i64).into(),
            ])
        );
    }

    #[test]
    fn test_nested_logical_operators() {
        let filter = normalize(json!({
            "$and": [
                {"price": {"$gte": 100, "$lte": 1000}},
                {"$or": [{"stock": {"$gt": 0}}, {"preorder": true}]}
            ]
        }))
        .unwrap();

        match filter {
            FilterExpression::And(children) => {
                assert_eq!(children.len(), 2);
                assert_eq!(
                    children[1],
                    FilterExpression::Or(vec![
                        FilterCondition::gt("stock", 0i64).into(),
                        FilterCondition::eq("preorder", true).into(),
                    ])
                );
            }
            other => panic!("expected $and, got {other:?}"),
        }
    }

    #[test]
    fn test_forbidden_operators_rejected() {
        for op in FORBIDDEN_OPERATORS {
            let mut raw = Map::new();
            raw.insert(op.to_string(), json!({"a": 1}));

            let err = normalize(Value::Object(raw)).unwrap_err();
            assert!(
                matches!(&err, DomainError::UnsupportedOperator { operator } if operator == op),
                "{op}: {err}"
            );
        }

        let err = normalize(json!({"title": {"$regex": "^a"}})).unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedOperator { operator } if operator == "$regex"));
    }

    #[test]
    fn test_not_operator_rejected() {
        let err = normalize(json!({"$not": {"a": 1}})).unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedOperator { operator } if operator == "$not"));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = normalize(json!({"a": {"$like": "x"}})).unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedOperator { .. }));
    }

    #[test]
    fn test_empty_in_operator_first_form() {
        let err = normalize(json!({"$in": {"tag": []}})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperand { operator, .. } if operator == "$in"));
    }

    #[test]
    fn test_operator_first_form_normalizes_to_leaf() {
        let filter = normalize(json!({"$in": {"tag": ["a", "b"]}})).unwrap();
        assert_eq!(
            filter,
            FilterCondition::in_list("tag", vec!["a".into(), "b".into()]).into()
        );
    }

    #[test]
    fn test_eq_operand_types() {
        assert!(normalize(json!({"a": {"$eq": "x"}})).is_ok());
        assert!(normalize(json!({"a": {"$ne": 1.5}})).is_ok());
        assert!(normalize(json!({"a": true})).is_ok());

        for bad in [json!({"a": null}), json!({"a": {"$eq": [1, 2]}}), json!({"a": {"$ne": null}})] {
            let err = normalize(bad).unwrap_err();
            assert!(matches!(err, DomainError::InvalidOperand { .. }), "{err}");
        }
    }

    #[test]
    fn test_range_operands_accept_dates() {
        let filter = normalize(json!({"timestamp": {"$gt": "2024-01-01T00:00:00Z"}})).unwrap();
        assert_eq!(filter, FilterCondition::gt("timestamp", 1_704_067_200_000i64).into());

        let filter = normalize(json!({"timestamp": {"$lte": {"$date": "2024-01-01T00:00:00Z"}}}))
            .unwrap();
        assert_eq!(filter, FilterCondition::lte("timestamp", 1_704_067_200_000i64).into());

        let filter = normalize(json!({"day": {"$gte": "2024-01-01"}})).unwrap();
        assert_eq!(filter, FilterCondition::gte("day", 1_704_067_200_000i64).into());
    }

    #[test]
    fn test_range_operands_reject_non_numbers() {
        for bad in [
            json!({"a": {"$gt": "not a date"}}),
            json!({"a": {"$lt": true}}),
            json!({"a": {"$gte": null}}),
            json!({"a": {"$lte": [1]}}),
        ] {
            let err = normalize(bad).unwrap_err();
            assert!(matches!(err, DomainError::InvalidOperand { .. }), "{err}");
        }
    }

    #[test]
    fn test_in_converts_date_elements() {
        let filter = normalize(json!({"at": {"$nin": [{"$date": "2024-01-01T00:00:00Z"}, 5]}}))
            .unwrap();
        assert_eq!(
            filter,
            FilterCondition::not_in_list(
                "at",
                vec![FilterValue::Integer(1_704_067_200_000), FilterValue::Integer(5)]
            )
            .into()
        );
    }

    #[test]
    fn test_in_rejects_bad_elements() {
        let err = normalize(json!({"tag": {"$in": ["a", null]}})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperand { .. }));

        let err = normalize(json!({"tag": {"$nin": "a"}})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperand { .. }));
    }

    #[test]
    fn test_exists_requires_boolean() {
        assert!(normalize(json!({"source": {"$exists": false}})).is_ok());

        let err = normalize(json!({"source": {"$exists": 1}})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperand { operator, .. } if operator == "$exists"));
    }

    #[test]
    fn test_content_key_is_not_filterable() {
        let err = normalize(json!({"content": "hello"})).unwrap_err();
        assert!(matches!(err, DomainError::NonFilterableKey { key } if key == "content"));

        let err = normalize(json!({"$or": [{"title": "a"}, {"content": {"$exists": true}}]}))
            .unwrap_err();
        assert!(matches!(err, DomainError::NonFilterableKey { .. }));
    }

    #[test]
    fn test_custom_non_filterable_keys() {
        let normalizer = FilterNormalizer::new(vec!["body".to_string()]);

        assert!(normalizer.normalize(&json!({"content": "x"})).is_ok());
        assert!(matches!(
            normalizer.normalize(&json!({"body": "x"})),
            Err(DomainError::NonFilterableKey { .. })
        ));
    }

    #[test]
    fn test_empty_logical_arrays_rejected() {
        let err = normalize(json!({"$and": []})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperand { operator, .. } if operator == "$and"));

        let err = normalize(json!({"$or": []})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperand { operator, .. } if operator == "$or"));

        let err = normalize(json!({"$or": {"a": 1}})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperand { .. }));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(normalize(json!([])), Err(DomainError::InvalidOperand { .. })));
        assert!(matches!(normalize(json!({})), Err(DomainError::InvalidOperand { .. })));
        assert!(matches!(
            normalize(json!({"a": {}})),
            Err(DomainError::InvalidOperand { .. })
        ));
        assert!(matches!(
            normalize(json!({"a": {"b": 1}})),
            Err(DomainError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn test_mixed_logical_and_field_keys_combine_with_and() {
        let filter = normalize(json!({"$or": [{"a": 1}, {"b": 2}], "c": 3})).unwrap();

        assert_eq!(
            filter,
            FilterExpression::And(vec![
                FilterExpression::Or(vec![
                    FilterCondition::eq("a", 1i64).into(),
                    FilterCondition::eq("b", 2i64).into(),
                ]),
                FilterCondition::eq("c", 3i64).into(),
            ])
        );
    }

    #[test]
    fn test_normalization_is_stable() {
        let raw = json!({"genre": {"$in": ["doc", "comedy"]}, "year": {"$gte": 2020}});
        let once = normalize(raw).unwrap();
        let twice = normalize(once.to_json()).unwrap();
        assert_eq!(once, twice);
    }
}
