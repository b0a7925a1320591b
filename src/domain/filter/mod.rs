//! Metadata filter language: canonical tree and normalizer

mod expression;
mod normalize;

pub use expression::{FilterCondition, FilterExpression, FilterOperator, FilterValue};
pub use normalize::{FilterNormalizer, CONTENT_KEY, FORBIDDEN_OPERATORS};
