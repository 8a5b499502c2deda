//! `?ordering=` support for list endpoints
//!
//! Terms are comma separated field names; a leading `-` sorts descending.
//! Terms naming fields outside the allowed set are ignored.

use std::cmp::Ordering as CmpOrdering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::persistence::Model;

/// Ordering query parameters
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OrderingParams {
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone)]
pub struct Ordering {
    /// `None` allows any top-level field of the serialized items.
    fields: Option<Vec<String>>,
}

impl Ordering {
    pub fn new<I, T>(fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            fields: Some(fields.into_iter().map(Into::into).collect()),
        }
    }

    /// Allow ordering by any field the items serialize.
    pub fn all() -> Self {
        Self { fields: None }
    }

    /// Allow ordering by the model's declared fields and its `id`.
    pub fn for_model<M: Model>() -> Self {
        Self::new(std::iter::once("id").chain(M::FIELDS.iter().copied()))
    }

    /// Also allow ordering by `field`.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        if let Some(fields) = &mut self.fields {
            fields.push(field.into());
        }
        self
    }

    /// Parse `value` into terms, dropping empty and disallowed ones.
    pub fn terms(&self, value: Option<&str>) -> Vec<OrderTerm> {
        let Some(value) = value else {
            return Vec::new();
        };
        value
            .split(',')
            .map(str::trim)
            .filter_map(|term| {
                let (field, descending) = match term.strip_prefix('-') {
                    Some(field) => (field, true),
                    None => (term, false),
                };
                let allowed = match &self.fields {
                    Some(fields) => fields.iter().any(|allowed| allowed == field),
                    None => !field.is_empty(),
                };
                allowed.then(|| OrderTerm {
                    field: field.to_string(),
                    descending,
                })
            })
            .collect()
    }

    /// Stable sort of `items` by the requested terms.
    pub fn apply<T: Serialize>(&self, items: Vec<T>, params: &OrderingParams) -> ApiResult<Vec<T>> {
        let terms = self.terms(params.ordering.as_deref());
        if terms.is_empty() {
            return Ok(items);
        }

        let mut keyed = items
            .into_iter()
            .map(|item| serde_json::to_value(&item).map(|value| (value, item)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::Internal(e.into()))?;

        keyed.sort_by(|(left, _), (right, _)| {
            terms
                .iter()
                .map(|term| {
                    let order = compare_values(&left[&term.field], &right[&term.field]);
                    if term.descending {
                        order.reverse()
                    } else {
                        order
                    }
                })
                .find(|order| order.is_ne())
                .unwrap_or(CmpOrdering::Equal)
        });

        tracing::debug!(terms = ?terms, "Ordered results");

        Ok(keyed.into_iter().map(|(_, item)| item).collect())
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Nulls first, then booleans, numbers and strings in natural order.
fn compare_values(left: &Value, right: &Value) -> CmpOrdering {
    match (left, right) {
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => l
                .as_f64()
                .partial_cmp(&r.as_f64())
                .unwrap_or(CmpOrdering::Equal),
        },
        (Value::String(l), Value::String(r)) => l.cmp(r),
        _ => rank(left).cmp(&rank(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Row {
        id: i64,
        title: &'static str,
        rank: Option<i64>,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, title: "b", rank: Some(2) },
            Row { id: 2, title: "a", rank: None },
            Row { id: 3, title: "b", rank: Some(1) },
        ]
    }

    fn ordering(value: &str) -> OrderingParams {
        OrderingParams {
            ordering: Some(value.to_string()),
        }
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|row| row.id).collect()
    }

    #[test]
    fn test_terms_drop_unknown_fields() {
        let ordering = Ordering::new(["title", "rank"]);
        assert_eq!(
            ordering.terms(Some(" title , -rank,secret,,-")),
            vec![
                OrderTerm { field: "title".into(), descending: false },
                OrderTerm { field: "rank".into(), descending: true },
            ]
        );
        assert!(ordering.terms(None).is_empty());
    }

    #[test]
    fn test_multiple_terms() {
        let sorted = Ordering::all()
            .apply(rows(), &ordering("title,-rank"))
            .unwrap();
        assert_eq!(ids(&sorted), vec![2, 1, 3]);

        let sorted = Ordering::all().apply(rows(), &ordering("-id")).unwrap();
        assert_eq!(ids(&sorted), vec![3, 2, 1]);
    }

    #[test]
    fn test_nulls_sort_first() {
        let sorted = Ordering::all().apply(rows(), &ordering("rank")).unwrap();
        assert_eq!(ids(&sorted), vec![2, 3, 1]);
    }

    #[test]
    fn test_model_fields() {
        #[derive(Clone, Serialize, serde::Deserialize)]
        struct Card {
            id: Option<i64>,
            title: String,
        }

        impl Model for Card {
            const NAME: &'static str = "Card";
            const FIELDS: &'static [&'static str] = &["title"];

            fn pk(&self) -> Option<i64> {
                self.id
            }

            fn set_pk(&mut self, pk: i64) {
                self.id = Some(pk);
            }
        }

        let ordering = Ordering::for_model::<Card>().with_field("created_at");
        let fields: Vec<String> = ordering
            .terms(Some("-id,title,created_at,secret"))
            .into_iter()
            .map(|term| term.field)
            .collect();
        assert_eq!(fields, vec!["id", "title", "created_at"]);
    }

    #[test]
    fn test_no_valid_terms_keeps_order() {
        let sorted = Ordering::new(["title"])
            .apply(rows(), &ordering("-rank"))
            .unwrap();
        assert_eq!(ids(&sorted), vec![1, 2, 3]);
    }

    #[test]
    fn test_compare_mixed_values() {
        assert_eq!(compare_values(&json!(null), &json!(0)), CmpOrdering::Less);
        assert_eq!(compare_values(&json!(1.5), &json!(2)), CmpOrdering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), CmpOrdering::Greater);
    }
}
