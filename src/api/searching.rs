//! `?search=` support for list endpoints
//!
//! Every search term must match at least one search field. Field names take
//! an optional lookup prefix:
//!
//! - `^title`: starts with
//! - `=title`: exact match
//! - `@title` or `title`: contains
//!
//! Matching is case-insensitive.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult, ValidationError};
use crate::persistence::Model;

/// Search query parameters
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchParams {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    StartsWith,
    Exact,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchField {
    name: String,
    lookup: Lookup,
}

impl SearchField {
    fn parse(raw: &str) -> Result<Self, ValidationError> {
        let (lookup, name) = match raw.chars().next() {
            Some('^') => (Lookup::StartsWith, &raw[1..]),
            Some('=') => (Lookup::Exact, &raw[1..]),
            Some('@') => (Lookup::Contains, &raw[1..]),
            Some('$') => {
                return Err(ValidationError::new(format!(
                    "Search field `{raw}`: regex lookups are not supported"
                )))
            }
            _ => (Lookup::Contains, raw),
        };
        if name.is_empty() {
            return Err(ValidationError::new(format!(
                "Search field `{raw}` has no field name"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            lookup,
        })
    }

    fn matches(&self, item: &Value, term: &str) -> bool {
        match &item[&self.name] {
            Value::Array(values) => values.iter().any(|value| self.matches_value(value, term)),
            value => self.matches_value(value, term),
        }
    }

    fn matches_value(&self, value: &Value, term: &str) -> bool {
        let text = match value {
            Value::String(text) => text.to_lowercase(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => return false,
        };
        match self.lookup {
            Lookup::StartsWith => text.starts_with(term),
            Lookup::Exact => text == term,
            Lookup::Contains => text.contains(term),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Searching {
    fields: Vec<SearchField>,
}

impl Searching {
    pub fn new<I, T>(fields: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let fields = fields
            .into_iter()
            .map(|field| SearchField::parse(field.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { fields })
    }

    /// Search the model's declared fields with `contains` lookups.
    pub fn for_model<M: Model>() -> Self {
        Self {
            fields: M::FIELDS
                .iter()
                .map(|name| SearchField {
                    name: (*name).to_string(),
                    lookup: Lookup::Contains,
                })
                .collect(),
        }
    }

    /// Lower-cased terms split on whitespace and commas, NULs removed.
    pub fn terms(value: Option<&str>) -> Vec<String> {
        value
            .map(|value| {
                value
                    .replace('\0', "")
                    .replace(',', " ")
                    .split_whitespace()
                    .map(str::to_lowercase)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Keep the items matching every term.
    pub fn apply<T: Serialize>(&self, items: Vec<T>, params: &SearchParams) -> ApiResult<Vec<T>> {
        let terms = Self::terms(params.search.as_deref());
        if self.fields.is_empty() || terms.is_empty() {
            return Ok(items);
        }

        let mut matched = Vec::new();
        for item in items {
            let value = serde_json::to_value(&item).map_err(|e| ApiError::Internal(e.into()))?;
            let hit = terms.iter().all(|term| {
                self.fields
                    .iter()
                    .any(|field| field.matches(&value, term))
            });
            if hit {
                matched.push(item);
            }
        }

        tracing::debug!(terms = ?terms, matched = matched.len(), "Searched results");

        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Article {
        id: i64,
        title: &'static str,
        body: Option<&'static str>,
        tags: Vec<&'static str>,
    }

    fn articles() -> Vec<Article> {
        vec![
            Article { id: 1, title: "Rust Ownership", body: Some("borrowing rules"), tags: vec!["lang"] },
            Article { id: 2, title: "Async Rust", body: None, tags: vec!["tokio", "lang"] },
            Article { id: 3, title: "Cooking", body: Some("pasta"), tags: vec![] },
        ]
    }

    fn search(value: &str) -> SearchParams {
        SearchParams {
            search: Some(value.to_string()),
        }
    }

    fn ids(items: &[Article]) -> Vec<i64> {
        items.iter().map(|item| item.id).collect()
    }

    #[test]
    fn test_terms() {
        assert_eq!(Searching::terms(Some(" Rust,tokio\0  ")), vec!["rust", "tokio"]);
        assert!(Searching::terms(Some(" , ")).is_empty());
        assert!(Searching::terms(None).is_empty());
    }

    #[test]
    fn test_every_term_must_match_some_field() {
        let searching = Searching::new(["title", "body", "tags"]).unwrap();

        let found = searching.apply(articles(), &search("rust")).unwrap();
        assert_eq!(ids(&found), vec![1, 2]);

        let found = searching.apply(articles(), &search("rust, tokio")).unwrap();
        assert_eq!(ids(&found), vec![2]);

        let found = searching.apply(articles(), &search("PASTA")).unwrap();
        assert_eq!(ids(&found), vec![3]);
    }

    #[test]
    fn test_lookup_prefixes() {
        let starts = Searching::new(["^title"]).unwrap();
        assert_eq!(ids(&starts.apply(articles(), &search("rust")).unwrap()), vec![1]);

        let exact = Searching::new(["=title"]).unwrap();
        assert!(exact.apply(articles(), &search("rust")).unwrap().is_empty());
        assert_eq!(ids(&exact.apply(articles(), &search("cooking")).unwrap()), vec![3]);
    }

    #[test]
    fn test_empty_search_keeps_everything() {
        let searching = Searching::new(["title"]).unwrap();
        assert_eq!(searching.apply(articles(), &SearchParams::default()).unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_fields() {
        assert!(Searching::new(["$title"]).is_err());
        assert!(Searching::new(["^"]).is_err());
    }
}
