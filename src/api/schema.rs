//! Schema naming
//!
//! Every type that crosses the API boundary has a display name. Generic
//! envelopes derive theirs from the item type, e.g.
//! `PaginatedEnvelope[Task]`.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A type with a stable, human readable schema name.
///
/// The default name is the last path segment of the Rust type name, so most
/// types only need an empty `impl Schema for Task {}`.
pub trait Schema {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed(short_type_name::<Self>())
    }
}

macro_rules! impl_schema_for_primitives {
    ($($ty:ty),* $(,)?) => {
        $(impl Schema for $ty {})*
    };
}

impl_schema_for_primitives!(String, bool, i32, i64, u32, u64, f32, f64, serde_json::Value);

/// Reference to a response schema by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRef(String);

impl SchemaRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Reference to the schema of `T`.
    pub fn of<T: Schema + ?Sized>() -> Self {
        Self(T::schema_name().into_owned())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn into_name(self) -> String {
        self.0
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialization controls shared by route rendering and schema dumps.
///
/// Field aliases come from serde's `rename` attributes, which always apply,
/// so `by_alias` only records what the caller asked for. `exclude_unset` and
/// `exclude_defaults` are forwarded to schemas that track those states
/// themselves; `exclude_none` is applied generically by [`DumpOptions::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpOptions {
    #[serde(default)]
    pub by_alias: bool,
    #[serde(default)]
    pub exclude_unset: bool,
    #[serde(default)]
    pub exclude_defaults: bool,
    #[serde(default)]
    pub exclude_none: bool,
}

impl DumpOptions {
    pub fn by_alias() -> Self {
        Self {
            by_alias: true,
            ..Self::default()
        }
    }

    pub fn exclude_none() -> Self {
        Self {
            exclude_none: true,
            ..Self::default()
        }
    }

    pub fn apply(&self, value: serde_json::Value) -> serde_json::Value {
        if self.exclude_none {
            strip_nulls(value)
        } else {
            value
        }
    }

    /// Serialize `value` and apply these options.
    pub fn render<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(value).map(|value| self.apply(value))
    }
}

fn strip_nulls(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// `crate::domain::tasks::Task` -> `Task`, `Vec<u8>` -> `Vec`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Upper-cases the first character, leaving the rest untouched.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Invoice;
    impl Schema for Invoice {}

    #[test]
    fn test_default_schema_name_is_short_type_name() {
        assert_eq!(Invoice::schema_name(), "Invoice");
        assert_eq!(String::schema_name(), "String");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("task"), "Task");
        assert_eq!(capitalize("lineItem"), "LineItem");
        assert_eq!(capitalize("i64"), "I64");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_exclude_none_is_recursive() {
        let value = serde_json::json!({
            "title": "Ship",
            "description": null,
            "owner": {"name": "Ada", "email": null},
            "tags": [{"label": null}]
        });

        assert_eq!(
            DumpOptions::exclude_none().apply(value.clone()),
            serde_json::json!({
                "title": "Ship",
                "owner": {"name": "Ada"},
                "tags": [{}]
            })
        );
        assert_eq!(DumpOptions::default().apply(value.clone()), value);
    }

    #[test]
    fn test_schema_ref_of() {
        assert_eq!(SchemaRef::of::<Invoice>().name(), "Invoice");
        assert_eq!(SchemaRef::new("Custom").to_string(), "Custom");
    }
}
