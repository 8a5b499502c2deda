//! Persisted models and their field mappings

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::PersistenceError;

/// Field name to value mapping passed to managers.
pub type FieldMap = serde_json::Map<String, Value>;

/// A type stored by a [`Manager`](super::Manager).
///
/// `FIELDS` is the complete set of fields a schema may pass to the
/// constructor or assign on an existing instance. Anything else is rejected
/// rather than silently attached.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const NAME: &'static str;
    const FIELDS: &'static [&'static str];

    /// Primary key, `None` until the instance is first saved.
    fn pk(&self) -> Option<i64>;

    fn set_pk(&mut self, pk: i64);

    /// Build an instance from constructor arguments.
    fn from_fields(fields: FieldMap) -> Result<Self, PersistenceError> {
        check_fields::<Self>(&fields)?;
        serde_json::from_value(Value::Object(fields)).map_err(|source| {
            PersistenceError::InvalidValue {
                model: Self::NAME,
                source,
            }
        })
    }

    /// Assign `fields` onto this instance.
    ///
    /// All-or-nothing: on error the instance is left untouched.
    fn assign(&mut self, fields: FieldMap) -> Result<(), PersistenceError> {
        check_fields::<Self>(&fields)?;

        let invalid = |source| PersistenceError::InvalidValue {
            model: Self::NAME,
            source,
        };
        let mut current = match serde_json::to_value(&*self).map_err(invalid)? {
            Value::Object(map) => map,
            other => {
                return Err(invalid(serde::de::Error::custom(format!(
                    "expected {} to serialize as an object, got {other}",
                    Self::NAME
                ))))
            }
        };
        current.extend(fields);
        *self = serde_json::from_value(Value::Object(current)).map_err(invalid)?;
        Ok(())
    }
}

fn check_fields<M: Model>(fields: &FieldMap) -> Result<(), PersistenceError> {
    match fields.keys().find(|key| !M::FIELDS.contains(&key.as_str())) {
        Some(field) => Err(PersistenceError::UnexpectedArgument {
            model: M::NAME,
            field: field.clone(),
        }),
        None => Ok(()),
    }
}
