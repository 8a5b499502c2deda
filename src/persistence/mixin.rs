//! Model-backed mutation schemas
//!
//! A request schema bound to a [`Model`] gets `perform_create`,
//! `perform_update` and `perform_patch` for free:
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct CreateTask {
//!     title: String,
//! }
//!
//! impl Schema for CreateTask {}
//!
//! impl ModelSchema for CreateTask {
//!     type Model = Task;
//! }
//!
//! let task = payload.perform_create(&manager, FieldMap::new())?;
//! ```

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;

use super::manager::Manager;
use super::model::{FieldMap, Model};
use crate::api::{DumpOptions, Schema};
use crate::error::{ApiError, ApiResult, ConfigurationError, PersistenceError};

pub trait ModelSchema: Schema + Serialize {
    /// The model this schema writes to.
    type Model: Model;

    /// Dump the validated fields as a field mapping.
    fn dump(&self, options: DumpOptions) -> ApiResult<FieldMap> {
        let value = options
            .render(self)
            .with_context(|| format!("failed to serialize `{}`", Self::schema_name()))?;
        match value {
            Value::Object(fields) => Ok(fields),
            _ => Err(ConfigurationError::NotAnObject {
                schema: Self::schema_name().into_owned(),
            }
            .into()),
        }
    }

    /// Create a new instance from every field of this schema plus
    /// `overrides`, which win on collisions.
    fn perform_create<G>(&self, manager: &G, overrides: FieldMap) -> ApiResult<Self::Model>
    where
        G: Manager<Model = Self::Model> + ?Sized,
    {
        let mut data = self.dump(DumpOptions::by_alias())?;
        data.extend(overrides);

        match manager.create(data) {
            Ok(instance) => {
                tracing::debug!(
                    model = <Self::Model as Model>::NAME,
                    schema = %Self::schema_name(),
                    pk = ?instance.pk(),
                    "Created instance"
                );
                Ok(instance)
            }
            Err(err @ PersistenceError::UnexpectedArgument { .. }) => {
                let err = ConfigurationError::CreateArguments {
                    model: <Self::Model as Model>::NAME,
                    manager: manager.name().to_string(),
                    schema: Self::schema_name().into_owned(),
                    detail: err.to_string(),
                };
                tracing::warn!(error = %err, "Schema does not match model constructor");
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Assign the non-null fields of this schema plus `overrides` onto
    /// `instance` and save it once.
    ///
    /// Fields left as `None` in the schema never overwrite the instance.
    fn perform_update<G>(
        &self,
        manager: &G,
        mut instance: Self::Model,
        overrides: FieldMap,
    ) -> ApiResult<Self::Model>
    where
        G: Manager<Model = Self::Model> + ?Sized,
    {
        let mut data = self.dump(DumpOptions::exclude_none())?;
        data.extend(overrides);

        instance.assign(data).map_err(|err| match err {
            PersistenceError::UnexpectedArgument { model, field } => {
                let err = ConfigurationError::UnknownField {
                    model,
                    schema: Self::schema_name().into_owned(),
                    field,
                };
                tracing::warn!(error = %err, "Schema does not match model fields");
                ApiError::from(err)
            }
            other => ApiError::from(other),
        })?;
        manager.save(&mut instance)?;

        tracing::debug!(
            model = <Self::Model as Model>::NAME,
            schema = %Self::schema_name(),
            pk = ?instance.pk(),
            "Updated instance"
        );
        Ok(instance)
    }

    /// Same contract as [`perform_update`](Self::perform_update).
    fn perform_patch<G>(
        &self,
        manager: &G,
        instance: Self::Model,
        overrides: FieldMap,
    ) -> ApiResult<Self::Model>
    where
        G: Manager<Model = Self::Model> + ?Sized,
    {
        self.perform_update(manager, instance, overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryManager;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Author {
        #[serde(default)]
        id: Option<i64>,
        name: String,
        #[serde(default)]
        bio: Option<String>,
    }

    impl Model for Author {
        const NAME: &'static str = "Author";
        const FIELDS: &'static [&'static str] = &["name", "bio"];

        fn pk(&self) -> Option<i64> {
            self.id
        }

        fn set_pk(&mut self, pk: i64) {
            self.id = Some(pk);
        }
    }

    #[derive(Serialize)]
    struct CreateAuthor {
        name: String,
        bio: Option<String>,
    }

    impl Schema for CreateAuthor {}

    impl ModelSchema for CreateAuthor {
        type Model = Author;
    }

    #[derive(Serialize)]
    struct CreateAuthorWithEmail {
        name: String,
        email: String,
    }

    impl Schema for CreateAuthorWithEmail {}

    impl ModelSchema for CreateAuthorWithEmail {
        type Model = Author;
    }

    #[derive(Serialize)]
    struct UpdateAuthor {
        name: Option<String>,
        bio: Option<String>,
    }

    impl Schema for UpdateAuthor {}

    impl ModelSchema for UpdateAuthor {
        type Model = Author;
    }

    #[derive(Serialize)]
    struct RenameAuthor {
        nmae: Option<String>,
    }

    impl Schema for RenameAuthor {}

    impl ModelSchema for RenameAuthor {
        type Model = Author;
    }

    /// Counts saves and can be told to fail them.
    #[derive(Default)]
    struct CountingManager {
        saves: AtomicUsize,
        fail_saves: bool,
    }

    impl Manager for CountingManager {
        type Model = Author;

        fn create(&self, fields: FieldMap) -> Result<Author, PersistenceError> {
            let mut author = Author::from_fields(fields)?;
            self.save(&mut author)?;
            Ok(author)
        }

        fn save(&self, instance: &mut Author) -> Result<(), PersistenceError> {
            if self.fail_saves {
                return Err(PersistenceError::Constraint("author name must be unique".into()));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            if instance.id.is_none() {
                instance.id = Some(1);
            }
            Ok(())
        }

        fn get(&self, _pk: i64) -> Result<Option<Author>, PersistenceError> {
            Ok(None)
        }

        fn all(&self) -> Result<Vec<Author>, PersistenceError> {
            Ok(Vec::new())
        }
    }

    fn overrides(value: Value) -> FieldMap {
        value.as_object().cloned().unwrap_or_default()
    }

    fn saved_author() -> Author {
        Author {
            id: Some(1),
            name: "original".into(),
            bio: Some("Writes things".into()),
        }
    }

    #[test]
    fn test_dump_keeps_or_drops_nulls() {
        let schema = CreateAuthor {
            name: "Ada".into(),
            bio: None,
        };
        assert_eq!(
            Value::Object(schema.dump(DumpOptions::default()).unwrap()),
            json!({"name": "Ada", "bio": null})
        );
        assert_eq!(
            Value::Object(schema.dump(DumpOptions::exclude_none()).unwrap()),
            json!({"name": "Ada"})
        );
    }

    #[test]
    fn test_perform_create_applies_every_field() {
        let manager = InMemoryManager::<Author>::new();
        let schema = CreateAuthor {
            name: "Ada".into(),
            bio: Some("Mathematician".into()),
        };

        let author = schema.perform_create(&manager, FieldMap::new()).unwrap();

        assert_eq!(author.id, Some(1));
        assert_eq!(author.name, "Ada");
        assert_eq!(author.bio.as_deref(), Some("Mathematician"));
        assert_eq!(manager.get(1).unwrap(), Some(author));
    }

    #[test]
    fn test_perform_create_overrides_win() {
        let manager = InMemoryManager::<Author>::new();
        let schema = CreateAuthor {
            name: "Ada".into(),
            bio: None,
        };

        let author = schema
            .perform_create(&manager, overrides(json!({"bio": "From override"})))
            .unwrap();
        assert_eq!(author.bio.as_deref(), Some("From override"));
    }

    #[test]
    fn test_perform_create_reports_field_mismatch() {
        let manager = InMemoryManager::<Author>::named("writers");
        let schema = CreateAuthorWithEmail {
            name: "Ada".into(),
            email: "ada@example.com".into(),
        };

        let err = schema
            .perform_create(&manager, FieldMap::new())
            .unwrap_err();
        let message = err.to_string();

        assert!(matches!(
            err,
            ApiError::Configuration(ConfigurationError::CreateArguments { .. })
        ));
        assert!(message.contains("Author.writers.create()"));
        assert!(message.contains("CreateAuthorWithEmail.perform_create()"));
        assert!(message.contains("unexpected keyword argument 'email'"));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_perform_create_propagates_other_errors() {
        let manager = CountingManager {
            fail_saves: true,
            ..CountingManager::default()
        };
        let schema = CreateAuthor {
            name: "Ada".into(),
            bio: None,
        };

        let err = schema.perform_create(&manager, FieldMap::new()).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Persistence(PersistenceError::Constraint(_))
        ));
    }

    #[test]
    fn test_perform_update_override_wins_and_saves_once() {
        let manager = CountingManager::default();
        let schema = UpdateAuthor {
            name: Some("original".into()),
            bio: None,
        };

        let author = schema
            .perform_update(&manager, saved_author(), overrides(json!({"name": "override"})))
            .unwrap();

        assert_eq!(author.name, "override");
        assert_eq!(manager.saves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_perform_update_skips_none_fields() {
        let manager = CountingManager::default();
        let schema = UpdateAuthor {
            name: Some("Renamed".into()),
            bio: None,
        };

        let author = schema
            .perform_update(&manager, saved_author(), FieldMap::new())
            .unwrap();

        assert_eq!(author.name, "Renamed");
        assert_eq!(author.bio.as_deref(), Some("Writes things"));
    }

    #[test]
    fn test_perform_update_rejects_undeclared_fields() {
        let manager = CountingManager::default();
        let schema = RenameAuthor {
            nmae: Some("typo".into()),
        };

        let err = schema
            .perform_update(&manager, saved_author(), FieldMap::new())
            .unwrap_err();

        assert!(matches!(
            &err,
            ApiError::Configuration(ConfigurationError::UnknownField { field, .. }) if field == "nmae"
        ));
        assert!(err.to_string().contains("RenameAuthor"));
        assert_eq!(manager.saves.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_perform_update_propagates_save_errors() {
        let manager = CountingManager {
            fail_saves: true,
            ..CountingManager::default()
        };
        let schema = UpdateAuthor {
            name: Some("Renamed".into()),
            bio: None,
        };

        let err = schema
            .perform_update(&manager, saved_author(), FieldMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Persistence(PersistenceError::Constraint(_))
        ));
    }

    #[test]
    fn test_perform_patch_matches_update() {
        let manager = CountingManager::default();
        let schema = UpdateAuthor {
            name: None,
            bio: Some("Patched".into()),
        };

        let author = schema
            .perform_patch(&manager, saved_author(), FieldMap::new())
            .unwrap();

        assert_eq!(author.name, "original");
        assert_eq!(author.bio.as_deref(), Some("Patched"));
        assert_eq!(manager.saves.load(Ordering::SeqCst), 1);
    }
}
