//! Persistence manager capability

use super::model::{FieldMap, Model};
use crate::error::PersistenceError;

/// Creates, saves and loads instances of one model type.
///
/// Every call is synchronous and performs at most one storage operation.
/// Transactions and retries belong to the implementation.
pub trait Manager: Send + Sync {
    type Model: Model;

    /// Name used in diagnostics, e.g. `Task.objects.create()`.
    fn name(&self) -> &str {
        "objects"
    }

    /// Construct and persist a new instance from constructor arguments.
    fn create(&self, fields: FieldMap) -> Result<Self::Model, PersistenceError>;

    /// Persist `instance`, assigning a primary key if it has none.
    fn save(&self, instance: &mut Self::Model) -> Result<(), PersistenceError>;

    fn get(&self, pk: i64) -> Result<Option<Self::Model>, PersistenceError>;

    /// All instances in primary-key order.
    fn all(&self) -> Result<Vec<Self::Model>, PersistenceError>;
}
