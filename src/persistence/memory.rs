//! In-memory manager

use std::collections::BTreeMap;
use std::marker::PhantomData;

use parking_lot::RwLock;

use super::manager::Manager;
use super::model::{FieldMap, Model};
use crate::error::PersistenceError;

struct Store<M> {
    rows: BTreeMap<i64, M>,
    next_pk: i64,
}

/// [`Manager`] keeping instances in an ordered map.
pub struct InMemoryManager<M: Model> {
    name: String,
    store: RwLock<Store<M>>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Default for InMemoryManager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> InMemoryManager<M> {
    pub fn new() -> Self {
        Self::named("objects")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: RwLock::new(Store {
                rows: BTreeMap::new(),
                next_pk: 1,
            }),
            _model: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.store.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M: Model> Manager for InMemoryManager<M> {
    type Model = M;

    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self, fields: FieldMap) -> Result<M, PersistenceError> {
        let mut instance = M::from_fields(fields)?;
        self.save(&mut instance)?;
        Ok(instance)
    }

    fn save(&self, instance: &mut M) -> Result<(), PersistenceError> {
        let mut store = self.store.write();
        let pk = match instance.pk() {
            Some(pk) => {
                store.next_pk = store.next_pk.max(pk + 1);
                pk
            }
            None => {
                let pk = store.next_pk;
                store.next_pk += 1;
                instance.set_pk(pk);
                pk
            }
        };
        store.rows.insert(pk, instance.clone());

        tracing::debug!(model = M::NAME, pk, "Saved instance");
        Ok(())
    }

    fn get(&self, pk: i64) -> Result<Option<M>, PersistenceError> {
        Ok(self.store.read().rows.get(&pk).cloned())
    }

    fn all(&self) -> Result<Vec<M>, PersistenceError> {
        Ok(self.store.read().rows.values().cloned().collect())
    }
}
