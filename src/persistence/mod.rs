//! Persistence capability and model-backed mutation schemas

pub mod manager;
pub mod memory;
pub mod mixin;
pub mod model;

pub use manager::Manager;
pub use memory::InMemoryManager;
pub use mixin::ModelSchema;
pub use model::{FieldMap, Model};
