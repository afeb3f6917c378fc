//! Metamodel collaborator
//!
//! Model names, primary keys and relation definitions consumed by the field
//! projector and the include dispatcher. Lookups are read-only.

mod registry;
mod types;

pub use registry::{ModelDefinitions, ModelRegistry, DEFAULT_PRIMARY_KEY};
pub use types::{ModelDefinition, Polymorphism, RelationDefinition, RelationType};
