//! Payload object model: dynamic objects, typed views and the update
//! envelope.

mod object;
pub mod types;
mod update;

pub use object::{NO_RELATIONS, Relation, RelationTable, ResponseObject, ResponseValue};
pub use update::{Update, UpdateKind};
