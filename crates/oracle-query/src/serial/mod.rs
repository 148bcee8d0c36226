//! Tagged-state serialization.
//!
//! Entities are written as mappings carrying their type tag under `"type"`
//! followed by their declared fields. A [`Registry`] maps tags back to types
//! when a document is read.

pub mod item;
pub mod json;
pub mod registry;

pub use item::Item;
pub use json::{to_canonical_string, AsciiFormatter};
pub use registry::{entity_state, serialize, Entity, Field, Registry, Serializable};
