//! Data model types for oracle queries.
//!
//! This module contains the core types shared by the codec and the query
//! kinds:
//! - Query identifiers (Keccak-256 or legacy)
//! - ABI types (parsed type grammar)
//! - ABI values (runtime values to encode)

pub mod abi_type;
pub mod id;
pub mod value;

pub use abi_type::AbiType;
pub use id::{format_hex, keccak256, parse_hex, QueryId};
pub use value::AbiValue;
