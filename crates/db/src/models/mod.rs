//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row and, where rows are created through the API or tests, a
//! `Deserialize` create DTO.

pub mod ban;
pub mod creator;
pub mod embedding;
pub mod engagement;
pub mod screenshot;
pub mod selection;
