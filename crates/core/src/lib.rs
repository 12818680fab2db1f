//! Domain logic for the Hall of Fame discovery and deduplication engine.
//!
//! Everything here is pure: selection, similarity scanning and merge planning
//! operate on plain values so they can be exercised without a database.
//! Persistence lives in `hof-db`.

pub mod error;
pub mod merge;
pub mod merge_lock;
pub mod pagination;
pub mod roles;
pub mod selection;
pub mod similarity;
pub mod threshold_validation;
pub mod types;
