//! Shared types, errors and limits for Agrama.
//!
//! This crate has no dependency on storage, indexing, or dispatch — it is
//! the vocabulary every other Agrama crate speaks.

pub mod error;
pub mod key;
pub mod limits;
pub mod types;

pub use error::{Error, Result};
pub use limits::Limits;
pub use types::{Edge, Item, Key, Metadata};
