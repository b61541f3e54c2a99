//! Error types for `grocer-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("item not found: {0}")]
  ItemNotFound(String),

  #[error("category not found: {0}")]
  CategoryNotFound(String),

  #[error("set not found: {0}")]
  SetNotFound(String),

  #[error("the uncategorized category cannot be changed or deleted")]
  ReservedCategory,

  #[error("name already in use: {0:?}")]
  DuplicateName(String),

  #[error("name must not be empty")]
  EmptyName,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
