//! The `StateStore` trait and the persisted document set.
//!
//! The trait is implemented by storage backends (e.g. `grocer-store-sqlite`).
//! The application service depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::model::{Category, Item, ItemSet, Preferences, PurchaseLog};

// ─── Documents ───────────────────────────────────────────────────────────────

/// One independently persisted document.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Document {
  Categories,
  Items,
  Sets,
  Logs,
  Preferences,
}

impl Document {
  pub const ALL: [Document; 5] = [
    Self::Categories,
    Self::Items,
    Self::Sets,
    Self::Logs,
    Self::Preferences,
  ];

  /// The storage key; must match the `rename_all = "lowercase"` serde tags.
  pub fn key(self) -> &'static str {
    match self {
      Self::Categories => "categories",
      Self::Items => "items",
      Self::Sets => "sets",
      Self::Logs => "logs",
      Self::Preferences => "preferences",
    }
  }

  pub fn from_key(key: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|d| d.key() == key)
  }
}

/// Whatever the backend had on disk. `None` means the document was never
/// saved and the built-in default applies.
#[derive(Debug, Clone, Default)]
pub struct StoredDocuments {
  pub categories:  Option<Vec<Category>>,
  pub items:       Option<Vec<Item>>,
  pub sets:        Option<Vec<ItemSet>>,
  pub logs:        Option<Vec<PurchaseLog>>,
  pub preferences: Option<Preferences>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Grocer persistence backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StateStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read every stored document.
  fn load(
    &self,
  ) -> impl Future<Output = Result<StoredDocuments, Self::Error>> + Send + '_;

  /// Replace one document with its JSON-encoded body.
  fn save(
    &self,
    document: Document,
    body: serde_json::Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
