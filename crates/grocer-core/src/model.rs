//! Persisted entities: categories, items, saved sets and purchase logs.
//!
//! Cross references (item → category, log entry → category) are plain ids.
//! Nothing holds a pointer into another collection, and lookups tolerate
//! dangling ids.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Reserved category ───────────────────────────────────────────────────────

/// Id of the category that always exists and can be neither edited nor
/// deleted.
pub const UNCATEGORIZED_ID: &str = "dept_none";
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";
pub const UNCATEGORIZED_EMOJI: &str = "⚪";

// ─── Category ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub id:    String,
  pub name:  String,
  pub emoji: String,
}

impl Category {
  pub fn uncategorized() -> Self {
    Self {
      id:    UNCATEGORIZED_ID.to_owned(),
      name:  UNCATEGORIZED_NAME.to_owned(),
      emoji: UNCATEGORIZED_EMOJI.to_owned(),
    }
  }

  pub fn is_reserved(&self) -> bool { self.id == UNCATEGORIZED_ID }
}

// ─── Item ────────────────────────────────────────────────────────────────────

/// A product the household has ever put on the list.
///
/// Items are never removed by completing them; they stay in history with a
/// growing `purchase_count`. `completed_at` is present iff `completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub id:             String,
  pub name:           String,
  pub category_id:    String,
  pub on_list:        bool,
  pub completed:      bool,
  pub completed_at:   Option<DateTime<Utc>>,
  pub purchase_count: u32,
}

// ─── Set ─────────────────────────────────────────────────────────────────────

/// One line of a saved set.
///
/// This is a value snapshot, not a reference to an [`Item`]: editing or
/// deleting history items never changes a set's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetItem {
  pub name:          String,
  pub category_name: String,
  pub emoji:         String,
}

/// A named, reusable template that can be bulk-applied to the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSet {
  pub id:          String,
  pub name:        String,
  pub emoji:       String,
  pub items:       Vec<SetItem>,
  pub usage_count: u32,
}

// ─── Purchase log ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
  pub name:        String,
  pub category_id: String,
}

/// Every purchase event of one calendar day, in the order they happened.
/// Duplicate names are allowed; the count of a name is its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLog {
  pub id:      String,
  pub date:    NaiveDate,
  pub entries: Vec<LogEntry>,
}

impl PurchaseLog {
  pub fn for_day(date: NaiveDate) -> Self {
    Self { id: format!("log_{date}"), date, entries: Vec::new() }
  }
}

// ─── Preferences ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
  pub dark_mode:               bool,
  pub ai_enabled:              bool,
  pub confirm_delete_item:     bool,
  pub confirm_delete_category: bool,
  pub confirm_delete_set:      bool,
}

impl Default for Preferences {
  fn default() -> Self {
    Self {
      dark_mode:               false,
      ai_enabled:              true,
      confirm_delete_item:     true,
      confirm_delete_category: true,
      confirm_delete_set:      true,
    }
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// The local calendar day a timestamp falls on.
pub fn calendar_day(ts: DateTime<Utc>) -> NaiveDate {
  ts.with_timezone(&Local).date_naive()
}

/// Normalised lookup key for case-insensitive name matching.
pub fn name_key(name: &str) -> String { name.trim().to_lowercase() }

/// Trim and upper-case the first character: `"bread"` becomes `"Bread"`.
pub fn display_name(raw: &str) -> String {
  let mut chars = raw.trim().chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

pub(crate) fn new_id(prefix: &str) -> String {
  format!("{prefix}_{}", Uuid::new_v4().simple())
}
