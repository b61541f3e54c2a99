//! Shapes of the AI responses and the rule for folding them into state.
//!
//! Field names follow the JSON schema the gateway requests, hence
//! `camelCase`. Every type has a `Default` that is used when the service
//! answers successfully with an empty body.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  model::{
    Item, SetItem, UNCATEGORIZED_EMOJI, UNCATEGORIZED_ID, UNCATEGORIZED_NAME,
    display_name,
  },
  state::AppState,
};

/// Emoji for a category the model names without offering one.
const FALLBACK_CATEGORY_EMOJI: &str = "🏷️";

/// Emoji for a generated set the model returned nothing for.
pub const FALLBACK_SET_EMOJI: &str = "🛒";

// ─── Response types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategorySuggestion {
  pub category_name:   String,
  pub suggested_emoji: String,
  pub is_new:          bool,
}

impl Default for CategorySuggestion {
  fn default() -> Self {
    Self {
      category_name:   UNCATEGORIZED_NAME.to_owned(),
      suggested_emoji: UNCATEGORIZED_EMOJI.to_owned(),
      is_new:          false,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedItem {
  pub name:            String,
  pub category_name:   String,
  pub suggested_emoji: String,
}

/// A dictated utterance split into items. `dish_name` is set only when the
/// user asked for the ingredients of a dish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dictation {
  pub items:     Vec<ParsedItem>,
  pub dish_name: Option<String>,
}

/// One line of a generated or suggested set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateItem {
  pub name:          String,
  pub category_name: String,
  pub emoji:         String,
}

impl From<TemplateItem> for SetItem {
  fn from(t: TemplateItem) -> Self {
    SetItem { name: t.name, category_name: t.category_name, emoji: t.emoji }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedSet {
  pub set_emoji: String,
  pub items:     Vec<TemplateItem>,
}

impl Default for GeneratedSet {
  fn default() -> Self {
    Self { set_emoji: FALLBACK_SET_EMOJI.to_owned(), items: Vec::new() }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestedSet {
  pub name:  String,
  pub emoji: String,
  pub items: Vec<TemplateItem>,
}

// ─── Request inputs ──────────────────────────────────────────────────────────

/// A purchase log reduced to what the history analysis needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDay {
  pub date:  NaiveDate,
  pub items: Vec<String>,
}

/// Every logged day, oldest first, as input for set suggestions.
pub fn history_digest(state: &AppState) -> Vec<HistoryDay> {
  let mut days: Vec<HistoryDay> = state
    .logs()
    .iter()
    .map(|log| HistoryDay {
      date:  log.date,
      items: log.entries.iter().map(|e| e.name.clone()).collect(),
    })
    .collect();
  days.sort_by_key(|d| d.date);
  days
}

// ─── Merge rule ──────────────────────────────────────────────────────────────

impl AppState {
  /// Decide which category a suggested item goes to.
  ///
  /// Local history wins: an existing item with the same name keeps its
  /// category. Otherwise the suggested category is matched by name
  /// case-insensitively and only created when nothing matches. A blank
  /// suggestion resolves to the reserved category.
  pub fn resolve_suggested_category(
    &mut self,
    item_name: &str,
    category_name: &str,
    emoji: &str,
  ) -> String {
    if let Some(existing) = self.find_item_by_name(item_name) {
      let id = existing.category_id.clone();
      return if self.category(&id).is_some() { id } else { UNCATEGORIZED_ID.to_owned() };
    }

    let name = category_name.trim();
    if name.is_empty() {
      return UNCATEGORIZED_ID.to_owned();
    }
    if let Some(category) = self.find_category_by_name(name) {
      return category.id.clone();
    }

    let emoji = match emoji.trim() {
      "" => FALLBACK_CATEGORY_EMOJI,
      e => e,
    };
    self.insert_category(name, emoji).id.clone()
  }

  /// Resolve the category through the merge rule, then add the item. A
  /// blank name is refused before any category is created.
  pub fn add_suggested_item(
    &mut self,
    name: &str,
    category_name: &str,
    emoji: &str,
  ) -> Result<&Item> {
    if display_name(name).is_empty() {
      return Err(Error::EmptyName);
    }
    let category_id = self.resolve_suggested_category(name, category_name, emoji);
    self.add_item(name, Some(&category_id))
  }

  /// Fold a categorisation answer for `name` into state.
  pub fn add_categorized_item(
    &mut self,
    name: &str,
    suggestion: &CategorySuggestion,
  ) -> Result<&Item> {
    self.add_suggested_item(name, &suggestion.category_name, &suggestion.suggested_emoji)
  }

  /// Add every item of a dictation and return their ids. Blank names are
  /// skipped.
  pub fn add_dictation(&mut self, dictation: &Dictation) -> Result<Vec<String>> {
    let mut added = Vec::with_capacity(dictation.items.len());
    for parsed in dictation.items.iter().filter(|p| !p.name.trim().is_empty()) {
      let item = self.add_suggested_item(
        &parsed.name,
        &parsed.category_name,
        &parsed.suggested_emoji,
      )?;
      added.push(item.id.clone());
    }
    Ok(added)
  }
}
