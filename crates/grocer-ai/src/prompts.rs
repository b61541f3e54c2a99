//! Prompt text and response schemas for the four structured calls.
//!
//! Schemas use the OpenAPI subset accepted by `generateContent`. Property
//! names must match the `camelCase` serde names in `grocer_core::suggest`.

use grocer_core::suggest::HistoryDay;
use serde_json::{Value, json};

use crate::CompletionRequest;

/// Shared rule for telling a single dish apart from a request for a kit.
const DISH_RULE: &str = "If the text names a single dish or food on its own \
  (for example \"pizza\"), return exactly one item for it and no dish name. \
  Only when it explicitly asks for ingredients or a kit (\"ingredients for X\", \
  \"kit for X\") break it down into ingredients and set the dish name to X.";

fn category_hint(categories: &[String]) -> String {
  if categories.is_empty() {
    "There are no existing categories yet.".to_owned()
  } else {
    format!(
      "Existing categories: {}. Prefer one of them; only propose a new \
       category when none fits.",
      categories.join(", ")
    )
  }
}

fn template_item_schema() -> Value {
  json!({
    "type": "OBJECT",
    "properties": {
      "name":         { "type": "STRING" },
      "categoryName": { "type": "STRING" },
      "emoji":        { "type": "STRING" }
    },
    "required": ["name", "categoryName", "emoji"]
  })
}

pub fn categorize(product: &str, categories: &[String]) -> CompletionRequest {
  CompletionRequest {
    prompt: format!(
      "Assign the grocery product \"{product}\" to a store department. {} \
       Reply with the category name, a fitting emoji, and whether the \
       category is new.",
      category_hint(categories)
    ),
    schema: json!({
      "type": "OBJECT",
      "properties": {
        "categoryName":   { "type": "STRING" },
        "suggestedEmoji": { "type": "STRING" },
        "isNew":          { "type": "BOOLEAN" }
      },
      "required": ["categoryName", "suggestedEmoji", "isNew"]
    }),
  }
}

pub fn parse_dictation(text: &str, categories: &[String]) -> CompletionRequest {
  CompletionRequest {
    prompt: format!(
      "Turn this dictated shopping request into list items: \"{text}\". \
       {DISH_RULE} {} Use short product names.",
      category_hint(categories)
    ),
    schema: json!({
      "type": "OBJECT",
      "properties": {
        "items": {
          "type": "ARRAY",
          "items": {
            "type": "OBJECT",
            "properties": {
              "name":           { "type": "STRING" },
              "categoryName":   { "type": "STRING" },
              "suggestedEmoji": { "type": "STRING" }
            },
            "required": ["name", "categoryName", "suggestedEmoji"]
          }
        },
        "dishName": { "type": "STRING", "nullable": true }
      },
      "required": ["items"]
    }),
  }
}

pub fn generate_set(description: &str, categories: &[String]) -> CompletionRequest {
  CompletionRequest {
    prompt: format!(
      "Create a reusable shopping set for: \"{description}\". {DISH_RULE} {} \
       Also pick one emoji for the whole set.",
      category_hint(categories)
    ),
    schema: json!({
      "type": "OBJECT",
      "properties": {
        "setEmoji": { "type": "STRING" },
        "items":    { "type": "ARRAY", "items": template_item_schema() }
      },
      "required": ["setEmoji", "items"]
    }),
  }
}

pub fn suggest_sets(history: &[HistoryDay], categories: &[String]) -> CompletionRequest {
  let days: Vec<String> = history
    .iter()
    .map(|day| format!("{}: {}", day.date, day.items.join(", ")))
    .collect();
  CompletionRequest {
    prompt: format!(
      "Here is a household's purchase history, one day per line:\n{}\n\
       Find up to 3 groups of products that are regularly bought together \
       and propose each as a named set with an emoji. {}",
      days.join("\n"),
      category_hint(categories)
    ),
    schema: json!({
      "type": "ARRAY",
      "items": {
        "type": "OBJECT",
        "properties": {
          "name":  { "type": "STRING" },
          "emoji": { "type": "STRING" },
          "items": { "type": "ARRAY", "items": template_item_schema() }
        },
        "required": ["name", "emoji", "items"]
      }
    }),
  }
}
