//! Built-in dataset used when a document has never been persisted.

use crate::model::{Category, ItemSet, Preferences, SetItem};

const DEPARTMENTS: &[(&str, &str, &str)] = &[
  ("dept_produce", "Produce", "🥦"),
  ("dept_dairy", "Dairy", "🥛"),
  ("dept_bakery", "Bakery", "🍞"),
  ("dept_meat", "Meat & Fish", "🥩"),
  ("dept_pantry", "Pantry", "🥫"),
  ("dept_frozen", "Frozen", "🧊"),
  ("dept_household", "Household", "🧴"),
];

/// The reserved category followed by a handful of common departments.
pub fn categories() -> Vec<Category> {
  std::iter::once(Category::uncategorized())
    .chain(DEPARTMENTS.iter().map(|(id, name, emoji)| Category {
      id:    (*id).to_owned(),
      name:  (*name).to_owned(),
      emoji: (*emoji).to_owned(),
    }))
    .collect()
}

/// One starter set so the sets screen is not empty on first launch.
pub fn sets() -> Vec<ItemSet> {
  let line = |name: &str, category_name: &str, emoji: &str| SetItem {
    name:          name.to_owned(),
    category_name: category_name.to_owned(),
    emoji:         emoji.to_owned(),
  };
  vec![ItemSet {
    id:          "set_breakfast".to_owned(),
    name:        "Breakfast".to_owned(),
    emoji:       "🍳".to_owned(),
    items:       vec![
      line("Eggs", "Dairy", "🥚"),
      line("Bread", "Bakery", "🍞"),
      line("Milk", "Dairy", "🥛"),
    ],
    usage_count: 0,
  }]
}

pub fn preferences() -> Preferences { Preferences::default() }
