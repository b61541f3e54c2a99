//! Read-only projections for the buy list, history, calendar and sets
//! screens.
//!
//! Every function here is pure over `&AppState` and recomputed after each
//! mutation. Ids that point at a missing category resolve to the
//! "Uncategorized ⚪" placeholder; empty collections give empty views.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  model::{
    Item, ItemSet, UNCATEGORIZED_EMOJI, UNCATEGORIZED_ID, UNCATEGORIZED_NAME,
    calendar_day, name_key,
  },
  state::AppState,
};

// ─── Category label ──────────────────────────────────────────────────────────

/// The category a view groups under, borrowed from state or the placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryLabel<'a> {
  pub id:    &'a str,
  pub name:  &'a str,
  pub emoji: &'a str,
}

impl CategoryLabel<'static> {
  pub const PLACEHOLDER: Self = Self {
    id:    UNCATEGORIZED_ID,
    name:  UNCATEGORIZED_NAME,
    emoji: UNCATEGORIZED_EMOJI,
  };
}

pub fn category_label<'a>(state: &'a AppState, id: &str) -> CategoryLabel<'a> {
  state
    .category(id)
    .map(|c| CategoryLabel { id: &c.id, name: &c.name, emoji: &c.emoji })
    .unwrap_or(CategoryLabel::PLACEHOLDER)
}

/// Group `members` by resolved category, keeping first-appearance order.
fn group_by_category<'a, T>(
  state: &'a AppState,
  members: impl IntoIterator<Item = (&'a str, T)>,
) -> Vec<(CategoryLabel<'a>, Vec<T>)> {
  let mut groups: Vec<(CategoryLabel<'a>, Vec<T>)> = Vec::new();
  let mut slots: HashMap<&'a str, usize> = HashMap::new();
  for (category_id, member) in members {
    let label = category_label(state, category_id);
    let slot = *slots.entry(label.id).or_insert_with(|| {
      groups.push((label, Vec::new()));
      groups.len() - 1
    });
    groups[slot].1.push(member);
  }
  groups
}

// ─── Buy list ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ActiveList<'a> {
  pub pending:         Vec<&'a Item>,
  pub completed_today: Vec<&'a Item>,
}

/// Items on the list, split into still-to-buy and bought today.
///
/// Items off the list never appear, even when completed; completed items
/// from an earlier day appear in neither half.
pub fn active_list<'a>(
  state: &'a AppState,
  category_filter: Option<&str>,
  today: NaiveDate,
) -> ActiveList<'a> {
  let mut view = ActiveList { pending: Vec::new(), completed_today: Vec::new() };
  let on_list = state.items().iter().filter(|i| i.on_list).filter(|i| {
    category_filter.is_none_or(|id| category_label(state, &i.category_id).id == id)
  });

  for item in on_list {
    if !item.completed {
      view.pending.push(item);
    } else if item.completed_at.is_some_and(|at| calendar_day(at) == today) {
      view.completed_today.push(item);
    }
  }
  view
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup<'a> {
  pub category: CategoryLabel<'a>,
  /// Purchases of every item ever assigned to the category.
  pub rank:     u64,
  pub items:    Vec<&'a Item>,
}

/// Sum of purchase counts per resolved category id, over all items.
fn category_totals(state: &AppState) -> HashMap<&str, u64> {
  let mut totals: HashMap<&str, u64> = HashMap::new();
  for item in state.items() {
    let id = category_label(state, &item.category_id).id;
    *totals.entry(id).or_default() += u64::from(item.purchase_count);
  }
  totals
}

/// Group pending items by category, habitually bought categories first and
/// habitually bought items first within each.
pub fn group_pending<'a>(
  state: &'a AppState,
  pending: &[&'a Item],
) -> Vec<CategoryGroup<'a>> {
  let totals = category_totals(state);
  let mut groups: Vec<CategoryGroup<'a>> = group_by_category(
    state,
    pending.iter().map(|&item| (item.category_id.as_str(), item)),
  )
  .into_iter()
  .map(|(category, mut items)| {
    items.sort_by(|a, b| b.purchase_count.cmp(&a.purchase_count));
    CategoryGroup {
      rank: totals.get(category.id).copied().unwrap_or(0),
      category,
      items,
    }
  })
  .collect();

  groups.sort_by(|a, b| b.rank.cmp(&a.rank));
  groups
}

// ─── History ─────────────────────────────────────────────────────────────────

/// One entry per distinct name (first occurrence wins), most bought first.
pub fn history_picker(state: &AppState) -> Vec<&Item> {
  let mut seen = HashSet::new();
  let mut items: Vec<&Item> = state
    .items()
    .iter()
    .filter(|i| seen.insert(name_key(&i.name)))
    .collect();
  items.sort_by(|a, b| b.purchase_count.cmp(&a.purchase_count));
  items
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryGroup<'a> {
  pub category: CategoryLabel<'a>,
  pub total:    u64,
  pub items:    Vec<&'a Item>,
}

/// Every item grouped by category, biggest totals first.
pub fn history_by_category(state: &AppState) -> Vec<HistoryGroup<'_>> {
  let mut groups: Vec<HistoryGroup<'_>> = group_by_category(
    state,
    state.items().iter().map(|item| (item.category_id.as_str(), item)),
  )
  .into_iter()
  .map(|(category, mut items)| {
    items.sort_by(|a, b| b.purchase_count.cmp(&a.purchase_count));
    HistoryGroup {
      total: items.iter().map(|i| u64::from(i.purchase_count)).sum(),
      category,
      items,
    }
  })
  .collect();

  groups.sort_by(|a, b| b.total.cmp(&a.total));
  groups
}

// ─── Calendar ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoggedDay {
  pub date:    NaiveDate,
  pub entries: usize,
}

/// Days that have a purchase log, newest first.
pub fn logged_days(state: &AppState) -> Vec<LoggedDay> {
  let mut days: Vec<LoggedDay> = state
    .logs()
    .iter()
    .filter(|l| !l.entries.is_empty())
    .map(|l| LoggedDay { date: l.date, entries: l.entries.len() })
    .collect();
  days.sort_by(|a, b| b.date.cmp(&a.date));
  days
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NameCount<'a> {
  pub name:  &'a str,
  pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayGroup<'a> {
  pub category: CategoryLabel<'a>,
  pub entries:  Vec<NameCount<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayDetail<'a> {
  pub date:   NaiveDate,
  pub groups: Vec<DayGroup<'a>>,
}

/// What was bought on `day`, by category, each name once with its
/// multiplicity. `None` when nothing was logged that day.
pub fn day_detail(state: &AppState, day: NaiveDate) -> Option<DayDetail<'_>> {
  let log = state.log_for(day)?;
  let groups = group_by_category(
    state,
    log.entries.iter().map(|e| (e.category_id.as_str(), e.name.as_str())),
  )
  .into_iter()
  .map(|(category, names)| {
    let mut entries: Vec<NameCount<'_>> = Vec::new();
    for name in names {
      match entries.iter_mut().find(|nc| name_key(nc.name) == name_key(name)) {
        Some(nc) => nc.count += 1,
        None => entries.push(NameCount { name, count: 1 }),
      }
    }
    DayGroup { category, entries }
  })
  .collect();

  Some(DayDetail { date: day, groups })
}

// ─── Sets ────────────────────────────────────────────────────────────────────

/// Sets ordered by how often they have been applied.
pub fn ranked_sets(state: &AppState) -> Vec<&ItemSet> {
  let mut sets: Vec<&ItemSet> = state.sets().iter().collect();
  sets.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
  sets
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    model::{Category, ItemSet, LogEntry, PurchaseLog},
    state::tests::{category, item, noon, state_with},
    store::StoredDocuments,
  };

  fn on_list(mut i: Item) -> Item {
    i.on_list = true;
    i
  }

  fn grocery_state() -> AppState {
    state_with(
      vec![
        Category::uncategorized(),
        category("dairy", "Dairy"),
        category("bakery", "Bakery"),
      ],
      vec![
        on_list(item("milk", "Milk", "dairy", 1)),
        item("cheese", "Cheese", "dairy", 9),
        on_list(item("bread", "Bread", "bakery", 4)),
        on_list(item("rolls", "Rolls", "bakery", 6)),
        on_list(item("soap", "Soap", "gone", 2)),
      ],
    )
  }

  fn ids(items: &[&Item]) -> Vec<String> {
    items.iter().map(|i| i.id.clone()).collect()
  }

  #[test]
  fn active_list_partitions_by_completion_day() {
    let mut state = grocery_state();
    state.complete_item("bread", noon(0)).unwrap();
    state.complete_item("rolls", noon(1)).unwrap();
    state.complete_item("cheese", noon(0)).unwrap();
    let today = calendar_day(noon(0));

    let view = active_list(&state, None, today);
    assert_eq!(ids(&view.pending), ["milk", "soap"]);
    // Cheese is completed today but not on the list; rolls were bought
    // yesterday.
    assert_eq!(ids(&view.completed_today), ["bread"]);
  }

  #[test]
  fn active_list_category_filter() {
    let state = grocery_state();
    let today = calendar_day(noon(0));
    let view = active_list(&state, Some("bakery"), today);
    assert_eq!(ids(&view.pending), ["bread", "rolls"]);

    // Dangling ids count as the reserved category.
    let view = active_list(&state, Some(UNCATEGORIZED_ID), today);
    assert_eq!(ids(&view.pending), ["soap"]);
  }

  #[test]
  fn pending_groups_rank_by_all_time_category_purchases() {
    let state = grocery_state();
    let today = calendar_day(noon(0));
    let view = active_list(&state, None, today);
    let groups = group_pending(&state, &view.pending);

    let order: Vec<_> = groups.iter().map(|g| (g.category.id, g.rank)).collect();
    // Dairy counts cheese even though it is not on the list.
    assert_eq!(order, [("dairy", 10), ("bakery", 10), (UNCATEGORIZED_ID, 2)]);
    assert_eq!(ids(&groups[1].items), ["rolls", "bread"]);
    assert_eq!(groups[2].category, CategoryLabel::PLACEHOLDER);
  }

  #[test]
  fn picker_dedupes_by_lowercase_name() {
    let state = state_with(vec![Category::uncategorized()], vec![
      item("a", "Milk", UNCATEGORIZED_ID, 1),
      item("b", "Eggs", UNCATEGORIZED_ID, 5),
      item("c", "milk", UNCATEGORIZED_ID, 7),
    ]);
    assert_eq!(ids(&history_picker(&state)), ["b", "a"]);
  }

  #[test]
  fn history_groups_sum_and_sort() {
    let state = grocery_state();
    let groups = history_by_category(&state);
    let order: Vec<_> = groups.iter().map(|g| (g.category.id, g.total)).collect();
    assert_eq!(order, [("dairy", 10), ("bakery", 10), (UNCATEGORIZED_ID, 2)]);
    assert_eq!(ids(&groups[0].items), ["cheese", "milk"]);
  }

  #[test]
  fn day_detail_counts_repeats_per_category() {
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let entry = |name: &str, category_id: &str| LogEntry {
      name:        name.into(),
      category_id: category_id.into(),
    };
    let state = AppState::from_documents(StoredDocuments {
      categories: Some(vec![Category::uncategorized(), category("dairy", "Dairy")]),
      logs: Some(vec![PurchaseLog {
        id:      "log_2024-05-01".into(),
        date:    day,
        entries: vec![
          entry("Milk", "dairy"),
          entry("Tape", "missing"),
          entry("Milk", "dairy"),
          entry("Butter", "dairy"),
          entry("Milk", "dairy"),
        ],
      }]),
      ..StoredDocuments::default()
    });

    let detail = day_detail(&state, day).unwrap();
    assert_eq!(detail.groups.len(), 2);
    assert_eq!(detail.groups[0].category.id, "dairy");
    assert_eq!(detail.groups[0].entries, [
      NameCount { name: "Milk", count: 3 },
      NameCount { name: "Butter", count: 1 },
    ]);
    assert_eq!(detail.groups[1].category, CategoryLabel::PLACEHOLDER);

    assert!(day_detail(&state, day.succ_opt().unwrap()).is_none());
    assert_eq!(logged_days(&state), [LoggedDay { date: day, entries: 5 }]);
  }

  #[test]
  fn sets_rank_by_usage() {
    let set = |id: &str, usage_count| ItemSet {
      id: id.into(),
      name: id.into(),
      emoji: "🧺".into(),
      items: vec![],
      usage_count,
    };
    let state = AppState::from_documents(StoredDocuments {
      sets: Some(vec![set("a", 1), set("b", 3), set("c", 2)]),
      ..StoredDocuments::default()
    });
    let order: Vec<_> = ranked_sets(&state).iter().map(|s| s.id.as_str()).collect();
    assert_eq!(order, ["b", "c", "a"]);
  }

  #[test]
  fn empty_state_gives_empty_views() {
    let state = state_with(vec![], vec![]);
    let today = calendar_day(noon(0));
    let view = active_list(&state, None, today);
    assert!(view.pending.is_empty() && view.completed_today.is_empty());
    assert!(group_pending(&state, &view.pending).is_empty());
    assert!(history_picker(&state).is_empty());
    assert!(history_by_category(&state).is_empty());
    assert!(logged_days(&state).is_empty());
    assert!(ranked_sets(&state).is_empty());
  }
}
