//! [`AppState`]: the single aggregate every action mutates.
//!
//! The four collections plus preferences are owned here and nowhere else.
//! Every mutation records which persisted [`Document`]s it touched so the
//! owner can save exactly those afterwards.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
  Error, Result, defaults,
  model::{
    Category, Item, ItemSet, LogEntry, Preferences, PurchaseLog, SetItem,
    UNCATEGORIZED_ID, calendar_day, display_name, name_key, new_id,
  },
  store::{Document, StoredDocuments},
};

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AppState {
  categories:  Vec<Category>,
  items:       Vec<Item>,
  sets:        Vec<ItemSet>,
  logs:        Vec<PurchaseLog>,
  preferences: Preferences,
  /// `name_key(item.name)` → item id.
  name_index:  HashMap<String, String>,
  dirty:       BTreeSet<Document>,
}

impl Default for AppState {
  fn default() -> Self { Self::from_documents(StoredDocuments::default()) }
}

impl AppState {
  /// Build state from whatever the store returned, substituting the built-in
  /// dataset for documents that were never saved.
  pub fn from_documents(docs: StoredDocuments) -> Self {
    let mut categories = docs.categories.unwrap_or_else(defaults::categories);
    if !categories.iter().any(Category::is_reserved) {
      categories.insert(0, Category::uncategorized());
    }

    let mut state = Self {
      categories,
      items: docs.items.unwrap_or_default(),
      sets: docs.sets.unwrap_or_else(defaults::sets),
      logs: docs.logs.unwrap_or_default(),
      preferences: docs.preferences.unwrap_or_else(defaults::preferences),
      name_index: HashMap::new(),
      dirty: BTreeSet::new(),
    };
    state.rebuild_index();
    state
  }

  fn rebuild_index(&mut self) {
    self.name_index.clear();
    for item in &self.items {
      self
        .name_index
        .entry(name_key(&item.name))
        .or_insert_with(|| item.id.clone());
    }
  }

  // ── Read access ─────────────────────────────────────────────────────────

  pub fn categories(&self) -> &[Category] { &self.categories }

  pub fn items(&self) -> &[Item] { &self.items }

  pub fn sets(&self) -> &[ItemSet] { &self.sets }

  pub fn logs(&self) -> &[PurchaseLog] { &self.logs }

  pub fn preferences(&self) -> Preferences { self.preferences }

  pub fn item(&self, id: &str) -> Option<&Item> {
    self.items.iter().find(|i| i.id == id)
  }

  /// Case-insensitive lookup through the name index.
  pub fn find_item_by_name(&self, name: &str) -> Option<&Item> {
    let id = self.name_index.get(&name_key(name))?;
    self.item(id)
  }

  pub fn category(&self, id: &str) -> Option<&Category> {
    self.categories.iter().find(|c| c.id == id)
  }

  pub fn find_category_by_name(&self, name: &str) -> Option<&Category> {
    let key = name_key(name);
    self.categories.iter().find(|c| name_key(&c.name) == key)
  }

  pub fn set(&self, id: &str) -> Option<&ItemSet> {
    self.sets.iter().find(|s| s.id == id)
  }

  pub fn log_for(&self, day: NaiveDate) -> Option<&PurchaseLog> {
    self.logs.iter().find(|l| l.date == day)
  }

  pub fn category_names(&self) -> Vec<String> {
    self.categories.iter().map(|c| c.name.clone()).collect()
  }

  // ── Persistence bookkeeping ─────────────────────────────────────────────

  fn touch(&mut self, documents: &[Document]) {
    self.dirty.extend(documents.iter().copied());
  }

  /// Documents changed since they were last saved.
  pub fn dirty(&self) -> Vec<Document> { self.dirty.iter().copied().collect() }

  /// Clear `document` from the dirty set once the store has accepted it.
  /// Anything not marked stays dirty and is written by the next save.
  pub fn mark_saved(&mut self, document: Document) {
    self.dirty.remove(&document);
  }

  /// JSON body for one document, as handed to
  /// [`StateStore::save`](crate::store::StateStore::save).
  pub fn encode(&self, document: Document) -> Result<serde_json::Value> {
    Ok(match document {
      Document::Categories => serde_json::to_value(&self.categories)?,
      Document::Items => serde_json::to_value(&self.items)?,
      Document::Sets => serde_json::to_value(&self.sets)?,
      Document::Logs => serde_json::to_value(&self.logs)?,
      Document::Preferences => serde_json::to_value(self.preferences)?,
    })
  }

  // ── Items ───────────────────────────────────────────────────────────────

  fn item_index(&self, id: &str) -> Result<usize> {
    self
      .items
      .iter()
      .position(|i| i.id == id)
      .ok_or_else(|| Error::ItemNotFound(id.to_owned()))
  }

  fn check_category(&self, id: &str) -> Result<()> {
    match self.category(id) {
      Some(_) => Ok(()),
      None => Err(Error::CategoryNotFound(id.to_owned())),
    }
  }

  /// Put `name` on the list.
  ///
  /// A case-insensitive match is updated in place: it goes back on the list
  /// with its completion cleared, and is moved to `category_id` only when
  /// one is given. Otherwise a new item is created in `category_id` or the
  /// reserved category.
  pub fn add_item(
    &mut self,
    name: &str,
    category_id: Option<&str>,
  ) -> Result<&Item> {
    let name = display_name(name);
    if name.is_empty() {
      return Err(Error::EmptyName);
    }
    if let Some(id) = category_id {
      self.check_category(id)?;
    }

    let idx = match self.name_index.get(&name_key(&name)).cloned() {
      Some(existing) => {
        let idx = self.item_index(&existing)?;
        let item = &mut self.items[idx];
        item.on_list = true;
        item.completed = false;
        item.completed_at = None;
        if let Some(id) = category_id {
          item.category_id = id.to_owned();
        }
        idx
      }
      None => {
        let item = Item {
          id: new_id("item"),
          name,
          category_id: category_id.unwrap_or(UNCATEGORIZED_ID).to_owned(),
          on_list: true,
          completed: false,
          completed_at: None,
          purchase_count: 0,
        };
        self.name_index.insert(name_key(&item.name), item.id.clone());
        self.items.push(item);
        self.items.len() - 1
      }
    };

    self.touch(&[Document::Items]);
    Ok(&self.items[idx])
  }

  /// Rename and/or recategorise an item. Names stay unique.
  pub fn update_item(
    &mut self,
    id: &str,
    name: Option<&str>,
    category_id: Option<&str>,
  ) -> Result<&Item> {
    let idx = self.item_index(id)?;
    if let Some(cid) = category_id {
      self.check_category(cid)?;
    }

    if let Some(raw) = name {
      let name = display_name(raw);
      if name.is_empty() {
        return Err(Error::EmptyName);
      }
      let key = name_key(&name);
      if self.name_index.get(&key).is_some_and(|other| other != id) {
        return Err(Error::DuplicateName(name));
      }
      self.name_index.remove(&name_key(&self.items[idx].name));
      self.name_index.insert(key, id.to_owned());
      self.items[idx].name = name;
    }
    if let Some(cid) = category_id {
      self.items[idx].category_id = cid.to_owned();
    }

    self.touch(&[Document::Items]);
    Ok(&self.items[idx])
  }

  /// Mark an item purchased and append it to the day's log.
  /// Completing an already completed item changes nothing.
  pub fn complete_item(&mut self, id: &str, now: DateTime<Utc>) -> Result<&Item> {
    let idx = self.item_index(id)?;
    if self.items[idx].completed {
      return Ok(&self.items[idx]);
    }

    let item = &mut self.items[idx];
    item.completed = true;
    item.completed_at = Some(now);
    item.purchase_count += 1;
    let entry = LogEntry {
      name:        item.name.clone(),
      category_id: item.category_id.clone(),
    };

    let day = calendar_day(now);
    let log_idx = match self.logs.iter().position(|l| l.date == day) {
      Some(i) => i,
      None => {
        self.logs.push(PurchaseLog::for_day(day));
        self.logs.len() - 1
      }
    };
    self.logs[log_idx].entries.push(entry);

    self.touch(&[Document::Items, Document::Logs]);
    Ok(&self.items[idx])
  }

  /// Undo a completion: decrement the counter and drop the most recently
  /// appended log entry with the same name from the day it was completed.
  ///
  /// The entry is matched by name, not by item id, so two items that share a
  /// name across categories can remove each other's entry.
  pub fn uncomplete_item(&mut self, id: &str) -> Result<&Item> {
    let idx = self.item_index(id)?;
    if !self.items[idx].completed {
      return Ok(&self.items[idx]);
    }

    let item = &mut self.items[idx];
    let completed_at = item.completed_at.take();
    item.completed = false;
    item.purchase_count = item.purchase_count.saturating_sub(1);
    let key = name_key(&item.name);

    if let Some(day) = completed_at.map(calendar_day)
      && let Some(log_idx) = self.logs.iter().position(|l| l.date == day)
    {
      let log = &mut self.logs[log_idx];
      if let Some(pos) = log.entries.iter().rposition(|e| name_key(&e.name) == key) {
        log.entries.remove(pos);
      }
      if log.entries.is_empty() {
        self.logs.remove(log_idx);
      }
    }

    self.touch(&[Document::Items, Document::Logs]);
    Ok(&self.items[idx])
  }

  /// Take an item off the list without touching its history.
  pub fn remove_from_list(&mut self, id: &str) -> Result<&Item> {
    let idx = self.item_index(id)?;
    let item = &mut self.items[idx];
    item.on_list = false;
    item.completed = false;
    item.completed_at = None;
    self.touch(&[Document::Items]);
    Ok(&self.items[idx])
  }

  /// Remove an item from history. Returns its former position so the
  /// deletion can be undone with [`AppState::restore_item`].
  pub fn delete_item(&mut self, id: &str) -> Result<(usize, Item)> {
    let idx = self.item_index(id)?;
    let item = self.items.remove(idx);
    self.name_index.remove(&name_key(&item.name));
    self.touch(&[Document::Items]);
    Ok((idx, item))
  }

  /// Put a deleted item back at (or near) its former position. Fails if the
  /// name has been taken again in the meantime.
  pub fn restore_item(&mut self, index: usize, item: Item) -> Result<&Item> {
    let key = name_key(&item.name);
    if self.name_index.contains_key(&key) {
      return Err(Error::DuplicateName(item.name));
    }
    let idx = index.min(self.items.len());
    self.name_index.insert(key, item.id.clone());
    self.items.insert(idx, item);
    self.touch(&[Document::Items]);
    Ok(&self.items[idx])
  }

  // ── Day rollover ────────────────────────────────────────────────────────

  /// Clear completions from before `today`: those items leave the list.
  /// Returns how many items were reset; running it again returns 0.
  pub fn roll_over(&mut self, today: NaiveDate) -> usize {
    let mut reset = 0;
    for item in &mut self.items {
      let stale = item.completed
        && item.completed_at.is_some_and(|at| calendar_day(at) < today);
      if stale {
        item.completed = false;
        item.on_list = false;
        item.completed_at = None;
        reset += 1;
      }
    }
    if reset > 0 {
      self.touch(&[Document::Items]);
    }
    reset
  }

  // ── Categories ──────────────────────────────────────────────────────────

  fn category_index(&self, id: &str) -> Result<usize> {
    self
      .categories
      .iter()
      .position(|c| c.id == id)
      .ok_or_else(|| Error::CategoryNotFound(id.to_owned()))
  }

  /// Create a category, or return the existing one with the same
  /// case-insensitive name.
  pub fn add_category(&mut self, name: &str, emoji: &str) -> Result<&Category> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::EmptyName);
    }
    if let Some(idx) = self
      .categories
      .iter()
      .position(|c| name_key(&c.name) == name_key(name))
    {
      return Ok(&self.categories[idx]);
    }

    self.categories.push(Category {
      id:    new_id("dept"),
      name:  name.to_owned(),
      emoji: emoji.trim().to_owned(),
    });
    self.touch(&[Document::Categories]);
    Ok(&self.categories[self.categories.len() - 1])
  }

  pub fn update_category(
    &mut self,
    id: &str,
    name: Option<&str>,
    emoji: Option<&str>,
  ) -> Result<&Category> {
    let idx = self.category_index(id)?;
    if self.categories[idx].is_reserved() {
      return Err(Error::ReservedCategory);
    }

    if let Some(raw) = name {
      let name = raw.trim();
      if name.is_empty() {
        return Err(Error::EmptyName);
      }
      if self
        .categories
        .iter()
        .any(|c| c.id != id && name_key(&c.name) == name_key(name))
      {
        return Err(Error::DuplicateName(name.to_owned()));
      }
      self.categories[idx].name = name.to_owned();
    }
    if let Some(emoji) = emoji {
      self.categories[idx].emoji = emoji.trim().to_owned();
    }

    self.touch(&[Document::Categories]);
    Ok(&self.categories[idx])
  }

  /// Delete a category; its items move to the reserved category. Returns the
  /// number of items reassigned.
  pub fn delete_category(&mut self, id: &str) -> Result<usize> {
    let idx = self.category_index(id)?;
    if self.categories[idx].is_reserved() {
      return Err(Error::ReservedCategory);
    }
    self.categories.remove(idx);

    let mut moved = 0;
    for item in self.items.iter_mut().filter(|i| i.category_id == id) {
      item.category_id = UNCATEGORIZED_ID.to_owned();
      moved += 1;
    }

    self.touch(&[Document::Categories, Document::Items]);
    Ok(moved)
  }

  // ── Sets ────────────────────────────────────────────────────────────────

  fn set_index(&self, id: &str) -> Result<usize> {
    self
      .sets
      .iter()
      .position(|s| s.id == id)
      .ok_or_else(|| Error::SetNotFound(id.to_owned()))
  }

  /// Every line of a set needs a name.
  fn check_set_lines(items: &[SetItem]) -> Result<()> {
    if items.iter().any(|line| display_name(&line.name).is_empty()) {
      return Err(Error::EmptyName);
    }
    Ok(())
  }

  pub fn add_set(
    &mut self,
    name: &str,
    emoji: &str,
    items: Vec<SetItem>,
  ) -> Result<&ItemSet> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::EmptyName);
    }
    Self::check_set_lines(&items)?;
    self.sets.push(ItemSet {
      id: new_id("set"),
      name: name.to_owned(),
      emoji: emoji.trim().to_owned(),
      items,
      usage_count: 0,
    });
    self.touch(&[Document::Sets]);
    Ok(&self.sets[self.sets.len() - 1])
  }

  pub fn update_set(
    &mut self,
    id: &str,
    name: Option<&str>,
    emoji: Option<&str>,
    items: Option<Vec<SetItem>>,
  ) -> Result<&ItemSet> {
    let idx = self.set_index(id)?;
    let name = name.map(str::trim);
    if name.is_some_and(str::is_empty) {
      return Err(Error::EmptyName);
    }
    if let Some(items) = &items {
      Self::check_set_lines(items)?;
    }
    if let Some(name) = name {
      self.sets[idx].name = name.to_owned();
    }
    if let Some(emoji) = emoji {
      self.sets[idx].emoji = emoji.trim().to_owned();
    }
    if let Some(items) = items {
      self.sets[idx].items = items;
    }
    self.touch(&[Document::Sets]);
    Ok(&self.sets[idx])
  }

  pub fn delete_set(&mut self, id: &str) -> Result<ItemSet> {
    let idx = self.set_index(id)?;
    self.touch(&[Document::Sets]);
    Ok(self.sets.remove(idx))
  }

  /// Put the lines of a set on the list and count one use of the set.
  ///
  /// `selection` restricts which lines are added (matched by name,
  /// case-insensitively); `None` adds all of them. Lines without a name are
  /// skipped. Returns the ids of the items now on the list.
  pub fn apply_set(
    &mut self,
    id: &str,
    selection: Option<&[String]>,
  ) -> Result<Vec<String>> {
    let idx = self.set_index(id)?;
    let wanted: Option<Vec<String>> =
      selection.map(|names| names.iter().map(|n| name_key(n)).collect());

    let lines: Vec<SetItem> = self.sets[idx]
      .items
      .iter()
      .filter(|line| !display_name(&line.name).is_empty())
      .filter(|line| {
        wanted.as_ref().is_none_or(|w| w.contains(&name_key(&line.name)))
      })
      .cloned()
      .collect();

    let mut added = Vec::with_capacity(lines.len());
    for line in &lines {
      let item =
        self.add_suggested_item(&line.name, &line.category_name, &line.emoji)?;
      added.push(item.id.clone());
    }

    self.sets[idx].usage_count += 1;
    self.touch(&[Document::Sets]);
    Ok(added)
  }

  // ── Preferences ─────────────────────────────────────────────────────────

  pub fn set_preferences(&mut self, preferences: Preferences) {
    self.preferences = preferences;
    self.touch(&[Document::Preferences]);
  }

  // ── Crate-internal helpers ──────────────────────────────────────────────

  /// Insert a category without the empty-name check; used by the merge rule
  /// after it has already looked for a match.
  pub(crate) fn insert_category(&mut self, name: &str, emoji: &str) -> &Category {
    self.categories.push(Category {
      id:    new_id("dept"),
      name:  name.to_owned(),
      emoji: emoji.to_owned(),
    });
    self.touch(&[Document::Categories]);
    &self.categories[self.categories.len() - 1]
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
