//! [`AppService`]: the single owner of in-memory state.
//!
//! Every action locks the state, applies one mutation, writes the documents
//! it touched back to the store and releases the lock. AI calls run with the
//! lock released; their answers are folded in by a second, short action.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use grocer_ai::{Completion, Gateway};
use grocer_core::{
  model::{
    Category, Item, ItemSet, Preferences, SetItem, UNCATEGORIZED_NAME, calendar_day,
    display_name,
  },
  state::AppState,
  store::StateStore,
  suggest::{GeneratedSet, HistoryDay, SuggestedSet, history_digest},
  undo::{DeletedItem, UndoSlots},
};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::ApiError;

/// How long a completion or deletion can be undone.
pub const DEFAULT_UNDO_WINDOW_SECS: i64 = 5;

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AddOutcome {
  pub item:   Item,
  /// Set when AI categorisation failed and the item went to Uncategorized.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notice: Option<String>,
}

/// An item after an action that armed an undo slot.
#[derive(Debug, Clone, Serialize)]
pub struct Undoable {
  pub item:            Item,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub undo_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DictationOutcome {
  pub items:     Vec<Item>,
  pub dish_name: Option<String>,
}

// ─── Service ─────────────────────────────────────────────────────────────────

struct Inner {
  state: AppState,
  undo:  UndoSlots,
  /// Calendar day of the last rollover.
  today: NaiveDate,
}

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct AppService<S, C> {
  inner:       Mutex<Inner>,
  store:       S,
  gateway:     Gateway<C>,
  undo_window: Duration,
  clock:       Clock,
}

fn items_by_id(state: &AppState, ids: &[String]) -> Vec<Item> {
  ids.iter().filter_map(|id| state.item(id)).cloned().collect()
}

impl<S, C> AppService<S, C>
where
  S: StateStore,
  C: Completion,
{
  /// Read every document from `store` and roll over completions from
  /// earlier days.
  pub async fn load(store: S, gateway: Gateway<C>) -> Result<Self, ApiError> {
    let documents = store.load().await.map_err(ApiError::store)?;
    let mut state = AppState::from_documents(documents);
    let today = calendar_day(Utc::now());
    let reset = state.roll_over(today);
    tracing::info!(
      items = state.items().len(),
      categories = state.categories().len(),
      reset,
      "state loaded"
    );

    let service = Self {
      inner: Mutex::new(Inner { state, undo: UndoSlots::default(), today }),
      store,
      gateway,
      undo_window: Duration::seconds(DEFAULT_UNDO_WINDOW_SECS),
      clock: Arc::new(Utc::now),
    };
    {
      let mut inner = service.inner.lock().await;
      service.persist(&mut inner.state).await?;
    }
    Ok(service)
  }

  pub fn with_undo_window(mut self, window: Duration) -> Self {
    self.undo_window = window;
    self
  }

  /// Replace the wall clock. The next action rolls over if `clock` reports
  /// a later day than the one the state was loaded on.
  pub fn with_clock(
    mut self,
    clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
  ) -> Self {
    self.clock = Arc::new(clock);
    self
  }

  pub fn gateway(&self) -> &Gateway<C> { &self.gateway }

  fn now(&self) -> DateTime<Utc> { (self.clock)() }

  // ── Plumbing ────────────────────────────────────────────────────────────

  /// Lock the state, rolling it over first if the calendar day changed
  /// since the last action.
  async fn lock(&self) -> Result<MutexGuard<'_, Inner>, ApiError> {
    let mut inner = self.inner.lock().await;
    let today = calendar_day(self.now());
    if today != inner.today {
      let reset = inner.state.roll_over(today);
      inner.today = today;
      tracing::info!(%today, reset, "day rolled over");
      self.persist(&mut inner.state).await?;
    }
    Ok(inner)
  }

  /// Write every dirty document. A document that fails to save stays dirty,
  /// as do the ones after it, so the next action retries them.
  async fn persist(&self, state: &mut AppState) -> Result<(), ApiError> {
    for document in state.dirty() {
      let body = state.encode(document)?;
      if let Err(e) = self.store.save(document, body).await {
        tracing::warn!(document = document.key(), "document save failed");
        return Err(ApiError::store(e));
      }
      state.mark_saved(document);
      tracing::debug!(document = document.key(), "document saved");
    }
    Ok(())
  }

  /// Apply `f` under the lock and save what it touched, even when it fails
  /// part way through.
  async fn mutate<T, F>(&self, f: F) -> Result<T, ApiError>
  where
    F: FnOnce(&mut Inner, DateTime<Utc>) -> Result<T, ApiError> + Send,
    T: Send,
  {
    let mut inner = self.lock().await?;
    let now = self.now();
    let result = f(&mut inner, now);
    self.persist(&mut inner.state).await?;
    result
  }

  /// Render a derived view of the current state.
  pub async fn view<F>(&self, f: F) -> Result<serde_json::Value, ApiError>
  where
    F: FnOnce(&AppState, NaiveDate) -> serde_json::Result<serde_json::Value> + Send,
  {
    let inner = self.lock().await?;
    Ok(f(&inner.state, inner.today)?)
  }

  /// Inputs for an AI call, refused when AI features are turned off.
  async fn ai_context<T, F>(&self, f: F) -> Result<T, ApiError>
  where
    F: FnOnce(&AppState) -> T + Send,
  {
    let inner = self.lock().await?;
    if !inner.state.preferences().ai_enabled {
      return Err(ApiError::BadRequest("AI features are turned off".to_owned()));
    }
    Ok(f(&inner.state))
  }

  // ── Items ───────────────────────────────────────────────────────────────

  /// Put an item on the list.
  ///
  /// A name never seen before with no explicit category is sent for AI
  /// categorisation when AI is enabled. If that fails the item still goes
  /// on the list, under Uncategorized, and the failure comes back as a
  /// notice.
  pub async fn add_item(
    &self,
    name: &str,
    category_id: Option<&str>,
  ) -> Result<AddOutcome, ApiError> {
    let ask = {
      let inner = self.lock().await?;
      let state = &inner.state;
      let unknown = !name.trim().is_empty() && state.find_item_by_name(name).is_none();
      (category_id.is_none() && unknown && state.preferences().ai_enabled)
        .then(|| state.category_names())
    };

    let mut notice = None;
    if let Some(categories) = ask {
      match self.gateway.categorize(&display_name(name), &categories).await {
        Ok(suggestion) => {
          return self
            .mutate(|inner, _| {
              let item = inner.state.add_categorized_item(name, &suggestion)?.clone();
              Ok(AddOutcome { item, notice: None })
            })
            .await;
        }
        Err(e) => {
          tracing::warn!(item = name, "categorisation failed, using {UNCATEGORIZED_NAME}: {e}");
          notice = Some(e.user_message());
        }
      }
    }

    self
      .mutate(move |inner, _| {
        let item = inner.state.add_item(name, category_id)?.clone();
        Ok(AddOutcome { item, notice })
      })
      .await
  }

  pub async fn update_item(
    &self,
    id: &str,
    name: Option<&str>,
    category_id: Option<&str>,
  ) -> Result<Item, ApiError> {
    self
      .mutate(|inner, _| Ok(inner.state.update_item(id, name, category_id)?.clone()))
      .await
  }

  /// Check an item off. A fresh completion arms the completion undo,
  /// superseding any pending one.
  pub async fn complete_item(&self, id: &str) -> Result<Undoable, ApiError> {
    let window = self.undo_window;
    self
      .mutate(|inner, now| {
        let was_completed = inner.state.item(id).is_some_and(|i| i.completed);
        let item = inner.state.complete_item(id, now)?.clone();
        let undo_expires_at = (!was_completed).then(|| {
          let expires_at = now + window;
          inner.undo.complete.arm(item.id.clone(), expires_at);
          expires_at
        });
        Ok(Undoable { item, undo_expires_at })
      })
      .await
  }

  pub async fn uncomplete_item(&self, id: &str) -> Result<Item, ApiError> {
    self
      .mutate(|inner, _| Ok(inner.state.uncomplete_item(id)?.clone()))
      .await
  }

  pub async fn remove_from_list(&self, id: &str) -> Result<Item, ApiError> {
    self
      .mutate(|inner, _| Ok(inner.state.remove_from_list(id)?.clone()))
      .await
  }

  /// Delete an item from history and arm the delete undo.
  pub async fn delete_item(&self, id: &str) -> Result<Undoable, ApiError> {
    let window = self.undo_window;
    self
      .mutate(|inner, now| {
        let (index, item) = inner.state.delete_item(id)?;
        let expires_at = now + window;
        inner.undo.delete.arm(DeletedItem { index, item: item.clone() }, expires_at);
        Ok(Undoable { item, undo_expires_at: Some(expires_at) })
      })
      .await
  }

  // ── Undo ────────────────────────────────────────────────────────────────

  pub async fn undo_complete(&self) -> Result<Item, ApiError> {
    self
      .mutate(|inner, now| {
        let id = inner
          .undo
          .complete
          .take(now)
          .ok_or_else(|| ApiError::NotFound("no completion to undo".to_owned()))?;
        Ok(inner.state.uncomplete_item(&id)?.clone())
      })
      .await
  }

  pub async fn undo_delete(&self) -> Result<Item, ApiError> {
    self
      .mutate(|inner, now| {
        let DeletedItem { index, item } = inner
          .undo
          .delete
          .take(now)
          .ok_or_else(|| ApiError::NotFound("no deletion to undo".to_owned()))?;
        Ok(inner.state.restore_item(index, item)?.clone())
      })
      .await
  }

  // ── Categories ──────────────────────────────────────────────────────────

  pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
    let inner = self.lock().await?;
    Ok(inner.state.categories().to_vec())
  }

  pub async fn add_category(&self, name: &str, emoji: &str) -> Result<Category, ApiError> {
    self
      .mutate(|inner, _| Ok(inner.state.add_category(name, emoji)?.clone()))
      .await
  }

  pub async fn update_category(
    &self,
    id: &str,
    name: Option<&str>,
    emoji: Option<&str>,
  ) -> Result<Category, ApiError> {
    self
      .mutate(|inner, _| Ok(inner.state.update_category(id, name, emoji)?.clone()))
      .await
  }

  /// Delete a category. Returns how many items moved to Uncategorized.
  pub async fn delete_category(&self, id: &str) -> Result<usize, ApiError> {
    self
      .mutate(|inner, _| Ok(inner.state.delete_category(id)?))
      .await
  }

  // ── Sets ────────────────────────────────────────────────────────────────

  pub async fn add_set(
    &self,
    name: &str,
    emoji: &str,
    items: Vec<SetItem>,
  ) -> Result<ItemSet, ApiError> {
    self
      .mutate(|inner, _| Ok(inner.state.add_set(name, emoji, items)?.clone()))
      .await
  }

  pub async fn update_set(
    &self,
    id: &str,
    name: Option<&str>,
    emoji: Option<&str>,
    items: Option<Vec<SetItem>>,
  ) -> Result<ItemSet, ApiError> {
    self
      .mutate(|inner, _| Ok(inner.state.update_set(id, name, emoji, items)?.clone()))
      .await
  }

  pub async fn delete_set(&self, id: &str) -> Result<ItemSet, ApiError> {
    self.mutate(|inner, _| Ok(inner.state.delete_set(id)?)).await
  }

  /// Put a set's lines on the list; `selection` limits which ones.
  pub async fn apply_set(
    &self,
    id: &str,
    selection: Option<&[String]>,
  ) -> Result<Vec<Item>, ApiError> {
    self
      .mutate(|inner, _| {
        let ids = inner.state.apply_set(id, selection)?;
        Ok(items_by_id(&inner.state, &ids))
      })
      .await
  }

  // ── Preferences ─────────────────────────────────────────────────────────

  pub async fn preferences(&self) -> Result<Preferences, ApiError> {
    Ok(self.lock().await?.state.preferences())
  }

  pub async fn set_preferences(&self, preferences: Preferences) -> Result<Preferences, ApiError> {
    self
      .mutate(|inner, _| {
        inner.state.set_preferences(preferences);
        Ok(inner.state.preferences())
      })
      .await
  }

  // ── AI ──────────────────────────────────────────────────────────────────

  /// Parse a dictated utterance and put every item it names on the list.
  pub async fn dictate(&self, text: &str) -> Result<DictationOutcome, ApiError> {
    if text.trim().is_empty() {
      return Err(ApiError::BadRequest("dictation text must not be empty".to_owned()));
    }
    let categories = self.ai_context(AppState::category_names).await?;
    let dictation = self.gateway.parse_dictation(text, &categories).await?;
    tracing::debug!(items = dictation.items.len(), dish = ?dictation.dish_name, "dictation parsed");

    self
      .mutate(|inner, _| {
        let ids = inner.state.add_dictation(&dictation)?;
        Ok(DictationOutcome {
          items:     items_by_id(&inner.state, &ids),
          dish_name: dictation.dish_name.clone(),
        })
      })
      .await
  }

  /// Draft a set from a description. Nothing is saved; the caller posts the
  /// draft to `/sets` once the user accepts it.
  pub async fn generate_set(&self, description: &str) -> Result<GeneratedSet, ApiError> {
    if description.trim().is_empty() {
      return Err(ApiError::BadRequest("description must not be empty".to_owned()));
    }
    let categories = self.ai_context(AppState::category_names).await?;
    Ok(self.gateway.generate_set(description, &categories).await?)
  }

  /// Propose sets from purchase history. An empty history needs no call.
  pub async fn suggest_sets(&self) -> Result<Vec<SuggestedSet>, ApiError> {
    let (history, categories): (Vec<HistoryDay>, Vec<String>) = self
      .ai_context(|state| (history_digest(state), state.category_names()))
      .await?;
    if history.is_empty() {
      return Ok(Vec::new());
    }
    Ok(self.gateway.suggest_sets(&history, &categories).await?)
  }
}
