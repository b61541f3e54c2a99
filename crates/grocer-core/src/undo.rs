//! Short-lived undo slots behind the "Undo" toasts.
//!
//! Each slot holds at most one pending action; arming it again supersedes
//! whatever was pending. Completion-undo and delete-undo are independent
//! slots. Expiry is checked when the undo is taken, so no timer task is
//! needed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::Item;

#[derive(Debug, Clone)]
struct Pending<T> {
  payload:    T,
  expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UndoSlot<T> {
  pending: Option<Pending<T>>,
}

impl<T> Default for UndoSlot<T> {
  fn default() -> Self { Self { pending: None } }
}

impl<T> UndoSlot<T> {
  /// Arm the slot, returning the payload it replaced, expired or not.
  pub fn arm(&mut self, payload: T, expires_at: DateTime<Utc>) -> Option<T> {
    self
      .pending
      .replace(Pending { payload, expires_at })
      .map(|p| p.payload)
  }

  /// Take the pending payload if it has not expired at `now`. The slot is
  /// empty afterwards either way.
  pub fn take(&mut self, now: DateTime<Utc>) -> Option<T> {
    self
      .pending
      .take()
      .filter(|p| now < p.expires_at)
      .map(|p| p.payload)
  }
}

/// A history deletion that can still be reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedItem {
  pub index: usize,
  pub item:  Item,
}

#[derive(Debug, Clone, Default)]
pub struct UndoSlots {
  /// Id of the item whose completion can be undone.
  pub complete: UndoSlot<String>,
  pub delete:   UndoSlot<DeletedItem>,
}
