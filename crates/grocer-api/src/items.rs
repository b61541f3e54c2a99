//! Handlers for `/items` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/items` | Body: [`NewItemBody`]; merges with an existing name |
//! | `PUT`    | `/items/{id}` | Body: [`UpdateItemBody`] |
//! | `DELETE` | `/items/{id}` | Removes from history; arms the delete undo |
//! | `POST`   | `/items/{id}/complete` | Arms the completion undo |
//! | `POST`   | `/items/{id}/uncomplete` | |
//! | `POST`   | `/items/{id}/remove` | Off the list, history kept |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use grocer_ai::Completion;
use grocer_core::{model::Item, store::StateStore};
use serde::Deserialize;

use crate::{
  error::ApiError,
  service::{AddOutcome, AppService, Undoable},
};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewItemBody {
  pub name:        String,
  /// Skips AI categorisation when given.
  pub category_id: Option<String>,
}

/// `POST /items`
pub async fn create<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Json(body): Json<NewItemBody>,
) -> Result<Json<AddOutcome>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let outcome = service
    .add_item(&body.name, body.category_id.as_deref())
    .await?;
  Ok(Json(outcome))
}

// ─── Update / delete ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateItemBody {
  pub name:        Option<String>,
  pub category_id: Option<String>,
}

/// `PUT /items/{id}`
pub async fn update<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Path(id): Path<String>,
  Json(body): Json<UpdateItemBody>,
) -> Result<Json<Item>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let item = service
    .update_item(&id, body.name.as_deref(), body.category_id.as_deref())
    .await?;
  Ok(Json(item))
}

/// `DELETE /items/{id}`
pub async fn delete<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Path(id): Path<String>,
) -> Result<Json<Undoable>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.delete_item(&id).await?))
}

// ─── List actions ─────────────────────────────────────────────────────────────

/// `POST /items/{id}/complete`
pub async fn complete<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Path(id): Path<String>,
) -> Result<Json<Undoable>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.complete_item(&id).await?))
}

/// `POST /items/{id}/uncomplete`
pub async fn uncomplete<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Path(id): Path<String>,
) -> Result<Json<Item>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.uncomplete_item(&id).await?))
}

/// `POST /items/{id}/remove`
pub async fn remove<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Path(id): Path<String>,
) -> Result<Json<Item>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.remove_from_list(&id).await?))
}

// ─── Undo ─────────────────────────────────────────────────────────────────────

/// `POST /undo/complete`: 404 when nothing is pending or the window passed.
pub async fn undo_complete<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
) -> Result<Json<Item>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.undo_complete().await?))
}

/// `POST /undo/delete`
pub async fn undo_delete<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
) -> Result<Json<Item>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.undo_delete().await?))
}
