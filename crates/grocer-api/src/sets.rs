//! Handlers for `/sets` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/sets` | Most used first |
//! | `POST`   | `/sets` | Body: [`NewSetBody`]; returns 201 |
//! | `PUT`    | `/sets/{id}` | Body: [`UpdateSetBody`] |
//! | `DELETE` | `/sets/{id}` | Returns the deleted set |
//! | `POST`   | `/sets/{id}/apply` | Body: `{"items":[..]}` (optional); returns the added items |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use grocer_ai::Completion;
use grocer_core::{
  model::{Item, ItemSet, SetItem},
  store::StateStore,
  views::ranked_sets,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ApiError, service::AppService};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /sets`
pub async fn list<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
) -> Result<Json<Value>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let body = service
    .view(|state, _| serde_json::to_value(ranked_sets(state)))
    .await?;
  Ok(Json(body))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewSetBody {
  pub name:  String,
  #[serde(default)]
  pub emoji: String,
  #[serde(default)]
  pub items: Vec<SetItem>,
}

/// `POST /sets`: returns 201 + the stored [`ItemSet`].
pub async fn create<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Json(body): Json<NewSetBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let set = service.add_set(&body.name, &body.emoji, body.items).await?;
  Ok((StatusCode::CREATED, Json(set)))
}

// ─── Update / delete ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateSetBody {
  pub name:  Option<String>,
  pub emoji: Option<String>,
  /// Replaces every line when present.
  pub items: Option<Vec<SetItem>>,
}

/// `PUT /sets/{id}`
pub async fn update<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Path(id): Path<String>,
  Json(body): Json<UpdateSetBody>,
) -> Result<Json<ItemSet>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let set = service
    .update_set(&id, body.name.as_deref(), body.emoji.as_deref(), body.items)
    .await?;
  Ok(Json(set))
}

/// `DELETE /sets/{id}`
pub async fn delete<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Path(id): Path<String>,
) -> Result<Json<ItemSet>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.delete_set(&id).await?))
}

// ─── Apply ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ApplyBody {
  /// Names of the lines to add; all of them when absent.
  pub items: Option<Vec<String>>,
}

/// `POST /sets/{id}/apply`
pub async fn apply<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Path(id): Path<String>,
  body: Option<Json<ApplyBody>>,
) -> Result<Json<Vec<Item>>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let items = service.apply_set(&id, body.items.as_deref()).await?;
  Ok(Json(items))
}
