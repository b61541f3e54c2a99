//! Handlers for `/categories` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/categories` | |
//! | `POST`   | `/categories` | Body: `{"name":"..","emoji":".."}`; reuses a same-named category |
//! | `PUT`    | `/categories/{id}` | 400 for the reserved category |
//! | `DELETE` | `/categories/{id}` | Items move to Uncategorized; returns `{"moved":n}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use grocer_ai::Completion;
use grocer_core::{model::Category, store::StateStore};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, service::AppService};

/// `GET /categories`
pub async fn list<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
) -> Result<Json<Vec<Category>>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.categories().await?))
}

#[derive(Debug, Deserialize)]
pub struct NewCategoryBody {
  pub name:  String,
  #[serde(default)]
  pub emoji: String,
}

/// `POST /categories`
pub async fn create<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Json(body): Json<NewCategoryBody>,
) -> Result<Json<Category>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.add_category(&body.name, &body.emoji).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryBody {
  pub name:  Option<String>,
  pub emoji: Option<String>,
}

/// `PUT /categories/{id}`
pub async fn update<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Path(id): Path<String>,
  Json(body): Json<UpdateCategoryBody>,
) -> Result<Json<Category>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let category = service
    .update_category(&id, body.name.as_deref(), body.emoji.as_deref())
    .await?;
  Ok(Json(category))
}

#[derive(Debug, Serialize)]
pub struct Deleted {
  pub moved: usize,
}

/// `DELETE /categories/{id}`
pub async fn delete<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Path(id): Path<String>,
) -> Result<Json<Deleted>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let moved = service.delete_category(&id).await?;
  Ok(Json(Deleted { moved }))
}
