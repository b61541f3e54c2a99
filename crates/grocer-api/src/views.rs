//! Read-only endpoints over the derived views.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/list` | Optional `?category=<id>`; pending groups + bought today |
//! | `GET`  | `/history` | Every item by category |
//! | `GET`  | `/history/picker` | Distinct names, most bought first |
//! | `GET`  | `/calendar` | Days with a purchase log, newest first |
//! | `GET`  | `/calendar/{date}` | `YYYY-MM-DD`; 404 when nothing was logged |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use grocer_ai::Completion;
use grocer_core::{
  model::Item,
  store::StateStore,
  views::{
    CategoryGroup, active_list, day_detail, group_pending, history_by_category,
    history_picker, logged_days,
  },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::ApiError, service::AppService};

// ─── Buy list ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Only show items resolving to this category id.
  pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BuyList<'a> {
  pub groups:          Vec<CategoryGroup<'a>>,
  pub completed_today: Vec<&'a Item>,
}

/// `GET /list[?category=<id>]`
pub async fn list<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let body = service
    .view(|state, today| {
      let list = active_list(state, params.category.as_deref(), today);
      serde_json::to_value(BuyList {
        groups:          group_pending(state, &list.pending),
        completed_today: list.completed_today,
      })
    })
    .await?;
  Ok(Json(body))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /history`
pub async fn history<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
) -> Result<Json<Value>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let body = service
    .view(|state, _| serde_json::to_value(history_by_category(state)))
    .await?;
  Ok(Json(body))
}

/// `GET /history/picker`
pub async fn picker<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
) -> Result<Json<Value>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let body = service
    .view(|state, _| serde_json::to_value(history_picker(state)))
    .await?;
  Ok(Json(body))
}

// ─── Calendar ─────────────────────────────────────────────────────────────────

/// `GET /calendar`
pub async fn calendar<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
) -> Result<Json<Value>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let body = service
    .view(|state, _| serde_json::to_value(logged_days(state)))
    .await?;
  Ok(Json(body))
}

/// `GET /calendar/{date}`
pub async fn day<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Path(date): Path<NaiveDate>,
) -> Result<Json<Value>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  let body = service
    .view(|state, _| serde_json::to_value(day_detail(state, date)))
    .await?;
  if body.is_null() {
    return Err(ApiError::NotFound(format!("nothing logged on {date}")));
  }
  Ok(Json(body))
}
