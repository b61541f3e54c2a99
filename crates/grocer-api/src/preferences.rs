//! `GET /preferences` and `PUT /preferences`. The PUT body replaces every
//! flag; missing fields take their defaults.

use std::sync::Arc;

use axum::{Json, extract::State};
use grocer_ai::Completion;
use grocer_core::{model::Preferences, store::StateStore};

use crate::{error::ApiError, service::AppService};

/// `GET /preferences`
pub async fn get<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
) -> Result<Json<Preferences>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.preferences().await?))
}

/// `PUT /preferences`
pub async fn put<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Json(body): Json<Preferences>,
) -> Result<Json<Preferences>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.set_preferences(body).await?))
}
