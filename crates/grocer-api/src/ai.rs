//! Handlers for `/ai` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/ai/dictation` | Body: `{"text":".."}`; adds the parsed items to the list |
//! | `POST` | `/ai/sets/generate` | Body: `{"description":".."}`; returns an unsaved draft |
//! | `POST` | `/ai/sets/suggest` | Proposals from purchase history |
//!
//! All three answer 400 while AI is turned off in the preferences.

use std::sync::Arc;

use axum::{Json, extract::State};
use grocer_ai::Completion;
use grocer_core::{
  store::StateStore,
  suggest::{GeneratedSet, SuggestedSet},
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  service::{AppService, DictationOutcome},
};

#[derive(Debug, Deserialize)]
pub struct DictationBody {
  pub text: String,
}

/// `POST /ai/dictation`
pub async fn dictation<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Json(body): Json<DictationBody>,
) -> Result<Json<DictationOutcome>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.dictate(&body.text).await?))
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
  pub description: String,
}

/// `POST /ai/sets/generate`
pub async fn generate_set<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
  Json(body): Json<GenerateBody>,
) -> Result<Json<GeneratedSet>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.generate_set(&body.description).await?))
}

/// `POST /ai/sets/suggest`
pub async fn suggest_sets<S, C>(
  State(service): State<Arc<AppService<S, C>>>,
) -> Result<Json<Vec<SuggestedSet>>, ApiError>
where
  S: StateStore,
  C: Completion,
{
  Ok(Json(service.suggest_sets().await?))
}
