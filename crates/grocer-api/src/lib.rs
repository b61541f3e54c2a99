//! JSON REST API for Grocer.
//!
//! Exposes an axum [`Router`] backed by an [`AppService`], which owns the
//! in-memory state, writes it through any [`grocer_core::store::StateStore`],
//! and reaches the AI service through a [`grocer_ai::Gateway`].
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", grocer_api::api_router(service.clone()))
//! ```

pub mod ai;
pub mod categories;
pub mod error;
pub mod items;
pub mod preferences;
pub mod service;
pub mod sets;
pub mod views;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use grocer_ai::Completion;
use grocer_core::store::StateStore;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use service::AppService;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(service: Arc<AppService<S, C>>) -> Router<()>
where
  S: StateStore + 'static,
  C: Completion + 'static,
{
  Router::new()
    // Buy list and items
    .route("/list", get(views::list::<S, C>))
    .route("/items", post(items::create::<S, C>))
    .route("/items/{id}", put(items::update::<S, C>).delete(items::delete::<S, C>))
    .route("/items/{id}/complete", post(items::complete::<S, C>))
    .route("/items/{id}/uncomplete", post(items::uncomplete::<S, C>))
    .route("/items/{id}/remove", post(items::remove::<S, C>))
    .route("/undo/complete", post(items::undo_complete::<S, C>))
    .route("/undo/delete", post(items::undo_delete::<S, C>))
    // History and calendar
    .route("/history", get(views::history::<S, C>))
    .route("/history/picker", get(views::picker::<S, C>))
    .route("/calendar", get(views::calendar::<S, C>))
    .route("/calendar/{date}", get(views::day::<S, C>))
    // Categories
    .route("/categories", get(categories::list::<S, C>).post(categories::create::<S, C>))
    .route(
      "/categories/{id}",
      put(categories::update::<S, C>).delete(categories::delete::<S, C>),
    )
    // Sets
    .route("/sets", get(sets::list::<S, C>).post(sets::create::<S, C>))
    .route("/sets/{id}", put(sets::update::<S, C>).delete(sets::delete::<S, C>))
    .route("/sets/{id}/apply", post(sets::apply::<S, C>))
    // AI
    .route("/ai/dictation", post(ai::dictation::<S, C>))
    .route("/ai/sets/generate", post(ai::generate_set::<S, C>))
    .route("/ai/sets/suggest", post(ai::suggest_sets::<S, C>))
    // Preferences
    .route("/preferences", get(preferences::get::<S, C>).put(preferences::put::<S, C>))
    .layer(TraceLayer::new_for_http())
    .with_state(service)
}
