//! [`Gateway`]: the four structured AI calls, each wrapped in the retry
//! policy.
//!
//! A successful call with an empty body is not an error: it yields the
//! response type's default.

use grocer_core::suggest::{
  CategorySuggestion, Dictation, GeneratedSet, HistoryDay, SuggestedSet,
};
use serde::de::DeserializeOwned;

use crate::{Completion, CompletionRequest, Result, RetryPolicy, prompts};

/// Upper bound on sets returned by [`Gateway::suggest_sets`].
pub const MAX_SUGGESTED_SETS: usize = 3;

pub struct Gateway<C> {
  completion: C,
  policy:     RetryPolicy,
}

impl<C: Completion> Gateway<C> {
  pub fn new(completion: C) -> Self {
    Self { completion, policy: RetryPolicy::default() }
  }

  pub fn with_policy(completion: C, policy: RetryPolicy) -> Self {
    Self { completion, policy }
  }

  pub fn completion(&self) -> &C { &self.completion }

  async fn structured<T>(&self, call: &'static str, request: CompletionRequest) -> Result<T>
  where
    T: DeserializeOwned + Default,
  {
    let text = self
      .policy
      .run(|| self.completion.complete(&request))
      .await
      .inspect_err(|e| tracing::debug!(call, "AI call failed: {e}"))?;

    if text.trim().is_empty() {
      tracing::debug!(call, "AI call returned an empty body");
      return Ok(T::default());
    }
    Ok(serde_json::from_str(&text)?)
  }

  /// Pick a department for one product.
  pub async fn categorize(
    &self,
    product: &str,
    categories: &[String],
  ) -> Result<CategorySuggestion> {
    self
      .structured("categorize", prompts::categorize(product, categories))
      .await
  }

  /// Split a dictated utterance into items.
  pub async fn parse_dictation(
    &self,
    text: &str,
    categories: &[String],
  ) -> Result<Dictation> {
    self
      .structured("parse_dictation", prompts::parse_dictation(text, categories))
      .await
  }

  /// Draft the lines of a set from a free-text description.
  pub async fn generate_set(
    &self,
    description: &str,
    categories: &[String],
  ) -> Result<GeneratedSet> {
    self
      .structured("generate_set", prompts::generate_set(description, categories))
      .await
  }

  /// Propose up to [`MAX_SUGGESTED_SETS`] sets from purchase history.
  pub async fn suggest_sets(
    &self,
    history: &[HistoryDay],
    categories: &[String],
  ) -> Result<Vec<SuggestedSet>> {
    let mut sets: Vec<SuggestedSet> = self
      .structured("suggest_sets", prompts::suggest_sets(history, categories))
      .await?;
    sets.truncate(MAX_SUGGESTED_SETS);
    Ok(sets)
  }
}
