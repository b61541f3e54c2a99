//! The seam between the gateway and whatever actually answers prompts.

use std::future::Future;

use crate::Result;

/// One prompt plus the JSON schema the answer must follow.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
  pub prompt: String,
  pub schema: serde_json::Value,
}

/// A single structured completion call. Implementations make exactly one
/// attempt; retrying is the gateway's job.
pub trait Completion: Send + Sync {
  /// Returns the raw response text, which may be empty.
  fn complete<'a>(
    &'a self,
    request: &'a CompletionRequest,
  ) -> impl Future<Output = Result<String>> + Send + 'a;
}
