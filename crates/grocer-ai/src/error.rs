//! Error type for `grocer-ai`.

use thiserror::Error;

/// Longest message shown to the user for an unexpected service failure.
const USER_MESSAGE_LIMIT: usize = 120;

#[derive(Debug, Error)]
pub enum Error {
  /// No API key is configured. Raised before any request is made.
  #[error("AI API key is not configured")]
  MissingCredential,

  #[error("rate limited: {message}")]
  RateLimited { message: String },

  #[error("AI service error ({status}): {message}")]
  Service { status: u16, message: String },

  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("malformed AI response: {0}")]
  Decode(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Textual markers of quota exhaustion in a message or sub-error.
pub(crate) fn mentions_quota(message: &str) -> bool {
  message.to_lowercase().contains("quota") || message.contains("RESOURCE_EXHAUSTED")
}

impl Error {
  /// Whether the failure is a transient rate limit worth retrying.
  pub fn is_rate_limited(&self) -> bool {
    match self {
      Self::RateLimited { .. } => true,
      Self::Service { status, message } => *status == 429 || mentions_quota(message),
      _ => false,
    }
  }

  /// A short message suitable for a transient notification.
  pub fn user_message(&self) -> String {
    match self {
      Self::MissingCredential => {
        "AI features need an API key. Add one to the configuration and restart.".to_owned()
      }
      _ if self.is_rate_limited() => {
        "The AI service is busy right now, try again in a minute.".to_owned()
      }
      other => {
        let full = other.to_string();
        match full.char_indices().nth(USER_MESSAGE_LIMIT) {
          Some((cut, _)) => format!("{}…", &full[..cut]),
          None => full,
        }
      }
    }
  }
}
