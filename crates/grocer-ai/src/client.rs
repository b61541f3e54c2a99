//! [`GeminiClient`]: a [`Completion`] backed by the Gemini
//! `generateContent` REST endpoint.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{Completion, CompletionRequest, Error, Result, error::mentions_quota};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Connection settings for the AI service.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
  /// Without a key every call fails with [`Error::MissingCredential`].
  pub api_key:  Option<String>,
  pub model:    String,
  pub base_url: String,
  pub timeout:  Duration,
}

impl Default for GeminiConfig {
  fn default() -> Self {
    Self {
      api_key:  None,
      model:    DEFAULT_MODEL.to_owned(),
      base_url: DEFAULT_BASE_URL.to_owned(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// Async HTTP client for `generateContent`.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct GeminiClient {
  http:   Client,
  config: GeminiConfig,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GenerateResponse {
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Candidate {
  content: Content,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Content {
  parts: Vec<Part>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Part {
  text: String,
}

impl GenerateResponse {
  /// Concatenated text of the first candidate; empty when there is none.
  fn into_text(self) -> String {
    self
      .candidates
      .into_iter()
      .next()
      .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
      .unwrap_or_default()
  }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  code:    Option<u16>,
  #[serde(default)]
  message: String,
  #[serde(default)]
  status:  Option<String>,
}

/// Map a non-2xx response to a typed error.
fn classify(status: u16, body: &str) -> Error {
  let detail = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
  let message = match &detail {
    Some(d) if !d.message.is_empty() => d.message.clone(),
    _ => body.trim().to_owned(),
  };

  let rate_limited = status == 429
    || detail.as_ref().is_some_and(|d| {
      d.code == Some(429) || d.status.as_deref() == Some("RESOURCE_EXHAUSTED")
    })
    || mentions_quota(&message);

  if rate_limited {
    Error::RateLimited { message }
  } else {
    Error::Service { status, message }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

impl GeminiClient {
  pub fn new(config: GeminiConfig) -> Result<Self> {
    let http = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { http, config })
  }

  pub fn has_credential(&self) -> bool {
    self.config.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
  }

  fn url(&self) -> String {
    format!(
      "{}/models/{}:generateContent",
      self.config.base_url.trim_end_matches('/'),
      self.config.model
    )
  }
}

impl Completion for GeminiClient {
  async fn complete(&self, request: &CompletionRequest) -> Result<String> {
    let key = match self.config.api_key.as_deref() {
      Some(k) if !k.trim().is_empty() => k,
      _ => return Err(Error::MissingCredential),
    };

    let body = json!({
      "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
      "generationConfig": {
        "responseMimeType": "application/json",
        "responseSchema":   request.schema,
      }
    });

    let resp = self
      .http
      .post(self.url())
      .header("x-goog-api-key", key)
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
      return Err(classify(status.as_u16(), &text));
    }

    let parsed: GenerateResponse = serde_json::from_str(&text)?;
    let answer = parsed.into_text();
    tracing::debug!(model = %self.config.model, bytes = answer.len(), "AI call succeeded");
    Ok(answer)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
