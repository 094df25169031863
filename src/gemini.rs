//! Minimal Gemini client for our one use-case: challenge generation.
//!
//! We only call generateContent with a strict JSON response schema. Calls
//! are instrumented and log model names, latencies, and response sizes
//! (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::config::Prompts;
use crate::domain::{split_template, Challenge, ChallengeSource, MultipleChoiceOption};
use crate::util::fill_template;

#[derive(Clone)]
pub struct Gemini {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl Gemini {
  /// Construct the client if we find GEMINI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("GEMINI_API_KEY").ok()?;
    let base_url = std::env::var("GEMINI_BASE_URL")
      .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// JSON-constrained generateContent call; returns the raw response text.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
  async fn generate_json(&self, system: &str, user: &str) -> Result<String, String> {
    let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
    let req = GenerateContentRequest {
      system_instruction: Some(ContentPayload::from_text(system)),
      contents: vec![ContentPayload::from_text(user)],
      generation_config: GenerationConfig {
        temperature: 0.7,
        response_mime_type: "application/json".into(),
        response_schema: Some(challenge_response_schema()),
      },
    };

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "versicle-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header("x-goog-api-key", &self.api_key)
      .json(&req)
      .send()
      .await
      .map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_gemini_error(&body).unwrap_or(body);
      return Err(format!("Gemini HTTP {}: {}", status, msg));
    }

    let body: GenerateContentResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage_metadata {
      info!(
        prompt_tokens = ?usage.prompt_token_count,
        candidate_tokens = ?usage.candidates_token_count,
        total_tokens = ?usage.total_token_count,
        "Gemini usage"
      );
    }
    let text = body
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .and_then(|c| c.parts.into_iter().next())
      .map(|p| p.text)
      .unwrap_or_default();

    if text.trim().is_empty() {
      return Err("Gemini returned an empty candidate".into());
    }
    Ok(text)
  }

  /// Fetch a verse challenge for a freeform query at the given difficulty.
  #[instrument(
    level = "info",
    skip(self, prompts, query),
    fields(%difficulty, model = %self.model, query_len = query.len())
  )]
  pub async fn generate_challenge(
    &self,
    prompts: &Prompts,
    query: &str,
    difficulty: u8,
  ) -> Result<Challenge, String> {
    let share = match difficulty {
      2 => "about 40%",
      3 => "about 60%",
      _ => "about 25%",
    };
    let user = fill_template(
      &prompts.challenge_user_template,
      &[("query", query), ("blank_share", share)],
    );

    let start = std::time::Instant::now();
    let result = self.generate_json(&prompts.challenge_system, &user).await;
    let elapsed = start.elapsed();

    let text = match result {
      Ok(t) => {
        info!(?elapsed, response_len = t.len(), "Model response received");
        t
      }
      Err(e) => {
        error!(?elapsed, error = %e, "Model call failed during challenge generation");
        return Err(format!("Model generation failed: {e}"));
      }
    };

    let raw: RawChallenge =
      serde_json::from_str(&text).map_err(|e| format!("JSON parse error: {}", e))?;
    let ch = challenge_from_raw(raw)?;

    info!(
      reference = %ch.reference,
      gaps = ch.answers.len(),
      chunks = ch.ordered_chunks.len(),
      "Verse challenge successfully generated"
    );
    Ok(ch)
  }
}

/// Payload shape the provider returns before we derive the template.
#[derive(Debug, Deserialize)]
struct RawChallenge {
  #[serde(rename = "verseText")]
  verse_text: String,
  reference: String,
  challenge: String,
  answers: Vec<String>,
  #[serde(rename = "orderedChunks")]
  ordered_chunks: Vec<String>,
  #[serde(rename = "multipleChoiceOptions")]
  multiple_choice_options: Vec<MultipleChoiceOption>,
  #[serde(rename = "firstLetters")]
  first_letters: String,
}

/// Validate a provider payload and shape it into a `Challenge`.
///
/// The provider is untrusted: structural faults are logged and the payload
/// is rejected so every accepted challenge is internally consistent.
fn challenge_from_raw(raw: RawChallenge) -> Result<Challenge, String> {
  if raw.answers.is_empty() {
    warn!(target: "challenge", reference = %raw.reference, "Rejecting payload: no answers");
    return Err("payload has no blanked answers".into());
  }
  if raw.answers.len() != raw.multiple_choice_options.len() {
    warn!(
      target: "challenge",
      reference = %raw.reference,
      answers = raw.answers.len(),
      options = raw.multiple_choice_options.len(),
      "Rejecting payload: answers and multiple choice options differ in length"
    );
    return Err("answers and multiple choice options differ in length".into());
  }
  let challenge_template = split_template(&raw.challenge);
  if challenge_template.len() != raw.answers.len() + 1 {
    warn!(
      target: "challenge",
      reference = %raw.reference,
      fragments = challenge_template.len(),
      answers = raw.answers.len(),
      "Rejecting payload: gap markers do not match the answer count"
    );
    return Err("gap markers do not match the answer count".into());
  }

  Ok(Challenge {
    original_verse: raw.verse_text,
    reference: raw.reference,
    challenge_template,
    answers: raw.answers,
    ordered_chunks: raw.ordered_chunks,
    multiple_choice_options: raw.multiple_choice_options,
    first_letters: raw.first_letters,
    source: ChallengeSource::Generated,
  })
}

/// Response schema forcing the provider into the exact payload shape.
fn challenge_response_schema() -> serde_json::Value {
  serde_json::json!({
    "type": "OBJECT",
    "properties": {
      "verseText": { "type": "STRING" },
      "reference": { "type": "STRING" },
      "challenge": { "type": "STRING" },
      "answers": { "type": "ARRAY", "items": { "type": "STRING" } },
      "orderedChunks": { "type": "ARRAY", "items": { "type": "STRING" } },
      "multipleChoiceOptions": {
        "type": "ARRAY",
        "items": {
          "type": "OBJECT",
          "properties": {
            "answer": { "type": "STRING" },
            "distractors": { "type": "ARRAY", "items": { "type": "STRING" } }
          },
          "required": ["answer", "distractors"]
        }
      },
      "firstLetters": { "type": "STRING" }
    },
    "required": [
      "verseText", "reference", "challenge", "answers",
      "orderedChunks", "multipleChoiceOptions", "firstLetters"
    ]
  })
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct GenerateContentRequest {
  #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
  system_instruction: Option<ContentPayload>,
  contents: Vec<ContentPayload>,
  #[serde(rename = "generationConfig")]
  generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct ContentPayload {
  parts: Vec<Part>,
}

impl ContentPayload {
  fn from_text(text: &str) -> Self {
    Self { parts: vec![Part { text: text.into() }] }
  }
}

#[derive(Serialize, Deserialize)]
struct Part {
  text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
  temperature: f32,
  #[serde(rename = "responseMimeType")]
  response_mime_type: String,
  #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
  response_schema: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
  #[serde(default, rename = "usageMetadata")]
  usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
  content: Option<ContentPayload>,
}

#[derive(Deserialize)]
struct UsageMetadata {
  #[serde(default, rename = "promptTokenCount")]
  prompt_token_count: Option<u32>,
  #[serde(default, rename = "candidatesTokenCount")]
  candidates_token_count: Option<u32>,
  #[serde(default, rename = "totalTokenCount")]
  total_token_count: Option<u32>,
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw(answers: &[&str], options: usize, challenge: &str) -> RawChallenge {
    RawChallenge {
      verse_text: "Vì Đức Chúa Trời yêu thương thế gian".into(),
      reference: "Giăng 3:16".into(),
      challenge: challenge.into(),
      answers: answers.iter().map(|s| s.to_string()).collect(),
      ordered_chunks: vec!["Vì Đức Chúa Trời".into(), "yêu thương thế gian".into()],
      multiple_choice_options: (0..options)
        .map(|i| MultipleChoiceOption {
          answer: answers.get(i).map(|s| s.to_string()).unwrap_or_default(),
          distractors: vec!["ghét".into(), "bỏ".into()],
        })
        .collect(),
      first_letters: "V Đ C T y t t g".into(),
    }
  }

  #[test]
  fn consistent_payload_is_accepted_and_split() {
    let ch = challenge_from_raw(raw(
      &["yêu", "thế gian"],
      2,
      "Vì Đức Chúa Trời [...] thương [...]",
    ))
    .expect("payload is consistent");
    assert_eq!(ch.challenge_template.len(), 3);
    assert_eq!(ch.source, ChallengeSource::Generated);
  }

  #[test]
  fn option_length_mismatch_is_rejected() {
    let err = challenge_from_raw(raw(&["yêu"], 2, "Vì Đức Chúa Trời [...] thương thế gian"))
      .expect_err("mismatch must be rejected");
    assert!(err.contains("differ in length"));
  }

  #[test]
  fn gap_marker_mismatch_is_rejected() {
    let err = challenge_from_raw(raw(&["yêu", "thế gian"], 2, "no markers at all"))
      .expect_err("marker mismatch must be rejected");
    assert!(err.contains("gap markers"));
  }

  #[test]
  fn empty_answer_list_is_rejected() {
    assert!(challenge_from_raw(raw(&[], 0, "Vì Đức Chúa Trời yêu thương thế gian")).is_err());
  }

  #[test]
  fn error_body_extraction_prefers_the_message() {
    let body = r#"{"error":{"code":429,"message":"quota exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
    assert_eq!(extract_gemini_error(body).as_deref(), Some("quota exhausted"));
    assert_eq!(extract_gemini_error("not json"), None);
  }
}
