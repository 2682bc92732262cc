//! Google Gemini judgment client.
//!
//! Calls the `generateContent` REST endpoint with the policy instruction,
//! the user prompt and four inline JPEG frames, asking for JSON output that
//! follows [`response_schema`](super::prompt::response_schema).

use std::time::Instant;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::prompt::{response_schema, system_instruction, user_prompt};
use super::VerdictService;
use crate::config::{GeminiConfig, Locale};
use crate::error::{GuardError, Result};
use crate::history::HistoryEntry;
use crate::sampler::FrameSet;
use crate::verdict::Verdict;

/// `generateContent` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

/// `generateContent` response body (only the fields we read).
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Gemini-backed [`VerdictService`].
pub struct GeminiJudge {
    client: Client,
    config: GeminiConfig,
}

impl GeminiJudge {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GuardError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create a judge from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl VerdictService for GeminiJudge {
    #[instrument(skip_all, fields(model = %self.config.model, history = history.len()))]
    async fn judge(&self, frames: &FrameSet, history: &[HistoryEntry]) -> Result<Verdict> {
        let start = Instant::now();
        let body = build_request(frames, history, self.config.locale);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini request failed");
                GuardError::Http(e)
            })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(
                status = %status,
                latency_ms = start.elapsed().as_millis() as u64,
                body = %truncate(&detail, 512),
                "Gemini returned an error status"
            );
            return Err(GuardError::Judgment(format!(
                "Gemini API returned status: {status}"
            )));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse Gemini response envelope");
            GuardError::MalformedVerdict(format!("Failed to parse Gemini response: {e}"))
        })?;

        let text = response_text(parsed)?;
        let verdict = Verdict::from_response_text(&text).inspect_err(|e| {
            warn!(error = %e, "Gemini output does not match the verdict schema");
        })?;

        info!(
            status = %verdict.status,
            similar = verdict.history_check.is_similar_to_past,
            latency_ms = start.elapsed().as_millis() as u64,
            "Verdict received"
        );
        Ok(verdict)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

fn build_request(
    frames: &FrameSet,
    history: &[HistoryEntry],
    locale: Locale,
) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(frames.frames.len() + 1);
    parts.push(Part {
        text: Some(user_prompt(locale).to_string()),
        inline_data: None,
    });
    parts.extend(frames.frames.iter().map(|jpeg| Part {
        text: None,
        inline_data: Some(InlineData {
            mime_type: "image/jpeg".to_string(),
            data: BASE64.encode(jpeg),
        }),
    }));

    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: Some(system_instruction(history, locale)),
                inline_data: None,
            }],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: response_schema(locale),
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: GenerateContentResponse) -> Result<String> {
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| GuardError::MalformedVerdict("Gemini returned no candidates".into()))?;

    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        return Err(GuardError::MalformedVerdict(
            "Gemini returned an empty candidate".into(),
        ));
    }
    Ok(text)
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames() -> FrameSet {
        FrameSet {
            frames: [vec![1], vec![2], vec![3], vec![4]],
            thumbnail: "data:image/jpeg;base64,AA==".to_string(),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let history = vec![HistoryEntry::with_timestamp(1, "monk under tree", "t")];
        let body =
            serde_json::to_value(build_request(&frames(), &history, Locale::Burmese)).unwrap();

        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0]["text"], user_prompt(Locale::Burmese));
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[1]["inlineData"]["data"], BASE64.encode([1u8]));
        assert_eq!(parts[4]["inlineData"]["data"], BASE64.encode([4u8]));

        let instruction = body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap();
        assert!(instruction.contains("[ID_1] Visual Fingerprint: monk under tree"));
        assert!(body["systemInstruction"].get("role").is_none());

        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response_text(parsed).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_response_without_candidates_is_malformed() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            response_text(parsed),
            Err(GuardError::MalformedVerdict(_))
        ));

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(response_text(blocked).is_err());
    }

    #[test]
    fn test_endpoint_format() {
        let mut config = GeminiConfig::new("key");
        config.api_url = "https://example.test/v1beta/".to_string();
        config.model = "gemini-test".to_string();
        let judge = GeminiJudge::new(config).unwrap();
        assert_eq!(
            judge.endpoint(),
            "https://example.test/v1beta/models/gemini-test:generateContent"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_service_failure() {
        let mut config = GeminiConfig::new("key");
        config.api_url = "http://127.0.0.1:9".to_string();
        config.timeout = std::time::Duration::from_secs(5);
        let judge = GeminiJudge::new(config).unwrap();

        let err = judge.judge(&frames(), &[]).await.unwrap_err();
        assert!(err.is_service_failure());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("ဗီဒီယို", 2), "ဗီ");
    }
}
