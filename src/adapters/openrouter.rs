//! OpenRouter-compatible chat-completions guidance provider.
//!
//! Endpoint: POST {base_url}/chat/completions
//! Auth: Bearer token
//! Output: a JSON object `{"summary": [...], "next_actions": [...]}`

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::LlmSettings;

use super::{Guidance, GuidanceProvider, RetryPolicy};

/// Guidance provider backed by an OpenAI-style chat-completions API
pub struct OpenRouterProvider {
    endpoint: String,
    api_key: String,
    model: String,
    request_timeout: Duration,
    retry_policy: RetryPolicy,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

const SYSTEM_PROMPT: &str = "You are improving a Pokemon TCG post-game coaching report.\n\
Return concise, evidence-aligned coaching text as a JSON object with keys \
\"summary\" (5 to 8 strings) and \"next_actions\" (3 to 5 strings).\n\
Rules:\n\
- Keep each bullet to one sentence.\n\
- Do not invent hidden information.\n\
- Keep content grounded in the log text.";

fn format_bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// User prompt for one guidance request
pub fn build_prompt(log_text: &str, fallback_summary: &[String], fallback_next_actions: &[String]) -> String {
    format!(
        "Fallback summary bullets:\n{}\n\nFallback next actions:\n{}\n\nBattle log:\n{}",
        format_bullets(fallback_summary),
        format_bullets(fallback_next_actions),
        log_text
    )
}

/// Parse and bound-check the model's message content
pub fn parse_guidance(content: &str) -> Result<Guidance> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let guidance: Guidance =
        serde_json::from_str(trimmed).context("Guidance is not a valid JSON object")?;
    if !guidance.is_within_bounds() {
        anyhow::bail!(
            "Guidance out of bounds: {} summary, {} next actions",
            guidance.summary.len(),
            guidance.next_actions.len()
        );
    }
    Ok(guidance)
}

impl OpenRouterProvider {
    /// Create a provider from resolved settings, or `None` outside live mode
    pub fn from_settings(settings: &LlmSettings) -> Option<Self> {
        if !settings.live_mode_enabled() {
            return None;
        }
        let api_key = settings.api_key.clone()?;
        Some(Self {
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key,
            model: settings.model.clone(),
            request_timeout: Duration::from_secs(settings.timeout_seconds),
            retry_policy: settings.retry_policy.clone(),
            client: reqwest::Client::new(),
        })
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Override the retry policy
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request_once(&self, prompt: &str) -> Result<Guidance> {
        let payload = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .context("Failed to reach guidance endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Guidance endpoint error ({}): {}", status, text)
        }

        let body: ChatResponse = response
            .json()
            .await
            .context("Guidance response is not a chat completion")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("Guidance response has no choices")?;

        parse_guidance(&content)
    }

    async fn request_with_timeout(&self, prompt: &str) -> Result<Guidance> {
        timeout(self.request_timeout, self.request_once(prompt))
            .await
            .with_context(|| format!("Guidance request timed out after {:?}", self.request_timeout))?
    }
}

#[async_trait]
impl GuidanceProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn generate(
        &self,
        log_text: &str,
        fallback_summary: &[String],
        fallback_next_actions: &[String],
    ) -> Option<Guidance> {
        let prompt = build_prompt(log_text, fallback_summary, fallback_next_actions);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.request_with_timeout(&prompt).await {
                Ok(guidance) => {
                    info!(attempt, model = %self.model, "Guidance received");
                    return Some(guidance);
                }
                Err(e) => {
                    if self.retry_policy.should_retry(attempt) {
                        let delay = self.retry_policy.delay_for_attempt(attempt);
                        warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Guidance request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    warn!(attempt, error = %e, "Guidance unavailable, using deterministic fallback");
                    debug!(error = ?e, "Guidance failure detail");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_settings() -> LlmSettings {
        LlmSettings {
            api_key: Some("sk-test".to_string()),
            base_url: "http://localhost:1/api/v1/".to_string(),
            ..LlmSettings::default()
        }
    }

    #[test]
    fn test_from_settings_requires_live_mode() {
        assert!(OpenRouterProvider::from_settings(&LlmSettings::default()).is_none());
        let provider = OpenRouterProvider::from_settings(&live_settings()).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:1/api/v1/chat/completions");
        assert_eq!(provider.name(), "openrouter");
    }

    #[test]
    fn test_parse_guidance_bounds_and_fences() {
        let ok = r#"```json
{"summary": ["a","b","c","d","e"], "next_actions": ["x","y","z"]}
```"#;
        assert_eq!(parse_guidance(ok).unwrap().summary.len(), 5);

        let short = r#"{"summary": ["a"], "next_actions": ["x","y","z"]}"#;
        assert!(parse_guidance(short).is_err());
        assert!(parse_guidance("not json").is_err());
    }

    #[test]
    fn test_prompt_lists_fallbacks_and_log() {
        let prompt = build_prompt("LOG", &["s1".to_string()], &["n1".to_string()]);
        assert!(prompt.contains("- s1"));
        assert!(prompt.contains("- n1"));
        assert!(prompt.ends_with("LOG"));
    }
}
