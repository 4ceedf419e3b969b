use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    RateLimited,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{0}")]
    RateLimited(String),
    #[error("{0}")]
    Failed(String),
}

impl ProviderError {
    /// Classifies a provider failure from its message text alone.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if lowered.contains("429")
            || lowered.contains("quota")
            || lowered.contains("rate limit")
            || lowered.contains("resource_exhausted")
        {
            ProviderError::RateLimited(message)
        } else {
            ProviderError::Failed(message)
        }
    }

    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::RateLimited(_) => ProviderErrorKind::RateLimited,
            ProviderError::Failed(_) => ProviderErrorKind::Failed,
        }
    }
}

/// Text generation capability backing the assistant.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini `generateContent` over HTTPS.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Failed(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: GEMINI_ENDPOINT.to_string(),
            api_key,
            model,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.model, "sending generateContent request");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Failed("the AI service did not respond in time".to_string())
                } else {
                    ProviderError::from_message(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::RateLimited(format!("429 {detail}")));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_message(format!("{status}: {detail}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Failed(format!("malformed response: {e}")))?;
        extract_text(parsed)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, ProviderError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ProviderError::Failed("the AI service returned no text".to_string()));
    }
    Ok(text)
}

pub fn build_sql_prompt(schema: &str, question: &str) -> String {
    format!(
        "You are a SQL query generator for a rental property management system.

Database Schema:
{schema}

User Question: {question}

Generate a SQL SELECT query to answer this question. Important rules:
1. Only generate SELECT queries (no INSERT, UPDATE, DELETE)
2. Always filter out deleted records using: WHERE deleted_at IS NULL
3. Use proper JOINs when needed
4. Return only the SQL query, nothing else

SQL Query:"
    )
}

pub fn build_tenant_prompt(tenant_data: &str, question: &str) -> String {
    format!(
        "You are an AI assistant helping a property owner understand their tenants.

Tenant Data (JSON):
{tenant_data}

Owner's Question: {question}

Answer the question using the tenant data provided. Use tenant names, provide statistics, and be helpful and concise.

Answer:"
    )
}

/// Length of the language tag opening a fenced block, or 0 when there is none.
///
/// `sql` is recognised before any whitespace. Any other identifier counts as
/// a tag only when it fills the fence line, which keeps `SELECT` in
/// "```SELECT 1```".
fn language_tag_len(inner: &str) -> usize {
    let len = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-')))
        .unwrap_or(inner.len());
    let tag = &inner[..len];
    let next = inner[len..].chars().next();

    let is_tag = if tag.eq_ignore_ascii_case("sql") {
        next.is_none_or(char::is_whitespace)
    } else {
        !tag.is_empty()
            && !tag.eq_ignore_ascii_case("select")
            && matches!(next, Some('\n' | '\r'))
    };
    if is_tag { len } else { 0 }
}

/// Removes a surrounding markdown code fence and its optional language tag.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let inner = rest.split("```").next().unwrap_or_default();
    inner[language_tag_len(inner)..].trim()
}

pub struct QuerySynthesizer {
    generator: Arc<dyn TextGenerator>,
}

impl QuerySynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    pub async fn synthesize(&self, user_text: &str, schema: &str) -> Result<String, ProviderError> {
        let prompt = build_sql_prompt(schema, user_text);
        let raw = self.generator.generate(&prompt).await?;
        Ok(strip_code_fence(&raw).to_string())
    }
}
