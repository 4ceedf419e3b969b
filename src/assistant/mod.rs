//! Natural-language assistant: turns a question into a guarded, read-only SQL
//! query, runs it, and answers with a readable summary.

pub mod guard;
pub mod humanizer;
pub mod ledger;
pub mod schema;
pub mod store;
pub mod synthesizer;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use guard::GuardRejection;
use ledger::{Admission, IdentityKey, Ledger, LedgerConfig, cache_key};
use store::{NameResolver, QueryStore};
use synthesizer::{ProviderError, QuerySynthesizer, build_tenant_prompt};

/// Phrases that ask the assistant about itself rather than about the data.
pub const IDENTITY_PROBES: [&str; 4] = ["who are you", "what are you", "your name", "your purpose"];

pub const SELF_DESCRIPTION: &str = "I'm RentEase AI Assistant. I help you find rental properties and answer questions about available rooms, bookings, and more. How can I assist you today?";
pub const NOT_CONFIGURED: &str = "AI service is not configured. Please contact the administrator.";
pub const OWNER_NOT_CONFIGURED: &str = "AI service is not configured.";
pub const PROVIDER_RATE_LIMITED: &str = "The AI service is currently rate-limited. Please wait a few moments before trying again. You may have reached your API quota limit.";
pub const OWNER_PROVIDER_RATE_LIMITED: &str =
    "The AI service is currently rate-limited. Please wait a few moments before trying again.";
pub const SELECT_ONLY: &str = "I can only generate SELECT queries. Please ask about viewing data.";
pub const NO_TENANTS: &str = "You don't have any tenants yet.";

/// Uniform wrapper for every conversational outcome, success or soft failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEnvelope {
    pub response: String,
    pub timestamp: Option<String>,
}

impl ChatEnvelope {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            response: text.into(),
            timestamp: None,
        }
    }
}

/// Failures that are not answered conversationally.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message is required")]
    MessageRequired,
    #[error(transparent)]
    Store(#[from] sqlx::Error),
    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

enum AnswerFailure {
    Provider(ProviderError),
    Rejected(GuardRejection),
    Store(sqlx::Error),
}

impl AnswerFailure {
    fn user_message(&self) -> String {
        match self {
            AnswerFailure::Provider(ProviderError::RateLimited(_)) => {
                PROVIDER_RATE_LIMITED.to_string()
            }
            AnswerFailure::Provider(e) => rephrase_message(e),
            // Store failures read the same as provider failures.
            AnswerFailure::Store(e) => rephrase_message(e),
            AnswerFailure::Rejected(_) => SELECT_ONLY.to_string(),
        }
    }
}

fn rephrase_message(cause: &dyn std::fmt::Display) -> String {
    format!(
        "I encountered an error processing your request: {cause}. Please try rephrasing your question."
    )
}

pub fn is_identity_probe(message: &str) -> bool {
    let lowered = message.to_lowercase();
    IDENTITY_PROBES.iter().any(|probe| lowered.contains(probe))
}

pub struct ChatGateway {
    synthesizer: Option<QuerySynthesizer>,
    store: Arc<dyn QueryStore>,
    resolver: Arc<dyn NameResolver>,
    ledger: Ledger<ChatEnvelope>,
}

impl ChatGateway {
    pub fn new(
        synthesizer: Option<QuerySynthesizer>,
        store: Arc<dyn QueryStore>,
        resolver: Arc<dyn NameResolver>,
        ledger: LedgerConfig,
    ) -> Self {
        Self {
            synthesizer,
            store,
            resolver,
            ledger: Ledger::new(ledger),
        }
    }

    pub fn ledger(&self) -> &Ledger<ChatEnvelope> {
        &self.ledger
    }

    pub fn store(&self) -> &Arc<dyn QueryStore> {
        &self.store
    }

    fn admit(&self, principal: Option<i64>, origin: &str, now: Instant) -> Option<ChatEnvelope> {
        let identity = IdentityKey::identify(principal, origin);
        match self.ledger.admit(&identity, now) {
            Admission::Allowed => None,
            Admission::Denied(denial) => {
                tracing::info!(%identity, retry_after = denial.retry_after_secs, "assistant request rate limited");
                Some(ChatEnvelope::reply(denial.to_string()))
            }
        }
    }

    /// Answers a free-form question about the marketplace data.
    pub async fn ask(
        &self,
        principal: Option<i64>,
        origin: &str,
        message: &str,
    ) -> Result<ChatEnvelope, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::MessageRequired);
        }

        if is_identity_probe(message) {
            return Ok(ChatEnvelope::reply(SELF_DESCRIPTION));
        }

        let Some(synthesizer) = &self.synthesizer else {
            tracing::warn!("chat request received but the AI service is not configured");
            return Ok(ChatEnvelope::reply(NOT_CONFIGURED));
        };

        let now = Instant::now();
        if let Some(denied) = self.admit(principal, origin, now) {
            return Ok(denied);
        }

        let key = cache_key(message);
        if let Some(cached) = self.ledger.cache_get(&key, now) {
            tracing::debug!("serving cached assistant response");
            return Ok(cached);
        }

        let envelope = match self.answer(synthesizer, message).await {
            Ok(text) => ChatEnvelope::reply(text),
            Err(failure) => return Ok(ChatEnvelope::reply(failure.user_message())),
        };

        self.ledger.cache_put(key, envelope.clone(), Instant::now());
        Ok(envelope)
    }

    async fn answer(
        &self,
        synthesizer: &QuerySynthesizer,
        message: &str,
    ) -> Result<String, AnswerFailure> {
        let preview: String = message.chars().take(50).collect();
        tracing::info!(question = %preview, "generating SQL for assistant question");

        let sql = synthesizer
            .synthesize(message, schema::schema_descriptor())
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "text generation failed");
                AnswerFailure::Provider(e)
            })?;

        guard::validate(&sql).map_err(|rejection| {
            tracing::warn!(%sql, "generated statement rejected: {rejection}");
            AnswerFailure::Rejected(rejection)
        })?;

        let mut rows = self.store.fetch_rows(&sql).await.map_err(|e| {
            tracing::error!(%sql, error = %e, "generated query failed");
            AnswerFailure::Store(e)
        })?;

        humanizer::humanize(&mut rows, self.resolver.as_ref())
            .await
            .map_err(AnswerFailure::Store)?;

        tracing::debug!(rows = rows.len(), "assistant query answered");
        Ok(humanizer::render(&rows))
    }

    /// Answers an owner's question about their own tenants. `tenants` is only
    /// awaited once the request has been admitted.
    pub async fn ask_about_tenants<F, T>(
        &self,
        owner_id: i64,
        origin: &str,
        message: &str,
        tenants: F,
    ) -> Result<ChatEnvelope, ChatError>
    where
        F: Future<Output = Result<Vec<T>, sqlx::Error>> + Send,
        T: Serialize + Send,
    {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::MessageRequired);
        }

        let Some(synthesizer) = &self.synthesizer else {
            tracing::warn!("tenant chat request received but the AI service is not configured");
            return Ok(ChatEnvelope::reply(OWNER_NOT_CONFIGURED));
        };

        if let Some(denied) = self.admit(Some(owner_id), origin, Instant::now()) {
            return Ok(denied);
        }

        let tenants = tenants.await?;
        if tenants.is_empty() {
            return Ok(ChatEnvelope::reply(NO_TENANTS));
        }

        let tenant_data = serde_json::to_string_pretty(&tenants)?;
        let prompt = build_tenant_prompt(&tenant_data, message);

        let reply = match synthesizer.generator().generate(&prompt).await {
            Ok(answer) => answer.trim().to_string(),
            Err(ProviderError::RateLimited(_)) => OWNER_PROVIDER_RATE_LIMITED.to_string(),
            Err(e) => {
                tracing::warn!(owner_id, error = %e, "tenant chat generation failed");
                format!("I encountered an error: {e}")
            }
        };
        Ok(ChatEnvelope::reply(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_probe_is_case_insensitive_substring() {
        assert!(is_identity_probe("Hey, WHO ARE YOU?"));
        assert!(is_identity_probe("what is your purpose"));
        assert!(!is_identity_probe("show me rooms under 5000"));
    }

    #[test]
    fn envelope_serializes_null_timestamp() {
        let json = serde_json::to_value(ChatEnvelope::reply("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"response": "hi", "timestamp": null}));
    }
}
