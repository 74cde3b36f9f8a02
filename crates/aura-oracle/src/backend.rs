//! Completion backends.
//!
//! Enum dispatch over the concrete backends, since async methods are not
//! dyn-compatible. [`Oracle::respond`] and [`Oracle::dream`] never fail:
//! every error is logged and mapped to the fixed fallback reply, so a
//! chat turn always completes.

use std::time::Duration;

use aura_core::config::OracleSettings;
use aura_core::session::TurnPlan;
use aura_types::{CognitiveMode, Completion, MessageRole};
use serde_json::{Value, json};

use crate::error::OracleError;
use crate::parse::split_burst;
use crate::prompt::{FLASH_CORE_LABEL, PRO_CORE_LABEL, PromptEngine};

/// Reply text when no API key is configured.
pub const MISSING_KEY_TEXT: &str = "ОШИБКА: СВЯЗЬ С ЯДРОМ РАЗОРВАНА. ПРОВЕРЬТЕ API KEY.";

/// Introspection when no API key is configured.
pub const MISSING_KEY_INTROSPECTION: &str = "API Key Missing";

/// Reply text when the API call fails.
pub const FAILURE_TEXT: &str =
    "Критический сбой когнитивной матрицы. Связь с М-Пространством нарушена.";

/// Introspection when the API call fails.
pub const FAILURE_INTROSPECTION: &str = "ERROR_TRACE_FAIL";

/// Whether `mode` is routed to the reasoning model.
pub const fn uses_pro_model(mode: CognitiveMode) -> bool {
    matches!(mode, CognitiveMode::Alchemy | CognitiveMode::Analytic)
}

/// The completion collaborator.
pub enum Oracle {
    /// The `generateContent` HTTP API.
    Gemini(GeminiBackend),
    /// No API key: every turn gets the missing-key reply.
    Offline,
    /// Fixed replies, for tests and demos.
    Scripted(ScriptedBackend),
}

impl Oracle {
    /// Reply to a chat turn.
    pub async fn respond(&self, plan: &TurnPlan) -> Completion {
        match self {
            Self::Gemini(backend) => match backend.respond(plan).await {
                Ok(completion) => completion,
                Err(e) => {
                    tracing::warn!(error = %e, mode = %plan.mode, "Completion failed");
                    Completion {
                        text: FAILURE_TEXT.to_owned(),
                        introspection: FAILURE_INTROSPECTION.to_owned(),
                    }
                }
            },
            Self::Offline => Completion {
                text: MISSING_KEY_TEXT.to_owned(),
                introspection: MISSING_KEY_INTROSPECTION.to_owned(),
            },
            Self::Scripted(backend) => split_burst(&backend.reply),
        }
    }

    /// Render a dream image. Returns base64 JPEG data, or `None`.
    pub async fn dream(&self, prompt: &str) -> Option<String> {
        match self {
            Self::Gemini(backend) => match backend.dream(prompt).await {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(error = %e, "Dream generation failed");
                    None
                }
            },
            Self::Offline => None,
            Self::Scripted(backend) => backend.image.clone(),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Gemini(_) => "gemini",
            Self::Offline => "offline",
            Self::Scripted(_) => "scripted",
        }
    }
}

// ---------------------------------------------------------------------------
// Gemini backend
// ---------------------------------------------------------------------------

/// Backend for the `generateContent` API.
///
/// Sends requests to `{api_url}/models/{model}:generateContent`.
pub struct GeminiBackend {
    client: reqwest::Client,
    prompts: PromptEngine,
    api_url: String,
    api_key: String,
    flash_model: String,
    pro_model: String,
    image_model: String,
}

impl GeminiBackend {
    /// Create a backend with the given key.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Http`] if the HTTP client cannot be built.
    /// Returns [`OracleError::Template`] if the system prompt does not parse.
    pub fn new(settings: &OracleSettings, api_key: &str) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            prompts: PromptEngine::new(settings.templates_dir.as_deref())?,
            api_url: settings.api_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            flash_model: settings.flash_model.clone(),
            pro_model: settings.pro_model.clone(),
            image_model: settings.image_model.clone(),
        })
    }

    /// The model a turn in `mode` is sent to.
    pub fn model_for(&self, mode: CognitiveMode) -> &str {
        if uses_pro_model(mode) {
            &self.pro_model
        } else {
            &self.flash_model
        }
    }

    async fn respond(&self, plan: &TurnPlan) -> Result<Completion, OracleError> {
        let core = if uses_pro_model(plan.mode) {
            PRO_CORE_LABEL
        } else {
            FLASH_CORE_LABEL
        };
        let system = self.prompts.render_system(core, plan.mode, &plan.shadow)?;
        let model = self.model_for(plan.mode);

        let body = json!({ "contents": build_contents(&system, plan) });
        let response = self.generate(model, &body).await?;
        let text = extract_text(&response)?;

        tracing::debug!(model, mode = %plan.mode, chars = text.len(), "Completion received");
        Ok(split_burst(&text))
    }

    async fn dream(&self, prompt: &str) -> Result<Option<String>, OracleError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });
        let response = self.generate(&self.image_model, &body).await?;
        Ok(extract_inline_image(&response))
    }

    async fn generate(&self, model: &str, body: &Value) -> Result<Value, OracleError> {
        let url = format!("{}/models/{model}:generateContent", self.api_url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// The system prompt as the first user turn, then the history, then the
/// new prompt. AI messages map to the `model` role.
fn build_contents(system: &str, plan: &TurnPlan) -> Vec<Value> {
    let mut contents = Vec::with_capacity(plan.history.len().saturating_add(2));
    contents.push(json!({ "role": "user", "parts": [{ "text": system }] }));
    for msg in &plan.history {
        let role = match msg.role {
            MessageRole::Ai => "model",
            MessageRole::User => "user",
        };
        contents.push(json!({ "role": role, "parts": [{ "text": msg.text }] }));
    }
    contents.push(json!({ "role": "user", "parts": [{ "text": plan.prompt }] }));
    contents
}

fn candidate_parts(json: &Value) -> Option<&Vec<Value>> {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
}

/// Concatenate the text parts of the first candidate.
fn extract_text(json: &Value) -> Result<String, OracleError> {
    let parts = candidate_parts(json)
        .ok_or(OracleError::MissingContent("candidates[0].content.parts"))?;
    Ok(parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect())
}

/// The first inline image payload of the first candidate.
fn extract_inline_image(json: &Value) -> Option<String> {
    candidate_parts(json)?.iter().find_map(|p| {
        p.get("inlineData")
            .and_then(|d| d.get("data"))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
    })
}

// ---------------------------------------------------------------------------
// Scripted backend
// ---------------------------------------------------------------------------

/// Returns the same reply and image for every request.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    /// Raw reply, split at the burst marker like a real one.
    pub reply: String,
    /// Dream image payload.
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create the oracle from settings: [`Oracle::Gemini`] when a non-blank key
/// is configured, otherwise [`Oracle::Offline`].
///
/// # Errors
///
/// Returns [`OracleError`] if the Gemini backend cannot be built.
pub fn create_oracle(settings: &OracleSettings) -> Result<Oracle, OracleError> {
    match settings.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            let backend = GeminiBackend::new(settings, key)?;
            tracing::info!(
                flash = %backend.flash_model,
                pro = %backend.pro_model,
                "Completion backend ready"
            );
            Ok(Oracle::Gemini(backend))
        }
        _ => {
            tracing::warn!("No API key configured, completions run offline");
            Ok(Oracle::Offline)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use aura_types::{ChatMessage, MessageId};
    use chrono::Utc;

    use super::*;

    fn plan(mode: CognitiveMode, history: Vec<ChatMessage>) -> TurnPlan {
        TurnPlan {
            mode,
            prompt: "привет".to_owned(),
            history,
            shadow: "CALM".to_owned(),
            user_message_id: MessageId::new(),
        }
    }

    fn message(role: MessageRole, text: &str) -> ChatMessage {
        ChatMessage {
            id: MessageId::new(),
            role,
            text: text.to_owned(),
            timestamp: Utc::now(),
            introspection: None,
            attachment: None,
            mode: None,
        }
    }

    #[test]
    fn routing_sends_reasoning_modes_to_pro() {
        assert!(uses_pro_model(CognitiveMode::Alchemy));
        assert!(uses_pro_model(CognitiveMode::Analytic));
        assert!(!uses_pro_model(CognitiveMode::Empathic));
        assert!(!uses_pro_model(CognitiveMode::Dream));
        assert!(!uses_pro_model(CognitiveMode::Creative));
    }

    #[test]
    fn model_for_uses_settings() {
        let settings = OracleSettings::default();
        let backend = GeminiBackend::new(&settings, "k").unwrap();
        assert_eq!(backend.model_for(CognitiveMode::Alchemy), settings.pro_model);
        assert_eq!(backend.model_for(CognitiveMode::Empathic), settings.flash_model);
    }

    #[test]
    fn contents_map_roles() {
        let history = vec![message(MessageRole::Ai, "hello"), message(MessageRole::User, "hi")];
        let contents = build_contents("SYS", &plan(CognitiveMode::Analytic, history));
        let roles: Vec<&str> = contents
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user", "user"]);
        assert_eq!(contents[0]["parts"][0]["text"], "SYS");
        assert_eq!(contents[3]["parts"][0]["text"], "привет");
    }

    #[test]
    fn extract_text_joins_parts() {
        let json = json!({
            "candidates": [{ "content": { "parts": [{ "text": "a" }, { "text": "b" }] } }]
        });
        assert_eq!(extract_text(&json).unwrap(), "ab");
        assert!(extract_text(&json!({ "error": "quota" })).is_err());
    }

    #[test]
    fn extract_inline_image_finds_first() {
        let json = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "here" },
                { "inlineData": { "mimeType": "image/jpeg", "data": "QUJD" } }
            ] } }]
        });
        assert_eq!(extract_inline_image(&json).as_deref(), Some("QUJD"));
        assert_eq!(extract_inline_image(&json!({ "candidates": [] })), None);
    }

    #[test]
    fn missing_key_is_offline() {
        let mut settings = OracleSettings::default();
        assert_eq!(create_oracle(&settings).unwrap().name(), "offline");
        settings.api_key = Some("   ".to_owned());
        assert_eq!(create_oracle(&settings).unwrap().name(), "offline");
        settings.api_key = Some("key".to_owned());
        assert_eq!(create_oracle(&settings).unwrap().name(), "gemini");
    }

    #[tokio::test]
    async fn offline_replies_with_missing_key_text() {
        let oracle = Oracle::Offline;
        let completion = oracle.respond(&plan(CognitiveMode::Empathic, vec![])).await;
        assert_eq!(completion.text, MISSING_KEY_TEXT);
        assert_eq!(completion.introspection, MISSING_KEY_INTROSPECTION);
        assert_eq!(oracle.dream("stars").await, None);
    }

    #[tokio::test]
    async fn unreachable_api_yields_failure_text() {
        let settings = OracleSettings {
            api_url: "http://127.0.0.1:9".to_owned(),
            api_key: Some("key".to_owned()),
            request_timeout_ms: 500,
            ..OracleSettings::default()
        };
        let oracle = create_oracle(&settings).unwrap();
        let completion = oracle.respond(&plan(CognitiveMode::Analytic, vec![])).await;
        assert_eq!(completion.text, FAILURE_TEXT);
        assert_eq!(completion.introspection, FAILURE_INTROSPECTION);
        assert_eq!(oracle.dream("stars").await, None);
    }

    #[tokio::test]
    async fn scripted_splits_burst() {
        let oracle = Oracle::Scripted(ScriptedBackend {
            reply: "ok [SYSTEM_BURST] node".to_owned(),
            image: Some("QUJD".to_owned()),
        });
        let completion = oracle.respond(&plan(CognitiveMode::Dream, vec![])).await;
        assert_eq!(completion.text, "ok");
        assert_eq!(completion.introspection, "node");
        assert_eq!(oracle.dream("x").await.as_deref(), Some("QUJD"));
    }
}
