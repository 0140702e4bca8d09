use reqwest::header;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::session::ExecutionStep;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
pub const API_BASE_ENV_VAR: &str = "AGENTDECK_API_BASE_URL";

/// Backend base URL: environment override when set, well-known local
/// address otherwise.
pub fn resolve_base_url() -> String {
    match std::env::var(API_BASE_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => normalize_base(&value),
        _ => DEFAULT_API_BASE.to_string(),
    }
}

fn normalize_base(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    NotJson(String),
    #[error("{0}")]
    Backend(String),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Deepseek,
    Openai,
    Claude,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Deepseek,
        Provider::Openai,
        Provider::Claude,
        Provider::Gemini,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Provider::Deepseek => "DeepSeek",
            Provider::Openai => "OpenAI",
            Provider::Claude => "Claude",
            Provider::Gemini => "Gemini",
        }
    }

    /// Gemini goes through the official SDK on the backend and takes no
    /// base URL.
    pub fn uses_base_url(self) -> bool {
        self != Provider::Gemini
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub provider: Provider,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub max_steps: u32,
    pub temperature: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Deepseek,
            model: "deepseek-chat".to_string(),
            base_url: Some("https://api.deepseek.com".to_string()),
            max_steps: 100,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub is_mcp: bool,
}

impl Tool {
    pub fn matches(&self, filter: &str) -> bool {
        let needle = filter.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// One entry of the server-held conversation history list.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub time: String,
    #[serde(default)]
    pub message_count: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub steps: Option<Vec<ExecutionStep>>,
}

#[derive(Debug, Deserialize)]
struct ConfigEnvelope {
    config: AgentConfig,
}

#[derive(Debug, Deserialize)]
struct ToolsEnvelope {
    #[serde(default)]
    tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    history: Vec<ChatSession>,
}

/// Thin wrapper over the backend's REST surface: JSON in, JSON out, uniform
/// error taxonomy, no retries.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base(&base_url.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn request<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self
            .http
            .request(method, self.url_for(path))
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));

        if !is_json {
            let fallback = response.text().await.unwrap_or_default();
            let detail = fallback.trim();
            return Err(ApiError::NotJson(if detail.is_empty() {
                format!("backend returned a non-JSON response (status {})", status.as_u16())
            } else {
                detail.to_string()
            }));
        }

        let bytes = response.bytes().await?;
        let value: Value = serde_json::from_slice(&bytes)?;

        if !status.is_success() {
            return Err(ApiError::Backend(backend_message(&value, status.as_u16())));
        }
        Ok(value)
    }

    pub async fn send_chat(&self, session_id: &str, message: &str) -> Result<ChatReply, ApiError> {
        let body = json!({ "message": message, "session_id": session_id });
        let value = self.request(Method::POST, "/api/chat", Some(&body)).await?;
        decode_envelope(value)
    }

    pub async fn fetch_config(&self) -> Result<AgentConfig, ApiError> {
        let value = self.request::<()>(Method::GET, "/api/config", None).await?;
        let envelope: ConfigEnvelope = decode_envelope(value)?;
        Ok(envelope.config)
    }

    /// Persist the edited config; on success returns the backend's
    /// confirmation message.
    pub async fn save_config(&self, config: &AgentConfig) -> Result<String, ApiError> {
        let value = self
            .request(Method::POST, "/api/config", Some(config))
            .await?;
        ensure_success(&value)?;
        Ok(value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Configuration saved")
            .to_string())
    }

    pub async fn fetch_tools(&self) -> Result<Vec<Tool>, ApiError> {
        let value = self.request::<()>(Method::GET, "/api/tools", None).await?;
        let envelope: ToolsEnvelope = decode_envelope(value)?;
        Ok(envelope.tools)
    }

    pub async fn fetch_history(&self) -> Result<Vec<ChatSession>, ApiError> {
        let value = self.request::<()>(Method::GET, "/api/history", None).await?;
        let envelope: HistoryEnvelope = decode_envelope(value)?;
        Ok(envelope.history)
    }
}

fn backend_message(value: &Value, status: u16) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("request failed with status {status}"))
}

fn ensure_success(value: &Value) -> Result<(), ApiError> {
    let status = value.get("status").and_then(Value::as_str).unwrap_or("");
    if status == "success" {
        return Ok(());
    }
    Err(ApiError::Backend(
        value
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .unwrap_or("backend reported a failure")
            .to_string(),
    ))
}

fn decode_envelope<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    ensure_success(&value)?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_joins_relative_paths_against_the_base() {
        let client = ApiClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.url_for("/api/chat"), "http://localhost:5000/api/chat");
        assert_eq!(client.url_for("api/chat"), "http://localhost:5000/api/chat");
    }

    #[test]
    fn url_for_passes_absolute_urls_through() {
        let client = ApiClient::new("http://localhost:5000");
        assert_eq!(
            client.url_for("https://example.com/api/tools"),
            "https://example.com/api/tools"
        );
    }

    #[test]
    fn normalize_base_strips_whitespace_and_trailing_slash() {
        assert_eq!(normalize_base(" http://agent:8080/ "), "http://agent:8080");
        assert_eq!(normalize_base("http://agent:8080"), "http://agent:8080");
    }

    #[test]
    fn chat_envelope_decodes_response_and_steps() {
        let value = json!({
            "status": "success",
            "session_id": "abc",
            "response": "done",
            "steps": [{"step_num": 1, "thought": "t", "action": "a", "observation": "ok"}],
            "step_count": 1
        });

        let reply: ChatReply = decode_envelope(value).expect("envelope should decode");
        assert_eq!(reply.response, "done");
        let steps = reply.steps.expect("steps should be present");
        assert_eq!(steps.len(), 1);
        assert!(steps[0].is_completed());
    }

    #[test]
    fn error_envelope_surfaces_the_backend_message() {
        let value = json!({ "status": "error", "message": "missing DEEPSEEK_API_KEY" });
        let result: Result<ChatReply, ApiError> = decode_envelope(value);
        match result {
            Err(ApiError::Backend(message)) => assert_eq!(message, "missing DEEPSEEK_API_KEY"),
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn error_envelope_without_message_gets_a_generic_description() {
        let result: Result<ChatReply, ApiError> = decode_envelope(json!({ "status": "error" }));
        match result {
            Err(ApiError::Backend(message)) => {
                assert_eq!(message, "backend reported a failure");
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn backend_message_falls_back_to_the_http_status() {
        assert_eq!(
            backend_message(&json!({}), 502),
            "request failed with status 502"
        );
        assert_eq!(backend_message(&json!({"message": "boom"}), 500), "boom");
    }

    #[test]
    fn history_envelope_tolerates_missing_list() {
        let envelope: HistoryEnvelope =
            decode_envelope(json!({ "status": "success" })).expect("envelope should decode");
        assert!(envelope.history.is_empty());
    }

    #[test]
    fn tool_filter_is_a_case_insensitive_substring_match() {
        let tool = Tool {
            name: "read_file".to_string(),
            description: "Read a file from the workspace".to_string(),
            is_mcp: false,
        };
        assert!(tool.matches("READ"));
        assert!(tool.matches("workspace"));
        assert!(!tool.matches("delete"));
    }

    #[test]
    fn provider_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Provider::Deepseek).expect("provider should serialize"),
            json!("deepseek")
        );
        let provider: Provider =
            serde_json::from_value(json!("claude")).expect("provider should deserialize");
        assert_eq!(provider, Provider::Claude);
    }

    #[test]
    fn default_config_matches_the_backend_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.provider, Provider::Deepseek);
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.base_url.as_deref(), Some("https://api.deepseek.com"));
        assert_eq!(config.max_steps, 100);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn config_round_trips_through_the_wire_shape() {
        let config = AgentConfig::default();
        let value = serde_json::to_value(&config).expect("config should serialize");
        assert_eq!(value["provider"], "deepseek");
        let back: AgentConfig =
            serde_json::from_value(value).expect("config should deserialize");
        assert_eq!(back, config);
    }
}
