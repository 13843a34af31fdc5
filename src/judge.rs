//! Judgment-source adapter: provider abstraction over the upstream model that
//! decides whether a query would trigger web search, plus defensive parsing of
//! its reply. The model output is untrusted text; everything here assumes it
//! may be fenced, truncated, or missing fields.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::judge::JudgeConfig;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Instruction contract v2. Sent verbatim as the system message with every
/// judgment request. Version bumps require re-checking the JSON schema below.
pub const INSTRUCTION_CONTRACT: &str = r#"
You are simulating an AI assistant's internal web-search reasoning.

Step 1: Confidence check
Estimate the assistant's confidence answering the query from training alone:
- HIGH (well-known, evergreen)
- MEDIUM (some ambiguity / comparison)
- LOW (exploratory, niche, fast-changing)

Step 2: Search decision
Set needs_search = true ONLY if confidence is MEDIUM or LOW, or if the query:
- Is time-sensitive
- Needs verification
- Is exploratory / research-oriented

Step 3 (ONLY IF needs_search = true):
Scale depth based on confidence:
- HIGH -> shallow search
- MEDIUM -> moderate search
- LOW -> deep, broad search

Generate variable (not fixed) numbers of:
- fanout queries
- snippets
- realistic, well-known source URLs

Rules:
- Do NOT browse the web
- Behavioral simulation only
- Output sizes must vary naturally
- Return STRICT JSON only

JSON schema:
{
  "needs_search": boolean,
  "fanout_queries": string[],
  "snippets": string[],
  "urls": string[]
}
"#;

/// One query's judgment: the search-trigger decision plus its supporting
/// artifacts. Lists are order-preserving and already clamped: when
/// `needs_search` is false they are guaranteed empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    #[serde(default)]
    pub needs_search: bool,
    #[serde(default)]
    pub fanout_queries: Vec<String>,
    #[serde(default)]
    pub snippets: Vec<String>,
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Adapter failure modes, kept distinct so handlers can map them to
/// different HTTP statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JudgeError {
    /// No credential configured; the service cannot reach the model at all.
    MissingApiKey,
    /// Connection/timeout-level failure on the outbound call.
    Transport(String),
    /// The model endpoint answered with a non-success status.
    BadStatus(u16),
    /// The reply body (or the model's message inside it) was not parseable.
    Malformed(String),
}

impl std::fmt::Display for JudgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JudgeError::MissingApiKey => {
                write!(f, "Missing OPENAI_API_KEY; judgment service unavailable")
            }
            JudgeError::Transport(msg) => write!(f, "Judgment request failed: {msg}"),
            JudgeError::BadStatus(code) => write!(f, "Judgment service returned HTTP {code}"),
            JudgeError::Malformed(msg) => write!(f, "Unparseable judgment payload: {msg}"),
        }
    }
}

impl std::error::Error for JudgeError {}

/// Trait object used by handlers and the batch runner.
#[async_trait]
pub trait JudgeClient: Send + Sync {
    /// Consult the model about one query. One call, no retries; the caller
    /// decides how to isolate the failure.
    async fn judge(&self, query: &str) -> Result<Judgment, JudgeError>;
    /// Provider name for diagnostics/logs.
    fn provider_name(&self) -> &'static str;
    /// False when the client can never succeed (no credential); lets
    /// endpoints fail fast before any per-query work.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Convenient alias used by callers.
pub type DynJudgeClient = Arc<dyn JudgeClient>;

/// Factory: build a client according to config and environment.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock client.
/// * Else if the config is disabled or carries no key, returns a client that
///   always reports the missing-credential error.
/// * Else builds the real OpenAI-backed provider.
pub fn build_judge_client(config: &JudgeConfig) -> DynJudgeClient {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockJudge::canned());
    }

    if !config.enabled || config.api_key.is_empty() {
        return Arc::new(DisabledJudge);
    }

    match config.provider.as_str() {
        "openai" => Arc::new(OpenAiJudge::new(config)),
        _ => Arc::new(DisabledJudge),
    }
}

// ------------------------------------------------------------
// Providers
// ------------------------------------------------------------

/// OpenAI provider (Chat Completions API). Requires an API key; applies
/// bounded connect/total timeouts so one slow query cannot stall a batch.
pub struct OpenAiJudge {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiJudge {
    pub fn new(config: &JudgeConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("search-ccp-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl JudgeClient for OpenAiJudge {
    async fn judge(&self, query: &str) -> Result<Judgment, JudgeError> {
        if self.api_key.is_empty() {
            return Err(JudgeError::MissingApiKey);
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: INSTRUCTION_CONTRACT,
                },
                Msg {
                    role: "user",
                    content: query,
                },
            ],
            temperature: 0.0,
        };

        let resp = self
            .http
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(JudgeError::BadStatus(status.as_u16()));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| JudgeError::Malformed(e.to_string()))?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("");
        parse_judgment(content)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Always fails with the missing-credential error; used when no key is set.
pub struct DisabledJudge;

#[async_trait]
impl JudgeClient for DisabledJudge {
    async fn judge(&self, _query: &str) -> Result<Judgment, JudgeError> {
        Err(JudgeError::MissingApiKey)
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Deterministic provider for tests and local runs.
#[derive(Clone)]
pub struct MockJudge {
    pub fixed: Judgment,
}

impl MockJudge {
    /// Fixture with a plausibly-shaped triggered judgment.
    pub fn canned() -> Self {
        Self {
            fixed: Judgment {
                needs_search: true,
                fanout_queries: vec![
                    "example fanout one".to_string(),
                    "example fanout two".to_string(),
                    "example fanout three".to_string(),
                ],
                snippets: vec![
                    "Synthetic snippet A.".to_string(),
                    "Synthetic snippet B.".to_string(),
                ],
                urls: vec![
                    "https://example.com/a".to_string(),
                    "https://example.org/b".to_string(),
                ],
            },
        }
    }
}

#[async_trait]
impl JudgeClient for MockJudge {
    async fn judge(&self, _query: &str) -> Result<Judgment, JudgeError> {
        Ok(self.fixed.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Defensive parse boundary
// ------------------------------------------------------------

/// Parse a raw model reply into a [`Judgment`].
///
/// Absent list fields default to empty, a bare `{}` is a valid "no search"
/// answer, and whatever lists arrive alongside `needs_search: false` are
/// dropped. Anything that is not JSON after fence-stripping is `Malformed`.
pub fn parse_judgment(raw: &str) -> Result<Judgment, JudgeError> {
    let cleaned = strip_code_fences(raw);
    let mut parsed: Judgment =
        serde_json::from_str(cleaned).map_err(|e| JudgeError::Malformed(e.to_string()))?;
    if !parsed.needs_search {
        parsed.fanout_queries.clear();
        parsed.snippets.clear();
        parsed.urls.clear();
    }
    Ok(parsed)
}

/// Models often wrap "STRICT JSON" in markdown fences anyway.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}
