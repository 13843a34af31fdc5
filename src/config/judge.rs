// src/config/judge.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

/// Runtime config for the judgment-source client, loaded from
/// `config/judge.json` when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    pub enabled: bool,
    /// "openai" (case-insensitive). Unknown providers disable the client.
    pub provider: String,
    /// "ENV" means: read from OPENAI_API_KEY.
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Total per-call timeout. One slow query must not stall a whole batch.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "openai".to_string(),
            api_key: String::new(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl JudgeConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: JudgeConfig = serde_json::from_str(&data)?;

        // Normalize provider
        cfg.provider = cfg.provider.to_lowercase();

        // Resolve api key if "ENV"
        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "openai" => env::var("OPENAI_API_KEY")
                    .map_err(|_| anyhow::anyhow!("Missing OPENAI_API_KEY env var"))?,
                other => anyhow::bail!("Unsupported provider in config: {other}"),
            };
        }

        // Sanitize timeout
        if cfg.timeout_secs == 0 {
            cfg.timeout_secs = default_timeout_secs();
        }

        Ok(cfg)
    }

    /// Env-driven fallback: enabled exactly when a key is present.
    pub fn from_env() -> Self {
        let api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        Self {
            enabled: !api_key.is_empty(),
            api_key,
            ..Self::default()
        }
    }
}

/// Load `config/judge.json`, falling back to the env-driven default so the
/// service still boots without a config file (endpoints then report the
/// missing credential instead of crashing at startup).
pub fn load() -> JudgeConfig {
    match JudgeConfig::load_from_file("config/judge.json") {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!(error = %err, "judge config file unavailable, using env defaults");
            JudgeConfig::from_env()
        }
    }
}
