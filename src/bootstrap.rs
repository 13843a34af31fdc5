// src/bootstrap.rs
use crate::config::judge::JudgeConfig;
use crate::judge::DynJudgeClient;
use tracing::{info, warn};

pub struct JudgeRuntime {
    pub cfg: JudgeConfig,
    pub client: DynJudgeClient,
}

impl JudgeRuntime {
    pub fn new(cfg: JudgeConfig, client: DynJudgeClient) -> Self {
        // Safe diagnostics: only provider + enabled + key length
        info!(
            "judge runtime ready: provider={}, enabled={}, key_len={}",
            cfg.provider,
            cfg.enabled,
            cfg.api_key.len()
        );
        Self { cfg, client }
    }

    /// One-off smoke test of the judge round-trip. Logs only; never panics.
    pub async fn quick_probe(&self) {
        if !self.cfg.enabled {
            warn!("judge quick_probe skipped: judge is disabled in config");
            return;
        }
        let sample = "best mirrorless cameras under 1000 usd 2026";
        match self.client.judge(sample).await {
            Ok(judgment) => info!(
                needs_search = judgment.needs_search,
                fanouts = judgment.fanout_queries.len(),
                "judge quick_probe ok"
            ),
            Err(e) => warn!(error = %e, "judge quick_probe failed"),
        }
    }
}
