//! CCP Scoring Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the judge client, routes, and metrics.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use search_ccp_analyzer::bootstrap::JudgeRuntime;
use search_ccp_analyzer::{api, config, judge, metrics};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - CCP_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("CCP_DEV_LOG").ok().is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("search_ccp_analyzer=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This is where
    // OPENAI_API_KEY comes from when there is no config file.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = config::judge::load();
    let client = judge::build_judge_client(&cfg);
    tracing::info!(provider = client.provider_name(), "judge client ready");

    // Opt-in startup round-trip against the real judge.
    if std::env::var("CCP_QUICK_PROBE").ok().as_deref() == Some("1") {
        JudgeRuntime::new(cfg.clone(), client.clone())
            .quick_probe()
            .await;
    }

    let metrics = metrics::Metrics::init(cfg.timeout_secs);

    let state = api::AppState { judge: client };
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
