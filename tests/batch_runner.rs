// tests/batch_runner.rs
//
// Batch runner behavior against a scripted judge: row ordering, per-item
// failure isolation, sentinel rows, and score population.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use search_ccp_analyzer::batch::{run_batch, NO_ERROR, NO_SEARCH_SENTINEL};
use search_ccp_analyzer::judge::{JudgeClient, JudgeError, Judgment};

/// Judge stub with a canned answer per query; records every query it sees.
struct ScriptedJudge {
    script: HashMap<String, Result<Judgment, JudgeError>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedJudge {
    fn new(script: Vec<(&str, Result<Judgment, JudgeError>)>) -> Self {
        Self {
            script: script
                .into_iter()
                .map(|(q, r)| (q.to_string(), r))
                .collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl JudgeClient for ScriptedJudge {
    async fn judge(&self, query: &str) -> Result<Judgment, JudgeError> {
        self.seen.lock().unwrap().push(query.to_string());
        self.script
            .get(query)
            .cloned()
            .unwrap_or_else(|| Err(JudgeError::Transport("unscripted query".to_string())))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

fn triggered(fanouts: usize, snippets: usize, urls: usize) -> Judgment {
    Judgment {
        needs_search: true,
        fanout_queries: (0..fanouts).map(|i| format!("q{}", i + 1)).collect(),
        snippets: (0..snippets).map(|i| format!("s{}", i + 1)).collect(),
        urls: (0..urls).map(|i| format!("https://u{}.example", i + 1)).collect(),
    }
}

fn untriggered() -> Judgment {
    Judgment::default()
}

#[tokio::test]
async fn one_row_per_query_in_input_order() {
    let judge = ScriptedJudge::new(vec![
        ("query one ok", Ok(triggered(2, 1, 1))),
        ("query two no search", Ok(untriggered())),
        ("query three fails", Err(JudgeError::BadStatus(429))),
        ("query four ok", Ok(triggered(1, 1, 1))),
        ("query five ok", Ok(triggered(3, 3, 3))),
    ]);
    let queries: Vec<String> = [
        "query one ok",
        "query two no search",
        "query three fails",
        "query four ok",
        "query five ok",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let rows = run_batch(&judge, &queries).await;

    assert_eq!(rows.len(), 5, "exactly one row per input");
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.index, i + 1, "indexes are 1-based and ordered");
        assert_eq!(row.query, queries[i]);
    }
}

#[tokio::test]
async fn one_bad_item_does_not_poison_neighbors() {
    let judge = ScriptedJudge::new(vec![
        ("healthy first query", Ok(triggered(3, 2, 2))),
        (
            "broken middle query",
            Err(JudgeError::Malformed("not json".to_string())),
        ),
        ("healthy last query", Ok(triggered(1, 0, 0))),
    ]);
    let queries: Vec<String> = [
        "healthy first query",
        "broken middle query",
        "healthy last query",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let rows = run_batch(&judge, &queries).await;

    assert_eq!(rows[0].error, NO_ERROR);
    assert!(rows[0].ccp.is_some());

    assert!(rows[1].error.contains("Unparseable"));
    assert_eq!(rows[1].ccp, None, "failed row carries no score");
    assert_eq!(rows[1].search_depth, None);

    assert_eq!(rows[2].error, NO_ERROR);
    assert!(rows[2].ccp.is_some());
}

#[tokio::test]
async fn invalid_length_never_reaches_the_judge() {
    let judge = ScriptedJudge::new(vec![("a valid query here", Ok(triggered(1, 1, 1)))]);
    let queries: Vec<String> = ["abc", "a valid query here"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = run_batch(&judge, &queries).await;

    assert!(rows[0].error.contains("4-100"));
    assert_eq!(rows[0].ccp, None);
    assert_eq!(
        judge.seen(),
        vec!["a valid query here".to_string()],
        "the invalid query must not trigger a judge call"
    );
}

#[tokio::test]
async fn untriggered_row_gets_sentinel_and_hard_zero() {
    let judge = ScriptedJudge::new(vec![
        ("what is the capital of France", Ok(untriggered())),
        ("best sunglasses 2025 list", Ok(triggered(3, 2, 2))),
    ]);
    let queries: Vec<String> = ["what is the capital of France", "best sunglasses 2025 list"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = run_batch(&judge, &queries).await;

    let quiet = &rows[0];
    assert_eq!(quiet.ccp, Some(0));
    assert_eq!(quiet.search_depth, Some(0));
    assert_eq!(quiet.fanouts, NO_SEARCH_SENTINEL);
    assert_eq!(quiet.snippets, NO_SEARCH_SENTINEL);
    assert_eq!(quiet.urls, NO_SEARCH_SENTINEL);
    assert_eq!(quiet.error, NO_ERROR);

    // f=3, s=2, u=2 -> 0.4*0.5 + 0.35*0.4 + 0.25*0.4 = 0.44 -> 48%.
    let busy = &rows[1];
    assert_eq!(busy.ccp, Some(48));
    assert_eq!(busy.search_depth, Some(7));
    assert_eq!(busy.fanouts, "q1\nq2\nq3");
    assert_eq!(busy.snippets, "s1\ns2");
    assert_eq!(busy.error, NO_ERROR);
}

#[tokio::test]
async fn saturated_judgment_caps_at_ninety() {
    let judge = ScriptedJudge::new(vec![("deep research style query", Ok(triggered(6, 5, 5)))]);
    let queries: Vec<String> = ["deep research style query", "deep research style query"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = run_batch(&judge, &queries).await;

    for row in &rows {
        assert_eq!(row.ccp, Some(90));
        assert_eq!(row.search_depth, Some(16));
    }
}
