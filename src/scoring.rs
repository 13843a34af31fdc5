//! Score normalization: turns a variable-shaped [`Judgment`] into a bounded
//! CCP percentage.
//!
//! Two deliberately independent policies live here. The batch policy is a
//! capped-linear blend (cheap to read in a spreadsheet column); the single
//! policy is a logarithmic-saturation blend (shown with more granularity, so
//! it should resist spikes from one unusually long list). Keep them as two
//! named functions; do not merge them into one parameterized formula.

use std::collections::HashSet;

use crate::judge::Judgment;

// Empirical tuning constants carried over from the original calibration;
// there is no principled derivation behind them.
const FANOUT_CAP: f64 = 6.0;
const SNIPPET_CAP: f64 = 5.0;
const URL_CAP: f64 = 5.0;
const BATCH_W_FANOUT: f64 = 0.40;
const BATCH_W_SNIPPET: f64 = 0.35;
const BATCH_W_URL: f64 = 0.25;
/// Soft floor: a triggered search never reports near-zero confidence.
const BATCH_FLOOR: f64 = 0.15;
/// Span above the floor; floor + span = 0.90 ceiling before rounding.
const BATCH_SPAN: f64 = 0.75;

const SINGLE_W_FANOUT: f64 = 0.15;
const SINGLE_W_SNIPPET: f64 = 0.25;
const SINGLE_W_URL: f64 = 0.35;
const SINGLE_W_GATE: f64 = 0.25;

/// Output of the batch policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreResult {
    /// Normalized percentage in [0, 100].
    pub ccp: u8,
    /// Fanout + snippet + URL counts, undeduplicated. Coarse effort proxy.
    pub search_depth: usize,
}

fn distinct_urls(urls: &[String]) -> usize {
    urls.iter().map(String::as_str).collect::<HashSet<_>>().len()
}

/// Batch policy: capped-linear blend. Call only for judgments where a search
/// was actually triggered; the runner hard-sets 0/0 for the rest.
///
/// Each count saturates at its cap, the weighted blend lands in [0,1], and
/// the floor/span squeeze maps it into [15, 90] after rounding.
pub fn batch_ccp(judgment: &Judgment) -> ScoreResult {
    let f = judgment.fanout_queries.len();
    let s = judgment.snippets.len();
    let u = distinct_urls(&judgment.urls);

    let fanout_score = (f as f64 / FANOUT_CAP).min(1.0);
    let snippet_score = (s as f64 / SNIPPET_CAP).min(1.0);
    let url_score = (u as f64 / URL_CAP).min(1.0);

    let raw =
        BATCH_W_FANOUT * fanout_score + BATCH_W_SNIPPET * snippet_score + BATCH_W_URL * url_score;

    let ccp = ((BATCH_FLOOR + raw * BATCH_SPAN) * 100.0).round() as u8;
    let search_depth = f + s + judgment.urls.len();

    ScoreResult { ccp, search_depth }
}

/// Single-query policy: logarithmic saturation blend, evaluated
/// unconditionally. With `needs_search == false` the lists are clamped empty,
/// so every term is zero and the score is 0 without a special case.
pub fn single_ccp(judgment: &Judgment) -> u8 {
    let f = judgment.fanout_queries.len() as f64;
    let s = judgment.snippets.len() as f64;
    let u = distinct_urls(&judgment.urls) as f64;
    let gate = if judgment.needs_search { 1.0 } else { 0.0 };

    let raw = SINGLE_W_FANOUT * (1.0 + f).ln()
        + SINGLE_W_SNIPPET * (1.0 + s).ln()
        + SINGLE_W_URL * (1.0 + u).ln()
        + SINGLE_W_GATE * gate;

    (raw.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triggered(fanouts: usize, snippets: usize, urls: &[&str]) -> Judgment {
        Judgment {
            needs_search: true,
            fanout_queries: (0..fanouts).map(|i| format!("q{i}")).collect(),
            snippets: (0..snippets).map(|i| format!("s{i}")).collect(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn batch_saturates_at_90() {
        let j = triggered(6, 5, &["u1", "u2", "u3", "u4", "u5"]);
        let r = batch_ccp(&j);
        assert_eq!(r.ccp, 90);
        assert_eq!(r.search_depth, 16);
    }

    #[test]
    fn batch_excess_counts_stay_capped() {
        let j = triggered(12, 9, &["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!(batch_ccp(&j).ccp, 90);
    }

    #[test]
    fn batch_floor_applies_to_minimal_search() {
        // One fanout, nothing else: raw = 0.4/6, ccp = round((0.15 + 0.05) * 100).
        let j = triggered(1, 0, &[]);
        let r = batch_ccp(&j);
        assert_eq!(r.ccp, 20);
        assert_eq!(r.search_depth, 1);
        assert!(r.ccp >= 15);
    }

    #[test]
    fn batch_moderate_search_scores_midrange() {
        // f=3, s=2, u=2 -> raw = 0.2 + 0.14 + 0.10 = 0.44 -> 48%.
        let j = triggered(3, 2, &["u1", "u2"]);
        let r = batch_ccp(&j);
        assert_eq!(r.ccp, 48);
        assert_eq!(r.search_depth, 7);
    }

    #[test]
    fn duplicate_urls_count_once_for_score_but_fully_for_depth() {
        let dup = triggered(0, 0, &["a", "a", "b"]);
        let uniq = triggered(0, 0, &["a", "b"]);
        assert_eq!(batch_ccp(&dup).ccp, batch_ccp(&uniq).ccp);
        assert_eq!(batch_ccp(&dup).search_depth, 3);
        assert_eq!(single_ccp(&dup), single_ccp(&uniq));
    }

    #[test]
    fn single_no_search_scores_zero() {
        let j = Judgment::default();
        assert_eq!(single_ccp(&j), 0);
    }

    #[test]
    fn single_small_search_scores_midhigh() {
        // ln(2) per term: 0.75*0.6931 + 0.25 ~= 0.7699 -> 77%.
        let j = triggered(1, 1, &["u"]);
        assert_eq!(single_ccp(&j), 77);
    }

    #[test]
    fn single_saturated_search_clamps_to_100() {
        let j = triggered(6, 5, &["u1", "u2", "u3", "u4", "u5"]);
        assert_eq!(single_ccp(&j), 100);
    }

    #[test]
    fn policies_are_pure() {
        let j = triggered(3, 2, &["u1", "u2"]);
        assert_eq!(batch_ccp(&j), batch_ccp(&j));
        assert_eq!(single_ccp(&j), single_ccp(&j));
    }
}
