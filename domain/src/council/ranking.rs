//! Verdict parsing and Borda-count aggregation.
//!
//! These functions turn free-form judge responses into structured orderings
//! and reduce a set of verdicts into one de-anonymized leaderboard. They are
//! pure domain logic - no I/O, no session management, just text pattern
//! matching and arithmetic.

use super::labels::LabelMap;
use super::value_objects::{RankingVerdict, StageOneResponse};
use crate::core::model::Model;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One row of the aggregate leaderboard, sorted descending by score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedModel {
    pub model: Model,
    /// Total Borda points across all verdicts
    pub score: u64,
    /// 1-based position after sorting
    pub rank: usize,
}

/// Parse a judge response into an ordered list of known labels, best first.
///
/// Preferred format is an explicit ranking line such as
/// `FINAL RANKING: B > A > C`; when several qualify, the last one wins
/// (models often restate the ranking in their closing summary). Falls back
/// to the order in which labels are first mentioned as standalone tokens.
/// Unknown labels are dropped, duplicates keep their first position.
pub fn parse_ranked_labels(response: &str, labels: &LabelMap) -> Vec<String> {
    let mut best: Option<Vec<String>> = None;

    for line in response.lines() {
        if !line.contains('>') {
            continue;
        }
        let parsed = parse_ranking_line(line, labels);
        if parsed.len() >= 2 {
            best = Some(parsed);
        }
    }

    if let Some(ranking) = best {
        return ranking;
    }

    first_mention_order(response, labels)
}

/// Parse a single `X > Y > Z` line, tolerating a leading `RANKING:` prefix.
fn parse_ranking_line(line: &str, labels: &LabelMap) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    for segment in line.split('>') {
        // The first segment may carry a prefix ("FINAL RANKING: B");
        // the label is always the last word of the segment.
        let Some(word) = segment.split_whitespace().last() else {
            continue;
        };
        let token = word.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if labels.model_for(token).is_some() && seen.insert(token.to_string()) {
            ordered.push(token.to_string());
        }
    }

    ordered
}

/// Order labels by first mention as a standalone token in the text.
fn first_mention_order(response: &str, labels: &LabelMap) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    for token in response.split(|c: char| !c.is_ascii_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        if labels.model_for(token).is_some() && seen.insert(token.to_string()) {
            ordered.push(token.to_string());
        }
    }

    ordered
}

/// Reduce the verdict set into one de-anonymized leaderboard.
///
/// Borda count: with `k` anonymized answers, the first-ranked label earns
/// `k-1` points, the second `k-2`, down to 0. Points are summed per
/// underlying model across all successful verdicts; panel models never
/// referenced score 0. Pure and idempotent - the same verdicts always
/// produce the same ordering.
///
/// Ties break deterministically: models whose stage-1 call produced a usable
/// answer sort before those that failed, then by lexical model id.
pub fn aggregate_rankings(
    verdicts: &[RankingVerdict],
    labels: &LabelMap,
    stage1: &[StageOneResponse],
) -> Vec<RankedModel> {
    let k = labels.len();
    let mut points: HashMap<Model, u64> = HashMap::new();

    for verdict in verdicts.iter().filter(|v| v.succeeded) {
        let mut counted = HashSet::new();
        for (position, label) in verdict.ranking.iter().enumerate() {
            if position >= k {
                break;
            }
            if !counted.insert(label.as_str()) {
                continue;
            }
            if let Some(model) = labels.model_for(label) {
                *points.entry(model.clone()).or_default() += (k - 1 - position) as u64;
            }
        }
    }

    let usable: HashSet<&Model> = stage1
        .iter()
        .filter(|r| r.is_usable())
        .map(|r| &r.model)
        .collect();

    let mut rows: Vec<RankedModel> = stage1
        .iter()
        .map(|r| RankedModel {
            model: r.model.clone(),
            score: points.get(&r.model).copied().unwrap_or(0),
            rank: 0,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| usable.contains(&b.model).cmp(&usable.contains(&a.model)))
            .then_with(|| a.model.as_str().cmp(b.model.as_str()))
    });

    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }

    rows
}
