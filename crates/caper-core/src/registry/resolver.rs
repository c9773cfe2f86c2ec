//! RunResolver — map user queries (run ids and/or labels, with `?` and `*`
//! wildcards) onto runs from a single registry snapshot.
//!
//! The result always follows the snapshot's order and never contains the
//! same run twice, whatever order the patterns came in or however many of
//! them a run satisfies.

use std::collections::HashSet;

use glob::{MatchOptions, Pattern};

use super::summary::RunSummary;
use crate::error::CaperError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A single user query compiled to a glob.
#[derive(Debug, Clone)]
struct RunPattern {
    raw: String,
    pattern: Option<Pattern>,
}

impl RunPattern {
    fn new(raw: &str) -> Self {
        let pattern = match Pattern::new(&to_glob(raw)) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("[Resolver] Pattern '{}' compared literally: {}", raw, e);
                None
            }
        };
        Self {
            raw: raw.to_string(),
            pattern,
        }
    }

    fn matches(&self, candidate: &str) -> bool {
        match &self.pattern {
            Some(p) => p.matches_with(candidate, MATCH_OPTIONS),
            None => self.raw == candidate,
        }
    }

    /// Matches the run's id, or its label when it has one.
    fn matches_run(&self, run: &RunSummary) -> bool {
        self.matches(&run.id) || run.label.as_deref().is_some_and(|l| self.matches(l))
    }
}

/// Only `?` and `*` are wildcards; brackets match themselves.
/// Runs of `*` collapse into one so `**` never reads as a recursive glob.
fn to_glob(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_star = false;
    for c in raw.chars() {
        match c {
            '*' if prev_star => continue,
            '[' => out.push_str("[[]"),
            ']' => out.push_str("[]]"),
            _ => out.push(c),
        }
        prev_star = c == '*';
    }
    out
}

/// Select runs from `snapshot` matching any of `patterns`.
///
/// An empty pattern list selects the whole snapshot.
pub fn resolve_runs(snapshot: &[RunSummary], patterns: &[String]) -> Vec<RunSummary> {
    if patterns.is_empty() {
        return snapshot.to_vec();
    }

    let compiled: Vec<RunPattern> = patterns.iter().map(|p| RunPattern::new(p)).collect();

    let mut matched: HashSet<&str> = HashSet::new();
    for run in snapshot {
        if compiled.iter().any(|p| p.matches_run(run)) {
            matched.insert(run.id.as_str());
        }
    }

    let mut result = Vec::with_capacity(matched.len());
    for run in snapshot {
        // remove() so a duplicated registry entry is emitted once
        if matched.remove(run.id.as_str()) {
            result.push(run.clone());
        }
    }

    tracing::debug!(
        "[Resolver] {} of {} run(s) matched {:?}",
        result.len(),
        snapshot.len(),
        patterns
    );
    result
}

/// Describe-style callers need exactly one run.
pub fn expect_single(mut runs: Vec<RunSummary>, query: &[String]) -> Result<RunSummary, CaperError> {
    match runs.len() {
        1 => Ok(runs.remove(0)),
        0 => Err(CaperError::NoMatchingRun(query.join(" "))),
        count => Err(CaperError::AmbiguousRuns {
            query: query.join(" "),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Vec<RunSummary> {
        vec![
            RunSummary::new("wf_1").with_label("alice-run"),
            RunSummary::new("wf_2").with_label("bob-run"),
            RunSummary::new("wf_3"),
        ]
    }

    fn ids(runs: &[RunSummary]) -> Vec<&str> {
        runs.iter().map(|r| r.id.as_str()).collect()
    }

    fn patterns(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_patterns_return_full_snapshot() {
        let snap = snapshot();
        assert_eq!(resolve_runs(&snap, &[]), snap);
    }

    #[test]
    fn test_single_char_wildcard_on_ids() {
        let snap = snapshot();
        assert_eq!(
            ids(&resolve_runs(&snap, &patterns(&["wf_?"]))),
            vec!["wf_1", "wf_2", "wf_3"]
        );
    }

    #[test]
    fn test_label_pattern() {
        let snap = snapshot();
        assert_eq!(ids(&resolve_runs(&snap, &patterns(&["alice*"]))), vec!["wf_1"]);
    }

    #[test]
    fn test_result_follows_snapshot_order() {
        let snap = snapshot();
        assert_eq!(
            ids(&resolve_runs(&snap, &patterns(&["wf_2", "alice-run"]))),
            vec!["wf_1", "wf_2"]
        );
    }

    #[test]
    fn test_star_matches_everything_once() {
        let mut snap = snapshot();
        snap.reverse();
        let result = resolve_runs(&snap, &patterns(&["*", "wf_*", "*-run"]));
        assert_eq!(ids(&result), vec!["wf_3", "wf_2", "wf_1"]);
    }

    #[test]
    fn test_duplicate_registry_entries_emitted_once() {
        let mut snap = snapshot();
        snap.push(RunSummary::new("wf_1").with_label("alice-run"));
        let result = resolve_runs(&snap, &patterns(&["*"]));
        assert_eq!(ids(&result), vec!["wf_1", "wf_2", "wf_3"]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let snap = snapshot();
        assert!(resolve_runs(&snap, &patterns(&["carol*"])).is_empty());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let snap = snapshot();
        assert!(resolve_runs(&snap, &patterns(&["ALICE*"])).is_empty());
        assert!(resolve_runs(&snap, &patterns(&["WF_1"])).is_empty());
    }

    #[test]
    fn test_brackets_are_literal() {
        let snap = vec![
            RunSummary::new("a").with_label("run[1]"),
            RunSummary::new("b").with_label("run1"),
        ];
        assert_eq!(ids(&resolve_runs(&snap, &patterns(&["run[1]"]))), vec!["a"]);
        assert_eq!(ids(&resolve_runs(&snap, &patterns(&["run**"]))), vec!["a", "b"]);
    }

    #[test]
    fn test_star_crosses_slashes() {
        let snap = vec![RunSummary::new("x").with_label("proj/sample/rep1")];
        assert_eq!(ids(&resolve_runs(&snap, &patterns(&["proj*rep1"]))), vec!["x"]);
    }

    #[test]
    fn test_expect_single() {
        let q = patterns(&["wf_*"]);
        assert_eq!(expect_single(vec![RunSummary::new("wf_1")], &q).unwrap().id, "wf_1");
        assert!(matches!(
            expect_single(vec![], &q),
            Err(CaperError::NoMatchingRun(_))
        ));
        assert!(matches!(
            expect_single(snapshot(), &q),
            Err(CaperError::AmbiguousRuns { count: 3, .. })
        ));
    }
}
