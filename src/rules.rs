// src/rules.rs
//! Reply rule evaluation for a single tracked post.
//!
//! Reply text is split on whitespace (no punctuation stripping, no stemming). For each
//! rule, every (word, search term) pair whose similarity is above
//! `WORD_SIMILARITY_THRESHOLD` adds one to the rule's match count; a word may count
//! toward several terms and a term may be hit by several words.
//!
//! Policies:
//! - `all`:     match count == number of terms
//! - `partial`: match count / number of terms > `PARTIAL_MATCH_RATIO`
//! - `any`:     match count > 0
//!
//! All rules are evaluated and the **last** matching rule (declaration order) wins.

use serde::Serialize;

use crate::fuzzy::similarity;
use crate::model::{MatchPolicy, ReplyRule, TrackedPost};

/// A word matches a search term when similarity is strictly above this.
pub const WORD_SIMILARITY_THRESHOLD: f64 = 0.75;
/// `partial` fires when strictly more than this share of terms matched.
pub const PARTIAL_MATCH_RATIO: f64 = 0.5;

/// Per-rule outcome, in rule order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    pub index: usize,
    pub policy: MatchPolicy,
    pub match_count: usize,
    pub term_count: usize,
    pub matched: bool,
}

/// Full evaluation trace for a post; `response` is what `evaluate` returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleTrace {
    pub rules: Vec<RuleOutcome>,
    pub response: Option<String>,
}

impl RuleTrace {
    /// Short `rule:<index>:<policy>:<count>/<terms>` markers for matched rules.
    pub fn matched_markers(&self) -> Vec<String> {
        self.rules
            .iter()
            .filter(|r| r.matched)
            .map(|r| {
                format!(
                    "rule:{}:{}:{}/{}",
                    r.index, r.policy, r.match_count, r.term_count
                )
            })
            .collect()
    }
}

/// Number of (word, term) pairs above the similarity threshold.
pub fn count_matches(words: &[&str], terms: &[String]) -> usize {
    words
        .iter()
        .map(|w| {
            terms
                .iter()
                .filter(|t| similarity(w, t) > WORD_SIMILARITY_THRESHOLD)
                .count()
        })
        .sum()
}

/// Whether `match_count` satisfies `policy` for a rule with `term_count` terms.
pub fn policy_satisfied(policy: MatchPolicy, match_count: usize, term_count: usize) -> bool {
    if term_count == 0 {
        return false;
    }
    match policy {
        MatchPolicy::All => match_count == term_count,
        MatchPolicy::Partial => (match_count as f64 / term_count as f64) > PARTIAL_MATCH_RATIO,
        MatchPolicy::Any => match_count > 0,
    }
}

fn evaluate_rule(index: usize, rule: &ReplyRule, words: &[&str]) -> RuleOutcome {
    let match_count = count_matches(words, &rule.search_terms);
    let term_count = rule.search_terms.len();
    RuleOutcome {
        index,
        policy: rule.match_policy,
        match_count,
        term_count,
        matched: policy_satisfied(rule.match_policy, match_count, term_count),
    }
}

/// Evaluate every rule of `post` against `text`, keeping per-rule stats.
pub fn evaluate_traced(post: &TrackedPost, text: &str) -> RuleTrace {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut trace = RuleTrace::default();

    for (index, rule) in post.replies.iter().enumerate() {
        let outcome = evaluate_rule(index, rule, &words);
        if outcome.matched {
            // Later matches overwrite earlier ones.
            trace.response = Some(rule.response.clone());
        }
        trace.rules.push(outcome);
    }

    trace
}

/// Response of the last matching rule, or `None` when no rule matches.
pub fn evaluate(post: &TrackedPost, text: &str) -> Option<String> {
    evaluate_traced(post, text).response
}
