// src/relevance.rs
//! Relevance gate: does an inbound event reply to something we track?
//!
//! Also hosts the dev-only, anonymized logging helpers shared with the engine.

use serde::Serialize;
use tracing::info;

use crate::model::RuleSnapshot;

/// Score at which an event counts as a reply to a tracked account/post pair.
pub const FULLY_RELEVANT: u8 = 2;

pub const ENV_DEV_LOG: &str = "SELENITE_DEV_LOG";

// Dev logging gate: SELENITE_DEV_LOG=1 AND dev env (debug or SHUTTLE_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Short SHA-256 prefix so reply text can be correlated in logs without being stored.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Minimal, anonymized dev logger for reply evaluations.
pub(crate) fn dev_log_reply(event: &str, text: &str, score: u8, rule_hits: &[String]) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(text);
    let hits = truncate_vec(rule_hits, 5);
    // Never log raw text. Only hashed id + short lists.
    info!(
        target: "selenite::relevance",
        %id, score, event,
        rules = ?hits
    );
}

pub(crate) fn truncate_vec<T: ToString>(v: &[T], max: usize) -> Vec<String> {
    v.iter().take(max).map(|x| x.to_string()).collect()
}

/// Result of relevance evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Relevance {
    pub score: u8,
    pub account_matched: bool,
    pub post_matched: bool,
}

impl Relevance {
    pub fn is_full(&self) -> bool {
        self.score == FULLY_RELEVANT
    }
}

/// Check both reply targets against the snapshot.
///
/// The account hit and the post hit are counted independently: they do not have to
/// belong to the same account/post pair. Each side contributes at most one point.
pub fn assess(
    snapshot: &RuleSnapshot,
    in_reply_to_account_id: Option<&str>,
    in_reply_to_post_id: Option<&str>,
) -> Relevance {
    let mut rel = Relevance::default();

    for entry in snapshot.entries() {
        if !rel.account_matched && in_reply_to_account_id == Some(entry.account.id.as_str()) {
            rel.account_matched = true;
        }
        if !rel.post_matched
            && entry
                .posts
                .iter()
                .any(|p| in_reply_to_post_id == Some(p.id.as_str()))
        {
            rel.post_matched = true;
        }
        if rel.account_matched && rel.post_matched {
            break;
        }
    }

    rel.score = u8::from(rel.account_matched) + u8::from(rel.post_matched);
    rel
}

/// Relevance score in `{0, 1, 2}`.
pub fn score(
    snapshot: &RuleSnapshot,
    in_reply_to_account_id: Option<&str>,
    in_reply_to_post_id: Option<&str>,
) -> u8 {
    assess(snapshot, in_reply_to_account_id, in_reply_to_post_id).score
}
