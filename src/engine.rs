//! # Reply Engine
//! Composition root: relevance gate → tracked post lookup → rule evaluation.
//!
//! The engine owns a `SnapshotHandle`. Evaluations grab the current `Arc<RuleSnapshot>`
//! and work on it outside the lock, so a concurrent `publish` never produces a torn view.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::error::CacheDiagnostic;
use crate::model::{InboundEvent, RuleSnapshot};
use crate::relevance::{self, dev_log_reply, Relevance};
use crate::rules::{self, RuleTrace};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("selenite_events_total", "Inbound events evaluated.");
        describe_counter!(
            "selenite_events_relevant_total",
            "Events replying to a tracked account/post pair."
        );
        describe_counter!(
            "selenite_responses_total",
            "Events for which a reply rule matched."
        );
        describe_gauge!(
            "selenite_snapshot_accounts",
            "Accounts in the currently published snapshot."
        );
    });
}

#[derive(Debug)]
struct Published {
    version: u64,
    snapshot: Arc<RuleSnapshot>,
}

/// Thread-safe slot holding the current snapshot. Clones share the slot.
#[derive(Clone, Debug)]
pub struct SnapshotHandle {
    inner: Arc<RwLock<Published>>,
}

impl Default for SnapshotHandle {
    fn default() -> Self {
        Self::new(RuleSnapshot::default())
    }
}

impl SnapshotHandle {
    pub fn new(snapshot: RuleSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Published {
                version: 0,
                snapshot: Arc::new(snapshot),
            })),
        }
    }

    /// The snapshot every new evaluation will see.
    pub fn current(&self) -> Arc<RuleSnapshot> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard.snapshot)
    }

    /// Number of snapshots published since creation.
    pub fn version(&self) -> u64 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    /// Swap in a fully built snapshot and return its version.
    pub fn publish(&self, snapshot: RuleSnapshot) -> u64 {
        let fresh = Arc::new(snapshot);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.version += 1;
        guard.snapshot = fresh;
        guard.version
    }
}

/// Followed account ids, either as a list or a comma-joined string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FollowedIds {
    List(Vec<String>),
    Joined(String),
}

/// Followed ids plus any cache condition worth reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Followed {
    pub ids: FollowedIds,
    pub diagnostics: Vec<CacheDiagnostic>,
}

/// Everything the engine found out about one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Explanation {
    pub relevance: Relevance,
    pub account_id: Option<String>,
    pub post_id: Option<String>,
    pub trace: Option<RuleTrace>,
}

impl Explanation {
    pub fn response(&self) -> Option<&str> {
        self.trace.as_ref().and_then(|t| t.response.as_deref())
    }
}

#[derive(Clone, Debug, Default)]
pub struct ReplyEngine {
    snapshot: SnapshotHandle,
}

impl ReplyEngine {
    /// Engine with no snapshot loaded yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: RuleSnapshot) -> Self {
        let engine = Self::new();
        engine.publish(snapshot);
        engine
    }

    pub fn handle(&self) -> &SnapshotHandle {
        &self.snapshot
    }

    pub fn snapshot(&self) -> Arc<RuleSnapshot> {
        self.snapshot.current()
    }

    pub fn version(&self) -> u64 {
        self.snapshot.version()
    }

    /// Publish a new snapshot; in-flight evaluations finish on the old one.
    pub fn publish(&self, snapshot: RuleSnapshot) -> u64 {
        ensure_metrics_described();
        let accounts = snapshot.entries().len();
        let version = self.snapshot.publish(snapshot);
        gauge!("selenite_snapshot_accounts").set(accounts as f64);
        debug!(target: "selenite::engine", version, accounts, "snapshot published");
        version
    }

    /// Cache conditions of the current snapshot; empty when it has entries.
    pub fn diagnose(&self) -> Vec<CacheDiagnostic> {
        diagnose_snapshot(&self.snapshot())
    }

    /// Ids of every account in the snapshot, in snapshot order.
    pub fn get_followed_account_ids(&self, as_array: bool) -> Followed {
        let snap = self.snapshot();
        let diagnostics = diagnose_snapshot(&snap);
        for d in &diagnostics {
            warn!(target: "selenite::engine", as_array, "get_followed_account_ids: {d}");
        }

        let list = snap.account_ids();
        let ids = if as_array {
            FollowedIds::List(list)
        } else {
            FollowedIds::Joined(list.join(","))
        };
        Followed { ids, diagnostics }
    }

    /// Relevance, matched post and rule trace for `event`.
    pub fn explain(&self, event: &InboundEvent) -> Explanation {
        let snap = self.snapshot();
        let account = event.in_reply_to_account_id.as_deref();
        let post_id = event.in_reply_to_post_id.as_deref();

        let mut out = Explanation {
            relevance: relevance::assess(&snap, account, post_id),
            ..Explanation::default()
        };
        if !out.relevance.is_full() {
            return out;
        }

        // Full relevance implies the post id matched somewhere in this snapshot.
        if let Some((acc, post)) = post_id.and_then(|id| snap.find_post(id)) {
            out.account_id = Some(acc.id.clone());
            out.post_id = Some(post.id.clone());
            out.trace = Some(rules::evaluate_traced(post, &event.text));
        }
        out
    }

    /// Canned response for `event`, or `None` when nothing applies.
    pub fn get_response(&self, event: &InboundEvent) -> Option<String> {
        ensure_metrics_described();
        counter!("selenite_events_total").increment(1);

        let explanation = self.explain(event);
        if !explanation.relevance.is_full() {
            return None;
        }
        counter!("selenite_events_relevant_total").increment(1);

        let markers = explanation
            .trace
            .as_ref()
            .map(RuleTrace::matched_markers)
            .unwrap_or_default();
        let response = explanation.response().map(str::to_owned);
        if response.is_some() {
            counter!("selenite_responses_total").increment(1);
            dev_log_reply("matched", &event.text, explanation.relevance.score, &markers);
        } else {
            dev_log_reply("no_rule", &event.text, explanation.relevance.score, &markers);
        }
        response
    }
}

// Any snapshot without entries is an uninitialized cache; a loaded one also
// gets EmptyFollowList so operators can tell a bad store from a missing load.
fn diagnose_snapshot(snap: &RuleSnapshot) -> Vec<CacheDiagnostic> {
    if !snap.is_empty() {
        return Vec::new();
    }
    let mut out = vec![CacheDiagnostic::UninitializedCache];
    if snap.is_initialized() {
        out.push(CacheDiagnostic::EmptyFollowList);
    }
    out
}
