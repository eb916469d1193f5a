// src/model.rs
//! Typed records: tracked accounts, their posts, reply rules, inbound events, and the
//! immutable `RuleSnapshot` the engine evaluates against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// How many fuzzy term matches a rule needs before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum MatchPolicy {
    /// Every search term must be matched.
    All,
    /// More than half of the search terms must be matched.
    Partial,
    /// At least one search term must be matched.
    Any,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "partial" => Ok(Self::Partial),
            "any" => Ok(Self::Any),
            other => Err(format!(
                "unknown match policy `{other}` (expected all | partial | any)"
            )),
        }
    }
}

impl TryFrom<String> for MatchPolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Partial => "partial",
            Self::Any => "any",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRule {
    #[serde(alias = "searchTerms")]
    pub search_terms: Vec<String>,
    #[serde(alias = "matchPolicy")]
    pub match_policy: MatchPolicy,
    /// Canned response returned when the rule fires.
    pub response: String,
}

impl ReplyRule {
    pub fn new<S: Into<String>>(
        search_terms: impl IntoIterator<Item = S>,
        match_policy: MatchPolicy,
        response: impl Into<String>,
    ) -> Self {
        Self {
            search_terms: search_terms.into_iter().map(Into::into).collect(),
            match_policy,
            response: response.into(),
        }
    }
}

/// A post whose replies are watched. `replies` order is significant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedPost {
    pub id: String,
    pub owner_account_id: String,
    pub replies: Vec<ReplyRule>,
}

/// One snapshot row: an account paired with its tracked posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    pub account: Account,
    pub posts: Vec<TrackedPost>,
}

/* ----------------------------
Persisted record shapes
---------------------------- */

/// Account record as persisted by the data layer.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    pub account: Account,
    #[serde(default)]
    pub posts: Vec<PostRecord>,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostRecord {
    pub id: String,
    #[serde(default)]
    pub replies: Vec<ReplyRule>,
}

/* ----------------------------
Inbound events
---------------------------- */

/// A reply event from the stream. Aliases accept the streaming API's field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    #[serde(default, alias = "screen_name")]
    pub author_screen_name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "in_reply_to_user_id_str")]
    pub in_reply_to_account_id: Option<String>,
    #[serde(default, alias = "in_reply_to_status_id_str")]
    pub in_reply_to_post_id: Option<String>,
    #[serde(default, alias = "id_str")]
    pub event_id: String,
}

/* ----------------------------
Snapshot
---------------------------- */

/// Counts reported by diagnostics endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotStats {
    pub accounts: usize,
    pub posts: usize,
    pub rules: usize,
}

/// Immutable point-in-time view of tracked accounts, posts and rules.
///
/// Built once per load; a refresh builds a new one and swaps it in whole.
/// `retrieved_at` is `None` only for the placeholder used before the first load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleSnapshot {
    retrieved_at: Option<DateTime<Utc>>,
    entries: Vec<SnapshotEntry>,
}

impl RuleSnapshot {
    /// Build from persisted records: skips deleted accounts, drops rules without terms,
    /// and stamps the retrieval time.
    pub fn from_records(records: Vec<AccountRecord>) -> Self {
        let entries = records
            .into_iter()
            .filter(|r| !r.deleted)
            .map(|r| {
                let owner = r.account.id.clone();
                let posts = r
                    .posts
                    .into_iter()
                    .map(|p| TrackedPost {
                        id: p.id,
                        owner_account_id: owner.clone(),
                        replies: p.replies,
                    })
                    .collect();
                SnapshotEntry {
                    account: r.account,
                    posts,
                }
            })
            .collect();
        Self::from_entries(entries)
    }

    /// Build from already-shaped entries. Post owners are re-pointed at their entry's
    /// account so the ownership invariant holds by construction.
    pub fn from_entries(entries: Vec<SnapshotEntry>) -> Self {
        let entries = entries.into_iter().map(sanitize_entry).collect();
        Self {
            retrieved_at: Some(Utc::now()),
            entries,
        }
    }

    pub fn retrieved_at(&self) -> Option<DateTime<Utc>> {
        self.retrieved_at
    }

    /// False for the pre-load placeholder.
    pub fn is_initialized(&self) -> bool {
        self.retrieved_at.is_some()
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Account ids in snapshot order.
    pub fn account_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.account.id.clone()).collect()
    }

    /// First post (in snapshot order) with the given id, together with its account.
    pub fn find_post(&self, post_id: &str) -> Option<(&Account, &TrackedPost)> {
        self.entries.iter().find_map(|e| {
            e.posts
                .iter()
                .find(|p| p.id == post_id)
                .map(|p| (&e.account, p))
        })
    }

    pub fn stats(&self) -> SnapshotStats {
        let posts = self.entries.iter().map(|e| e.posts.len()).sum();
        let rules = self
            .entries
            .iter()
            .flat_map(|e| e.posts.iter())
            .map(|p| p.replies.len())
            .sum();
        SnapshotStats {
            accounts: self.entries.len(),
            posts,
            rules,
        }
    }
}

fn sanitize_entry(mut entry: SnapshotEntry) -> SnapshotEntry {
    for post in entry.posts.iter_mut() {
        post.owner_account_id = entry.account.id.clone();
        post.replies = std::mem::take(&mut post.replies)
            .into_iter()
            .filter_map(|mut rule| {
                rule.search_terms = rule
                    .search_terms
                    .into_iter()
                    .filter(|t| !t.trim().is_empty())
                    .collect();
                if rule.search_terms.is_empty() {
                    warn!(
                        target: "selenite::model",
                        account = %entry.account.id,
                        post = %post.id,
                        "dropping reply rule without search terms"
                    );
                    return None;
                }
                Some(rule)
            })
            .collect();
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDS: &str = r#"[
        {
            "account": { "id": "1" },
            "posts": [
                {
                    "id": "100",
                    "replies": [
                        { "searchTerms": ["hello", "world"], "matchPolicy": "ALL", "response": "hi" },
                        { "search_terms": ["  ", ""], "match_policy": "any", "response": "never" }
                    ]
                }
            ]
        },
        { "account": { "id": "2" }, "deleted": true },
        { "account": { "id": "3" } }
    ]"#;

    #[test]
    fn records_become_snapshot() {
        let records: Vec<AccountRecord> = serde_json::from_str(RECORDS).expect("parse");
        let snap = RuleSnapshot::from_records(records);

        assert!(snap.is_initialized());
        assert_eq!(snap.account_ids(), vec!["1".to_string(), "3".to_string()]);

        let (acc, post) = snap.find_post("100").expect("post 100");
        assert_eq!(acc.id, "1");
        assert_eq!(post.owner_account_id, "1");
        assert_eq!(post.replies.len(), 1, "rule with blank terms is dropped");
        assert_eq!(post.replies[0].match_policy, MatchPolicy::All);

        assert_eq!(
            snap.stats(),
            SnapshotStats {
                accounts: 2,
                posts: 1,
                rules: 1
            }
        );
    }

    #[test]
    fn search_terms_are_kept_as_written() {
        let snap = RuleSnapshot::from_entries(vec![SnapshotEntry {
            account: Account { id: "1".into() },
            posts: vec![TrackedPost {
                id: "100".into(),
                owner_account_id: String::new(),
                replies: vec![ReplyRule::new(
                    [" hi", "   ", ""],
                    MatchPolicy::Any,
                    "padded",
                )],
            }],
        }]);

        let (_, post) = snap.find_post("100").expect("post 100");
        assert_eq!(post.replies[0].search_terms, vec![" hi".to_string()]);
        // " hi" vs "hi" is 2/3 similar, below the word threshold
        assert_eq!(crate::rules::evaluate(post, "hi"), None);
        assert_eq!(crate::rules::evaluate(post, " hi"), None);
        assert_eq!(crate::rules::evaluate(post, "hi!"), None);
    }

    #[test]
    fn default_snapshot_is_uninitialized() {
        let snap = RuleSnapshot::default();
        assert!(!snap.is_initialized());
        assert!(snap.is_empty());
        assert!(snap.find_post("100").is_none());
    }

    #[test]
    fn policy_parsing_is_case_insensitive() {
        assert_eq!("Partial".parse::<MatchPolicy>(), Ok(MatchPolicy::Partial));
        assert_eq!(" ANY ".parse::<MatchPolicy>(), Ok(MatchPolicy::Any));
        assert!("most".parse::<MatchPolicy>().is_err());
        assert_eq!(MatchPolicy::All.to_string(), "all");
    }

    #[test]
    fn event_accepts_stream_field_names() {
        let ev: InboundEvent = serde_json::from_str(
            r#"{ "id_str": "55", "screen_name": "bob", "text": "hey",
                 "in_reply_to_user_id_str": "1", "in_reply_to_status_id_str": "100" }"#,
        )
        .expect("parse event");
        assert_eq!(ev.event_id, "55");
        assert_eq!(ev.author_screen_name, "bob");
        assert_eq!(ev.in_reply_to_account_id.as_deref(), Some("1"));
        assert_eq!(ev.in_reply_to_post_id.as_deref(), Some("100"));

        let bare: InboundEvent = serde_json::from_str("{}").expect("parse empty");
        assert!(bare.in_reply_to_post_id.is_none());
    }
}
