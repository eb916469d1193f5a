// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod fuzzy;
pub mod model;
pub mod refresh;
pub mod relevance;
pub mod rules;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::engine::{Followed, FollowedIds, ReplyEngine, SnapshotHandle};
pub use crate::error::{CacheDiagnostic, StoreError};
pub use crate::model::{
    Account, InboundEvent, MatchPolicy, ReplyRule, RuleSnapshot, SnapshotEntry, TrackedPost,
};
