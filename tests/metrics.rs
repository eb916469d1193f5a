// tests/metrics.rs
// Engine and refresh counters as rendered by the Prometheus exporter.

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusBuilder;

use selenite::engine::ReplyEngine;
use selenite::refresh::refresh_once;
use selenite::store::{SnapshotSource, StaticSnapshotSource};
use selenite::{InboundEvent, RuleSnapshot, StoreError};

const RECORDS: &str = r#"[
  { "account": { "id": "1" },
    "posts": [ { "id": "100", "replies": [
      { "search_terms": ["hello"], "match_policy": "any", "response": "hi" } ] } ] },
  { "account": { "id": "2" } }
]"#;

struct FailingSource;

#[async_trait]
impl SnapshotSource for FailingSource {
    async fn load(&self) -> Result<RuleSnapshot, StoreError> {
        Err(StoreError::UnsupportedFormat("test".into()))
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

fn event(account: &str, post: &str, text: &str) -> InboundEvent {
    InboundEvent {
        text: text.into(),
        in_reply_to_account_id: Some(account.into()),
        in_reply_to_post_id: Some(post.into()),
        ..InboundEvent::default()
    }
}

// The recorder is thread-local, so the async refreshes run on a current-thread
// runtime inside the closure.
#[test]
fn metrics_render_contains_engine_and_refresh_series() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let engine = ReplyEngine::new();
        let good = StaticSnapshotSource::from_json(RECORDS).expect("records");

        rt.block_on(async {
            refresh_once(&engine, &good).await.expect("first load");
            assert!(refresh_once(&engine, &FailingSource).await.is_err());
        });

        assert_eq!(
            engine.get_response(&event("1", "100", "hello")).as_deref(),
            Some("hi")
        );
        assert_eq!(engine.get_response(&event("1", "100", "goodbye")), None);
        assert_eq!(engine.get_response(&event("9", "999", "hello")), None);
    });

    let text = handle.render();
    for needle in [
        "selenite_events_total 3",
        "selenite_events_relevant_total 2",
        "selenite_responses_total 1",
        "selenite_snapshot_accounts 2",
        "selenite_snapshot_refresh_total 1",
        "selenite_snapshot_refresh_errors_total 1",
    ] {
        assert!(
            text.contains(needle),
            "metrics output missing {needle:?}\n---\n{text}"
        );
    }
}
