//! Live integration tests for hnscout-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/hnscout-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::{Duration, Utc};
use hnscout_core::{
    DiscoveryRecord, Item, ItemKind, ProcessedRecord, RunMode, RunRecord, RunStatus, Verdict,
};
use hnscout_db::{DbError, PgStore, StateStore};

fn item(id: i64, created_at: i64) -> Item {
    Item {
        id,
        title: format!("Show HN: thing {id}"),
        url: Some(format!("https://thing{id}.io")),
        author: Some("maker".to_string()),
        score: 42,
        comments: 7,
        created_at,
    }
}

fn verdict(kind: ItemKind, score: f64) -> Verdict {
    Verdict {
        kind,
        confidence: 0.8,
        name: "Thing".to_string(),
        category: "Developer Tools".to_string(),
        summary: "Does things.".to_string(),
        key_features: vec!["fast".to_string()],
        innovation_score: score,
        ..Verdict::default()
    }
}

fn accepted(id: i64, created_at: i64, score: f64) -> (ProcessedRecord, DiscoveryRecord) {
    let v = verdict(ItemKind::Innovation, score);
    (
        ProcessedRecord::accepted(&item(id, created_at), ItemKind::Innovation, Utc::now()),
        DiscoveryRecord::from_verdict(id, &v, Utc::now()),
    )
}

#[sqlx::test(migrations = "../../migrations")]
async fn put_processed_is_create_once(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let record = ProcessedRecord::rejected(&item(1, 1_000), ItemKind::Other, Utc::now());

    assert!(!store.exists(1).await.expect("exists"));
    assert!(store.put_processed(&record).await.expect("insert"));
    assert!(!store.put_processed(&record).await.expect("second insert is a no-op"));
    assert!(store.exists(1).await.expect("exists"));

    let stored = hnscout_db::processed_items::get_processed_item(store.pool(), 1)
        .await
        .expect("query")
        .expect("row");
    assert_eq!(stored.item_type, ItemKind::Other);
    assert!(!stored.is_startup && !stored.is_innovation);
}

#[sqlx::test(migrations = "../../migrations")]
async fn put_accepted_round_trips_verdict(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let now = Utc::now().timestamp();
    let (processed, discovery) = accepted(2, now, 7.5);

    assert!(store.put_accepted(&processed, &discovery).await.expect("write"));
    assert!(!store.put_accepted(&processed, &discovery).await.expect("noop"));

    let top = store.top_discoveries(10, 7).await.expect("top");
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].item.item_id, 2);
    assert!(top[0].item.is_innovation);
    assert_eq!(top[0].discovery.verdict.key_features, vec!["fast"]);
    assert_eq!(top[0].discovery.verdict.kind, ItemKind::Innovation);
}

#[sqlx::test(migrations = "../../migrations")]
async fn discovery_without_accepted_record_is_rejected(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let (_, discovery) = accepted(3, 1_000, 6.0);

    let err = store.put_discovery(&discovery).await.unwrap_err();
    assert!(matches!(err, DbError::PairingViolation { item_id: 3 }));

    let rejected = ProcessedRecord::rejected(&item(3, 1_000), ItemKind::Startup, Utc::now());
    store.put_processed(&rejected).await.expect("insert");
    let err = store.put_discovery(&discovery).await.unwrap_err();
    assert!(matches!(err, DbError::PairingViolation { .. }));
}

#[sqlx::test(migrations = "../../migrations")]
async fn failed_pairing_rolls_back_processed_record(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let rejected = ProcessedRecord::rejected(&item(4, 1_000), ItemKind::Other, Utc::now());
    let (_, discovery) = accepted(4, 1_000, 6.0);

    assert!(store.put_accepted(&rejected, &discovery).await.is_err());
    assert!(!store.exists(4).await.expect("exists"), "transaction rolled back");
}

#[sqlx::test(migrations = "../../migrations")]
async fn latest_processed_timestamp_is_max_created_time(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    assert_eq!(store.latest_processed_timestamp().await.expect("query"), None);

    for (id, created) in [(5, 500), (6, 1_500), (7, 900)] {
        let record = ProcessedRecord::rejected(&item(id, created), ItemKind::Other, Utc::now());
        store.put_processed(&record).await.expect("insert");
    }
    assert_eq!(
        store.latest_processed_timestamp().await.expect("query"),
        Some(1_500)
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn top_discoveries_orders_by_score_within_window(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let now = Utc::now().timestamp();
    let old = now - 10 * 86_400;

    for (id, created, score) in [(20, now, 5.0), (21, now, 8.0), (22, old, 9.9), (19, now, 5.0)] {
        let (p, d) = accepted(id, created, score);
        store.put_accepted(&p, &d).await.expect("write");
    }

    let ids: Vec<i64> = store
        .top_discoveries(10, 7)
        .await
        .expect("top")
        .iter()
        .map(|d| d.item.item_id)
        .collect();
    assert_eq!(ids, vec![21, 19, 20]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn runs_append_and_list_newest_first(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let base = Utc::now();
    let mut run = RunRecord {
        mode: RunMode::Historical,
        started_at: base - Duration::minutes(5),
        finished_at: base - Duration::minutes(4),
        items_fetched: 120,
        candidates: 30,
        processed: 25,
        accepted: 4,
        status: RunStatus::Completed,
        error_message: None,
    };
    let first = store.append_run(&run).await.expect("append");

    run.mode = RunMode::Incremental;
    run.started_at = base;
    run.status = RunStatus::Failed;
    run.error_message = Some("content listing failed".to_string());
    let second = store.append_run(&run).await.expect("append");

    let runs = store.list_runs(10).await.expect("list");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].id, second);
    assert_eq!(runs[0].run.status, RunStatus::Failed);
    assert_eq!(runs[1].id, first);
    assert_eq!(runs[1].run.items_fetched, 120);
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_check_succeeds_on_live_pool(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    store.health_check().await.expect("healthy");
}
