//! Serial batch runs and queue advancement.

use std::collections::HashSet;
use std::sync::Arc;

use batch_run_lib::error::AppError;
use batch_run_lib::models::{AdvanceOutcome, BatchRunMode};
use batch_run_lib::services::MemoryStore;
use futures_util::future::join_all;
use tokio_test::{assert_err, assert_ok};

use super::test_helpers::*;

fn only_queue(store: &MemoryStore) -> String {
    let queue_ids = store.queue_ids();
    assert_eq!(queue_ids.len(), 1, "expected exactly one queue");
    queue_ids[0].clone()
}

/// (1) The queue keeps the selection order and only the first entry is dispatched.
#[tokio::test]
async fn test_queue_follows_selection_order() {
    let store = seeded_store(&["a", "b", "c"]);
    let engine = RecordingEngine::new();
    let service = service(&store, &engine, settings(100, 1));

    service
        .batch_run(&batch_request(&["c", "a", "b"], BatchRunMode::Serial, None), USER_ID)
        .await;

    let queue_id = only_queue(&store);
    let details = store.queue_details(&queue_id);
    let sorts: Vec<i64> = details.iter().map(|d| d.sort).collect();
    let resources: Vec<&str> = details.iter().map(|d| d.resource_id.as_str()).collect();
    assert_eq!(sorts, vec![0, 1, 2]);
    assert_eq!(resources, vec!["c", "a", "b"]);

    let dispatched = engine.dispatched();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].task.resource_id, "c");
    assert_eq!(dispatched[0].task.queue_id.as_deref(), Some(queue_id.as_str()));
    assert_eq!(store.reports().len(), 1, "reports are created as entries run");
}

/// (2) Each advance dispatches the next entry until the queue drains.
#[tokio::test]
async fn test_advance_until_drained() {
    let store = seeded_store(&["a", "b", "c"]);
    let engine = RecordingEngine::new();
    let service = service(&store, &engine, settings(100, 1));

    service
        .batch_run(&batch_request(&["c", "a", "b"], BatchRunMode::Serial, None), USER_ID)
        .await;
    let queue_id = only_queue(&store);

    assert_eq!(
        assert_ok!(service.advance(&queue_id).await),
        AdvanceOutcome::Dispatched {
            resource_id: "a".to_string(),
            sort: 1
        }
    );
    assert_eq!(
        assert_ok!(service.advance(&queue_id).await),
        AdvanceOutcome::Dispatched {
            resource_id: "b".to_string(),
            sort: 2
        }
    );
    assert_eq!(
        assert_ok!(service.advance(&queue_id).await),
        AdvanceOutcome::Drained
    );
    assert_eq!(
        assert_ok!(service.advance(&queue_id).await),
        AdvanceOutcome::Drained
    );

    assert_eq!(engine.dispatched_ids(), ids(&["c", "a", "b"]));
    assert_eq!(store.reports().len(), 3);
}

/// (3) A new service instance over the same store resumes where the queue stopped.
#[tokio::test]
async fn test_queue_resumes_after_restart() {
    let store = seeded_store(&["a", "b", "c"]);
    let first_engine = RecordingEngine::new();
    let first = service(&store, &first_engine, settings(100, 1));

    first
        .batch_run(&batch_request(&["a", "b", "c"], BatchRunMode::Serial, None), USER_ID)
        .await;
    let queue_id = only_queue(&store);
    assert_ok!(first.advance(&queue_id).await);
    drop(first);

    let second_engine = RecordingEngine::new();
    let second = service(&store, &second_engine, settings(100, 1));
    assert_eq!(
        assert_ok!(second.advance(&queue_id).await),
        AdvanceOutcome::Dispatched {
            resource_id: "c".to_string(),
            sort: 2
        }
    );
    assert_eq!(
        assert_ok!(second.advance(&queue_id).await),
        AdvanceOutcome::Drained
    );

    assert_eq!(first_engine.dispatched_ids(), ids(&["a", "b"]));
    assert_eq!(second_engine.dispatched_ids(), ids(&["c"]));
}

/// (4) A deleted case dispatches nothing; the queue waits for the next advance.
#[tokio::test]
async fn test_deleted_case_waits_for_next_advance() {
    let store = seeded_store(&["a", "c"]);
    let engine = RecordingEngine::new();
    let service = service(&store, &engine, settings(100, 1));

    service
        .batch_run(&batch_request(&["a", "b", "c"], BatchRunMode::Serial, None), USER_ID)
        .await;
    let queue_id = only_queue(&store);

    assert_eq!(
        assert_ok!(service.advance(&queue_id).await),
        AdvanceOutcome::Skipped {
            resource_id: "b".to_string(),
            sort: 1
        }
    );
    assert_eq!(engine.dispatched_ids(), ids(&["a"]));

    assert_eq!(
        assert_ok!(service.advance(&queue_id).await),
        AdvanceOutcome::Dispatched {
            resource_id: "c".to_string(),
            sort: 2
        }
    );
    assert_eq!(engine.dispatched_ids(), ids(&["a", "c"]));
}

/// (5) Integrated serial run adds one step per executed entry at the entry's sort.
#[tokio::test]
async fn test_integrated_serial_steps() {
    let store = seeded_store(&["a", "b", "c"]);
    let engine = RecordingEngine::new();
    let service = service(&store, &engine, settings(100, 1));

    service
        .batch_run(
            &batch_request(&["b", "c", "a"], BatchRunMode::Serial, Some("nightly")),
            USER_ID,
        )
        .await;
    let queue_id = only_queue(&store);
    while assert_ok!(service.advance(&queue_id).await) != AdvanceOutcome::Drained {}

    let reports = store.reports();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert!(report.integrated);
    assert_eq!(report.run_mode, "SERIAL");
    assert_eq!(store.records().len(), 3);

    let steps = store.steps(&report.id);
    let step_ids: Vec<&str> = steps.iter().map(|s| s.step_id.as_str()).collect();
    let sorts: Vec<i64> = steps.iter().map(|s| s.sort).collect();
    assert_eq!(step_ids, vec!["b", "c", "a"]);
    assert_eq!(sorts, vec![0, 1, 2]);

    let dispatched = engine.dispatched();
    assert_eq!(engine.dispatched_ids(), ids(&["b", "c", "a"]));
    let task_reports: HashSet<&str> = dispatched.iter().map(|d| d.task.report_id.as_str()).collect();
    assert_eq!(task_reports.len(), 3);
    assert!(!task_reports.contains(report.id.as_str()));
}

/// (6) Concurrent advances claim every entry exactly once.
#[tokio::test]
async fn test_concurrent_advance_claims_once() {
    let all: Vec<String> = (0..6).map(|i| format!("case-{}", i)).collect();
    let all_refs: Vec<&str> = all.iter().map(String::as_str).collect();
    let store = seeded_store(&all_refs);
    let engine = RecordingEngine::new();
    let service = Arc::new(service(&store, &engine, settings(100, 1)));

    service
        .batch_run(&batch_request(&all_refs, BatchRunMode::Serial, None), USER_ID)
        .await;
    let queue_id = only_queue(&store);

    let handles = (0..10).map(|_| {
        let service = service.clone();
        let queue_id = queue_id.clone();
        tokio::spawn(async move { service.advance(&queue_id).await })
    });
    let outcomes: Vec<AdvanceOutcome> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let dispatched = outcomes
        .iter()
        .filter(|o| matches!(o, AdvanceOutcome::Dispatched { .. }))
        .count();
    assert_eq!(dispatched, 5);

    let mut dispatched_ids = engine.dispatched_ids();
    dispatched_ids.sort();
    dispatched_ids.dedup();
    assert_eq!(dispatched_ids, all);
}

/// (7) Advancing an unknown queue is an error.
#[tokio::test]
async fn test_advance_unknown_queue() {
    let store = seeded_store(&[]);
    let engine = RecordingEngine::new();
    let service = service(&store, &engine, settings(100, 1));

    let err = assert_err!(service.advance("missing").await);
    assert!(matches!(err, AppError::NotFound(_)));
}

/// (8) An engine rejection is returned to the caller advancing the queue.
#[tokio::test]
async fn test_engine_failure_returned_from_advance() {
    let store = seeded_store(&["a", "b"]);
    let engine = RecordingEngine::failing(["b"]);
    let service = service(&store, &engine, settings(100, 1));

    service
        .batch_run(&batch_request(&["a", "b"], BatchRunMode::Serial, None), USER_ID)
        .await;
    let queue_id = only_queue(&store);

    let err = assert_err!(service.advance(&queue_id).await);
    assert!(matches!(err, AppError::Engine(_)));
    assert_eq!(
        assert_ok!(service.advance(&queue_id).await),
        AdvanceOutcome::Drained
    );
}

/// (9) Nothing selected, no queue.
#[tokio::test]
async fn test_empty_selection_creates_no_queue() {
    let store = seeded_store(&["a"]);
    let engine = RecordingEngine::new();
    let service = service(&store, &engine, settings(100, 1));

    let mut request = batch_request(&[], BatchRunMode::Serial, None);
    request.selection.select_all = true;
    request.project_id = "other-project".to_string();
    service.batch_run(&request, USER_ID).await;

    assert!(store.queue_ids().is_empty());
    assert!(engine.attempted_ids().is_empty());
}
