//! Durable claiming of serial queue entries.

use std::collections::HashSet;

use batch_run_lib::entity::execution_queue::Entity as Queue;
use batch_run_lib::models::{ExecutionQueue, ExecutionQueueDetail, RunModeConfig};
use batch_run_lib::services::ExecutionQueueStore;
use chrono::Utc;
use sea_orm::EntityTrait;

use super::test_helpers::*;

async fn queue_with(pool: &batch_run_lib::db::DbPool, count: usize) -> String {
    let queue = ExecutionQueue {
        queue_id: unique("queue"),
        run_mode_config: RunModeConfig::default(),
        user_id: USER_ID.to_string(),
        create_time: Utc::now(),
    };
    let resource_ids: Vec<String> = (0..count).map(|i| format!("case-{}", i)).collect();
    pool.insert_queue(
        &queue,
        ExecutionQueueDetail::for_resources(&queue.queue_id, &resource_ids),
    )
    .await
    .expect("Failed to insert queue");
    queue.queue_id
}

/// Two pools advancing the same queue concurrently never claim an entry twice.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_pools_claim_each_detail_once() {
    let first = create_test_pool().await;
    let second = create_test_pool().await;
    let queue_id = queue_with(&first, 20).await;

    let handles: Vec<_> = (0..24)
        .map(|i| {
            let pool = if i % 2 == 0 { first.clone() } else { second.clone() };
            let queue_id = queue_id.clone();
            tokio::spawn(async move { pool.get_next_detail(&queue_id).await })
        })
        .collect();

    let mut sorts = Vec::new();
    for handle in handles {
        if let Some(detail) = handle.await.unwrap().unwrap() {
            sorts.push(detail.sort);
        }
    }

    let distinct: HashSet<i64> = sorts.iter().copied().collect();
    assert_eq!(sorts.len(), 20, "claimed sorts: {:?}", sorts);
    assert_eq!(distinct, (0..20).collect::<HashSet<i64>>());
    assert!(first.get_next_detail(&queue_id).await.unwrap().is_none());
}

/// Claims survive a new pool, which resumes at the lowest unclaimed sort.
#[tokio::test]
async fn test_claims_resume_after_reconnect() {
    let pool = create_test_pool().await;
    let queue_id = queue_with(&pool, 4).await;

    let first = pool.get_next_detail(&queue_id).await.unwrap().unwrap();
    let second = pool.get_next_detail(&queue_id).await.unwrap().unwrap();
    assert_eq!((first.sort, first.resource_id.as_str()), (0, "case-0"));
    assert_eq!((second.sort, second.resource_id.as_str()), (1, "case-1"));
    drop(pool);

    let restarted = create_test_pool().await;
    let stored = restarted.get_queue(&queue_id).await.unwrap().unwrap();
    assert_eq!(stored.user_id, USER_ID);

    let header = Queue::find_by_id(queue_id.clone())
        .one(restarted.connection())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header.last_claimed_sort, Some(1));

    let third = restarted.get_next_detail(&queue_id).await.unwrap().unwrap();
    assert_eq!(third.sort, 2);
    assert_eq!(third.resource_id, "case-2");
}

#[tokio::test]
async fn test_unknown_queue_has_no_details() {
    let pool = create_test_pool().await;
    let queue_id = unique("missing");
    assert!(pool.get_queue(&queue_id).await.unwrap().is_none());
    assert!(pool.get_next_detail(&queue_id).await.unwrap().is_none());
}
