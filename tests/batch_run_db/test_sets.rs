//! Execution set membership.

use batch_run_lib::services::ExecutionSetStore;

use super::test_helpers::*;

#[tokio::test]
async fn test_set_removal() {
    let pool = create_test_pool().await;
    let report_id = unique("report");
    let members: Vec<String> = (0..1500).map(|i| format!("case-{:04}", i)).collect();

    pool.init_set(&report_id, &members).await.unwrap();
    assert_eq!(set_items(&pool, &report_id).await, members);

    pool.remove_item(&report_id, "case-0000").await.unwrap();
    pool.remove_item(&report_id, "not-a-member").await.unwrap();
    pool.remove_item(&unique("other"), "case-0001").await.unwrap();

    let remaining = set_items(&pool, &report_id).await;
    assert_eq!(remaining.len(), 1499);
    assert_eq!(remaining[0], "case-0001");
}
