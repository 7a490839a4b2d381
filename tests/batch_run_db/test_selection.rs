//! Selection queries against stored test cases.

use batch_run_lib::models::BatchSelection;
use batch_run_lib::services::TestCaseStore;

use super::test_helpers::*;

/// Select-all follows position, breaks ties by id and skips deleted cases.
#[tokio::test]
async fn test_select_all_ordering() {
    let pool = create_test_pool().await;
    let project_id = unique("project");
    let tag = unique("sel");
    let id = |name: &str| format!("{}-{}", tag, name);

    seed_cases(
        &pool,
        &project_id,
        vec![
            SeedCase::new(&id("late"), 5).in_module("m1"),
            SeedCase::new(&id("early"), 1).in_module("m1"),
            SeedCase::new(&id("tie-b"), 3).in_module("m1"),
            SeedCase::new(&id("tie-a"), 3).in_module("m1"),
            SeedCase::new(&id("gone"), 2).in_module("m1").deleted(),
            SeedCase::new(&id("first"), 0).in_module("m2"),
        ],
    )
    .await;

    let mut selection = BatchSelection {
        select_all: true,
        ..Default::default()
    };
    let selected = pool.select_ids(&project_id, &selection).await.unwrap();
    assert_eq!(
        selected,
        vec![id("first"), id("early"), id("tie-a"), id("tie-b"), id("late")]
    );

    selection.module_ids = vec!["m1".to_string()];
    selection.exclude_ids = vec![id("early")];
    let selected = pool.select_ids(&project_id, &selection).await.unwrap();
    assert_eq!(selected, vec![id("tie-a"), id("tie-b"), id("late")]);

    let other_project = pool
        .select_ids(
            &unique("project"),
            &BatchSelection {
                select_all: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(other_project.is_empty());
}

/// Explicit ids keep the caller's order even for cases that do not exist.
#[tokio::test]
async fn test_explicit_selection_keeps_order() {
    let pool = create_test_pool().await;
    let selection = BatchSelection {
        select_ids: vec!["b".to_string(), "a".to_string(), "b".to_string()],
        ..Default::default()
    };
    let selected = pool.select_ids(&unique("project"), &selection).await.unwrap();
    assert_eq!(selected, vec!["b".to_string(), "a".to_string()]);
}
