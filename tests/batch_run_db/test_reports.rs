//! Report, link and step persistence.

use batch_run_lib::entity::api_report::{self, Entity as Report};
use batch_run_lib::entity::api_test_case_record::{self, Entity as TestCaseRecord};
use batch_run_lib::models::{ApiReportStep, STEP_TYPE_API_CASE};
use batch_run_lib::services::ReportStore;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use super::test_helpers::*;

fn step(report_id: &str, step_id: &str, sort: i64) -> ApiReportStep {
    ApiReportStep {
        report_id: report_id.to_string(),
        step_id: step_id.to_string(),
        sort,
        name: format!("case {}", step_id),
        step_type: STEP_TYPE_API_CASE.to_string(),
    }
}

/// A failing link insert rolls back the reports written with it.
#[tokio::test]
async fn test_reports_and_links_roll_back_together() {
    let pool = create_test_pool().await;
    let project_id = unique("project");
    let report_id = unique("report");

    let result = pool
        .insert_api_reports(
            vec![report(&report_id, &project_id)],
            vec![record(&report_id, "a"), record(&unique("missing"), "b")],
        )
        .await;
    assert!(result.is_err());

    let stored = Report::find_by_id(report_id.clone())
        .one(pool.connection())
        .await
        .unwrap();
    assert!(stored.is_none());

    let links = TestCaseRecord::find()
        .filter(api_test_case_record::Column::ApiReportId.eq(report_id))
        .count(pool.connection())
        .await
        .unwrap();
    assert_eq!(links, 0);
}

/// Batches larger than one INSERT statement can bind are written in full.
#[tokio::test]
async fn test_large_report_batch() {
    let pool = create_test_pool().await;
    let project_id = unique("project");
    let case_prefix = unique("case");

    let reports: Vec<_> = (0..5000)
        .map(|i| report(&format!("{}-{}", project_id, i), &project_id))
        .collect();
    let records: Vec<_> = reports
        .iter()
        .enumerate()
        .map(|(i, r)| record(&r.id, &format!("{}-{}", case_prefix, i)))
        .collect();
    pool.insert_api_reports(reports, records).await.unwrap();

    let report_count = Report::find()
        .filter(api_report::Column::ProjectId.eq(project_id.as_str()))
        .count(pool.connection())
        .await
        .unwrap();
    let link_count = TestCaseRecord::find()
        .filter(api_test_case_record::Column::ApiTestCaseId.starts_with(case_prefix.as_str()))
        .count(pool.connection())
        .await
        .unwrap();
    assert_eq!(report_count, 5000);
    assert_eq!(link_count, 5000);
}

/// Steps read back in sort order regardless of insert order, across slices.
#[tokio::test]
async fn test_steps_ordered_by_sort() {
    let pool = create_test_pool().await;
    let project_id = unique("project");
    let report_id = unique("report");
    pool.insert_api_reports(vec![report(&report_id, &project_id)], Vec::new())
        .await
        .unwrap();

    let mut batch: Vec<ApiReportStep> = (0..2500)
        .map(|i| step(&report_id, &format!("case-{}", i), i))
        .collect();
    batch.reverse();
    pool.insert_report_steps(batch).await.unwrap();

    let stored = steps(&pool, &report_id).await;
    assert_eq!(stored.len(), 2500);
    assert!(stored.windows(2).all(|w| w[0].sort < w[1].sort));
    assert_eq!(stored[0].step_id, "case-0");
    assert_eq!(stored[2499].step_id, "case-2499");

    // A duplicate step rejects the whole call
    let result = pool
        .insert_report_steps(vec![
            step(&report_id, "case-new", 2500),
            step(&report_id, "case-0", 2501),
        ])
        .await;
    assert!(result.is_err());
    assert_eq!(steps(&pool, &report_id).await.len(), 2500);
}
