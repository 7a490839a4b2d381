//! Database queries for test cases (resource selection and bulk loading).

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseBackend, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Statement,
};

use crate::entity::api_test_case::{self as case, Entity as TestCase};
use crate::entity::api_test_case_blob::{self as blob, Entity as TestCaseBlob};
use crate::error::{AppError, AppResult};
use crate::models::{ApiTestCase, ApiTestCaseBlob, BatchSelection};
use crate::services::selection::finalize_ids;
use crate::services::store::TestCaseStore;

use super::DbPool;

/// Ids bound per bulk load.
const LOAD_BATCH: usize = 1000;

impl From<case::Model> for ApiTestCase {
    fn from(model: case::Model) -> Self {
        ApiTestCase {
            id: model.id,
            name: model.name,
            project_id: model.project_id,
            module_id: model.module_id,
            environment_id: model.environment_id,
            pos: model.pos,
        }
    }
}

impl From<blob::Model> for ApiTestCaseBlob {
    fn from(model: blob::Model) -> Self {
        ApiTestCaseBlob {
            id: model.id,
            request: model.request,
        }
    }
}

impl DbPool {
    /// Ids of every active test case in a project, ordered by position.
    pub async fn find_case_ids(
        &self,
        project_id: &str,
        module_ids: &[String],
    ) -> AppResult<Vec<String>> {
        let mut select = TestCase::find()
            .select_only()
            .column(case::Column::Id)
            .filter(case::Column::ProjectId.eq(project_id))
            .filter(case::Column::DeletedAt.is_null());

        if !module_ids.is_empty() {
            select = select.filter(case::Column::ModuleId.is_in(module_ids.to_vec()));
        }

        let ids = select
            .order_by_asc(case::Column::Pos)
            .order_by_asc(case::Column::Id)
            .into_tuple::<String>()
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to select test case ids: {}", e)))?;

        Ok(ids)
    }

    /// Get an active test case by ID.
    pub async fn find_case_by_id(&self, id: &str) -> AppResult<Option<case::Model>> {
        let result = TestCase::find_by_id(id.to_string())
            .filter(case::Column::DeletedAt.is_null())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get test case: {}", e)))?;

        Ok(result)
    }

    /// Get the request body of a test case.
    pub async fn find_case_blob_by_id(&self, id: &str) -> AppResult<Option<blob::Model>> {
        let result = TestCaseBlob::find_by_id(id.to_string())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get test case blob: {}", e)))?;

        Ok(result)
    }

    /// Batch load active test cases.
    pub async fn find_cases_by_ids(&self, ids: &[String]) -> AppResult<Vec<case::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = Vec::with_capacity(ids.len());
        for slice in ids.chunks(LOAD_BATCH) {
            let models = TestCase::find()
                .filter(case::Column::Id.is_in(slice.to_vec()))
                .filter(case::Column::DeletedAt.is_null())
                .all(self.connection())
                .await
                .map_err(|e| AppError::Database(format!("Failed to load test cases: {}", e)))?;
            result.extend(models);
        }

        Ok(result)
    }

    /// Batch load request bodies.
    pub async fn find_case_blobs_by_ids(&self, ids: &[String]) -> AppResult<Vec<blob::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = Vec::with_capacity(ids.len());
        for slice in ids.chunks(LOAD_BATCH) {
            let models = TestCaseBlob::find()
                .filter(blob::Column::Id.is_in(slice.to_vec()))
                .all(self.connection())
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to load test case blobs: {}", e))
                })?;
            result.extend(models);
        }

        Ok(result)
    }
}

#[async_trait]
impl TestCaseStore for DbPool {
    async fn select_ids(
        &self,
        project_id: &str,
        selection: &BatchSelection,
    ) -> AppResult<Vec<String>> {
        let candidates = if selection.select_all {
            self.find_case_ids(project_id, &selection.module_ids).await?
        } else {
            selection.select_ids.clone()
        };
        Ok(finalize_ids(candidates, selection))
    }

    async fn get_test_case(&self, id: &str) -> AppResult<Option<ApiTestCase>> {
        Ok(self.find_case_by_id(id).await?.map(ApiTestCase::from))
    }

    async fn get_test_case_blob(&self, id: &str) -> AppResult<Option<ApiTestCaseBlob>> {
        Ok(self.find_case_blob_by_id(id).await?.map(ApiTestCaseBlob::from))
    }

    async fn list_test_cases(&self, ids: &[String]) -> AppResult<Vec<ApiTestCase>> {
        let models = self.find_cases_by_ids(ids).await?;
        Ok(models.into_iter().map(ApiTestCase::from).collect())
    }

    async fn list_test_case_blobs(&self, ids: &[String]) -> AppResult<Vec<ApiTestCaseBlob>> {
        let models = self.find_case_blobs_by_ids(ids).await?;
        Ok(models.into_iter().map(ApiTestCaseBlob::from).collect())
    }

    async fn ping(&self) -> AppResult<()> {
        let stmt = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1".to_owned());
        self.connection()
            .query_one_raw(stmt)
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))?;
        Ok(())
    }
}
