//! Database queries for environments.

use async_trait::async_trait;
use sea_orm::EntityTrait;

use crate::entity::environment::{self, Entity as Environment};
use crate::error::{AppError, AppResult};
use crate::models::EnvironmentConfig;
use crate::services::store::EnvironmentStore;

use super::DbPool;

impl From<environment::Model> for EnvironmentConfig {
    fn from(model: environment::Model) -> Self {
        EnvironmentConfig {
            id: model.id,
            name: model.name,
            config: model.config,
        }
    }
}

#[async_trait]
impl EnvironmentStore for DbPool {
    async fn get_environment(&self, id: &str) -> AppResult<Option<EnvironmentConfig>> {
        let result = Environment::find_by_id(id.to_string())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get environment: {}", e)))?;

        Ok(result.map(EnvironmentConfig::from))
    }
}
