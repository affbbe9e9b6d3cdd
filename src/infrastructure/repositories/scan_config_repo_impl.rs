// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scan_config::ScanConfiguration;
use crate::domain::repositories::jobs_repository::RepositoryError;
use crate::domain::repositories::scan_config_repository::ScanConfigRepository;
use crate::infrastructure::database::entities::scan_config as config_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;

/// 扫描配置仓库实现
#[derive(Clone)]
pub struct ScanConfigRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ScanConfigRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn string_list(value: Option<serde_json::Value>) -> Option<Vec<String>> {
    value.and_then(|json| serde_json::from_value(json).ok())
}

fn config_from_model(model: config_entity::Model) -> ScanConfiguration {
    ScanConfiguration {
        configuration_name: Some(model.configuration_name),
        account_ids: string_list(model.account_ids),
        org_unit_ids: string_list(model.org_unit_ids),
        regions: string_list(model.regions),
        service_names: string_list(model.service_names),
        expires_at: Some(model.expires_at),
    }
}

fn json_list(value: &Option<Vec<String>>) -> Result<Option<serde_json::Value>, RepositoryError> {
    value
        .as_ref()
        .map(|list| {
            serde_json::to_value(list)
                .map_err(|err| RepositoryError::Database(DbErr::Custom(err.to_string())))
        })
        .transpose()
}

#[async_trait]
impl ScanConfigRepository for ScanConfigRepositoryImpl {
    async fn save(
        &self,
        config: &ScanConfiguration,
    ) -> Result<ScanConfiguration, RepositoryError> {
        let name = config.configuration_name.clone().ok_or_else(|| {
            RepositoryError::Database(DbErr::Custom(
                "Configuration name is required to save a template".to_string(),
            ))
        })?;
        let expires_at = config
            .expires_at
            .unwrap_or_else(|| DateTime::<FixedOffset>::from(Utc::now()) + chrono::Duration::days(90));

        let model = config_entity::ActiveModel {
            configuration_name: Set(name),
            account_ids: Set(json_list(&config.account_ids)?),
            org_unit_ids: Set(json_list(&config.org_unit_ids)?),
            regions: Set(json_list(&config.regions)?),
            service_names: Set(json_list(&config.service_names)?),
            expires_at: Set(expires_at),
        };

        config_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::column(config_entity::Column::ConfigurationName)
                    .update_columns([
                        config_entity::Column::AccountIds,
                        config_entity::Column::OrgUnitIds,
                        config_entity::Column::Regions,
                        config_entity::Column::ServiceNames,
                        config_entity::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;

        let mut saved = config.clone();
        saved.expires_at = Some(expires_at);
        Ok(saved)
    }

    async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ScanConfiguration>, RepositoryError> {
        let model = config_entity::Entity::find_by_id(name.to_string())
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(config_from_model))
    }

    async fn find_all(&self) -> Result<Vec<ScanConfiguration>, RepositoryError> {
        let models = config_entity::Entity::find().all(self.db.as_ref()).await?;
        Ok(models.into_iter().map(config_from_model).collect())
    }

    async fn purge_expired(&self, now: DateTime<FixedOffset>) -> Result<u64, RepositoryError> {
        let result = config_entity::Entity::delete_many()
            .filter(config_entity::Column::ExpiresAt.lte(now))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
