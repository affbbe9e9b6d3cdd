// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::finding::Finding;
use crate::domain::models::job::AssessmentType;
use crate::domain::repositories::findings_repository::FindingsRepository;
use crate::domain::repositories::jobs_repository::RepositoryError;
use crate::infrastructure::database::entities::finding as finding_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;

/// 发现仓库实现
///
/// 基于SeaORM实现的扫描结果数据访问层。写入按 (评估类型, 复合键)
/// 覆盖，重复扫描刷新同一行而不是累积。
#[derive(Clone)]
pub struct FindingsRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl FindingsRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn finding_from_model(model: finding_entity::Model) -> Result<Finding, RepositoryError> {
    let assessment_type = model.assessment_type.parse().map_err(|_| {
        RepositoryError::Database(DbErr::Custom(format!(
            "Unknown assessment type: {}",
            model.assessment_type
        )))
    })?;
    Ok(Finding {
        assessment_type,
        sort_key: model.sort_key,
        account_id: model.account_id,
        region: model.region,
        job_id: model.job_id,
        assessed_at: model.assessed_at,
        payload: model.payload,
        expires_at: model.expires_at,
    })
}

impl From<&Finding> for finding_entity::ActiveModel {
    fn from(finding: &Finding) -> Self {
        Self {
            assessment_type: Set(finding.assessment_type.to_string()),
            sort_key: Set(finding.sort_key.clone()),
            account_id: Set(finding.account_id.clone()),
            region: Set(finding.region.clone()),
            job_id: Set(finding.job_id.clone()),
            assessed_at: Set(finding.assessed_at),
            payload: Set(finding.payload.clone()),
            expires_at: Set(finding.expires_at),
        }
    }
}

#[async_trait]
impl FindingsRepository for FindingsRepositoryImpl {
    async fn create_all(&self, findings: &[Finding]) -> Result<u64, RepositoryError> {
        if findings.is_empty() {
            return Ok(0);
        }
        let models: Vec<finding_entity::ActiveModel> = findings.iter().map(Into::into).collect();
        finding_entity::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    finding_entity::Column::AssessmentType,
                    finding_entity::Column::SortKey,
                ])
                .update_columns([
                    finding_entity::Column::AccountId,
                    finding_entity::Column::Region,
                    finding_entity::Column::JobId,
                    finding_entity::Column::AssessedAt,
                    finding_entity::Column::Payload,
                    finding_entity::Column::ExpiresAt,
                ])
                .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;
        Ok(findings.len() as u64)
    }

    async fn find_by_job_id(&self, job_id: &str) -> Result<Vec<Finding>, RepositoryError> {
        let models = finding_entity::Entity::find()
            .filter(finding_entity::Column::JobId.eq(job_id))
            .all(self.db.as_ref())
            .await?;
        models.into_iter().map(finding_from_model).collect()
    }

    async fn find_by_assessment_type(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<Vec<Finding>, RepositoryError> {
        let models = finding_entity::Entity::find()
            .filter(finding_entity::Column::AssessmentType.eq(assessment_type.to_string()))
            .all(self.db.as_ref())
            .await?;
        models.into_iter().map(finding_from_model).collect()
    }

    async fn delete_by_job_id(&self, job_id: &str) -> Result<u64, RepositoryError> {
        let result = finding_entity::Entity::delete_many()
            .filter(finding_entity::Column::JobId.eq(job_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn purge_expired(&self, now: DateTime<FixedOffset>) -> Result<u64, RepositoryError> {
        let result = finding_entity::Entity::delete_many()
            .filter(finding_entity::Column::ExpiresAt.lte(now))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
