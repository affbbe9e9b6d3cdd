// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::job::{AssessmentType, Job, JobMarker, TaskFailure};
use crate::domain::repositories::jobs_repository::{JobsRepository, RepositoryError};
use crate::infrastructure::database::entities::{
    job as job_entity, job_marker as marker_entity, task_failure as failure_entity,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

/// 任务仓库实现
///
/// 基于SeaORM实现的任务数据访问层
#[derive(Clone)]
pub struct JobsRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobsRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn parse_assessment_type(value: &str) -> Result<AssessmentType, RepositoryError> {
    value.parse().map_err(|_| {
        RepositoryError::Database(DbErr::Custom(format!("Unknown assessment type: {value}")))
    })
}

fn job_from_model(model: job_entity::Model) -> Result<Job, RepositoryError> {
    Ok(Job {
        assessment_type: parse_assessment_type(&model.assessment_type)?,
        job_id: model.job_id,
        status: model.status.parse().unwrap_or_default(),
        started_at: model.started_at,
        started_by: model.started_by,
        finished_at: model.finished_at,
        error: model.error,
        expires_at: model.expires_at,
    })
}

fn marker_from_model(model: marker_entity::Model) -> Result<JobMarker, RepositoryError> {
    Ok(JobMarker {
        assessment_type: parse_assessment_type(&model.assessment_type)?,
        job_id: model.job_id,
        status: model.status.parse().unwrap_or_default(),
        expires_at: model.expires_at,
    })
}

fn failure_from_model(model: failure_entity::Model) -> Result<TaskFailure, RepositoryError> {
    Ok(TaskFailure {
        id: model.id,
        assessment_type: parse_assessment_type(&model.assessment_type)?,
        job_id: model.job_id,
        service_name: model.service_name,
        account_id: model.account_id,
        region: model.region,
        failed_at: model.failed_at,
        error: model.error,
        expires_at: model.expires_at,
    })
}

impl From<&Job> for job_entity::ActiveModel {
    fn from(job: &Job) -> Self {
        Self {
            assessment_type: Set(job.assessment_type.to_string()),
            job_id: Set(job.job_id.clone()),
            status: Set(job.status.to_string()),
            started_at: Set(job.started_at),
            started_by: Set(job.started_by.clone()),
            finished_at: Set(job.finished_at),
            error: Set(job.error.clone()),
            expires_at: Set(job.expires_at),
        }
    }
}

impl From<&JobMarker> for marker_entity::ActiveModel {
    fn from(marker: &JobMarker) -> Self {
        Self {
            assessment_type: Set(marker.assessment_type.to_string()),
            job_id: Set(marker.job_id.clone()),
            status: Set(marker.status.to_string()),
            expires_at: Set(marker.expires_at),
        }
    }
}

impl From<&TaskFailure> for failure_entity::ActiveModel {
    fn from(failure: &TaskFailure) -> Self {
        Self {
            id: Set(failure.id),
            assessment_type: Set(failure.assessment_type.to_string()),
            job_id: Set(failure.job_id.clone()),
            service_name: Set(failure.service_name.clone()),
            account_id: Set(failure.account_id.clone()),
            region: Set(failure.region.clone()),
            failed_at: Set(failure.failed_at),
            error: Set(failure.error.clone()),
            expires_at: Set(failure.expires_at),
        }
    }
}

#[async_trait]
impl JobsRepository for JobsRepositoryImpl {
    async fn create_job(&self, job: &Job) -> Result<Job, RepositoryError> {
        let model: job_entity::ActiveModel = job.into();
        model.insert(self.db.as_ref()).await?;
        Ok(job.clone())
    }

    async fn put_job(&self, job: &Job) -> Result<(), RepositoryError> {
        let model: job_entity::ActiveModel = job.into();
        job_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    job_entity::Column::AssessmentType,
                    job_entity::Column::JobId,
                ])
                .update_columns([
                    job_entity::Column::Status,
                    job_entity::Column::StartedAt,
                    job_entity::Column::StartedBy,
                    job_entity::Column::FinishedAt,
                    job_entity::Column::Error,
                    job_entity::Column::ExpiresAt,
                ])
                .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn get_job(
        &self,
        assessment_type: AssessmentType,
        job_id: &str,
    ) -> Result<Option<Job>, RepositoryError> {
        let model =
            job_entity::Entity::find_by_id((assessment_type.to_string(), job_id.to_string()))
                .one(self.db.as_ref())
                .await?;
        model.map(job_from_model).transpose()
    }

    async fn find_all_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        let models = job_entity::Entity::find()
            .order_by_desc(job_entity::Column::StartedAt)
            .all(self.db.as_ref())
            .await?;
        models.into_iter().map(job_from_model).collect()
    }

    async fn find_jobs_by_assessment_type(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<Vec<Job>, RepositoryError> {
        let models = job_entity::Entity::find()
            .filter(job_entity::Column::AssessmentType.eq(assessment_type.to_string()))
            .order_by_desc(job_entity::Column::StartedAt)
            .all(self.db.as_ref())
            .await?;
        models.into_iter().map(job_from_model).collect()
    }

    async fn delete_job(
        &self,
        assessment_type: AssessmentType,
        job_id: &str,
    ) -> Result<(), RepositoryError> {
        job_entity::Entity::delete_by_id((assessment_type.to_string(), job_id.to_string()))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn put_job_marker(&self, marker: &JobMarker) -> Result<(), RepositoryError> {
        let model: marker_entity::ActiveModel = marker.into();
        marker_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::column(marker_entity::Column::AssessmentType)
                    .update_columns([
                        marker_entity::Column::JobId,
                        marker_entity::Column::Status,
                        marker_entity::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn get_job_marker(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<Option<JobMarker>, RepositoryError> {
        let model = marker_entity::Entity::find_by_id(assessment_type.to_string())
            .one(self.db.as_ref())
            .await?;
        model.map(marker_from_model).transpose()
    }

    async fn find_all_job_markers(&self) -> Result<Vec<JobMarker>, RepositoryError> {
        let models = marker_entity::Entity::find().all(self.db.as_ref()).await?;
        models.into_iter().map(marker_from_model).collect()
    }

    async fn create_task_failure(&self, failure: &TaskFailure) -> Result<(), RepositoryError> {
        let model: failure_entity::ActiveModel = failure.into();
        model.insert(self.db.as_ref()).await?;
        Ok(())
    }

    async fn find_task_failures_by_job_id(
        &self,
        job_id: &str,
    ) -> Result<Vec<TaskFailure>, RepositoryError> {
        let models = failure_entity::Entity::find()
            .filter(failure_entity::Column::JobId.eq(job_id))
            .all(self.db.as_ref())
            .await?;
        models.into_iter().map(failure_from_model).collect()
    }

    async fn delete_task_failures_by_job_id(
        &self,
        job_id: &str,
    ) -> Result<u64, RepositoryError> {
        let result = failure_entity::Entity::delete_many()
            .filter(failure_entity::Column::JobId.eq(job_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn purge_expired(&self, now: DateTime<FixedOffset>) -> Result<u64, RepositoryError> {
        let jobs = job_entity::Entity::delete_many()
            .filter(job_entity::Column::ExpiresAt.lte(now))
            .exec(self.db.as_ref())
            .await?;
        let markers = marker_entity::Entity::delete_many()
            .filter(marker_entity::Column::ExpiresAt.lte(now))
            .exec(self.db.as_ref())
            .await?;
        let failures = failure_entity::Entity::delete_many()
            .filter(failure_entity::Column::ExpiresAt.lte(now))
            .exec(self.db.as_ref())
            .await?;
        Ok(jobs.rows_affected + markers.rows_affected + failures.rows_affected)
    }
}
