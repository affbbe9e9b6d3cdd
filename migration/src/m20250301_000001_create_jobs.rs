// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // jobs: 复合主键 (assessment_type, job_id)
        manager
            .create_table(
                Table::create()
                    .table(Jobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Jobs::AssessmentType).string().not_null())
                    .col(ColumnDef::new(Jobs::JobId).string().not_null())
                    .col(ColumnDef::new(Jobs::Status).string().not_null())
                    .col(
                        ColumnDef::new(Jobs::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Jobs::StartedBy).string().not_null())
                    .col(ColumnDef::new(Jobs::FinishedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Jobs::Error).text())
                    .col(
                        ColumnDef::new(Jobs::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(Jobs::AssessmentType)
                            .col(Jobs::JobId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_started_at")
                    .table(Jobs::Table)
                    .col(Jobs::StartedAt)
                    .to_owned(),
            )
            .await?;

        // job_markers: 每种评估类型的最近一次任务
        manager
            .create_table(
                Table::create()
                    .table(JobMarkers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobMarkers::AssessmentType)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JobMarkers::JobId).string().not_null())
                    .col(ColumnDef::new(JobMarkers::Status).string().not_null())
                    .col(
                        ColumnDef::new(JobMarkers::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobMarkers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Jobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    AssessmentType,
    JobId,
    Status,
    StartedAt,
    StartedBy,
    FinishedAt,
    Error,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum JobMarkers {
    Table,
    AssessmentType,
    JobId,
    Status,
    ExpiresAt,
}
