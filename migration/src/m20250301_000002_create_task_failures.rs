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
        manager
            .create_table(
                Table::create()
                    .table(TaskFailures::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TaskFailures::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TaskFailures::AssessmentType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TaskFailures::JobId).string().not_null())
                    .col(ColumnDef::new(TaskFailures::ServiceName).string().not_null())
                    .col(ColumnDef::new(TaskFailures::AccountId).string().not_null())
                    .col(ColumnDef::new(TaskFailures::Region).string().not_null())
                    .col(
                        ColumnDef::new(TaskFailures::FailedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TaskFailures::Error).text().not_null())
                    .col(
                        ColumnDef::new(TaskFailures::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_task_failures_job_id")
                    .table(TaskFailures::Table)
                    .col(TaskFailures::JobId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TaskFailures::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TaskFailures {
    Table,
    Id,
    AssessmentType,
    JobId,
    ServiceName,
    AccountId,
    Region,
    FailedAt,
    Error,
    ExpiresAt,
}
