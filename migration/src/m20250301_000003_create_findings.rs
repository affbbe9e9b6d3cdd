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
        // findings: 复合主键 (assessment_type, sort_key)，按类别分区
        manager
            .create_table(
                Table::create()
                    .table(Findings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Findings::AssessmentType).string().not_null())
                    .col(ColumnDef::new(Findings::SortKey).string().not_null())
                    .col(ColumnDef::new(Findings::AccountId).string().not_null())
                    .col(ColumnDef::new(Findings::Region).string())
                    .col(ColumnDef::new(Findings::JobId).string().not_null())
                    .col(
                        ColumnDef::new(Findings::AssessedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Findings::Payload).json().not_null())
                    .col(
                        ColumnDef::new(Findings::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(Findings::AssessmentType)
                            .col(Findings::SortKey),
                    )
                    .to_owned(),
            )
            .await?;

        // 二级索引：按 JobId 拉取一次任务产生的全部发现
        manager
            .create_index(
                Index::create()
                    .name("idx_findings_job_id")
                    .table(Findings::Table)
                    .col(Findings::JobId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Findings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Findings {
    Table,
    AssessmentType,
    SortKey,
    AccountId,
    Region,
    JobId,
    AssessedAt,
    Payload,
    ExpiresAt,
}
