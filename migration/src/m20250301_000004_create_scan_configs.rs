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
                    .table(ScanConfigs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScanConfigs::ConfigurationName)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScanConfigs::AccountIds).json())
                    .col(ColumnDef::new(ScanConfigs::OrgUnitIds).json())
                    .col(ColumnDef::new(ScanConfigs::Regions).json())
                    .col(ColumnDef::new(ScanConfigs::ServiceNames).json())
                    .col(
                        ColumnDef::new(ScanConfigs::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScanConfigs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScanConfigs {
    Table,
    ConfigurationName,
    AccountIds,
    OrgUnitIds,
    Regions,
    ServiceNames,
    ExpiresAt,
}
