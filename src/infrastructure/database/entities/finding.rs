// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "findings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub assessment_type: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub sort_key: String,
    pub account_id: String,
    pub region: Option<String>,
    pub job_id: String,
    pub assessed_at: ChronoDateTimeWithTimeZone,
    pub payload: Json,
    pub expires_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
