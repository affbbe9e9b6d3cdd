// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scan_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub configuration_name: String,
    pub account_ids: Option<Json>,
    pub org_unit_ids: Option<Json>,
    pub regions: Option<Json>,
    pub service_names: Option<Json>,
    pub expires_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
