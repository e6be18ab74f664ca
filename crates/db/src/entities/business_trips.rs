//! `SeaORM` Entity for business_trips table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::BusinessTripStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "business_trips")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub purpose: String,
    pub destination: String,
    pub status: BusinessTripStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::verificators::Entity")]
    Verificators,
}

impl Related<super::verificators::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Verificators.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
