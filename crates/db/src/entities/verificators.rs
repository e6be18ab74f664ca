//! `SeaORM` Entity for verificators table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::VerificatorStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "verificators")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_trip_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub position: String,
    pub status: VerificatorStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub decided_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::business_trips::Entity",
        from = "Column::BusinessTripId",
        to = "super::business_trips::Column::Id"
    )]
    BusinessTrips,
}

impl Related<super::business_trips::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessTrips.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
