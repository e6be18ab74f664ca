//! `SeaORM` Entity for work_papers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::WorkPaperStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "work_papers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub document_link: Option<String>,
    pub status: WorkPaperStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::work_paper_signatures::Entity")]
    WorkPaperSignatures,
}

impl Related<super::work_paper_signatures::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkPaperSignatures.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
