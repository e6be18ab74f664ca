//! `SeaORM` Entity for work_paper_signatures table.
//!
//! The digital signature columns are all null until the signer signs
//! digitally, and are cleared together on reset.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::SignatureStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "work_paper_signatures")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub work_paper_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub position: String,
    pub status: SignatureStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub decided_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub digital_signature: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub signature_payload: Option<String>,
    pub signature_algorithm: Option<String>,
    pub signed_at: Option<DateTimeWithTimeZone>,
    pub signature_verified: bool,
    pub verified_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub verification_error: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_papers::Entity",
        from = "Column::WorkPaperId",
        to = "super::work_papers::Column::Id"
    )]
    WorkPapers,
}

impl Related<super::work_papers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkPapers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
