//! Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `work_paper_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "work_paper_status")]
pub enum WorkPaperStatus {
    /// Draft.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Ongoing.
    #[sea_orm(string_value = "ongoing")]
    Ongoing,
    /// Ready to sign.
    #[sea_orm(string_value = "ready_to_sign")]
    ReadyToSign,
    /// Completed.
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// `business_trip_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "business_trip_status")]
pub enum BusinessTripStatus {
    /// Draft.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Ready to verify.
    #[sea_orm(string_value = "ready_to_verify")]
    ReadyToVerify,
    /// Ongoing.
    #[sea_orm(string_value = "ongoing")]
    Ongoing,
    /// Canceled.
    #[sea_orm(string_value = "canceled")]
    Canceled,
    /// Completed.
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// `signature_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "signature_status")]
pub enum SignatureStatus {
    /// Pending.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Signed.
    #[sea_orm(string_value = "signed")]
    Signed,
    /// Rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// `verificator_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "verificator_status")]
pub enum VerificatorStatus {
    /// Pending.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}
