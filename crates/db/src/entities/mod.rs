//! `SeaORM` entities for the workflow tables.

pub mod business_trips;
pub mod sea_orm_active_enums;
pub mod verificators;
pub mod work_paper_signatures;
pub mod work_papers;
