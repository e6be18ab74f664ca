//! Repository implementations for data access.
//!
//! The workflow store adapts the core persistence traits to `SeaORM`,
//! hiding the database details from the orchestrator.

pub mod workflow;

pub use workflow::{SeaOrmUnitOfWork, SeaOrmWorkflowStore};
