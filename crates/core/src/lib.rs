//! Core business logic for Auditflow.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Parent lifecycles, party attestations, digital signatures and consensus
//! aggregation live here; persistence is reached through the traits in
//! `workflow::store`.
//!
//! # Modules
//!
//! - `workflow` - Attestation and parent status state machines

pub mod workflow;
