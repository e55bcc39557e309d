//! # campus-core
//!
//! Core types, validation rules, and error types for Campus.
//!
//! This crate provides the foundational types shared across all Campus crates:
//! - Entity structs for every domain object (courses, batches, enrollments, etc.)
//! - Status enums with state machine transitions
//! - ID prefix constants
//! - Stateless validation predicates and role permission tables
//! - Aggregate statistics and API response shapes
//! - Cross-cutting error types
//! - Audit detail sub-types

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod permissions;
pub mod responses;
pub mod stats;
pub mod validation;
