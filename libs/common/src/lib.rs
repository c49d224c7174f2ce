//! Shared infrastructure for the Campus Connect services.
//!
//! This crate holds the pieces that are not specific to any one service:
//! PostgreSQL connection pooling and the database error taxonomy.

pub mod database;
pub mod error;
