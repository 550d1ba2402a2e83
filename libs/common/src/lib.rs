//! Common library for the countdown timer backend
//!
//! This crate provides shared infrastructure used by the API service:
//! SQLite connection pooling, health checks, and the database error
//! types.

pub mod database;
pub mod error;
