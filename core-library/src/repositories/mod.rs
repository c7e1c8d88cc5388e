//! # Repository Pattern Implementation
//!
//! Repository traits and their SQLite implementations.
//!
//! - Traits define the interface so callers can be tested against mocks
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>`
//!
//! ## Available Repositories
//!
//! - `PositionRepository` - Resume positions keyed by media locator

pub mod position;

pub use position::{PositionRepository, SqlitePositionRepository};
