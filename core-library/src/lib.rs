//! # Position Store
//!
//! Durable resume positions for the player core.
//!
//! ## Overview
//!
//! This crate manages:
//! - SQLite connection pool and embedded schema migrations
//! - The `PlaybackPosition` model (one row per media key)
//! - `PositionRepository` with get/upsert/delete/prune by key
//!
//! Callers never mutate the table directly; the playback session controller
//! is the only writer.

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{LibraryError, Result};
pub use models::PlaybackPosition;
pub use repositories::{PositionRepository, SqlitePositionRepository};
