//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the player core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Session notification bus
//!
//! ## Overview
//!
//! Every other crate in the workspace depends on this one for its logging
//! conventions, the `CoreConfig` builder used at bootstrap, and the
//! broadcast bus carrying session-level events.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
