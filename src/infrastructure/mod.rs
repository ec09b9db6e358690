//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: MongoDB document store
//! - Adapters: Platform integrations (Discord)

pub mod adapters;
pub mod config;
pub mod storage;
