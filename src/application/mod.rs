//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Chat log, persistence gateway, session lifecycle
//! - Commands: Built-in command declarations
//! - Errors: Domain-specific errors
//! - Messaging: Command parsing, routing, event dispatching

pub mod commands;
pub mod errors;
pub mod messaging;
pub mod services;
