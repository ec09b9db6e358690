//! digo-bot - Discord chat logger and command bot
//!
//! Layers:
//! - domain: entities and infrastructure traits
//! - application: dispatcher, router, chat log, persistence, session lifecycle
//! - infrastructure: config, Discord (serenity) and MongoDB adapters

pub mod application;
pub mod domain;
pub mod infrastructure;
