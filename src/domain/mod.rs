//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Core business objects (Session, InboundEvent, Command)
//! - Traits: Abstractions for infrastructure (Gateway, Responder, DocumentStore)

pub mod entities;
pub mod traits;
