//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod store;

pub use bot::{EventSink, Gateway, Responder};
pub use store::DocumentStore;
