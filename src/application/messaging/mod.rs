//! Message handling - Event-driven message processing

pub mod dispatcher;
pub mod parser;
pub mod router;

pub use dispatcher::EventDispatcher;
pub use parser::CommandParser;
pub use router::{CommandRouter, RegistryPhase, Routed};
