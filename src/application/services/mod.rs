//! Application services - Business logic orchestration

pub mod message_logger;
pub mod persistence;
pub mod session_manager;

pub use message_logger::MessageLogger;
pub use persistence::{PersistenceGateway, DEFAULT_STORAGE_TIMEOUT};
pub use session_manager::{termination_signal, SessionManager, SessionSettings};
