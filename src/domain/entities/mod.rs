//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod event;
pub mod session;

pub use command::{Command, CommandHandler, CommandRegistry, Invocation};
pub use event::{BotIdentity, ChatMessage, InboundEvent, LogRecord};
pub use session::{ConnectionState, Intents, Session};
