//! Command router - Resolves prefixed messages to registered handlers

use std::sync::RwLock;

use crate::application::errors::CommandError;
use crate::domain::entities::{Command, CommandRegistry};
use super::parser::CommandParser;

/// Where the registry is in its startup/shutdown lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryPhase {
    /// Accepting registrations before the gateway is ready
    Open,
    /// Ready has been seen; new registrations are flagged immediately
    Finalized,
    /// Shutting down; registrations are rejected
    Closed,
}

/// Outcome of a successfully routed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub command: String,
    pub reply: String,
}

struct RouterState {
    registry: CommandRegistry,
    phase: RegistryPhase,
}

/// Routes command messages to handlers held in a shared registry
pub struct CommandRouter {
    parser: CommandParser,
    state: RwLock<RouterState>,
}

impl CommandRouter {
    pub fn new(prefix: char) -> Self {
        Self {
            parser: CommandParser::new(prefix),
            state: RwLock::new(RouterState {
                registry: CommandRegistry::new(),
                phase: RegistryPhase::Open,
            }),
        }
    }

    pub fn prefix(&self) -> char {
        self.parser.prefix()
    }

    /// Register a command under its unique name
    pub fn register(&self, command: Command) -> Result<(), CommandError> {
        let mut state = self.state.write()
            .map_err(|_| CommandError::ExecutionFailed("Lock poisoned".to_string()))?;

        if state.phase == RegistryPhase::Closed {
            return Err(CommandError::RegistryClosed(command.name));
        }

        let name = command.name.clone();
        state.registry.register(command)?;
        tracing::debug!("Registered command {}{}", self.parser.prefix(), name);

        if state.phase == RegistryPhase::Finalized {
            for name in state.registry.mark_registered() {
                tracing::info!("Loading {} command module...", name);
            }
        }
        Ok(())
    }

    /// Mark all declared commands as live; returns the names just loaded
    pub fn finalize(&self) -> Vec<String> {
        let Ok(mut state) = self.state.write() else {
            tracing::error!("Command registry lock poisoned, cannot finalize");
            return Vec::new();
        };
        if state.phase == RegistryPhase::Closed {
            return Vec::new();
        }
        state.phase = RegistryPhase::Finalized;
        state.registry.mark_registered()
    }

    /// Reject any further registrations
    pub fn close(&self) {
        match self.state.write() {
            Ok(mut state) => state.phase = RegistryPhase::Closed,
            Err(poisoned) => poisoned.into_inner().phase = RegistryPhase::Closed,
        }
    }

    pub fn phase(&self) -> RegistryPhase {
        self.state.read()
            .map(|s| s.phase)
            .unwrap_or(RegistryPhase::Closed)
    }

    /// Command names in registration order
    pub fn commands(&self) -> Vec<String> {
        self.state.read()
            .map(|s| s.registry.names())
            .unwrap_or_default()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.state.read()
            .ok()
            .and_then(|s| s.registry.get(name).map(|c| c.registered))
            .unwrap_or(false)
    }

    /// Route message content.
    ///
    /// `Ok(None)` means the text is not a command at all. A prefixed
    /// message naming no registered command is an `UnknownCommand` error.
    pub fn route(&self, content: &str) -> Result<Option<Routed>, CommandError> {
        let Some(invocation) = self.parser.parse(content) else {
            return Ok(None);
        };

        // Clone the handler out so it runs without holding the lock
        let handler = {
            let state = self.state.read()
                .map_err(|_| CommandError::ExecutionFailed("Lock poisoned".to_string()))?;
            let cmd = state.registry.get(&invocation.name)
                .ok_or_else(|| CommandError::UnknownCommand(invocation.name.clone()))?;
            cmd.handler.clone()
        };

        let reply = match handler {
            Some(handler) => handler(&invocation)?,
            None => format!(
                "Command {}{} is not implemented yet",
                self.parser.prefix(),
                invocation.name
            ),
        };

        Ok(Some(Routed {
            command: invocation.name,
            reply,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> CommandRouter {
        let router = CommandRouter::new('!');
        router
            .register(Command::new("test").with_handler(|inv| Ok(format!("ran {}", inv.name))))
            .unwrap();
        router.register(Command::new("hots")).unwrap();
        router
    }

    #[test]
    fn plain_text_is_ignored() {
        let router = router();
        assert_eq!(router.route("test"), Ok(None));
        assert_eq!(router.route("hello !test"), Ok(None));
        assert_eq!(router.route(""), Ok(None));
    }

    #[test]
    fn resolves_registered_command() {
        let routed = router().route("!test a b").unwrap().unwrap();
        assert_eq!(routed.command, "test");
        assert_eq!(routed.reply, "ran test");
    }

    #[test]
    fn declared_without_handler_replies_not_implemented() {
        let routed = router().route("!hots").unwrap().unwrap();
        assert_eq!(routed.command, "hots");
        assert_eq!(routed.reply, "Command !hots is not implemented yet");
    }

    #[test]
    fn unknown_and_wrong_case_names_are_unknown() {
        let router = router();
        assert_eq!(
            router.route("!nope"),
            Err(CommandError::UnknownCommand("nope".to_string()))
        );
        assert_eq!(
            router.route("!TEST"),
            Err(CommandError::UnknownCommand("TEST".to_string()))
        );
        assert_eq!(
            router.route("!"),
            Err(CommandError::UnknownCommand(String::new()))
        );
    }

    #[test]
    fn handler_errors_propagate() {
        let router = CommandRouter::new('!');
        router
            .register(Command::new("fail").with_handler(|_| {
                Err(CommandError::InvalidArgs("missing query".to_string()))
            }))
            .unwrap();
        assert_eq!(
            router.route("!fail"),
            Err(CommandError::InvalidArgs("missing query".to_string()))
        );
    }

    #[test]
    fn duplicate_registration_fails_and_first_wins() {
        let router = router();
        let err = router
            .register(Command::new("test").with_handler(|_| Ok("second".to_string())))
            .unwrap_err();
        assert_eq!(err, CommandError::DuplicateCommand("test".to_string()));
        assert_eq!(router.route("!test").unwrap().unwrap().reply, "ran test");
    }

    #[test]
    fn lifecycle_finalize_then_close() {
        let router = router();
        assert_eq!(router.phase(), RegistryPhase::Open);
        assert!(!router.is_registered("test"));

        assert_eq!(router.finalize(), vec!["test", "hots"]);
        assert!(router.is_registered("test"));

        router.register(Command::new("music")).unwrap();
        assert!(router.is_registered("music"));

        router.close();
        assert_eq!(
            router.register(Command::new("recommend")),
            Err(CommandError::RegistryClosed("recommend".to_string()))
        );
        assert!(router.finalize().is_empty());
        assert_eq!(router.commands(), vec!["test", "hots", "music"]);
    }
}
