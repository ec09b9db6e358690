use std::collections::HashMap;
use std::sync::Arc;

use crate::application::errors::CommandError;

/// Parsed command invocation handed to a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
}

/// Command handler function type
pub type CommandHandler = Arc<dyn Fn(&Invocation) -> Result<String, CommandError> + Send + Sync>;

/// Represents a bot command
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub usage: Option<String>,
    pub handler: Option<CommandHandler>,
    pub registered: bool,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            usage: None,
            handler: None,
            registered: false,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<String, CommandError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Case-sensitive name match
    pub fn matches(&self, input: &str) -> bool {
        self.name == input
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("has_handler", &self.handler.is_some())
            .field("registered", &self.registered)
            .finish()
    }
}

/// Command registry keyed by unique name, remembering registration order
#[derive(Default, Debug)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
    order: Vec<String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command; an existing entry with the same name is kept
    pub fn register(&mut self, command: Command) -> Result<(), CommandError> {
        if self.commands.contains_key(&command.name) {
            return Err(CommandError::DuplicateCommand(command.name));
        }
        self.order.push(command.name.clone());
        self.commands.insert(command.name.clone(), command);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Commands in registration order
    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.order.iter().filter_map(|name| self.commands.get(name))
    }

    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Flag every command as registered, returning the names newly flagged
    pub fn mark_registered(&mut self) -> Vec<String> {
        let mut flagged = Vec::new();
        for name in &self.order {
            if let Some(cmd) = self.commands.get_mut(name) {
                if !cmd.registered {
                    cmd.registered = true;
                    flagged.push(name.clone());
                }
            }
        }
        flagged
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_keeps_first() {
        let mut registry = CommandRegistry::new();
        registry
            .register(Command::new("test").with_description("first"))
            .unwrap();

        let err = registry
            .register(Command::new("test").with_description("second"))
            .unwrap_err();

        assert_eq!(err, CommandError::DuplicateCommand("test".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("test").unwrap().description.as_deref(),
            Some("first")
        );
    }

    #[test]
    fn iteration_follows_registration_order() {
        let mut registry = CommandRegistry::new();
        for name in ["test", "hots", "music", "recommend"] {
            registry.register(Command::new(name)).unwrap();
        }
        let names: Vec<_> = registry.all().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["test", "hots", "music", "recommend"]);
    }

    #[test]
    fn mark_registered_is_idempotent() {
        let mut registry = CommandRegistry::new();
        registry.register(Command::new("a")).unwrap();
        registry.register(Command::new("b")).unwrap();

        assert_eq!(registry.mark_registered(), vec!["a", "b"]);
        assert!(registry.mark_registered().is_empty());
        assert!(registry.get("a").unwrap().registered);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let cmd = Command::new("hots");
        assert!(cmd.matches("hots"));
        assert!(!cmd.matches("HOTS"));
    }
}
