//! Built-in command declarations

use crate::application::errors::CommandError;
use crate::application::messaging::CommandRouter;
use crate::domain::entities::Command;

/// Names registered at startup, in registration order
pub const BUILTIN_COMMANDS: [&str; 4] = ["test", "hots", "music", "recommend"];

/// Register the built-in commands.
///
/// `test` answers straight away. The others are declared so they show up
/// as loaded and reply that they are not implemented yet.
pub fn register_defaults(router: &CommandRouter) -> Result<(), CommandError> {
    router.register(
        Command::new("test")
            .with_description("Check that the bot is alive")
            .with_usage("!test [words...]")
            .with_handler(|inv| {
                if inv.args.is_empty() {
                    Ok("Test command OK".to_string())
                } else {
                    Ok(format!("Test command OK: {}", inv.args.join(" ")))
                }
            }),
    )?;

    router.register(Command::new("hots").with_description("Heroes of the Storm lookups"))?;
    router.register(Command::new("music").with_description("Music playback"))?;
    router.register(Command::new("recommend").with_description("Recommendations"))?;

    Ok(())
}
