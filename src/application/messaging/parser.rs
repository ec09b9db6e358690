//! Command parser - Splits prefixed message text into a command invocation

use crate::domain::entities::Invocation;

/// Recognizes command candidates by their leading prefix character
#[derive(Debug, Clone, Copy)]
pub struct CommandParser {
    prefix: char,
}

impl CommandParser {
    pub fn new(prefix: char) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    /// Parse message content.
    ///
    /// Returns `None` unless the very first character is the prefix. The
    /// command name is whatever follows the prefix up to the first
    /// whitespace, so a bare prefix yields an empty name.
    pub fn parse(&self, content: &str) -> Option<Invocation> {
        let rest = content.strip_prefix(self.prefix)?;

        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (name, tail) = rest.split_at(name_end);
        let args = tail.split_whitespace().map(str::to_string).collect();

        Some(Invocation {
            name: name.to_string(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_prefixed_text_is_not_a_command() {
        let parser = CommandParser::new('!');
        assert_eq!(parser.parse("hello"), None);
        assert_eq!(parser.parse(""), None);
        assert_eq!(parser.parse(" !test"), None);
        assert_eq!(parser.parse("/test"), None);
    }

    #[test]
    fn splits_name_and_args() {
        let parser = CommandParser::new('!');
        let inv = parser.parse("!music play  lofi beats").unwrap();
        assert_eq!(inv.name, "music");
        assert_eq!(inv.args, vec!["play", "lofi", "beats"]);
    }

    #[test]
    fn bare_prefix_has_empty_name() {
        let parser = CommandParser::new('!');
        let inv = parser.parse("!").unwrap();
        assert_eq!(inv.name, "");
        assert!(inv.args.is_empty());

        let inv = parser.parse("! test").unwrap();
        assert_eq!(inv.name, "");
        assert_eq!(inv.args, vec!["test"]);
    }

    #[test]
    fn multibyte_prefix_and_content() {
        let parser = CommandParser::new('¡');
        let inv = parser.parse("¡hots café").unwrap();
        assert_eq!(inv.name, "hots");
        assert_eq!(inv.args, vec!["café"]);
    }
}
