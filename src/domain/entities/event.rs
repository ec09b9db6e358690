use std::fmt::{self, Write as _};

/// Identity the gateway reports for the bot account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: String,
    pub username: String,
}

/// A chat message delivered by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub channel_id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub is_from_self: bool,
}

impl ChatMessage {
    pub fn new(
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            author_name: author_name.into(),
            content: content.into(),
            is_from_self: false,
        }
    }

    pub fn from_self(mut self, is_from_self: bool) -> Self {
        self.is_from_self = is_from_self;
        self
    }
}

/// Events the dispatcher reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Ready(BotIdentity),
    MessageCreate(ChatMessage),
}

impl InboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Ready(_) => "ready",
            InboundEvent::MessageCreate(_) => "message_create",
        }
    }
}

/// One line of the chat log
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    pub channel_id: &'a str,
    pub author_id: &'a str,
    pub author_name: &'a str,
    pub content: &'a str,
}

impl<'a> From<&'a ChatMessage> for LogRecord<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            channel_id: &msg.channel_id,
            author_id: &msg.author_id,
            author_name: &msg.author_name,
            content: &msg.content,
        }
    }
}

// One record is always one physical line: CR and LF inside the content are
// written as the two-character escapes `\r` and `\n`.
impl fmt::Display for LogRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} > ({}) {}: ", self.channel_id, self.author_id, self.author_name)?;
        for ch in self.content.chars() {
            match ch {
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                c => f.write_char(c)?,
            }
        }
        f.write_char('\n')
    }
}
