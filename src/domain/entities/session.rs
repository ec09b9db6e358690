use std::fmt;
use std::ops::BitOr;

/// Gateway capability flags requested at connect time.
///
/// Bit positions follow the Discord gateway so adapters can pass the raw
/// value straight through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Intents(u64);

impl Intents {
    pub const GUILD_MESSAGES: Intents = Intents(1 << 9);
    pub const DIRECT_MESSAGES: Intents = Intents(1 << 12);
    pub const MESSAGE_CONTENT: Intents = Intents(1 << 15);

    pub const fn empty() -> Self {
        Intents(0)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn contains(self, other: Intents) -> bool {
        self.0 & other.0 == other.0
    }

    /// Guild message visibility plus message content access
    pub const fn chat_logging() -> Self {
        Intents(Self::GUILD_MESSAGES.0 | Self::MESSAGE_CONTENT.0)
    }
}

impl BitOr for Intents {
    type Output = Intents;

    fn bitor(self, rhs: Self) -> Self::Output {
        Intents(self.0 | rhs.0)
    }
}

/// Lifecycle of the gateway connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

impl ConnectionState {
    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Forward moves only, plus `Closing -> Disconnected`. A failed connect
    /// tears down through `Closing` like any other shutdown.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Closing)
                | (Connected, Closing)
                | (Closing, Disconnected)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closing => "closing",
        };
        f.write_str(s)
    }
}

/// A bot session against the chat gateway
#[derive(Clone)]
pub struct Session {
    token: String,
    state: ConnectionState,
    intents: Intents,
    history: Vec<ConnectionState>,
}

impl Session {
    pub fn new(token: impl Into<String>, intents: Intents) -> Self {
        Self {
            token: token.into(),
            state: ConnectionState::Disconnected,
            intents,
            history: vec![ConnectionState::Disconnected],
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn intents(&self) -> Intents {
        self.intents
    }

    /// Every state this session has been in, oldest first
    pub fn history(&self) -> &[ConnectionState] {
        &self.history
    }

    /// Move to `next`, returning the previous state on success
    pub fn transition(&mut self, next: ConnectionState) -> Result<ConnectionState, String> {
        if !self.state.can_transition_to(next) {
            return Err(format!("illegal transition {} -> {}", self.state, next));
        }
        let prev = self.state;
        self.state = next;
        self.history.push(next);
        Ok(prev)
    }
}

// Keep the token out of debug output
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("state", &self.state)
            .field("intents", &self.intents)
            .finish()
    }
}
