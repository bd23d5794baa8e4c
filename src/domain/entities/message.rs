use chrono::{DateTime, Utc};

/// Raw inbound chat event as handed over by a transport
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub id: String,
    pub chat_id: String,
    pub sender: String,
    pub text: Option<String>,
    pub is_group: bool,
    /// Authored by the bot's own account
    pub from_me: bool,
    /// Event produced by the transport library itself (outgoing echo)
    pub is_echo: bool,
    pub timestamp: DateTime<Utc>,
}

impl InboundEvent {
    pub fn new(chat_id: impl Into<String>, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            sender: sender.into(),
            text: Some(text.into()),
            is_group: false,
            from_me: false,
            is_echo: false,
            timestamp: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn in_group(mut self) -> Self {
        self.is_group = true;
        self
    }

    pub fn from_me(mut self) -> Self {
        self.from_me = true;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A message as it travels through one dispatch
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender: String,
    pub text: String,
    pub is_group: bool,
    pub from_me: bool,
    pub timestamp: DateTime<Utc>,
    pub is_command: bool,
    /// Experience accrued during this dispatch, settled on cleanup
    pub exp: i64,
    /// Pending currency debit
    pub limit: Option<i64>,
    /// Name of the plugin whose handler ran
    pub plugin: Option<String>,
    /// Redacted text of the last handler error
    pub error: Option<String>,
}

impl Message {
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}

impl From<InboundEvent> for Message {
    fn from(event: InboundEvent) -> Self {
        Self {
            id: event.id,
            chat_id: event.chat_id,
            sender: event.sender,
            text: event.text.unwrap_or_default(),
            is_group: event.is_group,
            from_me: event.from_me,
            timestamp: event.timestamp,
            is_command: false,
            exp: 0,
            limit: None,
            plugin: None,
            error: None,
        }
    }
}

/// Result of resolving a prefix and command token against message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatch {
    pub used_prefix: String,
    /// Text with the used prefix removed, untrimmed
    pub no_prefix: String,
    /// First token, case-folded
    pub command: String,
    pub args: Vec<String>,
    /// Everything after the command token
    pub text: String,
}
