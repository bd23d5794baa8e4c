/// Membership change kinds reported for a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantAction {
    Add,
    Remove,
    Promote,
    Demote,
}

#[derive(Debug, Clone)]
pub struct ParticipantsUpdate {
    pub chat_id: String,
    pub participants: Vec<String>,
    pub action: ParticipantAction,
}

/// Group metadata change; only the fields that changed are set
#[derive(Debug, Clone, Default)]
pub struct GroupUpdate {
    pub chat_id: String,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub icon_changed: bool,
    /// New invite code after the link was revoked
    pub invite_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CallEvent {
    pub id: String,
    pub from: String,
    pub is_group: bool,
    /// Incoming offer, as opposed to accept/reject/timeout notifications
    pub is_offer: bool,
}

#[derive(Debug, Clone)]
pub struct DeletionEvent {
    pub chat_id: String,
    pub participant: String,
    pub message_id: String,
    /// Text of the deleted message, when the transport still has it
    pub text: Option<String>,
    pub from_me: bool,
}
