/// Admin role of a group participant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    pub admin: Option<AdminRole>,
}

impl Participant {
    pub fn member(id: impl Into<String>) -> Self {
        Self { id: id.into(), admin: None }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self { id: id.into(), admin: Some(AdminRole::Admin) }
    }

    pub fn super_admin(id: impl Into<String>) -> Self {
        Self { id: id.into(), admin: Some(AdminRole::SuperAdmin) }
    }
}

/// Group metadata as reported by the transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMetadata {
    pub id: String,
    pub subject: String,
    pub description: Option<String>,
    pub participants: Vec<Participant>,
}

impl GroupMetadata {
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }
}

/// Group context resolved for one message
#[derive(Debug, Clone, Default)]
pub struct GroupInfo {
    pub metadata: GroupMetadata,
    pub is_super_admin: bool,
    pub is_admin: bool,
    pub is_bot_admin: bool,
}

impl GroupInfo {
    pub fn resolve(metadata: GroupMetadata, sender: &str, bot_id: &str) -> Self {
        let user = metadata.participant(sender).and_then(|p| p.admin);
        let bot = metadata.participant(bot_id).and_then(|p| p.admin);
        Self {
            is_super_admin: user == Some(AdminRole::SuperAdmin),
            is_admin: user.is_some(),
            is_bot_admin: bot.is_some(),
            metadata,
        }
    }
}
