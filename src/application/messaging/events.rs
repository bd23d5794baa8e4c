//! Auxiliary event entry points - membership changes, group updates, calls, deletions

use crate::application::errors::BotError;
use crate::domain::entities::{
    CallEvent, DeletionEvent, GroupMetadata, GroupUpdate, ParticipantAction, ParticipantsUpdate,
};
use crate::infrastructure::config::render;
use super::dispatcher::Dispatcher;

/// `@<local part>` of a participant id
fn mention(id: &str) -> String {
    format!("@{}", id.split('@').next().unwrap_or(id))
}

impl Dispatcher {
    /// Welcome/bye and promote/demote notices. Returns the number of notices sent.
    pub async fn on_participants(&self, update: ParticipantsUpdate) -> Result<usize, BotError> {
        if self.config().dispatch.self_mode {
            return Ok(0);
        }
        let chat = self.store().ensure_chat(&update.chat_id);
        let notices = &self.config().notices;

        let texts: Vec<String> = match update.action {
            ParticipantAction::Add | ParticipantAction::Remove => {
                if !chat.welcome {
                    return Ok(0);
                }
                let metadata = match self.bot().group_metadata(&update.chat_id).await {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        tracing::warn!("Group metadata for {} unavailable: {}", update.chat_id, e);
                        GroupMetadata::default()
                    }
                };
                let template = if update.action == ParticipantAction::Add {
                    chat.welcome_text.as_deref().unwrap_or(&notices.welcome)
                } else {
                    chat.bye_text.as_deref().unwrap_or(&notices.bye)
                };
                let description = metadata.description.as_deref().unwrap_or("");
                update
                    .participants
                    .iter()
                    .map(|user| {
                        template
                            .replace("@subject", &metadata.subject)
                            .replace("@desc", description)
                            .replace("@user", &mention(user))
                    })
                    .collect()
            }
            ParticipantAction::Promote | ParticipantAction::Demote => {
                if !chat.detect {
                    return Ok(0);
                }
                let template = if update.action == ParticipantAction::Promote {
                    &notices.promote
                } else {
                    &notices.demote
                };
                update
                    .participants
                    .iter()
                    .map(|user| template.replace("@user", &mention(user)))
                    .collect()
            }
        };

        for text in &texts {
            self.bot().send_message(&update.chat_id, text).await?;
        }
        Ok(texts.len())
    }

    /// Detect notice for subject, description, icon or invite changes. The last changed field wins.
    pub async fn on_group_update(&self, update: GroupUpdate) -> Result<bool, BotError> {
        if self.config().dispatch.self_mode {
            return Ok(false);
        }
        let chat = self.store().ensure_chat(&update.chat_id);
        if !chat.detect {
            return Ok(false);
        }
        let notices = &self.config().notices;

        let mut text = None;
        if let Some(description) = &update.description {
            text = Some(notices.description_changed.replace("@desc", description));
        }
        if let Some(subject) = &update.subject {
            text = Some(notices.subject_changed.replace("@subject", subject));
        }
        if update.icon_changed {
            text = Some(notices.icon_changed.clone());
        }
        if let Some(code) = &update.invite_code {
            text = Some(notices.invite_revoked.replace("@revoke", code));
        }

        let Some(text) = text else {
            return Ok(false);
        };
        self.bot().send_message(&update.chat_id, &text).await?;
        Ok(true)
    }

    /// Reject and block private callers when anti-call is on
    pub async fn on_call(&self, call: CallEvent) -> Result<bool, BotError> {
        let settings = self.store().settings(self.bot_id());
        if !settings.anticall || !call.is_offer || call.is_group {
            return Ok(false);
        }
        self.bot()
            .send_message(&call.from, &self.config().notices.call_rejected)
            .await?;
        self.bot().block_user(&call.from).await?;
        tracing::info!("Blocked caller {} (call {})", call.from, call.id);
        Ok(true)
    }

    /// Re-post deleted text in chats with anti-delete on
    pub async fn on_delete(&self, event: DeletionEvent) -> Result<bool, BotError> {
        if event.from_me {
            return Ok(false);
        }
        let Some(chat) = self.store().chat(&event.chat_id) else {
            return Ok(false);
        };
        if !chat.antidelete {
            return Ok(false);
        }
        let text = render(
            &self.config().notices.deleted,
            &[("text", event.text.as_deref().unwrap_or(""))],
        )
        .replace("@user", &mention(&event.participant));
        self.bot().send_message(&event.chat_id, &text).await?;
        tracing::debug!("Re-posted deleted message {} in {}", event.message_id, event.chat_id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::entities::Participant;
    use crate::domain::traits::Store;
    use crate::infrastructure::adapters::console::ConsoleAdapter;
    use crate::infrastructure::config::Config;
    use crate::infrastructure::plugins::PluginRegistry;
    use crate::infrastructure::storage::MemoryStore;

    fn setup(config: Config) -> (Dispatcher, Arc<ConsoleAdapter>, Arc<MemoryStore>) {
        let bot = Arc::new(ConsoleAdapter::new().quiet().with_group(
            "g1",
            GroupMetadata {
                id: "g1".to_string(),
                subject: "Rustaceans".to_string(),
                description: Some("crabs only".to_string()),
                participants: vec![Participant::member("111@s.whatsapp.net")],
            },
        ));
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(config, Arc::new(PluginRegistry::new()), store.clone(), bot.clone());
        (dispatcher, bot, store)
    }

    #[tokio::test]
    async fn test_welcome_uses_chat_template() {
        let (dispatcher, bot, store) = setup(Config::default());
        store.ensure_chat("g1");
        store.update_chat("g1", &mut |chat| chat.welcome_text = Some("Hi @user, read: @desc (@subject)".to_string()));

        let sent = dispatcher
            .on_participants(ParticipantsUpdate {
                chat_id: "g1".to_string(),
                participants: vec!["111@s.whatsapp.net".to_string(), "222@s.whatsapp.net".to_string()],
                action: ParticipantAction::Add,
            })
            .await
            .unwrap();

        assert_eq!(sent, 2);
        assert_eq!(bot.texts(), vec![
            "Hi @111, read: crabs only (Rustaceans)".to_string(),
            "Hi @222, read: crabs only (Rustaceans)".to_string(),
        ]);
    }

    #[tokio::test]
    async fn test_welcome_toggle_and_self_mode() {
        let (dispatcher, bot, store) = setup(Config::default());
        store.ensure_chat("g1");
        store.update_chat("g1", &mut |chat| chat.welcome = false);
        let update = ParticipantsUpdate {
            chat_id: "g1".to_string(),
            participants: vec!["111".to_string()],
            action: ParticipantAction::Remove,
        };
        assert_eq!(dispatcher.on_participants(update.clone()).await.unwrap(), 0);

        let mut config = Config::default();
        config.dispatch.self_mode = true;
        let (selfish, _, _) = setup(config);
        assert_eq!(selfish.on_participants(update).await.unwrap(), 0);
        assert!(bot.texts().is_empty());
    }

    #[tokio::test]
    async fn test_promote_notice() {
        let (dispatcher, bot, _) = setup(Config::default());
        dispatcher
            .on_participants(ParticipantsUpdate {
                chat_id: "g1".to_string(),
                participants: vec!["333@s.whatsapp.net".to_string()],
                action: ParticipantAction::Promote,
            })
            .await
            .unwrap();
        assert_eq!(bot.texts(), vec!["@333 is now an admin.".to_string()]);
    }

    #[tokio::test]
    async fn test_group_update_latest_field_wins() {
        let (dispatcher, bot, _) = setup(Config::default());
        let update = GroupUpdate {
            chat_id: "g1".to_string(),
            subject: Some("New name".to_string()),
            description: Some("New rules".to_string()),
            ..Default::default()
        };
        assert!(dispatcher.on_group_update(update).await.unwrap());
        assert_eq!(bot.texts(), vec!["Subject changed to\nNew name".to_string()]);

        let nothing = GroupUpdate {
            chat_id: "g1".to_string(),
            ..Default::default()
        };
        assert!(!dispatcher.on_group_update(nothing).await.unwrap());
    }

    #[tokio::test]
    async fn test_anticall_blocks_private_offer() {
        let (dispatcher, bot, store) = setup(Config::default());
        let call = CallEvent {
            id: "c1".to_string(),
            from: "444@s.whatsapp.net".to_string(),
            is_group: false,
            is_offer: true,
        };
        assert!(!dispatcher.on_call(call.clone()).await.unwrap());

        store.update_settings(dispatcher.bot_id(), &mut |settings| settings.anticall = true);
        assert!(dispatcher.on_call(call).await.unwrap());
        assert_eq!(bot.blocked(), vec!["444@s.whatsapp.net".to_string()]);
        assert_eq!(bot.sent()[0].chat_id, "444@s.whatsapp.net");
    }

    #[tokio::test]
    async fn test_antidelete_reposts_text() {
        let (dispatcher, bot, store) = setup(Config::default());
        let event = DeletionEvent {
            chat_id: "g1".to_string(),
            participant: "555@s.whatsapp.net".to_string(),
            message_id: "m9".to_string(),
            text: Some("oops".to_string()),
            from_me: false,
        };
        assert!(!dispatcher.on_delete(event.clone()).await.unwrap());

        store.ensure_chat("g1");
        store.update_chat("g1", &mut |chat| chat.antidelete = true);
        assert!(dispatcher.on_delete(event).await.unwrap());
        assert_eq!(bot.texts(), vec!["@555 deleted a message:\noops".to_string()]);
    }
}
