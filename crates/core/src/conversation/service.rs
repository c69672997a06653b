use super::{build_prompt, ChatError, ChatMessage, ChatModel, Conversation, ConversationStore, Role};
use crate::clock::Clock;
use crate::constants::MESSAGE_REQUIRED;
use crate::history::{load_detail, HistoryStore};
use crate::{CoreError, CoreResult};
use cutis_uuid::ShardableUuid;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct StartedConversation {
    pub conversation_id: ShardableUuid,
    pub reply: String,
}

pub struct ConversationService {
    conversations: Arc<dyn ConversationStore>,
    history: Arc<dyn HistoryStore>,
    model: Option<Arc<dyn ChatModel>>,
    clock: Arc<dyn Clock>,
}

impl ConversationService {
    /// `model` is `None` when no conversation model is configured; every call then fails
    /// with [`ChatError::NotConfigured`].
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        history: Arc<dyn HistoryStore>,
        model: Option<Arc<dyn ChatModel>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            conversations,
            history,
            model,
            clock,
        }
    }

    /// Start a conversation about `history_id`, or about the user's newest entry.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidInput`] for a blank message or malformed id
    /// - [`CoreError::NotFound`] if there is no matching history entry
    /// - [`CoreError::Chat`] if the model is unavailable or fails
    pub async fn start(
        &self,
        user_id: &ShardableUuid,
        message: &str,
        history_id: Option<&str>,
    ) -> CoreResult<StartedConversation> {
        let message = require_message(message)?;
        let model = self.model()?;

        let entry = match history_id.map(str::trim).filter(|h| !h.is_empty()) {
            Some(raw) => {
                let id = parse_id(raw)?;
                self.history
                    .entry_for_user(user_id, &id)
                    .await?
                    .ok_or_else(|| {
                        CoreError::NotFound(
                            "Medical history not found for the given ID and user.".into(),
                        )
                    })?
            }
            None => self
                .history
                .entries_for_user(user_id)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| CoreError::NotFound("No medical history found for this user.".into()))?,
        };

        let history_id = entry.id.clone();
        let analysis = load_detail(self.history.as_ref(), entry)
            .await?
            .analysis_json();

        let asked_at = self.clock.now();
        let reply = model
            .generate(&build_prompt(&analysis, &[], message))
            .await?;

        let conversation = Conversation {
            id: ShardableUuid::new(),
            user_id: user_id.clone(),
            history_id,
            analysis,
            messages: vec![
                ChatMessage {
                    role: Role::User,
                    content: message.to_string(),
                    timestamp: asked_at,
                },
                ChatMessage {
                    role: Role::Ai,
                    content: reply.clone(),
                    timestamp: self.clock.now(),
                },
            ],
            created_at: asked_at,
        };
        self.conversations.save(&conversation).await?;
        tracing::info!(user = %user_id, conversation_id = %conversation.id, "conversation started");

        Ok(StartedConversation {
            conversation_id: conversation.id,
            reply,
        })
    }

    /// Append a user message and the model's answer to an existing conversation.
    pub async fn reply(
        &self,
        user_id: &ShardableUuid,
        conversation_id: &str,
        message: &str,
    ) -> CoreResult<String> {
        let message = require_message(message)?;
        let model = self.model()?;
        let id = parse_id(conversation_id)?;

        let mut conversation = self
            .conversations
            .get(user_id, &id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Conversation not found".into()))?;

        let asked_at = self.clock.now();
        let reply = model
            .generate(&build_prompt(
                &conversation.analysis,
                &conversation.messages,
                message,
            ))
            .await?;

        conversation.messages.push(ChatMessage {
            role: Role::User,
            content: message.to_string(),
            timestamp: asked_at,
        });
        conversation.messages.push(ChatMessage {
            role: Role::Ai,
            content: reply.clone(),
            timestamp: self.clock.now(),
        });
        self.conversations.save(&conversation).await?;
        Ok(reply)
    }

    /// Newest conversation for the user, optionally about one history entry.
    pub async fn latest(
        &self,
        user_id: &ShardableUuid,
        history_id: Option<&str>,
    ) -> CoreResult<Option<Conversation>> {
        let history_id = history_id
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(parse_id)
            .transpose()?;
        Ok(self
            .conversations
            .latest(user_id, history_id.as_ref())
            .await?)
    }

    fn model(&self) -> CoreResult<&Arc<dyn ChatModel>> {
        self.model
            .as_ref()
            .ok_or(CoreError::Chat(ChatError::NotConfigured))
    }
}

fn require_message(message: &str) -> CoreResult<&str> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput(MESSAGE_REQUIRED.into()));
    }
    Ok(trimmed)
}

fn parse_id(raw: &str) -> CoreResult<ShardableUuid> {
    ShardableUuid::parse(raw).map_err(|e| CoreError::InvalidInput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::conversation::MemoryConversationStore;
    use crate::history::{ConditionSnapshot, MedicalHistoryEntry, MemoryHistoryStore};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use cutis_types::Severity;
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoModel {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            Ok(format!("reply {}", prompts.len()))
        }
    }

    struct Fixture {
        service: ConversationService,
        model: Arc<EchoModel>,
        history: Arc<MemoryHistoryStore>,
        user: ShardableUuid,
        older: ShardableUuid,
        newer: ShardableUuid,
    }

    async fn seed_entry(
        history: &MemoryHistoryStore,
        user: &ShardableUuid,
        name: &str,
        mins: i64,
    ) -> ShardableUuid {
        let snapshot = ConditionSnapshot {
            id: ShardableUuid::new(),
            name: name.into(),
            description: format!("AI-detected skin condition: {}", name),
            severity: Severity::Low,
            recommendation: "Moisturise".into(),
        };
        history.insert_condition(&snapshot).await.unwrap();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() + Duration::minutes(mins);
        let entry = MedicalHistoryEntry {
            id: ShardableUuid::new(),
            user_id: user.clone(),
            condition_id: snapshot.id,
            diagnosis_date: at,
            treatment_recommendation: "Moisturise".into(),
            severity: Severity::Low,
            upload_skin: "http://localhost/images/a.png".into(),
            image_id: None,
            specialists: Vec::new(),
            clinics: Vec::new(),
            created_at: at,
        };
        history.insert_entry(&entry).await.unwrap();
        entry.id
    }

    async fn fixture() -> Fixture {
        let history = Arc::new(MemoryHistoryStore::new());
        let user = ShardableUuid::new();
        let older = seed_entry(&history, &user, "Eczema", 0).await;
        let newer = seed_entry(&history, &user, "Acne", 10).await;
        let model = Arc::new(EchoModel::default());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
        ));
        let service = ConversationService::new(
            Arc::new(MemoryConversationStore::new()),
            history.clone(),
            Some(model.clone()),
            clock,
        );
        Fixture {
            service,
            model,
            history,
            user,
            older,
            newer,
        }
    }

    #[tokio::test]
    async fn test_start_uses_newest_entry_by_default() {
        let f = fixture().await;
        let started = f.service.start(&f.user, "Is this serious?", None).await.unwrap();

        assert_eq!(started.reply, "reply 1");
        let prompt = f.model.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("\"name\": \"Acne\""));
        assert!(prompt.ends_with("User: Is this serious?\nAI:"));

        let latest = f.service.latest(&f.user, None).await.unwrap().unwrap();
        assert_eq!(latest.id, started.conversation_id);
        assert_eq!(latest.history_id, f.newer);
        assert_eq!(latest.messages.len(), 2);
        assert_eq!(latest.messages[1].role, Role::Ai);
    }

    #[tokio::test]
    async fn test_start_for_specific_entry_and_reply() {
        let f = fixture().await;
        let older = f.older.to_string();
        let started = f
            .service
            .start(&f.user, "What is eczema?", Some(&older))
            .await
            .unwrap();

        let reply = f
            .service
            .reply(&f.user, &started.conversation_id.to_string(), "How do I treat it?")
            .await
            .unwrap();
        assert_eq!(reply, "reply 2");

        let second_prompt = f.model.prompts.lock().unwrap()[1].clone();
        assert!(second_prompt.contains("\"name\": \"Eczema\""));
        assert!(second_prompt.contains("User: What is eczema?\nAI: reply 1"));

        let latest = f
            .service
            .latest(&f.user, Some(&older))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.messages.len(), 4);
        assert!(f
            .service
            .latest(&f.user, Some(&f.newer.to_string()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let f = fixture().await;
        let err = f.service.start(&f.user, "   ", None).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(ref m) if m == MESSAGE_REQUIRED));
        assert!(f.model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_history_is_not_found() {
        let f = fixture().await;
        let stranger = ShardableUuid::new();
        assert!(matches!(
            f.service.start(&stranger, "hi", None).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            f.service
                .start(&stranger, "hi", Some(&f.older.to_string()))
                .await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            f.service.start(&f.user, "hi", Some("bogus")).await,
            Err(CoreError::InvalidInput(_))
        ));
        assert_eq!(f.history.entry_count().await, 2);
    }

    #[tokio::test]
    async fn test_reply_to_unknown_conversation() {
        let f = fixture().await;
        let err = f
            .service
            .reply(&f.user, &ShardableUuid::new().to_string(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_without_model_conversations_are_unavailable() {
        let service = ConversationService::new(
            Arc::new(MemoryConversationStore::new()),
            Arc::new(MemoryHistoryStore::new()),
            None,
            Arc::new(crate::clock::SystemClock),
        );
        let err = service
            .start(&ShardableUuid::new(), "hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Chat(ChatError::NotConfigured)));
    }
}
