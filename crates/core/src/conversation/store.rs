use super::Conversation;
use crate::yaml_files::{read_record, read_records, remove_record, write_record, StoreResult};
use async_trait::async_trait;
use cutis_uuid::ShardableUuid;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Insert or replace.
    async fn save(&self, conversation: &Conversation) -> StoreResult<()>;

    async fn get(
        &self,
        user_id: &ShardableUuid,
        id: &ShardableUuid,
    ) -> StoreResult<Option<Conversation>>;

    /// Most recently started conversation, optionally restricted to one history entry.
    async fn latest(
        &self,
        user_id: &ShardableUuid,
        history_id: Option<&ShardableUuid>,
    ) -> StoreResult<Option<Conversation>>;

    /// Remove the user's conversations about `history_id`; returns how many were removed.
    async fn delete_for_history(
        &self,
        user_id: &ShardableUuid,
        history_id: &ShardableUuid,
    ) -> StoreResult<usize>;
}

fn newest<'a, I>(conversations: I, history_id: Option<&ShardableUuid>) -> Option<Conversation>
where
    I: IntoIterator<Item = &'a Conversation>,
{
    conversations
        .into_iter()
        .filter(|c| history_id.map_or(true, |h| &c.history_id == h))
        .max_by_key(|c| c.created_at)
        .cloned()
}

/// `<conversations_dir>/<s1>/<s2>/<user_id>/<conversation_id>.yaml`
pub struct FsConversationStore {
    root: PathBuf,
}

impl FsConversationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn user_dir(&self, user_id: &ShardableUuid) -> PathBuf {
        user_id.sharded_dir(&self.root)
    }

    fn path(&self, user_id: &ShardableUuid, id: &ShardableUuid) -> PathBuf {
        self.user_dir(user_id).join(format!("{}.yaml", id))
    }
}

#[async_trait]
impl ConversationStore for FsConversationStore {
    async fn save(&self, conversation: &Conversation) -> StoreResult<()> {
        write_record(&self.path(&conversation.user_id, &conversation.id), conversation).await
    }

    async fn get(
        &self,
        user_id: &ShardableUuid,
        id: &ShardableUuid,
    ) -> StoreResult<Option<Conversation>> {
        read_record(&self.path(user_id, id)).await
    }

    async fn latest(
        &self,
        user_id: &ShardableUuid,
        history_id: Option<&ShardableUuid>,
    ) -> StoreResult<Option<Conversation>> {
        let all: Vec<Conversation> = read_records(&self.user_dir(user_id)).await?;
        Ok(newest(&all, history_id))
    }

    async fn delete_for_history(
        &self,
        user_id: &ShardableUuid,
        history_id: &ShardableUuid,
    ) -> StoreResult<usize> {
        let all: Vec<Conversation> = read_records(&self.user_dir(user_id)).await?;
        let mut removed = 0;
        for conversation in all.iter().filter(|c| &c.history_id == history_id) {
            if remove_record(&self.path(user_id, &conversation.id)).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[derive(Default)]
pub struct MemoryConversationStore {
    conversations: RwLock<HashMap<ShardableUuid, Conversation>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn save(&self, conversation: &Conversation) -> StoreResult<()> {
        self.conversations
            .write()
            .await
            .insert(conversation.id.clone(), conversation.clone());
        Ok(())
    }

    async fn get(
        &self,
        user_id: &ShardableUuid,
        id: &ShardableUuid,
    ) -> StoreResult<Option<Conversation>> {
        Ok(self
            .conversations
            .read()
            .await
            .get(id)
            .filter(|c| &c.user_id == user_id)
            .cloned())
    }

    async fn latest(
        &self,
        user_id: &ShardableUuid,
        history_id: Option<&ShardableUuid>,
    ) -> StoreResult<Option<Conversation>> {
        let conversations = self.conversations.read().await;
        Ok(newest(
            conversations.values().filter(|c| &c.user_id == user_id),
            history_id,
        ))
    }

    async fn delete_for_history(
        &self,
        user_id: &ShardableUuid,
        history_id: &ShardableUuid,
    ) -> StoreResult<usize> {
        let mut conversations = self.conversations.write().await;
        let before = conversations.len();
        conversations.retain(|_, c| !(&c.user_id == user_id && &c.history_id == history_id));
        Ok(before - conversations.len())
    }
}
