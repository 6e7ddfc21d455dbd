//! JSON-file conversation store.
//!
//! One file per conversation at `<data_dir>/<owner>/<id>.json`. Identifiers
//! are sanitized before touching the filesystem so ids can never escape the
//! data directory.

use async_trait::async_trait;
use council_application::{
    Conversation, ConversationMeta, ConversationStore, StoreError, StoredMessage,
};
use council_domain::CouncilTurn;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct JsonConversationStore {
    data_dir: PathBuf,
}

impl JsonConversationStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn conversation_path(&self, owner: &str, conversation_id: &str) -> PathBuf {
        self.data_dir
            .join(sanitize(owner))
            .join(format!("{}.json", sanitize(conversation_id)))
    }

    async fn read(&self, path: &Path, conversation_id: &str) -> Result<Conversation, StoreError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(conversation_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    async fn write(&self, path: &Path, conversation: &Conversation) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(conversation)?;
        tokio::fs::write(path, raw).await?;
        Ok(())
    }

    async fn mutate<F>(
        &self,
        owner: &str,
        conversation_id: &str,
        apply: F,
    ) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Conversation),
    {
        let path = self.conversation_path(owner, conversation_id);
        let mut conversation = self.read(&path, conversation_id).await?;
        apply(&mut conversation);
        self.write(&path, &conversation).await
    }
}

#[async_trait]
impl ConversationStore for JsonConversationStore {
    async fn create(
        &self,
        owner: &str,
        conversation_id: &str,
    ) -> Result<Conversation, StoreError> {
        let conversation = Conversation {
            id: conversation_id.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            title: Conversation::DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
        };
        let path = self.conversation_path(owner, conversation_id);
        self.write(&path, &conversation).await?;
        debug!(owner, conversation_id, "Created conversation");
        Ok(conversation)
    }

    async fn get(&self, owner: &str, conversation_id: &str) -> Result<Conversation, StoreError> {
        let path = self.conversation_path(owner, conversation_id);
        self.read(&path, conversation_id).await
    }

    async fn list(&self, owner: &str) -> Result<Vec<ConversationMeta>, StoreError> {
        let owner_dir = self.data_dir.join(sanitize(owner));
        let mut entries = match tokio::fs::read_dir(&owner_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut metas = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = tokio::fs::read_to_string(&path).await?;
            // Skip files that are not conversations rather than failing the listing
            let Ok(conversation) = serde_json::from_str::<Conversation>(&raw) else {
                debug!(path = %path.display(), "Skipping unreadable conversation file");
                continue;
            };
            metas.push(ConversationMeta {
                id: conversation.id,
                created_at: conversation.created_at,
                title: conversation.title,
                message_count: conversation.messages.len(),
            });
        }

        metas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(metas)
    }

    async fn add_user_message(
        &self,
        owner: &str,
        conversation_id: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        let content = content.to_string();
        self.mutate(owner, conversation_id, |c| {
            c.messages.push(StoredMessage::User { content });
        })
        .await
    }

    async fn append_turn(
        &self,
        owner: &str,
        conversation_id: &str,
        turn: &CouncilTurn,
    ) -> Result<(), StoreError> {
        let message = StoredMessage::Assistant {
            stage1: turn.stage1.clone(),
            stage2: turn.verdicts.clone(),
            stage3: turn.synthesis.clone(),
        };
        self.mutate(owner, conversation_id, |c| {
            c.messages.push(message);
        })
        .await
    }

    async fn update_title(
        &self,
        owner: &str,
        conversation_id: &str,
        title: &str,
    ) -> Result<(), StoreError> {
        let title = title.to_string();
        self.mutate(owner, conversation_id, |c| {
            c.title = title;
        })
        .await
    }

    async fn delete(&self, owner: &str, conversation_id: &str) -> Result<bool, StoreError> {
        let path = self.conversation_path(owner, conversation_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Map anything outside `[a-zA-Z0-9_-]` to `_`
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
