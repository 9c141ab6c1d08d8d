use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Summary of one chat, as shown in the sidebar list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub timestamp: DateTime<Utc>,
    pub last_message: String,
}

/// Local chat-history store: every summary lives in one JSON file, read at
/// startup and rewritten on every mutation. Exactly one chat is active at
/// a time.
pub struct HistoryStore {
    path: PathBuf,
    chats: Vec<ChatSummary>,
}

impl HistoryStore {
    pub fn load(path: PathBuf) -> Result<Self> {
        let chats = if path.exists() {
            let content = fs::read_to_string(&path).context("Failed to read chat history")?;
            serde_json::from_str(&content).context("Failed to parse chat history")?
        } else {
            Vec::new()
        };
        Ok(Self { path, chats })
    }

    /// Create a new chat, mark it active and return its id.
    pub fn create_chat(&mut self) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        for chat in &mut self.chats {
            chat.active = false;
        }
        self.chats.push(ChatSummary {
            id: id.clone(),
            name: format!("Chat {}", self.chats.len() + 1),
            active: true,
            timestamp: Utc::now(),
            last_message: "New conversation started".to_string(),
        });
        self.persist()?;
        Ok(id)
    }

    /// Mark the given chat active, deactivating the rest.
    pub fn select_chat(&mut self, id: &str) -> Result<()> {
        for chat in &mut self.chats {
            chat.active = chat.id == id;
        }
        self.persist()
    }

    /// Record the latest message of a chat and bump its timestamp.
    pub fn touch(&mut self, id: &str, last_message: &str) -> Result<()> {
        if let Some(chat) = self.chats.iter_mut().find(|c| c.id == id) {
            chat.last_message = last_message.to_string();
            chat.timestamp = Utc::now();
            self.persist()?;
        }
        Ok(())
    }

    pub fn delete_chat(&mut self, id: &str) -> Result<()> {
        self.chats.retain(|c| c.id != id);
        self.persist()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.chats.clear();
        self.persist()
    }

    pub fn active_chat(&self) -> Option<&ChatSummary> {
        self.chats.iter().find(|c| c.active)
    }

    /// All chats, newest first.
    pub fn list(&self) -> Vec<&ChatSummary> {
        let mut chats: Vec<&ChatSummary> = self.chats.iter().collect();
        chats.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        chats
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create history directory")?;
        }
        let content =
            serde_json::to_string_pretty(&self.chats).context("Failed to serialize chat history")?;
        fs::write(&self.path, content).context("Failed to write chat history")
    }
}
