pub mod analytics;
pub mod client;
pub mod config;
pub mod decode;
pub mod history;
pub mod message;
pub mod session;

pub use analytics::{AnalyticsClient, Keyword, PopularTopic, TimeRange, TrendReport};
pub use client::{ChatClient, ChatError};
pub use config::Config;
pub use history::{ChatSummary, HistoryStore};
pub use message::{Conversation, Message, Role, reconcile};
pub use session::{ChatSession, ERROR_REPLY, SessionEvent};
