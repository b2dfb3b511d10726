//! UI-agnostic chat state
//!
//! The transcript shared by every front-end, plus the pending-action tag an
//! assistant message can carry when it is waiting for a follow-up answer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::MealType;

/// A chat message in the assistant conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingAction>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::User,
            content: content.into(),
            pending: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::Assistant,
            content: content.into(),
            pending: None,
        }
    }

    pub fn with_pending(mut self, action: PendingAction) -> Self {
        self.pending = Some(action);
        self
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

/// What the assistant is waiting for, with the data needed to finish it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum PendingAction {
    AwaitIngredients { menu_name: String, meal_type: MealType },
}
