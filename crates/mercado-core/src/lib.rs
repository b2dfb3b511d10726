pub mod ai;
pub mod assistant;
pub mod command;
pub mod config;
pub mod error;
pub mod gateway;
pub mod menu;
pub mod model;
pub mod planner;
pub mod provider;
pub mod shopping;
pub mod state;
pub mod storage;

// Re-export main types for convenience
pub use ai::{ChatCompletionClient, CompletionBackend};
pub use assistant::{Conversation, Turn};
pub use command::Command;
pub use config::{KeySource, Settings};
pub use error::{GatewayError, PlannerError, SettingsError};
pub use gateway::{AssistantGateway, AssistantProfile};
pub use menu::{MenuBook, MenuDraft};
pub use model::{Category, CategoryFilter, MealType, MenuItem, ShoppingItem};
pub use planner::Planner;
pub use provider::Provider;
pub use shopping::{ImportOutcome, ShoppingList};
pub use state::{ChatMessage, ChatRole, PendingAction};
pub use storage::LocalStore;
