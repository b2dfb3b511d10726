use thiserror::Error;
use uuid::Uuid;

/// Validation and lookup failures of the shopping list and menu stores.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlannerError {
    #[error("Por favor, introduce un nombre para el ítem")]
    EmptyItemName,

    #[error("Por favor, introduce un nombre para el menú")]
    EmptyMenuName,

    #[error("Por favor, añade al menos un ingrediente")]
    NoIngredients,

    #[error("item {0} not found")]
    ItemNotFound(Uuid),

    #[error("menu {0} not found")]
    MenuNotFound(Uuid),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Por favor, introduce una API Key válida")]
    EmptyApiKey,

    #[error("Por favor, introduce un prompt válido")]
    EmptySystemPrompt,

    #[error("could not persist settings: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Everything that can go wrong on the way to a chat completion.
///
/// These never reach the user directly: the gateway logs them and replies
/// with one of its fixed messages instead.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no API key configured for {0}")]
    MissingCredential(&'static str),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("response contained no choices")]
    EmptyReply,
}
