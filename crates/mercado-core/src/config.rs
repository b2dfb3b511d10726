//! Assistant settings: API keys and the system prompt, mirrored to the
//! local key/value store.

use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::SettingsError;
use crate::provider::Provider;
use crate::storage::LocalStore;

pub const DEFAULT_SYSTEM_PROMPT: &str = "Eres un asistente de compras y planificación de menús llamado Mercado Mágico. Ayudas a los usuarios a gestionar su lista de compras y a planificar sus menús semanales. Debes ser amable, servicial y dar respuestas concisas en español. Estructura tus respuestas en párrafos claros y ordenados, usando listas numeradas o con viñetas cuando sea apropiado.";

const SYSTEM_PROMPT_KEY: &str = "system_prompt";
const PROVIDER_KEY: &str = "provider";
const MODEL_KEY: &str = "model";

/// Where the active API key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Env,
    Stored,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Env => "env",
            KeySource::Stored => "config",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    store: LocalStore,
    api_keys: HashMap<Provider, (String, KeySource)>,
    system_prompt: String,
    provider: Provider,
    model: Option<String>,
}

impl Settings {
    pub fn load(store: LocalStore) -> Self {
        Self::load_with_env(store, |name| std::env::var(name).ok())
    }

    /// Like `load`, with environment lookups going through `env`
    pub fn load_with_env<F>(store: LocalStore, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut api_keys = HashMap::new();
        for provider in Provider::all() {
            let from_env = env(provider.env_var()).filter(|k| !k.trim().is_empty());
            let entry = match from_env {
                Some(key) => Some((key, KeySource::Env)),
                None => store
                    .get(provider.storage_key())
                    .filter(|k| !k.is_empty())
                    .map(|k| (k.to_string(), KeySource::Stored)),
            };
            if let Some(entry) = entry {
                api_keys.insert(provider, entry);
            }
        }

        let system_prompt = store
            .get(SYSTEM_PROMPT_KEY)
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
            .to_string();

        let provider = store
            .get(PROVIDER_KEY)
            .and_then(Provider::from_str)
            .unwrap_or_default();

        let model = store.get(MODEL_KEY).map(str::to_string);

        Self {
            store,
            api_keys,
            system_prompt,
            provider,
            model,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn api_key(&self) -> &str {
        self.api_key_for(self.provider)
    }

    pub fn api_key_for(&self, provider: Provider) -> &str {
        self.api_keys
            .get(&provider)
            .map(|(key, _)| key.as_str())
            .unwrap_or("")
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key().is_empty()
    }

    pub fn key_source(&self, provider: Provider) -> Option<KeySource> {
        self.api_keys.get(&provider).map(|(_, source)| *source)
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn default_system_prompt() -> &'static str {
        DEFAULT_SYSTEM_PROMPT
    }

    /// Model to request: the stored override or the provider default
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn set_api_key(&mut self, provider: Provider, key: &str) -> Result<(), SettingsError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SettingsError::EmptyApiKey);
        }
        self.store.set(provider.storage_key(), key)?;
        self.api_keys
            .insert(provider, (key.to_string(), KeySource::Stored));
        info!(provider = provider.as_str(), "saved API key");
        Ok(())
    }

    pub fn set_system_prompt(&mut self, prompt: &str) -> Result<(), SettingsError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SettingsError::EmptySystemPrompt);
        }
        self.store.set(SYSTEM_PROMPT_KEY, prompt)?;
        self.system_prompt = prompt.to_string();
        info!(chars = prompt.chars().count(), "saved system prompt");
        Ok(())
    }

    /// Switching provider drops any model override, since model names are
    /// provider specific
    pub fn set_provider(&mut self, provider: Provider) -> Result<(), SettingsError> {
        self.store.set(PROVIDER_KEY, provider.as_str())?;
        if self.provider != provider && self.model.take().is_some() {
            if let Err(e) = self.store.remove(MODEL_KEY) {
                warn!("could not clear model override: {e}");
            }
        }
        self.provider = provider;
        info!(provider = provider.as_str(), "switched provider");
        Ok(())
    }
}
