//! The assistant's single outbound call.
//!
//! `generate_response` never fails: a missing key yields a prompt to enter
//! one (without touching the network) and every other failure yields a
//! fixed apology, with the actual error going to the log.

use std::sync::Arc;
use tracing::{debug, error};

use crate::ai::{ChatCompletionClient, CompletionBackend, CompletionMessage, CompletionRequest};
use crate::config::Settings;
use crate::error::GatewayError;
use crate::provider::Provider;

pub const FALLBACK_REPLY: &str =
    "Lo siento, ha ocurrido un error al procesar tu mensaje. Por favor, intenta de nuevo más tarde.";

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 1000;

pub fn missing_key_reply(provider: Provider) -> String {
    format!(
        "Por favor, introduce tu API key de {} para continuar.",
        provider.display_name()
    )
}

/// Owned snapshot of the settings a request needs, so the call can run on
/// its own task
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantProfile {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
}

impl From<&Settings> for AssistantProfile {
    fn from(settings: &Settings) -> Self {
        Self {
            provider: settings.provider(),
            api_key: settings.api_key().to_string(),
            model: settings.model().to_string(),
            system_prompt: settings.system_prompt().to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AssistantGateway {
    backend: Arc<dyn CompletionBackend>,
}

impl Default for AssistantGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl AssistantGateway {
    pub fn new() -> Self {
        Self::with_backend(Arc::new(ChatCompletionClient::new()))
    }

    pub fn with_backend(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub fn build_request(message: &str, profile: &AssistantProfile) -> CompletionRequest {
        CompletionRequest {
            model: profile.model.clone(),
            messages: vec![
                CompletionMessage::system(&profile.system_prompt),
                CompletionMessage::user(message),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    pub async fn generate_response(&self, message: &str, profile: &AssistantProfile) -> String {
        match self.try_generate(message, profile).await {
            Ok(reply) => reply,
            Err(GatewayError::MissingCredential(_)) => missing_key_reply(profile.provider),
            Err(e) => {
                error!(provider = profile.provider.as_str(), "Error al generar respuesta: {e}");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    pub async fn try_generate(
        &self,
        message: &str,
        profile: &AssistantProfile,
    ) -> Result<String, GatewayError> {
        if profile.api_key.trim().is_empty() {
            return Err(GatewayError::MissingCredential(profile.provider.display_name()));
        }

        let request = Self::build_request(message, profile);
        debug!(
            provider = profile.provider.as_str(),
            model = %request.model,
            "sending chat completion"
        );
        self.backend
            .complete(profile.provider.endpoint(), &profile.api_key, &request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeBackend {
        reply: Result<String, u16>,
        calls: Mutex<Vec<(String, String, CompletionRequest)>>,
    }

    impl FakeBackend {
        fn new(reply: Result<String, u16>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionBackend for FakeBackend {
        async fn complete(
            &self,
            endpoint: &str,
            api_key: &str,
            request: &CompletionRequest,
        ) -> Result<String, GatewayError> {
            self.calls.lock().unwrap().push((
                endpoint.to_string(),
                api_key.to_string(),
                request.clone(),
            ));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(GatewayError::Status {
                    status: *status,
                    message: "boom".to_string(),
                }),
            }
        }
    }

    fn profile(api_key: &str) -> AssistantProfile {
        AssistantProfile {
            provider: Provider::Groq,
            api_key: api_key.to_string(),
            model: "llama3-8b-8192".to_string(),
            system_prompt: "Eres Mercado Mágico".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_key_skips_network() {
        let backend = FakeBackend::new(Ok("nunca".to_string()));
        let gateway = AssistantGateway::with_backend(backend.clone());

        let reply = gateway.generate_response("hola", &profile("")).await;
        assert_eq!(reply, "Por favor, introduce tu API key de Groq para continuar.");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_returns_reply_and_sends_prompt_pair() {
        let backend = FakeBackend::new(Ok("¡Claro!".to_string()));
        let gateway = AssistantGateway::with_backend(backend.clone());

        let reply = gateway.generate_response("¿Qué cocino hoy?", &profile("gsk_1")).await;
        assert_eq!(reply, "¡Claro!");

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (endpoint, key, request) = &calls[0];
        assert_eq!(endpoint, Provider::Groq.endpoint());
        assert_eq!(key, "gsk_1");
        assert_eq!(request.messages[0], CompletionMessage::system("Eres Mercado Mágico"));
        assert_eq!(request.messages[1], CompletionMessage::user("¿Qué cocino hoy?"));
        assert_eq!(request.max_tokens, 1000);
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_failure_falls_back_without_retry() {
        let backend = FakeBackend::new(Err(401));
        let gateway = AssistantGateway::with_backend(backend.clone());

        let reply = gateway.generate_response("hola", &profile("bad")).await;
        assert_eq!(reply, FALLBACK_REPLY);
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn test_profile_from_settings() {
        use crate::storage::LocalStore;

        let mut settings = Settings::load_with_env(LocalStore::in_memory(), |_| None);
        settings.set_provider(Provider::Perplexity).unwrap();
        settings.set_api_key(Provider::Perplexity, "pplx").unwrap();

        let profile = AssistantProfile::from(&settings);
        assert_eq!(profile.provider, Provider::Perplexity);
        assert_eq!(profile.api_key, "pplx");
        assert_eq!(profile.model, Provider::Perplexity.default_model());
    }
}
