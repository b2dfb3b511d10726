/// Chat-completion services the assistant can talk to. Both speak the
/// OpenAI-compatible `chat/completions` protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Provider {
    #[default]
    Groq,
    Perplexity,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::Perplexity => "perplexity",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "groq" => Some(Provider::Groq),
            "perplexity" => Some(Provider::Perplexity),
            _ => None,
        }
    }

    pub fn all() -> Vec<Provider> {
        vec![Provider::Groq, Provider::Perplexity]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::Perplexity => "Perplexity",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Provider::Groq => "https://api.groq.com/openai/v1/chat/completions",
            Provider::Perplexity => "https://api.perplexity.ai/chat/completions",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Groq => "llama3-8b-8192",
            Provider::Perplexity => "llama-3.1-sonar-small-128k-online",
        }
    }

    /// Local storage key holding this provider's API key
    pub fn storage_key(&self) -> &'static str {
        match self {
            Provider::Groq => "groq_api_key",
            Provider::Perplexity => "perplexity_api_key",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::Perplexity => "PERPLEXITY_API_KEY",
        }
    }

    pub fn key_url(&self) -> &'static str {
        match self {
            Provider::Groq => "https://console.groq.com/keys",
            Provider::Perplexity => "https://www.perplexity.ai/settings/api",
        }
    }
}
