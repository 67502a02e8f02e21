//! Maps model names to their owning platform and routes turns to the
//! right client.
//!
//! Platforms register a constructor plus a supported-model list; selection
//! dispatches through that table, so adding a backend never touches
//! existing logic. Clients are built lazily and retained across platform
//! swaps, which is what makes switching back to a platform resume its own
//! history (swap-not-merge: context never crosses providers).

use std::collections::HashMap;

use log::{debug, warn};

use crate::core::config::ResolvedConfig;
use crate::llm::client::ChatClient;
use crate::llm::providers::{ollama, openai};
use crate::llm::types::{LlmError, ModelEntry, Platform};

pub type ClientCtor = fn(&ResolvedConfig) -> Box<dyn ChatClient>;

fn new_ollama(config: &ResolvedConfig) -> Box<dyn ChatClient> {
    Box::new(ollama::OllamaClient::new(config.ollama_base_url.clone()))
}

fn new_openai(config: &ResolvedConfig) -> Box<dyn ChatClient> {
    Box::new(openai::OpenAiClient::new(
        config.openai_api_key.clone().unwrap_or_default(),
        config.openai_base_url.clone(),
    ))
}

pub struct ClientRegistry {
    config: ResolvedConfig,
    ctors: HashMap<Platform, ClientCtor>,
    models: Vec<ModelEntry>,
    idle: HashMap<Platform, Box<dyn ChatClient>>,
    active: Platform,
    current_model: String,
    checked_out: bool,
}

impl ClientRegistry {
    pub fn new(config: ResolvedConfig) -> Self {
        let mut registry = ClientRegistry {
            config: config.clone(),
            ctors: HashMap::new(),
            models: Vec::new(),
            idle: HashMap::new(),
            active: Platform::Ollama,
            current_model: ollama::DEFAULT_MODEL.to_string(),
            checked_out: false,
        };

        registry.register(Platform::Ollama, new_ollama, &ollama::supported_models());
        registry.register(Platform::OpenAi, new_openai, &openai::supported_models());
        for entry in &config.extra_models {
            registry.add_model(entry.clone());
        }

        if let Some(platform) = registry.platform_of(&config.default_model) {
            registry.active = platform;
            registry.current_model = config.default_model.clone();
        } else if !config.default_model.is_empty() {
            warn!(
                "unknown default model {:?}, falling back to {}",
                config.default_model, registry.current_model
            );
        }
        registry
    }

    /// Registers a platform's constructor and its supported models.
    pub fn register(&mut self, platform: Platform, ctor: ClientCtor, models: &[&str]) {
        self.ctors.insert(platform, ctor);
        for name in models {
            self.add_model(ModelEntry {
                name: name.to_string(),
                platform,
            });
        }
    }

    fn add_model(&mut self, entry: ModelEntry) {
        if self.models.iter().any(|m| m.name == entry.name) {
            return;
        }
        self.models.push(entry);
    }

    /// All pickable models, in registration order.
    pub fn models(&self) -> &[ModelEntry] {
        &self.models
    }

    pub fn platform_of(&self, model: &str) -> Option<Platform> {
        self.models
            .iter()
            .find(|m| m.name == model)
            .map(|m| m.platform)
    }

    pub fn active_platform(&self) -> Platform {
        self.active
    }

    pub fn current_model(&self) -> &str {
        &self.current_model
    }

    /// Routes a model selection.
    ///
    /// Same platform: only the model changes on the existing client, so its
    /// history is preserved. Different platform: the active client is
    /// swapped for that platform's (lazily built) client and the visible
    /// history becomes whatever that client already holds.
    pub fn select_model(&mut self, model: &str) -> Result<Platform, LlmError> {
        let platform = self
            .platform_of(model)
            .ok_or_else(|| LlmError::Config(format!("unknown model {model:?}")))?;

        self.current_model = model.to_string();
        if platform != self.active {
            debug!("switching platform {} -> {}", self.active, platform);
            self.active = platform;
        }
        if let Some(client) = self.idle.get_mut(&platform) {
            client.set_model(model);
        }
        Ok(platform)
    }

    /// Moves the active client out for the duration of one turn. Returns
    /// `None` if a turn already holds it; only one turn per client may be
    /// in flight.
    pub fn checkout(&mut self) -> Option<Box<dyn ChatClient>> {
        if self.checked_out {
            return None;
        }
        let mut client = self.idle.remove(&self.active).unwrap_or_else(|| {
            let ctor = self
                .ctors
                .get(&self.active)
                .expect("constructor registered for every known platform");
            ctor(&self.config)
        });
        client.set_model(&self.current_model);
        self.checked_out = true;
        Some(client)
    }

    /// Returns a client after its turn ended (cleanly or not). Filed under
    /// the client's own platform, which may no longer be the active one.
    pub fn check_in(&mut self, client: Box<dyn ChatClient>) {
        self.checked_out = false;
        self.idle.insert(client.platform(), client);
    }
}
