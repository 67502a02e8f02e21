//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.parley/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//!
//! The Ollama endpoint accepts the same loose host descriptors the server
//! itself does (`OLLAMA_HOST`): bare host, host:port, full URL, quoted,
//! with or without a trailing slash. A present-but-unparseable port is a
//! startup error rather than a silent fallback.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::llm::types::{ModelEntry, Platform};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub models: Vec<ModelTomlEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub default_model: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OllamaConfig {
    pub host: Option<String>,
}

/// A `[[models]]` entry as written in TOML. The platform tag is resolved
/// to a known platform during `resolve`; unknown tags are skipped with a
/// warning rather than failing startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelTomlEntry {
    pub name: String,
    pub platform: String,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_MODEL: &str = "llama3";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OLLAMA_HOST: &str = "127.0.0.1:11434";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub default_model: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Normalized to `scheme://host:port`, no trailing slash.
    pub ollama_base_url: String,
    pub extra_models: Vec<ModelEntry>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    InvalidHostPort(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::InvalidHostPort(p) => write!(f, "invalid Ollama host port: {p:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.parley/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".parley").join("config.toml"))
}

/// Load config from `~/.parley/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ParleyConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ParleyConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ParleyConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(ParleyConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: ParleyConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# Parley Configuration
# All settings are optional — defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# default_model = "llama3"

# [openai]
# api_key = "sk-..."                 # Or set OPENAI_API_KEY env var
# base_url = "https://api.openai.com/v1"

# [ollama]
# host = "127.0.0.1:11434"           # Or set OLLAMA_HOST env var

# [[models]]
# name = "llama3.1"
# platform = "ollama"

# [[models]]
# name = "gpt-4o-mini"
# platform = "openai"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_model` is from the `--model` flag (None = not specified). Fails
/// only on an invalid Ollama host descriptor; everything else degrades to
/// a default with a warning.
pub fn resolve(
    config: &ParleyConfig,
    cli_model: Option<&str>,
) -> Result<ResolvedConfig, ConfigError> {
    // Model: CLI → env → config → default
    let default_model = cli_model
        .map(|s| s.to_string())
        .or_else(|| std::env::var("PARLEY_MODEL").ok())
        .or_else(|| config.general.default_model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    // OpenAI API key: env → config
    let openai_api_key = std::env::var("OPENAI_API_KEY")
        .ok()
        .or_else(|| config.openai.api_key.clone());

    // OpenAI base URL: env → config → default
    let openai_base_url = std::env::var("OPENAI_BASE_URL")
        .ok()
        .or_else(|| config.openai.base_url.clone())
        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());

    // Ollama host: env → config → default, then normalized
    let host = std::env::var("OLLAMA_HOST")
        .ok()
        .or_else(|| config.ollama.host.clone())
        .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
    let ollama_base_url = parse_host_descriptor(&host)?;

    let extra_models = config
        .models
        .iter()
        .filter_map(|entry| match Platform::from_tag(&entry.platform) {
            Some(platform) => Some(ModelEntry {
                name: entry.name.clone(),
                platform,
            }),
            None => {
                warn!(
                    "skipping model {:?}: unknown platform {:?}",
                    entry.name, entry.platform
                );
                None
            }
        })
        .collect();

    Ok(ResolvedConfig {
        default_model,
        openai_api_key,
        openai_base_url,
        ollama_base_url,
        extra_models,
    })
}

// ============================================================================
// Host Descriptor Parsing
// ============================================================================

/// Normalizes a loose Ollama host descriptor into `scheme://host:port`.
///
/// Accepted shapes: `host`, `host:port`, `scheme://host`,
/// `scheme://host:port`, with optional surrounding quotes/whitespace, an
/// optional trailing path (dropped), and bracketed IPv6 literals. The
/// default port follows the scheme: 11434 for a bare descriptor, 80 for
/// explicit `http://`, 443 for `https://`. A port that is present but not
/// a valid u16 is an error.
pub fn parse_host_descriptor(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'');

    let (scheme, rest, default_port) = match trimmed.split_once("://") {
        None => ("http", trimmed, "11434"),
        Some(("http", rest)) => ("http", rest, "80"),
        Some(("https", rest)) => ("https", rest, "443"),
        // Unknown scheme: keep it, but treat the port like a bare descriptor.
        Some((scheme, rest)) => (scheme, rest, "11434"),
    };

    // Drop any path component.
    let hostport = rest.split('/').next().unwrap_or("");

    let (host, port) = split_host_port(hostport);
    let host = if host.is_empty() { "127.0.0.1" } else { host };
    let port = match port {
        Some(p) => {
            if p.parse::<u16>().is_err() {
                return Err(ConfigError::InvalidHostPort(p.to_string()));
            }
            p
        }
        None => default_port,
    };

    Ok(format!("{scheme}://{host}:{port}"))
}

/// Splits `host[:port]`, leaving bracketed IPv6 literals intact. A colon
/// inside brackets is part of the address, not a port separator.
fn split_host_port(hostport: &str) -> (&str, Option<&str>) {
    if let Some(rest) = hostport.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            let host = &hostport[..end + 2];
            return match hostport[end + 2..].strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None => (host, None),
            };
        }
        return (hostport, None);
    }
    match hostport.rsplit_once(':') {
        // A second colon means an unbracketed IPv6 literal; no port.
        Some((host, _)) if host.contains(':') => (hostport, None),
        Some((host, port)) => (host, Some(port)),
        None => (hostport, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = ParleyConfig::default();
        assert!(config.models.is_empty());
        assert!(config.general.default_model.is_none());
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing — everything else stays default
        let toml_str = r#"
[general]
default_model = "gpt-4"
"#;
        let config: ParleyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.default_model.as_deref(), Some("gpt-4"));
        assert!(config.openai.api_key.is_none());
        assert!(config.models.is_empty());
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[general]
default_model = "llama3"

[openai]
api_key = "sk-test-123"

[ollama]
host = "https://ollama.example.com"

[[models]]
name = "llama3.1"
platform = "ollama"

[[models]]
name = "gpt-4o-mini"
platform = "openai"
"#;
        let config: ParleyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.default_model.as_deref(), Some("llama3"));
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-test-123"));
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.models[1].platform, "openai");
    }

    #[test]
    fn test_resolve_maps_extra_models_and_skips_unknown_platforms() {
        let config = ParleyConfig {
            models: vec![
                ModelTomlEntry {
                    name: "llama3.1".to_string(),
                    platform: "ollama".to_string(),
                },
                ModelTomlEntry {
                    name: "mystery".to_string(),
                    platform: "acme".to_string(),
                },
            ],
            ..Default::default()
        };
        let resolved = resolve(&config, None).unwrap();
        assert_eq!(resolved.extra_models.len(), 1);
        assert_eq!(resolved.extra_models[0].platform, Platform::Ollama);
    }

    #[test]
    fn test_resolve_cli_model_wins() {
        let config = ParleyConfig {
            general: GeneralConfig {
                default_model: Some("llama3".to_string()),
            },
            ..Default::default()
        };
        let resolved = resolve(&config, Some("gpt-4")).unwrap();
        assert_eq!(resolved.default_model, "gpt-4");
    }

    #[test]
    fn test_host_bare_default() {
        assert_eq!(
            parse_host_descriptor("").unwrap(),
            "http://127.0.0.1:11434"
        );
    }

    #[test]
    fn test_host_bare_hostname() {
        assert_eq!(
            parse_host_descriptor("example.com").unwrap(),
            "http://example.com:11434"
        );
    }

    #[test]
    fn test_host_explicit_port() {
        assert_eq!(
            parse_host_descriptor("example.com:1234").unwrap(),
            "http://example.com:1234"
        );
    }

    #[test]
    fn test_host_scheme_defaults() {
        assert_eq!(
            parse_host_descriptor("http://example.com").unwrap(),
            "http://example.com:80"
        );
        assert_eq!(
            parse_host_descriptor("https://example.com").unwrap(),
            "https://example.com:443"
        );
    }

    #[test]
    fn test_host_trailing_path_is_dropped() {
        assert_eq!(
            parse_host_descriptor("https://example.com:5555/").unwrap(),
            "https://example.com:5555"
        );
        assert_eq!(
            parse_host_descriptor("http://example.com/api/").unwrap(),
            "http://example.com:80"
        );
    }

    #[test]
    fn test_host_quotes_and_whitespace_are_trimmed() {
        assert_eq!(
            parse_host_descriptor(" \"example.com:11434\" ").unwrap(),
            "http://example.com:11434"
        );
    }

    #[test]
    fn test_host_ipv6_brackets() {
        assert_eq!(
            parse_host_descriptor("[::1]:11434").unwrap(),
            "http://[::1]:11434"
        );
        assert_eq!(
            parse_host_descriptor("[::1]").unwrap(),
            "http://[::1]:11434"
        );
    }

    #[test]
    fn test_host_invalid_port_is_fatal() {
        let err = parse_host_descriptor("example.com:zz").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHostPort(_)));
        let err = parse_host_descriptor("example.com:70000").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHostPort(_)));
    }
}
