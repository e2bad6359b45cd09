//! Configuration assembler.
//!
//! All settings come from the process environment (optionally seeded from a
//! `.env` file) and are grouped into agent identity, server, Claude and
//! security settings. A `Config` is built once at startup, validated
//! eagerly, and then only ever read.

use crate::a2a::types::AgentCard;
use crate::brain::prompt_builder;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

mod defaults;

pub use defaults::DEFAULT_SYSTEM_PROMPT_TEMPLATE;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ANTHROPIC_API_KEY environment variable is required")]
    MissingApiKey,

    #[error("Invalid port number: {0}")]
    InvalidPort(i64),

    #[error("Invalid max_tokens: {0}")]
    InvalidMaxTokens(i64),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("failed to load env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
}

/// Agent identity and practice specialization.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub name: String,
    pub description: String,
    pub version: String,
    pub practice_name: String,
    pub practice_location: String,
    pub primary_services: Vec<String>,
    pub diagnostic_services: Vec<String>,
    pub specialized_procedures: Vec<String>,
}

/// Network, protocol and logging settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub log_level: String,
    pub log_json: bool,
    pub protocol_version: String,
    pub streaming_enabled: bool,
    pub push_notifications_enabled: bool,
    pub agent_card_path: String,
    pub base_url: String,
    pub default_input_modes: Vec<String>,
    pub default_output_modes: Vec<String>,
}

/// Claude API parameters.
#[derive(Clone)]
pub struct ClaudeSettings {
    pub api_key: Zeroizing<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt_template: String,
}

impl std::fmt::Debug for ClaudeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeSettings")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

/// Input validation and rate limiting thresholds.
#[derive(Debug, Clone)]
pub struct SecuritySettings {
    pub max_message_length: usize,
    pub max_file_size_mb: u32,
    pub allowed_file_types: Vec<String>,
    pub enable_input_sanitization: bool,
    pub enable_prompt_injection_protection: bool,
    /// Advertised only; no request throttling is performed.
    pub rate_limit_enabled: bool,
    pub rate_limit_rpm: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub agent: AgentSettings,
    pub server: ServerSettings,
    pub claude: ClaudeSettings,
    pub security: SecuritySettings,
}

impl Config {
    /// Read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let source = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;
        Self::from_source(&source)
    }

    /// Build from an already-assembled `config` source. Keys are looked up
    /// by their environment variable name.
    pub fn from_source(source: &config::Config) -> Result<Self, ConfigError> {
        let env = EnvLookup(source);

        let agent = AgentSettings {
            name: env.string("AGENT_NAME", defaults::AGENT_NAME),
            description: env.string("AGENT_DESCRIPTION", defaults::AGENT_DESCRIPTION),
            version: env.string("AGENT_VERSION", "1.0.0"),
            practice_name: env.string("PRACTICE_NAME", defaults::PRACTICE_NAME),
            practice_location: env.string("PRACTICE_LOCATION", ""),
            primary_services: env.list("PRIMARY_SERVICES", defaults::PRIMARY_SERVICES),
            diagnostic_services: env.list("DIAGNOSTIC_SERVICES", defaults::DIAGNOSTIC_SERVICES),
            specialized_procedures: env
                .list("SPECIALIZED_PROCEDURES", defaults::SPECIALIZED_PROCEDURES),
        };

        let raw_port: i64 = env.parse("PORT", 9999)?;
        let port = u16::try_from(raw_port)
            .ok()
            .filter(|p| *p >= 1024)
            .ok_or(ConfigError::InvalidPort(raw_port))?;

        let server = ServerSettings {
            host: env.string("HOST", "0.0.0.0"),
            port,
            debug: env.flag("DEBUG", false),
            log_level: env.string("LOG_LEVEL", "info"),
            log_json: env.string("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
            protocol_version: env.string("A2A_PROTOCOL_VERSION", "0.2.9"),
            streaming_enabled: env.flag("STREAMING_ENABLED", true),
            push_notifications_enabled: env.flag("PUSH_NOTIFICATIONS_ENABLED", false),
            agent_card_path: route_path(env.string(
                "AGENT_CARD_PATH",
                "/.well-known/agent-card.json",
            )),
            base_url: env.string("BASE_URL", &format!("http://localhost:{}", port)),
            default_input_modes: env.list("DEFAULT_INPUT_MODES", defaults::IO_MODES),
            default_output_modes: env.list("DEFAULT_OUTPUT_MODES", defaults::IO_MODES),
        };

        let api_key = Zeroizing::new(env.string("ANTHROPIC_API_KEY", ""));
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let raw_max_tokens: i64 = env.parse("CLAUDE_MAX_TOKENS", 1500)?;
        if !(100..=4096).contains(&raw_max_tokens) {
            return Err(ConfigError::InvalidMaxTokens(raw_max_tokens));
        }

        let claude = ClaudeSettings {
            api_key,
            base_url: env.string("ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
            model: env.string("CLAUDE_MODEL", "claude-3-5-sonnet-20241022"),
            max_tokens: raw_max_tokens as u32,
            temperature: env.parse("CLAUDE_TEMPERATURE", 0.3)?,
            system_prompt_template: env
                .string("SYSTEM_PROMPT_TEMPLATE", DEFAULT_SYSTEM_PROMPT_TEMPLATE)
                .trim()
                .to_string(),
        };

        let security = SecuritySettings {
            max_message_length: env.parse("MAX_MESSAGE_LENGTH", 10_000)?,
            max_file_size_mb: env.parse("MAX_FILE_SIZE_MB", 10)?,
            allowed_file_types: env.list("ALLOWED_FILE_TYPES", defaults::ALLOWED_FILE_TYPES),
            enable_input_sanitization: env.flag("ENABLE_INPUT_SANITIZATION", true),
            enable_prompt_injection_protection: env
                .flag("ENABLE_PROMPT_INJECTION_PROTECTION", true),
            rate_limit_enabled: env.flag("RATE_LIMIT_ENABLED", false),
            rate_limit_rpm: env.parse("RATE_LIMIT_RPM", 60)?,
        };

        Ok(Self {
            agent,
            server,
            claude,
            security,
        })
    }

    /// The system prompt template with practice details substituted.
    pub fn system_prompt(&self) -> String {
        prompt_builder::render_system_prompt(&self.claude.system_prompt_template, &self.agent)
    }

    /// Discovery document served by the gateway.
    pub fn agent_card(&self) -> AgentCard {
        crate::a2a::agent_card::build_agent_card(self)
    }

    /// Human-readable overview for startup logs. Never includes secrets.
    pub fn summary(&self) -> String {
        format!(
            "{} Configuration:\n  \
             Agent: {}\n  \
             Version: {}\n  \
             Server: {}:{}\n  \
             Claude Model: {}\n  \
             Services: {} primary, {} diagnostic\n  \
             Security: Input validation={}",
            self.agent.practice_name,
            self.agent.name,
            self.agent.version,
            self.server.host,
            self.server.port,
            self.claude.model,
            self.agent.primary_services.len(),
            self.agent.diagnostic_services.len(),
            self.security.enable_input_sanitization,
        )
    }
}

/// Routes must be absolute.
fn route_path(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}

/// Load a `.env` file into the process environment.
///
/// An explicit path must exist; otherwise `./.env` is used when present.
/// Returns the path that was loaded, if any.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map(|_| Some(path.to_path_buf()))
            .map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            }),
        None => Ok(dotenvy::dotenv().ok()),
    }
}

/// Typed accessors over a `config::Config` keyed by env var names.
struct EnvLookup<'a>(&'a config::Config);

impl EnvLookup<'_> {
    fn raw(&self, key: &str) -> Option<String> {
        self.0
            .get_string(&key.to_ascii_lowercase())
            .or_else(|_| self.0.get_string(key))
            .ok()
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }

    /// Comma-separated list; blank items are dropped and an empty result
    /// falls back to `default`.
    fn list(&self, key: &str, default: &[&str]) -> Vec<String> {
        let items: Vec<String> = self
            .raw(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if items.is_empty() {
            default.iter().map(|s| s.to_string()).collect()
        } else {
            items
        }
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        self.raw(key)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.raw(key) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value,
                }),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    /// Build a `Config` from explicit key/value pairs. An API key is
    /// supplied unless the pairs set one.
    pub(crate) fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let mut builder = config::Config::builder()
            .set_override("anthropic_api_key", "test-api-key")
            .expect("override");
        for (key, value) in pairs {
            builder = builder
                .set_override(key.to_ascii_lowercase(), *value)
                .expect("override");
        }
        Config::from_source(&builder.build().expect("build"))
    }

    pub(crate) fn test_config() -> Config {
        config_from(&[]).expect("valid config")
    }

    #[test]
    fn test_defaults() {
        let config = test_config();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.base_url, "http://localhost:9999");
        assert_eq!(config.claude.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.claude.max_tokens, 1500);
        assert!((config.claude.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.security.max_message_length, 10_000);
        assert_eq!(config.agent.primary_services.len(), 5);
        assert_eq!(config.agent.diagnostic_services.len(), 4);
        assert_eq!(config.agent.specialized_procedures.len(), 5);
        assert!(config.server.streaming_enabled);
        assert!(!config.server.push_notifications_enabled);
        assert!(!config.security.rate_limit_enabled);
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = config_from(&[("ANTHROPIC_API_KEY", "")]).expect_err("missing key");
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[rstest]
    #[case("80")]
    #[case("1023")]
    #[case("65536")]
    #[case("-1")]
    fn test_port_out_of_range(#[case] port: &str) {
        let err = config_from(&[("PORT", port)]).expect_err("bad port");
        assert!(matches!(err, ConfigError::InvalidPort(_)));
    }

    #[rstest]
    #[case("1024", 1024)]
    #[case("65535", 65535)]
    fn test_port_bounds_accepted(#[case] port: &str, #[case] expected: u16) {
        let config = config_from(&[("PORT", port)]).expect("valid port");
        assert_eq!(config.server.port, expected);
        assert_eq!(config.server.base_url, format!("http://localhost:{}", expected));
    }

    #[rstest]
    #[case("99")]
    #[case("4097")]
    fn test_max_tokens_out_of_range(#[case] tokens: &str) {
        let err = config_from(&[("CLAUDE_MAX_TOKENS", tokens)]).expect_err("bad tokens");
        assert!(matches!(err, ConfigError::InvalidMaxTokens(_)));
    }

    #[test]
    fn test_unparseable_number() {
        let err = config_from(&[("PORT", "nine")]).expect_err("bad number");
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn test_list_parsing_trims_and_drops_blanks() {
        let config = config_from(&[("PRIMARY_SERVICES", " Angiography ,, TAVR ,")]).expect("ok");
        assert_eq!(config.agent.primary_services, vec!["Angiography", "TAVR"]);
    }

    #[test]
    fn test_blank_list_falls_back_to_default() {
        let config = config_from(&[("DIAGNOSTIC_SERVICES", " , ")]).expect("ok");
        assert_eq!(config.agent.diagnostic_services.len(), 4);
    }

    #[test]
    fn test_flags_only_accept_true() {
        let config = config_from(&[
            ("STREAMING_ENABLED", "no"),
            ("RATE_LIMIT_ENABLED", "TRUE"),
        ])
        .expect("ok");
        assert!(!config.server.streaming_enabled);
        assert!(config.security.rate_limit_enabled);
    }

    #[test]
    fn test_summary_hides_api_key() {
        let config = config_from(&[("ANTHROPIC_API_KEY", "sk-secret-value")]).expect("ok");
        assert!(!config.summary().contains("sk-secret-value"));
        assert!(!format!("{:?}", config).contains("sk-secret-value"));
        assert!(config.summary().contains("5 primary, 4 diagnostic"));
    }

    #[test]
    fn test_card_path_gets_leading_slash() {
        let config = config_from(&[("AGENT_CARD_PATH", "card.json")]).expect("ok");
        assert_eq!(config.server.agent_card_path, "/card.json");
    }

    #[test]
    fn test_load_env_file_missing_path() {
        let err = load_env_file(Some(Path::new("/nonexistent/cardio.env"))).expect_err("missing");
        assert!(matches!(err, ConfigError::EnvFile { .. }));
    }

    #[test]
    fn test_load_env_file_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "CARDIO_AGENT_TEST_ONLY_VAR=loaded").expect("write");

        let loaded = load_env_file(Some(file.path())).expect("load");
        assert_eq!(loaded.as_deref(), Some(file.path()));
        assert_eq!(
            std::env::var("CARDIO_AGENT_TEST_ONLY_VAR").as_deref(),
            Ok("loaded")
        );
    }
}
