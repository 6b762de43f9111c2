use serde::{Deserialize, Serialize};
use std::net::SocketAddr;


/// Main configuration for the coachway engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub internal_auth: InternalAuthConfig,
    pub orchestrator: OrchestratorConfig,
    pub scheduling: SchedulingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

/// Shared-secret auth for internal-only endpoints (revenue calculation,
/// dispatch surface). These are never public.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InternalAuthConfig {
    /// Header carrying the shared secret.
    #[serde(default = "default_secret_header")]
    pub header: String,
    /// The shared secret. Empty means internal endpoints reject everything.
    #[serde(default)]
    pub secret: String,
}

/// Idempotency cache behavior for the scheduling event orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    /// TTL for cached successful dispatch results.
    #[serde(default = "default_success_ttl")]
    pub success_ttl_secs: u64,
    /// TTL for cached failed dispatch results. `None` disables failure
    /// caching entirely, allowing immediate retries.
    #[serde(default)]
    pub failure_ttl_secs: Option<u64>,
    /// Maximum entries held in the idempotency cache.
    #[serde(default = "default_cache_entries")]
    pub max_cache_entries: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulingConfig {
    /// Cooperative delay between entries in bulk scheduling loops, to avoid
    /// hammering rate-limited calendar APIs.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Organizer email used when creating calendar events.
    #[serde(default = "default_organizer")]
    pub organizer_email: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            internal_auth: InternalAuthConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            scheduling: SchedulingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

impl Default for InternalAuthConfig {
    fn default() -> Self {
        Self {
            header: default_secret_header(),
            secret: String::new(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            success_ttl_secs: default_success_ttl(),
            failure_ttl_secs: None,
            max_cache_entries: default_cache_entries(),
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
            organizer_email: default_organizer(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

fn default_secret_header() -> String {
    "x-internal-secret".to_string()
}

fn default_success_ttl() -> u64 {
    // Webhook providers typically retry for up to a day.
    86400
}

fn default_cache_entries() -> u64 {
    10_000
}

fn default_throttle_ms() -> u64 {
    100
}

fn default_organizer() -> String {
    "sessions@coachway.app".to_string()
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for [`Config`] with environment variable support.
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_internal_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.internal_auth.secret = secret.into();
        self
    }

    pub fn with_success_ttl_secs(mut self, secs: u64) -> Self {
        self.config.orchestrator.success_ttl_secs = secs;
        self
    }

    /// Enable short-TTL caching of failed dispatch results.
    ///
    /// Off by default so callers can retry failures immediately; turn on to
    /// damp retry storms from aggressive webhook redelivery.
    pub fn with_failure_ttl_secs(mut self, secs: u64) -> Self {
        self.config.orchestrator.failure_ttl_secs = Some(secs);
        self
    }

    pub fn with_throttle_ms(mut self, ms: u64) -> Self {
        self.config.scheduling.throttle_ms = ms;
        self
    }

    pub fn with_organizer_email(mut self, email: impl Into<String>) -> Self {
        self.config.scheduling.organizer_email = email.into();
        self
    }

    /// Load configuration overrides from the environment. `COACHWAY_{NAME}`
    /// wins; the bare name is accepted too so platform-standard variables
    /// (`PORT`, `LOG_LEVEL`) work without duplication.
    pub fn from_env(mut self) -> Self {
        if let Some(host) = env_override("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = env_override("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(level) = env_override("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = env_override("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }
        if let Some(secret) = env_override("INTERNAL_SECRET") {
            self.config.internal_auth.secret = secret;
        }
        if let Some(ttl) = env_override("DISPATCH_SUCCESS_TTL") {
            if let Ok(t) = ttl.parse() {
                self.config.orchestrator.success_ttl_secs = t;
            }
        }
        if let Some(ttl) = env_override("DISPATCH_FAILURE_TTL") {
            if let Ok(t) = ttl.parse() {
                self.config.orchestrator.failure_ttl_secs = Some(t);
            }
        }
        if let Some(ms) = env_override("SCHEDULE_THROTTLE_MS") {
            if let Ok(m) = ms.parse() {
                self.config.scheduling.throttle_ms = m;
            }
        }
        if let Some(email) = env_override("ORGANIZER_EMAIL") {
            self.config.scheduling.organizer_email = email;
        }
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn env_override(name: &str) -> Option<String> {
    ["COACHWAY_", ""]
        .into_iter()
        .find_map(|prefix| std::env::var(format!("{prefix}{name}")).ok())
}
