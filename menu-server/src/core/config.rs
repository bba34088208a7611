use std::time::Duration;

use shared::Locale;

use crate::auth::JwtConfig;
use crate::core::ServerError;
use crate::i18n::ResolverConfig;
use crate::mediator::MediatorConfig;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | HTTP_PORT | 8000 | HTTP listen port |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | tracing filter |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | (unset) | daily rolling log files |
/// | DEFAULT_LOCALE | en | resolver default locale |
/// | FALLBACK_LOCALES | (empty) | comma separated extra fallbacks |
/// | LOCK_TIMEOUT_MS | 2000 | entity write lock wait bound |
/// | REQUEST_TIMEOUT_MS | 30000 | per-request processing bound |
/// | MAX_CONNECTIONS | 1000 | concurrent in-flight requests |
/// | HIDE_EXISTENCE | false | report denials on ids as 404 |
/// | BOSS_USERNAME / BOSS_EMAIL / BOSS_PASSWORD | (unset) | bootstrap boss account |
///
/// JWT settings are read by [`JwtConfig::from_env`].
///
/// # Example
///
/// ```ignore
/// HTTP_PORT=8080 DEFAULT_LOCALE=es FALLBACK_LOCALES=en,it cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub default_locale: Locale,
    pub fallback_locales: Vec<Locale>,
    pub lock_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_connections: usize,
    pub hide_existence: bool,
    pub jwt: JwtConfig,
    pub boss: Option<BossAccount>,
}

/// Bootstrap boss credentials
#[derive(Clone)]
pub struct BossAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BossAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BossAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_locale(key: &str, raw: &str) -> Result<Locale, ServerError> {
    Locale::parse(raw).map_err(|e| ServerError::Config(format!("{}: {}", key, e)))
}

/// Parse a comma separated locale list; blanks are skipped
pub fn parse_locale_list(key: &str, raw: &str) -> Result<Vec<Locale>, ServerError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_locale(key, s))
        .collect()
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Unset variables fall back to defaults; malformed locales and JWT
    /// settings are errors.
    pub fn from_env() -> Result<Self, ServerError> {
        let default_locale = match std::env::var("DEFAULT_LOCALE") {
            Ok(raw) => parse_locale("DEFAULT_LOCALE", &raw)?,
            Err(_) => Locale::default(),
        };
        let fallback_locales = match std::env::var("FALLBACK_LOCALES") {
            Ok(raw) => parse_locale_list("FALLBACK_LOCALES", &raw)?,
            Err(_) => Vec::new(),
        };

        let boss = match (
            std::env::var("BOSS_USERNAME"),
            std::env::var("BOSS_EMAIL"),
            std::env::var("BOSS_PASSWORD"),
        ) {
            (Ok(username), Ok(email), Ok(password)) => Some(BossAccount {
                username,
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            http_port: env_or("HTTP_PORT", 8000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
            default_locale,
            fallback_locales,
            lock_timeout_ms: env_or("LOCK_TIMEOUT_MS", 2000),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30000),
            max_connections: env_or("MAX_CONNECTIONS", 1000),
            hide_existence: env_or("HIDE_EXISTENCE", false),
            jwt: JwtConfig::from_env().map_err(|e| ServerError::Config(e.to_string()))?,
            boss,
        })
    }

    /// Defaults without touching the environment
    ///
    /// Random JWT secret, no boss account. Used by tests and embedders.
    pub fn for_tests() -> Self {
        Self {
            http_port: 0,
            environment: "test".into(),
            log_level: "debug".into(),
            log_json: false,
            log_dir: None,
            default_locale: Locale::default(),
            fallback_locales: Vec::new(),
            lock_timeout_ms: 2000,
            request_timeout_ms: 30000,
            max_connections: 1000,
            hide_existence: false,
            jwt: JwtConfig::default(),
            boss: None,
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::new(self.default_locale.clone(), self.fallback_locales.clone())
    }

    pub fn mediator_config(&self) -> MediatorConfig {
        MediatorConfig {
            hide_existence: self.hide_existence,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale_list() {
        let list = parse_locale_list("FALLBACK_LOCALES", " es, pt_BR ,,it").unwrap();
        let codes: Vec<&str> = list.iter().map(Locale::as_str).collect();
        assert_eq!(codes, vec!["es", "pt-br", "it"]);

        assert!(parse_locale_list("FALLBACK_LOCALES", "es,spanish").is_err());
        assert!(parse_locale_list("FALLBACK_LOCALES", "").unwrap().is_empty());
    }

    #[test]
    fn test_test_config_defaults() {
        let config = Config::for_tests();
        assert_eq!(config.default_locale.as_str(), "en");
        assert_eq!(config.lock_timeout(), Duration::from_millis(2000));
        assert!(!config.mediator_config().hide_existence);
        assert!(config.resolver_config().fallbacks.is_empty());
    }

    #[test]
    fn test_boss_account_debug_hides_password() {
        let boss = BossAccount {
            username: "boss".into(),
            email: "boss@menu.test".into(),
            password: "hunter22hunter22".into(),
        };
        assert!(!format!("{:?}", boss).contains("hunter22"));
    }
}
