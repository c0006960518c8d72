use std::env;
use std::path::PathBuf;

/// AppConfig
///
/// Holds the client's entire configuration state. Immutable once loaded and shared by
/// every component of the `Conferio` context (gateway, session store, CLI).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Base URL of the conference backend, without a trailing slash.
    pub api_base_url: String,
    // Where the persisted identity record lives.
    pub identity_path: PathBuf,
    // Runtime environment marker. Controls log format and fail-fast rules.
    pub env: Env,
    // When set, any 401 answer clears the identity and sends the caller back to /login.
    pub logout_on_unauthorized: bool,
}

/// Env
///
/// Defines the runtime context: `Local` talks to a developer backend with sensible
/// fallbacks, `Production` requires every endpoint to be configured explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_API_URL: &str = "http://localhost:8080";
const IDENTITY_FILE_NAME: &str = "identity.json";

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking values used by test scaffolding. The identity path points into
    /// the system temp directory so tests never touch a developer's real credentials.
    fn default() -> Self {
        Self {
            api_base_url: LOCAL_API_URL.to_string(),
            identity_path: env::temp_dir().join("conferio-test").join(IDENTITY_FILE_NAME),
            env: Env::Local,
            logout_on_unauthorized: true,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (after `.env` has been applied by
    /// the caller).
    ///
    /// # Panics
    /// Panics in `Production` when `CONFERIO_API_URL` is missing, so the client never starts
    /// against an implicit localhost backend.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let api_base_url = match env {
            Env::Production => env::var("CONFERIO_API_URL")
                .expect("FATAL: CONFERIO_API_URL must be set in production."),
            Env::Local => {
                env::var("CONFERIO_API_URL").unwrap_or_else(|_| LOCAL_API_URL.to_string())
            }
        };

        let identity_path = env::var("CONFERIO_IDENTITY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_identity_path());

        let logout_on_unauthorized = env::var("CONFERIO_LOGOUT_ON_UNAUTHORIZED")
            .map(|value| {
                !matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "false" | "0" | "no"
                )
            })
            .unwrap_or(true);

        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            identity_path,
            env,
            logout_on_unauthorized,
        }
    }
}

// ~/.conferio/identity.json, or ./.conferio/identity.json when no home directory exists.
fn default_identity_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".conferio")
        .join(IDENTITY_FILE_NAME)
}
