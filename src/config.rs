use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub model: ModelConfig,

    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/trialgate.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    /// Origins allowed to call the API with credentials. "*" disables
    /// credential support and allows any origin.
    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Default: true for production safety. Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Sessions expire after this many minutes of inactivity.
    pub session_ttl_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            secure_cookies: true,
            session_ttl_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the trained classifier artifact.
    pub path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/eligibility.json".to_string(),
        }
    }
}

/// Bootstrap credentials for the seeded admin account. There is no
/// built-in default password: supply one via config.toml or the
/// `TRIALGATE_ADMIN_PASSWORD` environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub admin_username: String,

    #[serde(skip_serializing)]
    pub admin_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: String::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Path::new("config.toml");

        let mut config = if path.exists() {
            info!("Loading config from: {}", path.display());
            Self::load_from_path(path)?
        } else {
            info!("No config file found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("TRIALGATE_DATABASE_PATH") {
            self.general.database_path = value;
        }
        if let Ok(value) = std::env::var("TRIALGATE_MODEL_PATH") {
            self.model.path = value;
        }
        if let Ok(value) = std::env::var("TRIALGATE_ADMIN_USERNAME") {
            self.auth.admin_username = value;
        }
        if let Ok(value) = std::env::var("TRIALGATE_ADMIN_PASSWORD") {
            self.auth.admin_password = value;
        }
    }

    /// Startup gate: refuse to run on incomplete configuration rather than
    /// fall back to baked-in secrets.
    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            bail!("general.database_path must not be empty");
        }

        if self.model.path.is_empty() {
            bail!("model.path must not be empty");
        }

        if self.auth.admin_username.is_empty() {
            bail!("auth.admin_username must not be empty");
        }

        if self.auth.admin_password.is_empty() {
            bail!(
                "auth.admin_password is not set; configure it in config.toml \
                 or via TRIALGATE_ADMIN_PASSWORD"
            );
        }

        if self.server.session_ttl_minutes <= 0 {
            bail!("server.session_ttl_minutes must be positive");
        }

        Ok(())
    }
}
