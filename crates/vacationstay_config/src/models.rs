use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:data/vacationstay.db, overridden by VACATIONSTAY__DATABASE__URL
    #[serde(default)]
    pub max_connections: Option<u32>,
}

// --- Auth Config ---
// jwt_secret is usually "secret_from_env" in the config files and injected at load time.
#[derive(Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Token lifetime in milliseconds.
    #[serde(default = "default_jwt_expiration_ms")]
    pub jwt_expiration_ms: i64,
}

fn default_jwt_expiration_ms() -> i64 {
    86_400_000
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiration_ms", &self.jwt_expiration_ms)
            .finish()
    }
}

// --- Booking Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// IANA zone used to decide what "today" is, e.g. "Europe/Zurich".
    pub time_zone: Option<String>,
    /// ISO currency code for every price in the system.
    pub currency: Option<String>,
}

// --- Logging Config ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// Directory for daily rolling log files; stdout only when unset.
    pub directory: Option<String>,
    #[serde(default)]
    pub journald: bool,
}

// --- CORS Config ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// --- Main Application Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_swagger: bool,

    #[serde(default)]
    pub static_dir: Option<String>,

    // --- Sections ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    #[serde(default)]
    pub booking: Option<BookingConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            use_swagger: false,
            static_dir: None,
            database: None,
            auth: None,
            booking: None,
            logging: LoggingConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl AppConfig {
    /// The configured booking time zone name, `UTC` when unset.
    pub fn time_zone_name(&self) -> &str {
        self.booking
            .as_ref()
            .and_then(|b| b.time_zone.as_deref())
            .unwrap_or("UTC")
    }

    pub fn currency(&self) -> &str {
        self.booking
            .as_ref()
            .and_then(|b| b.currency.as_deref())
            .unwrap_or("USD")
    }

    pub fn jwt_expiration_ms(&self) -> i64 {
        self.auth
            .as_ref()
            .map(|a| a.jwt_expiration_ms)
            .unwrap_or_else(default_jwt_expiration_ms)
    }
}
