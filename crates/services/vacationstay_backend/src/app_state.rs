// --- File: crates/services/vacationstay_backend/src/app_state.rs ---
use std::sync::Arc;

use tracing::info;
use vacationstay_auth::{AuthState, JwtKeys, PasswordHasher};
use vacationstay_bookings::BookingsState;
use vacationstay_common::{time::parse_time_zone, VacationStayError};
use vacationstay_config::AppConfig;
use vacationstay_db::{init_all_schemas, DbClient};
use vacationstay_properties::PropertiesState;

/// Everything the routers need, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_client: DbClient,
    pub auth: Arc<AuthState>,
    pub properties: Arc<PropertiesState>,
    pub bookings: Arc<BookingsState>,
}

/// Builder for [`AppState`]. Parts not supplied are created from the config.
pub struct AppStateBuilder {
    config: Arc<AppConfig>,
    db_client: Option<DbClient>,
    jwt: Option<Arc<JwtKeys>>,
    hasher: Option<PasswordHasher>,
}

impl AppStateBuilder {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            db_client: None,
            jwt: None,
            hasher: None,
        }
    }

    pub fn with_db_client(mut self, db_client: DbClient) -> Self {
        self.db_client = Some(db_client);
        self
    }

    pub fn with_jwt_keys(mut self, jwt: Arc<JwtKeys>) -> Self {
        self.jwt = Some(jwt);
        self
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Connects, creates the schema and wires up the feature states.
    pub async fn build(self) -> Result<AppState, VacationStayError> {
        let config = self.config;

        let db_client = match self.db_client {
            Some(db_client) => db_client,
            None => DbClient::new(&config).await?,
        };
        let repos = init_all_schemas(&db_client).await?;

        let jwt = match self.jwt {
            Some(jwt) => jwt,
            None => Arc::new(JwtKeys::from_config(&config)?),
        };
        let time_zone = parse_time_zone(config.time_zone_name())?;
        info!(
            "Bookings use time zone {} and currency {}",
            time_zone,
            config.currency()
        );

        let auth = Arc::new(AuthState {
            users: repos.users.clone(),
            jwt: jwt.clone(),
            hasher: self.hasher.unwrap_or_default(),
        });
        let properties = Arc::new(PropertiesState {
            properties: repos.properties.clone(),
            reviews: repos.reviews.clone(),
            jwt: jwt.clone(),
        });
        let bookings = Arc::new(BookingsState {
            bookings: repos.bookings.clone(),
            properties: repos.properties.clone(),
            jwt,
            time_zone,
        });

        Ok(AppState {
            config,
            db_client,
            auth,
            properties,
            bookings,
        })
    }
}

impl AppState {
    pub fn builder(config: Arc<AppConfig>) -> AppStateBuilder {
        AppStateBuilder::new(config)
    }

    /// State backed by the configured database and secrets.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, VacationStayError> {
        Self::builder(config).build().await
    }
}
