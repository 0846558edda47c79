use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// cloned into the shared state, where handlers and extractors pull it out via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and secret fail-fast behaviour.
    pub env: Env,
    // MongoDB connection string.
    pub mongo_uri: String,
    // Database holding the users/requests/reviews/favourites/payments collections.
    pub db_name: String,
    // Secret used to sign and verify access tokens (HS256).
    pub jwt_secret: String,
    // Stripe secret key. Without one (local only) payment intents are mocked.
    pub stripe_secret: Option<String>,
    // Which record store backs the repository.
    pub store: StoreBackend,
    // Browser origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
    // TCP port the HTTP server binds to.
    pub port: u16,
    // Upper bound applied to any client-supplied page size.
    pub max_page_size: u64,
}

/// Env
///
/// Defines the runtime context: pretty logs and development fallbacks locally,
/// JSON logs and mandatory secrets in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// StoreBackend
///
/// `Memory` keeps every collection in process and is only honoured in `Env::Local`.
#[derive(Clone, PartialEq, Debug)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

pub const DEFAULT_DB_NAME: &str = "luxe-matches";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 100;
const LOCAL_JWT_SECRET: &str = "luxe-matches-local-token-secret";
const LOCAL_MONGO_URI: &str = "mongodb://localhost:27017";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:5174";

impl Default for AppConfig {
    /// Safe, non-panicking configuration used for test state scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            mongo_uri: LOCAL_MONGO_URI.to_string(),
            db_name: DEFAULT_DB_NAME.to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            stripe_secret: None,
            store: StoreBackend::Mongo,
            cors_origins: parse_origins(DEFAULT_CORS_ORIGINS),
            port: DEFAULT_PORT,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables.
    ///
    /// # Panics
    /// In production, panics if `ACCESS_TOKEN_SECRET`, `STRIPE_SECRET_KEY` or the
    /// database credentials are missing, so the server never starts half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let mongo_uri = match env::var("MONGODB_URI") {
            Ok(uri) => Some(uri),
            Err(_) => atlas_uri_from_parts(),
        };

        let (mongo_uri, jwt_secret, stripe_secret) = match env {
            Env::Production => (
                mongo_uri.expect("FATAL: MONGODB_URI or DB_USER/DB_PASS must be set in production."),
                env::var("ACCESS_TOKEN_SECRET")
                    .expect("FATAL: ACCESS_TOKEN_SECRET must be set in production."),
                Some(
                    env::var("STRIPE_SECRET_KEY")
                        .expect("FATAL: STRIPE_SECRET_KEY must be set in production."),
                ),
            ),
            Env::Local => (
                mongo_uri.unwrap_or_else(|| LOCAL_MONGO_URI.to_string()),
                env::var("ACCESS_TOKEN_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                env::var("STRIPE_SECRET_KEY").ok(),
            ),
        };

        let store = match (&env, env::var("STORE_BACKEND").as_deref()) {
            (Env::Local, Ok("memory")) => StoreBackend::Memory,
            _ => StoreBackend::Mongo,
        };

        Self {
            env,
            store,
            mongo_uri,
            db_name: env::var("DB_NAME").unwrap_or_else(|_| DEFAULT_DB_NAME.to_string()),
            jwt_secret,
            stripe_secret,
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
            ),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            max_page_size: env::var("MAX_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_MAX_PAGE_SIZE),
        }
    }
}

/// Builds the Atlas SRV connection string from `DB_USER`/`DB_PASS` when both are set.
fn atlas_uri_from_parts() -> Option<String> {
    let user = env::var("DB_USER").ok()?;
    let pass = env::var("DB_PASS").ok()?;
    let host = env::var("DB_HOST").unwrap_or_else(|_| "cluster0.qvjjrvn.mongodb.net".to_string());
    Some(format!(
        "mongodb+srv://{user}:{pass}@{host}/?retryWrites=true&w=majority&appName=Cluster0"
    ))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}
