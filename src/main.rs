use luxe_matches::{
    AppState, MemoryRepository, MockPaymentProvider, MongoRepository, StripeClient,
    config::{AppConfig, Env, StoreBackend},
    create_router,
    payments::PaymentState,
    repository::RepositoryState,
};
use mongodb::{Client, bson::doc};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the record store, the payment provider and
/// the HTTP server, in that order.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "luxe_matches=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for log aggregation.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Record store
    let repo: RepositoryState = match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart.");
            Arc::new(MemoryRepository::new())
        }
        StoreBackend::Mongo => {
            let client = Client::with_uri_str(&config.mongo_uri)
                .await
                .expect("FATAL: Invalid MongoDB connection string.");
            let db = client.database(&config.db_name);

            db.run_command(doc! { "ping": 1 })
                .await
                .expect("FATAL: Failed to reach MongoDB. Check MONGODB_URI.");
            tracing::info!(db = %config.db_name, "Pinged deployment, connected to MongoDB.");

            Arc::new(MongoRepository::new(&db))
        }
    };

    // 4. Payment provider
    let payments: PaymentState = match &config.stripe_secret {
        Some(secret) => Arc::new(StripeClient::new(secret)),
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set; payment intents are mocked.");
            Arc::new(MockPaymentProvider::new())
        }
    };

    // 5. Router and server startup
    let addr = format!("0.0.0.0:{}", config.port);
    let app = create_router(AppState {
        repo,
        payments,
        config,
    });

    let listener = TcpListener::bind(&addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener.");

    tracing::info!("Listening on {}", addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
