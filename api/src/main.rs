use std::sync::Arc;
use std::time::Duration;

use api::{
    Config, build,
    payment::TossClient,
    store::{MemoryStore, PgStore, ReservationStore},
    telemetry::{get_subscriber, init_subscriber},
    time::TimeSource,
};

/// Campground reservation API server.
///
/// Environment variables can be set directly or loaded from a .env file in
/// the project root.
///
/// - DATABASE_URL: PostgreSQL connection string; omit to run on the
///   in-memory store (development only, state is lost on restart)
/// - IP_ADDRESS: bind address (127.0.0.1 for local, 0.0.0.0 for public)
/// - PORT: server port, 0 for an os-assigned one
/// - TOSS_SECRET_KEY: payment gateway secret key
/// - TOSS_BASE_URL: payment gateway API host (override for sandbox)
/// - TOSS_CHECKOUT_URL: hosted checkout page for redirects
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file if available
    let _ = dotenvy::dotenv();

    let subscriber = get_subscriber("info".into());
    init_subscriber(subscriber);

    let mut config = Config::from_env();

    let store: Arc<dyn ReservationStore> = match &config.database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url)
                .await
                .expect("Failed to connect to Postgres");
            // Run database migrations embedded in the binary
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run database migrations");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!(
                "DATABASE_URL is not set; running on the in-memory store"
            );
            Arc::new(MemoryStore::new())
        }
    };

    let gateway = Arc::new(TossClient::new(
        config.toss_base_url.clone(),
        config.toss_checkout_url.clone(),
        config.toss_secret_key.clone(),
        Duration::from_secs(10),
    ));

    #[cfg(not(feature = "mock-time"))]
    let time_source = TimeSource::new();
    #[cfg(feature = "mock-time")]
    let time_source = TimeSource::new(jiff::Timestamp::now());

    let server = build(&mut config, time_source, store, gateway).await?;
    tracing::info!(port = config.port, "server listening");
    server.await
}
