pub mod availability;
pub mod dates;
pub mod lifecycle;
pub mod payment;
pub mod pricing;
pub mod routes;
pub mod store;
pub mod telemetry;
pub mod time;

use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use secrecy::SecretString;

use crate::payment::PaymentGateway;
use crate::store::ReservationStore;
use crate::time::TimeSource;

/// Build the server, but not await it.
///
/// Returns the port that the server has bound to by modifying the config.
/// The store and gateway are injected so tests can run against the
/// in-memory store and a mock gateway.
pub async fn build(
    config: &mut Config,
    time_source: TimeSource,
    store: Arc<dyn ReservationStore>,
    gateway: Arc<dyn PaymentGateway>,
) -> std::io::Result<Server> {
    let store = web::Data::from(store);
    let gateway = web::Data::from(gateway);
    let time_source = web::Data::new(time_source);

    // OS assigns the port if binding to 0
    let listener = TcpListener::bind(format!("{}:{}", config.ip, config.port))?;
    config.port = listener.local_addr()?.port();
    let server = HttpServer::new(move || {
        App::new()
            .service(routes::api_services())
            .app_data(store.clone())
            .app_data(gateway.clone())
            .app_data(time_source.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

pub struct Config {
    /// Absent means run on the in-memory store (development only).
    pub database_url: Option<String>,
    /// set to "0.0.0.0" for public access, "127.0.0.1" for local dev
    pub ip: String,
    /// set to 0 to get an os-assigned port
    pub port: u16,
    /// Payment gateway API host.
    pub toss_base_url: String,
    /// Hosted checkout page guests are redirected to.
    pub toss_checkout_url: String,
    pub toss_secret_key: SecretString,
}

impl Config {
    pub fn from_env() -> Self {
        use std::env::var;

        Config {
            database_url: var("DATABASE_URL").ok(),
            ip: var("IP_ADDRESS")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: var("PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(8000),
            toss_base_url: var("TOSS_BASE_URL").unwrap_or_else(|_| {
                "https://api.tosspayments.com".to_string()
            }),
            toss_checkout_url: var("TOSS_CHECKOUT_URL")
                .unwrap_or_else(|_| "http://localhost:8080/pay".to_string()),
            toss_secret_key: var("TOSS_SECRET_KEY")
                .unwrap_or_default()
                .into(),
        }
    }
}
