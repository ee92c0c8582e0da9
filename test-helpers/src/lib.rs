use std::sync::Arc;

use api::store::MemoryStore;
use api::time::TimeSource;
use api::{Config, telemetry};
use jiff::civil::Date;
use reqwest::StatusCode;
use tracing_log::LogTracer;
use tracing_subscriber::util::SubscriberInitExt;

pub mod mock;
use mock::MockPaymentGateway;

pub struct TestApp {
    #[allow(unused)]
    pub port: u16,
    pub client: payloads::APIClient,
    pub time_source: TimeSource,
    pub gateway: Arc<MockPaymentGateway>,
}

pub async fn spawn_app_on_port(port: u16) -> TestApp {
    let subscriber = telemetry::get_subscriber("error".into());
    let _ = LogTracer::init();
    let _ = subscriber.try_init();

    #[cfg(any(feature = "mock-time", test))]
    let time_source = TimeSource::new("2025-01-01T00:00:00Z".parse().unwrap());

    #[cfg(not(any(feature = "mock-time", test)))]
    let time_source = TimeSource::new();

    let mut config = Config {
        database_url: None,
        ip: "127.0.0.1".into(),
        port,
        toss_base_url: "http://payments.test".into(),
        toss_checkout_url: "http://payments.test/checkout".into(),
        toss_secret_key: "test-secret-key".to_string().into(),
    };

    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockPaymentGateway::new());

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let server = api::build(
        &mut config,
        time_source.clone(),
        store,
        gateway.clone(),
    )
    .await
    .unwrap();
    tokio::spawn(server);

    TestApp {
        port: config.port,
        client: payloads::APIClient {
            address: format!("http://127.0.0.1:{}", config.port),
            inner_client: client,
        },
        time_source,
        gateway,
    }
}

/// Use OS-assigned port for parallel testing.
pub async fn spawn_app() -> TestApp {
    spawn_app_on_port(0).await
}

pub fn assert_status_code<T>(
    result: Result<T, payloads::ClientError>,
    expected: StatusCode,
) {
    match result {
        Err(payloads::ClientError::APIError(code, _)) => {
            assert_eq!(code, expected)
        }
        _ => panic!("Expected APIError"),
    };
}

/// Assert both the HTTP status and the stable `code` string in the JSON
/// error body.
pub fn assert_error_code<T>(
    result: Result<T, payloads::ClientError>,
    expected_status: StatusCode,
    expected_code: &str,
) {
    match result {
        Err(payloads::ClientError::APIError(status, body)) => {
            assert_eq!(status, expected_status, "body: {body}");
            let parsed: serde_json::Value =
                serde_json::from_str(&body).expect("error body is JSON");
            assert_eq!(parsed["code"], expected_code, "body: {body}");
        }
        _ => panic!("Expected APIError"),
    };
}

/// Standard test site: weekday 50000, weekend 60000, 10000 per extra
/// person, 4 people included, 6 max.
pub fn site_details_a() -> payloads::requests::CreateSite {
    payloads::requests::CreateSite {
        name: "A1".into(),
        zone: "A".into(),
        kind: payloads::SiteKind::Tent,
        rates: payloads::requests::RateFields {
            offpeak_weekday: Some(50_000),
            offpeak_weekend: Some(60_000),
            extra_person: Some(10_000),
            base_people: Some(4),
            max_people: Some(6),
            ..Default::default()
        },
        peak_season: None,
        is_active: None,
    }
}

pub fn guest_a() -> payloads::GuestInfo {
    payloads::GuestInfo {
        name: "Kim Jiho".into(),
        phone: "010-1234-5678".into(),
        email: Some("jiho@example.com".into()),
    }
}

pub fn payment_ready_details(
    site_id: payloads::SiteId,
    check_in: Date,
    check_out: Date,
) -> payloads::requests::PaymentReady {
    payloads::requests::PaymentReady {
        site_id,
        check_in,
        check_out,
        people: None,
        guest: guest_a(),
        qa: vec![],
        agreements: vec![],
        manual_extra: None,
    }
}

impl TestApp {
    pub async fn create_site_a(&self) -> anyhow::Result<payloads::responses::Site> {
        Ok(self.client.create_site(&site_details_a()).await?)
    }

    /// Full happy path: ready then confirm, returning the paid
    /// reservation.
    pub async fn book_and_pay(
        &self,
        site_id: payloads::SiteId,
        check_in: Date,
        check_out: Date,
    ) -> anyhow::Result<payloads::responses::Reservation> {
        let ready = self
            .client
            .payment_ready(&payment_ready_details(
                site_id, check_in, check_out,
            ))
            .await?;
        self.client
            .payment_confirm(&payloads::requests::PaymentConfirm {
                payment_key: format!("pk-{}", ready.order_id),
                order_id: ready.order_id.clone(),
                amount: ready.total_amount,
            })
            .await?;
        Ok(self.client.get_reservation(&ready.reservation_id).await?)
    }
}
