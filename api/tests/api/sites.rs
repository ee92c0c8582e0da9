use payloads::requests;
use reqwest::StatusCode;
use test_helpers::{assert_error_code, site_details_a, spawn_app};

#[tokio::test]
async fn create_and_list_sites() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let created = app.client.create_site(&site_details_a()).await?;
    assert_eq!(created.site_details.name, "A1");
    assert!(created.site_details.is_active);
    assert_eq!(created.site_details.rate_table.offpeak_weekday, 50_000);
    assert_eq!(created.site_details.rate_table.offpeak_weekend, 60_000);

    let sites = app.client.list_sites().await?;
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].site_id, created.site_id);

    Ok(())
}

#[tokio::test]
async fn legacy_rate_aliases_collapse_at_ingestion() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let mut details = site_details_a();
    details.rates = requests::RateFields {
        price: Some(40_000),
        ..Default::default()
    };
    let created = app.client.create_site(&details).await?;

    let rates = created.site_details.rate_table;
    assert_eq!(rates.offpeak_weekday, 40_000);
    assert_eq!(rates.offpeak_weekend, 40_000);
    assert_eq!(rates.peak_weekday, 40_000);
    assert_eq!(rates.peak_weekend, 40_000);
    assert_eq!(rates.extra_person, 0);
    assert_eq!(rates.base_people, 1);
    assert_eq!(rates.max_people, 1);

    Ok(())
}

#[tokio::test]
async fn site_without_any_rate_is_rejected() {
    let app = spawn_app().await;

    let mut details = site_details_a();
    details.rates = requests::RateFields::default();
    let result = app.client.create_site(&details).await;

    assert_error_code(result, StatusCode::BAD_REQUEST, "MISSING_FIELD");
}

#[tokio::test]
async fn site_name_is_validated() {
    let app = spawn_app().await;

    let mut details = site_details_a();
    details.name = " ".into();
    let result = app.client.create_site(&details).await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "MISSING_FIELD");

    let mut details = site_details_a();
    details.name = "x".repeat(requests::SITE_NAME_MAX_LEN + 1);
    let result = app.client.create_site(&details).await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "FIELD_TOO_LONG");
}
