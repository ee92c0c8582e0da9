use jiff::civil::date;
use reqwest::StatusCode;
use test_helpers::{
    assert_error_code, payment_ready_details, spawn_app,
};

#[tokio::test]
async fn open_site_has_no_conflicts() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    let availability = app
        .client
        .availability(&site.site_id, date(2025, 7, 1), date(2025, 7, 4))
        .await?;
    assert!(availability.available);
    assert!(!availability.conflict);

    let disabled = app
        .client
        .disabled_dates(&site.site_id, date(2025, 7, 1), date(2025, 8, 1))
        .await?;
    assert!(disabled.dates.is_empty());

    Ok(())
}

#[tokio::test]
async fn paid_stay_blocks_overlap_but_not_adjacent() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;
    app.book_and_pay(site.site_id, date(2025, 7, 1), date(2025, 7, 4))
        .await?;

    let overlapping = app
        .client
        .availability(&site.site_id, date(2025, 7, 3), date(2025, 7, 5))
        .await?;
    assert!(overlapping.conflict);

    // Back-to-back stay sharing the check-out boundary is fine.
    let adjacent = app
        .client
        .availability(&site.site_id, date(2025, 7, 4), date(2025, 7, 6))
        .await?;
    assert!(adjacent.available);

    Ok(())
}

#[tokio::test]
async fn pending_greys_calendar_without_blocking_confirm()
-> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    // Initiated but never paid.
    app.client
        .payment_ready(&payment_ready_details(
            site.site_id,
            date(2025, 7, 1),
            date(2025, 7, 3),
        ))
        .await?;

    let availability = app
        .client
        .availability(&site.site_id, date(2025, 7, 1), date(2025, 7, 3))
        .await?;
    assert!(availability.available);

    let disabled = app
        .client
        .disabled_dates(&site.site_id, date(2025, 7, 1), date(2025, 8, 1))
        .await?;
    assert_eq!(disabled.dates, vec![date(2025, 7, 1), date(2025, 7, 2)]);

    Ok(())
}

#[tokio::test]
async fn disabled_dates_cover_every_conflicting_night() -> anyhow::Result<()>
{
    let app = spawn_app().await;
    let site = app.create_site_a().await?;
    app.book_and_pay(site.site_id, date(2025, 7, 2), date(2025, 7, 5))
        .await?;
    app.client
        .payment_ready(&payment_ready_details(
            site.site_id,
            date(2025, 7, 10),
            date(2025, 7, 12),
        ))
        .await?;

    let from = date(2025, 7, 1);
    let to = date(2025, 8, 1);
    let disabled = app.client.disabled_dates(&site.site_id, from, to).await?;

    let mut night = from;
    while night < to {
        let next = night.tomorrow()?;
        let check = app
            .client
            .availability(&site.site_id, night, next)
            .await?;
        if check.conflict {
            assert!(disabled.dates.contains(&night), "{night}");
        }
        night = next;
    }

    Ok(())
}

#[tokio::test]
async fn malformed_and_missing_parameters_are_rejected() {
    let app = spawn_app().await;
    let site = app.create_site_a().await.unwrap();

    let response = app
        .client
        .inner_client
        .get(format!(
            "{}/reservations/availability?siteId={}&checkIn=2025-7-1&checkOut=2025-07-04",
            app.client.address, site.site_id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .client
        .inner_client
        .get(format!(
            "{}/reservations/availability?siteId={}",
            app.client.address, site.site_id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_FIELD");

    // Inverted window.
    let result = app
        .client
        .availability(&site.site_id, date(2025, 7, 4), date(2025, 7, 1))
        .await;
    assert_error_code(
        result,
        StatusCode::BAD_REQUEST,
        "INVALID_DATE_RANGE",
    );
}
