use jiff::civil::date;
use payloads::{
    InternalKind, ReservationSource, ReservationStatus, requests,
};
use reqwest::StatusCode;
use test_helpers::{
    assert_error_code, payment_ready_details, spawn_app,
};

fn internal_details(
    site_id: payloads::SiteId,
    kind: InternalKind,
    amount: Option<i64>,
) -> requests::CreateInternalReservation {
    requests::CreateInternalReservation {
        site_id,
        check_in: date(2025, 7, 1),
        check_out: date(2025, 7, 3),
        people: None,
        internal_type: kind,
        admin_name: "manager".into(),
        amount,
        note: None,
    }
}

#[tokio::test]
async fn internal_reservation_blocks_from_birth() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    let created = app
        .client
        .create_internal_reservation(&internal_details(
            site.site_id,
            InternalKind::Manual,
            Some(80_000),
        ))
        .await?;
    assert_eq!(created.status, ReservationStatus::Confirmed);
    assert_eq!(created.source, ReservationSource::Admin);
    assert_eq!(created.internal_type, Some(InternalKind::Manual));
    assert_eq!(created.amount_breakdown.total, 80_000);

    let availability = app
        .client
        .availability(&site.site_id, date(2025, 7, 2), date(2025, 7, 4))
        .await?;
    assert!(availability.conflict);

    // A guest can still initiate over the block, but never pay.
    let ready = app
        .client
        .payment_ready(&payment_ready_details(
            site.site_id,
            date(2025, 7, 1),
            date(2025, 7, 3),
        ))
        .await?;
    let result = app
        .client
        .payment_confirm(&requests::PaymentConfirm {
            payment_key: "pk".into(),
            order_id: ready.order_id,
            amount: ready.total_amount,
        })
        .await;
    assert_error_code(result, StatusCode::CONFLICT, "ALREADY_RESERVED");

    Ok(())
}

#[tokio::test]
async fn overlapping_internal_creation_is_rejected() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    app.client
        .create_internal_reservation(&internal_details(
            site.site_id,
            InternalKind::Free,
            None,
        ))
        .await?;
    let result = app
        .client
        .create_internal_reservation(&internal_details(
            site.site_id,
            InternalKind::Free,
            None,
        ))
        .await;
    assert_error_code(result, StatusCode::CONFLICT, "ALREADY_RESERVED");

    Ok(())
}

#[tokio::test]
async fn amount_rules_per_kind() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    // Free always totals zero, even when an amount is supplied.
    let mut details =
        internal_details(site.site_id, InternalKind::Free, Some(55_000));
    let free = app.client.create_internal_reservation(&details).await?;
    assert_eq!(free.amount_breakdown.total, 0);

    // Manual requires an explicit amount.
    details = internal_details(site.site_id, InternalKind::Manual, None);
    details.check_in = date(2025, 7, 10);
    details.check_out = date(2025, 7, 12);
    let result = app.client.create_internal_reservation(&details).await;
    assert_error_code(
        result,
        StatusCode::BAD_REQUEST,
        "MANUAL_AMOUNT_REQUIRED",
    );

    // Paid without an amount falls back to the standard quote
    // (two weekday nights).
    details = internal_details(site.site_id, InternalKind::Paid, None);
    details.check_in = date(2025, 7, 14);
    details.check_out = date(2025, 7, 16);
    let paid = app.client.create_internal_reservation(&details).await?;
    assert_eq!(paid.amount_breakdown.total, 100_000);

    Ok(())
}

#[tokio::test]
async fn canceling_an_internal_reservation_releases_inventory()
-> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    let created = app
        .client
        .create_internal_reservation(&internal_details(
            site.site_id,
            InternalKind::Free,
            None,
        ))
        .await?;

    let blocked = app
        .client
        .disabled_dates(&site.site_id, date(2025, 7, 1), date(2025, 8, 1))
        .await?;
    assert_eq!(blocked.dates.len(), 2);

    let deleted = app
        .client
        .cancel_internal_reservation(&created.reservation_id)
        .await?;
    assert!(deleted.success);

    let reservation =
        app.client.get_reservation(&created.reservation_id).await?;
    assert_eq!(reservation.status, ReservationStatus::Canceled);

    let blocked = app
        .client
        .disabled_dates(&site.site_id, date(2025, 7, 1), date(2025, 8, 1))
        .await?;
    assert!(blocked.dates.is_empty());
    let availability = app
        .client
        .availability(&site.site_id, date(2025, 7, 1), date(2025, 7, 3))
        .await?;
    assert!(availability.available);

    Ok(())
}

#[tokio::test]
async fn updates_revalidate_dates_and_conflicts() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    app.client
        .create_internal_reservation(&internal_details(
            site.site_id,
            InternalKind::Free,
            None,
        ))
        .await?;
    let mut second_details =
        internal_details(site.site_id, InternalKind::Paid, None);
    second_details.check_in = date(2025, 7, 7);
    second_details.check_out = date(2025, 7, 9);
    let second = app
        .client
        .create_internal_reservation(&second_details)
        .await?;

    // Moving the second booking onto the first is a conflict.
    let result = app
        .client
        .update_internal_reservation(
            &second.reservation_id,
            &requests::UpdateInternalReservation {
                check_in: Some(date(2025, 7, 2)),
                check_out: Some(date(2025, 7, 4)),
                ..Default::default()
            },
        )
        .await;
    assert_error_code(result, StatusCode::CONFLICT, "ALREADY_RESERVED");

    // Inverted patch.
    let result = app
        .client
        .update_internal_reservation(
            &second.reservation_id,
            &requests::UpdateInternalReservation {
                check_out: Some(date(2025, 7, 6)),
                ..Default::default()
            },
        )
        .await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "INVALID_DATE_RANGE");

    // A clean date move recomputes the paid-kind amount (three weekday
    // nights).
    let updated = app
        .client
        .update_internal_reservation(
            &second.reservation_id,
            &requests::UpdateInternalReservation {
                check_in: Some(date(2025, 7, 14)),
                check_out: Some(date(2025, 7, 17)),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.check_in, date(2025, 7, 14));
    assert_eq!(updated.amount_breakdown.total, 150_000);

    Ok(())
}

#[tokio::test]
async fn guest_reservations_are_off_limits() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;
    let guest_booking = app
        .book_and_pay(site.site_id, date(2025, 7, 1), date(2025, 7, 3))
        .await?;

    let result = app
        .client
        .update_internal_reservation(
            &guest_booking.reservation_id,
            &requests::UpdateInternalReservation::default(),
        )
        .await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "INVALID_STATUS");

    let result = app
        .client
        .cancel_internal_reservation(&guest_booking.reservation_id)
        .await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "INVALID_STATUS");

    Ok(())
}

#[tokio::test]
async fn canceled_internal_reservations_reject_amendments()
-> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    let created = app
        .client
        .create_internal_reservation(&internal_details(
            site.site_id,
            InternalKind::Free,
            None,
        ))
        .await?;
    app.client
        .cancel_internal_reservation(&created.reservation_id)
        .await?;

    let result = app
        .client
        .update_internal_reservation(
            &created.reservation_id,
            &requests::UpdateInternalReservation {
                people: Some(2),
                ..Default::default()
            },
        )
        .await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "INVALID_STATUS");

    Ok(())
}
