use jiff::civil::date;
use payloads::{ReservationStatus, requests};
use reqwest::StatusCode;
use test_helpers::{
    assert_error_code, assert_status_code, payment_ready_details,
    site_details_a, spawn_app,
};

#[tokio::test]
async fn ready_creates_a_pending_reservation_with_quote()
-> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    // Mon -> Wed, 5 people with 4 included.
    let mut details = payment_ready_details(
        site.site_id,
        date(2025, 9, 1),
        date(2025, 9, 3),
    );
    details.people = Some(5);
    let ready = app.client.payment_ready(&details).await?;

    assert_eq!(ready.nights, 2);
    assert_eq!(ready.total_amount, 120_000);
    assert!(ready.checkout_url.contains(&ready.order_id));
    assert_eq!(ready.code.len(), 8);

    let reservation =
        app.client.get_reservation(&ready.reservation_id).await?;
    assert_eq!(reservation.status, ReservationStatus::Pending);
    assert_eq!(reservation.people, 5);
    assert_eq!(reservation.initial_people, 5);
    assert_eq!(reservation.amount_breakdown.base_amount, 100_000);
    assert_eq!(reservation.amount_breakdown.extra_person_amount, 20_000);

    Ok(())
}

#[tokio::test]
async fn confirm_flips_pending_to_paid() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    let reservation = app
        .book_and_pay(site.site_id, date(2025, 7, 1), date(2025, 7, 4))
        .await?;
    assert_eq!(reservation.status, ReservationStatus::Paid);
    assert_eq!(app.gateway.approved_count(), 1);

    Ok(())
}

#[tokio::test]
async fn amount_mismatch_is_rejected_before_charging() -> anyhow::Result<()>
{
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

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
            payment_key: "pk-test".into(),
            order_id: ready.order_id.clone(),
            amount: ready.total_amount + 1,
        })
        .await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "AMOUNT_MISMATCH");
    assert_eq!(app.gateway.approved_count(), 0);

    let reservation =
        app.client.get_reservation(&ready.reservation_id).await?;
    assert_eq!(reservation.status, ReservationStatus::Pending);

    Ok(())
}

#[tokio::test]
async fn declined_payment_leaves_the_reservation_pending()
-> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    let ready = app
        .client
        .payment_ready(&payment_ready_details(
            site.site_id,
            date(2025, 7, 1),
            date(2025, 7, 3),
        ))
        .await?;

    app.gateway.decline_with("REJECT_CARD_COMPANY", "card declined");
    let result = app
        .client
        .payment_confirm(&requests::PaymentConfirm {
            payment_key: "pk-test".into(),
            order_id: ready.order_id.clone(),
            amount: ready.total_amount,
        })
        .await;
    assert_error_code(
        result,
        StatusCode::PAYMENT_REQUIRED,
        "PAYMENT_DECLINED",
    );

    let reservation =
        app.client.get_reservation(&ready.reservation_id).await?;
    assert_eq!(reservation.status, ReservationStatus::Pending);

    // The guest can retry once the card issue is sorted.
    app.gateway.approve_all();
    app.client
        .payment_confirm(&requests::PaymentConfirm {
            payment_key: "pk-test".into(),
            order_id: ready.order_id,
            amount: ready.total_amount,
        })
        .await?;

    Ok(())
}

#[tokio::test]
async fn gateway_failures_fail_closed() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    let ready = app
        .client
        .payment_ready(&payment_ready_details(
            site.site_id,
            date(2025, 7, 1),
            date(2025, 7, 3),
        ))
        .await?;

    app.gateway.fail_all();
    let result = app
        .client
        .payment_confirm(&requests::PaymentConfirm {
            payment_key: "pk-test".into(),
            order_id: ready.order_id.clone(),
            amount: ready.total_amount,
        })
        .await;
    assert_error_code(result, StatusCode::BAD_GATEWAY, "GATEWAY_ERROR");
    assert_eq!(app.gateway.approved_count(), 0);

    let reservation =
        app.client.get_reservation(&ready.reservation_id).await?;
    assert_eq!(reservation.status, ReservationStatus::Pending);

    // Once the gateway is reachable again the same order goes through.
    app.gateway.approve_all();
    app.client
        .payment_confirm(&requests::PaymentConfirm {
            payment_key: "pk-test".into(),
            order_id: ready.order_id,
            amount: ready.total_amount,
        })
        .await?;

    Ok(())
}

#[tokio::test]
async fn confirm_cannot_be_replayed() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    let reservation = app
        .book_and_pay(site.site_id, date(2025, 7, 1), date(2025, 7, 4))
        .await?;

    let result = app
        .client
        .payment_confirm(&requests::PaymentConfirm {
            payment_key: "pk-replay".into(),
            order_id: reservation.order_id,
            amount: reservation.amount_breakdown.total,
        })
        .await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "INVALID_STATUS");

    Ok(())
}

#[tokio::test]
async fn losing_a_date_race_returns_conflict() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    app.book_and_pay(site.site_id, date(2025, 7, 1), date(2025, 7, 4))
        .await?;

    // A second booking over the same dates can still be initiated.
    let ready = app
        .client
        .payment_ready(&payment_ready_details(
            site.site_id,
            date(2025, 7, 2),
            date(2025, 7, 5),
        ))
        .await?;
    let result = app
        .client
        .payment_confirm(&requests::PaymentConfirm {
            payment_key: "pk-loser".into(),
            order_id: ready.order_id,
            amount: ready.total_amount,
        })
        .await;
    assert_error_code(result, StatusCode::CONFLICT, "ALREADY_RESERVED");
    // The loser was never charged.
    assert_eq!(app.gateway.approved_count(), 1);

    Ok(())
}

#[tokio::test]
async fn concurrent_confirms_have_exactly_one_winner() -> anyhow::Result<()>
{
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    let first = app
        .client
        .payment_ready(&payment_ready_details(
            site.site_id,
            date(2025, 7, 1),
            date(2025, 7, 4),
        ))
        .await?;
    let second = app
        .client
        .payment_ready(&payment_ready_details(
            site.site_id,
            date(2025, 7, 1),
            date(2025, 7, 4),
        ))
        .await?;

    let confirm_a = requests::PaymentConfirm {
        payment_key: "pk-a".into(),
        order_id: first.order_id.clone(),
        amount: first.total_amount,
    };
    let confirm_b = requests::PaymentConfirm {
        payment_key: "pk-b".into(),
        order_id: second.order_id.clone(),
        amount: second.total_amount,
    };
    let (a, b) = tokio::join!(
        app.client.payment_confirm(&confirm_a),
        app.client.payment_confirm(&confirm_b),
    );
    assert_eq!(
        a.is_ok() as u8 + b.is_ok() as u8,
        1,
        "exactly one confirm must win"
    );

    let reservations =
        app.client.list_site_reservations(&site.site_id).await?;
    let paid = reservations
        .iter()
        .filter(|r| r.status == ReservationStatus::Paid)
        .count();
    let pending = reservations
        .iter()
        .filter(|r| r.status == ReservationStatus::Pending)
        .count();
    assert_eq!(paid, 1);
    assert_eq!(pending, 1);

    Ok(())
}

#[tokio::test]
async fn booking_validation_failures() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let site = app.create_site_a().await?;

    // Inverted dates.
    let details = payment_ready_details(
        site.site_id,
        date(2025, 7, 4),
        date(2025, 7, 1),
    );
    let result = app.client.payment_ready(&details).await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "INVALID_DATE_RANGE");

    // Over maximum occupancy.
    let mut details = payment_ready_details(
        site.site_id,
        date(2025, 7, 1),
        date(2025, 7, 3),
    );
    details.people = Some(7);
    let result = app.client.payment_ready(&details).await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "INVALID_PEOPLE");

    // Blank guest name.
    let mut details = payment_ready_details(
        site.site_id,
        date(2025, 7, 1),
        date(2025, 7, 3),
    );
    details.guest.name = "  ".into();
    let result = app.client.payment_ready(&details).await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "MISSING_FIELD");

    // Phone number over its own limit.
    let mut details = payment_ready_details(
        site.site_id,
        date(2025, 7, 1),
        date(2025, 7, 3),
    );
    details.guest.phone = "0".repeat(requests::GUEST_PHONE_MAX_LEN + 1);
    let result = app.client.payment_ready(&details).await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "FIELD_TOO_LONG");

    Ok(())
}

#[tokio::test]
async fn inactive_site_rejects_bookings() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let mut details = site_details_a();
    details.is_active = Some(false);
    let site = app.client.create_site(&details).await?;

    let result = app
        .client
        .payment_ready(&payment_ready_details(
            site.site_id,
            date(2025, 7, 1),
            date(2025, 7, 3),
        ))
        .await;
    assert_error_code(result, StatusCode::BAD_REQUEST, "SITE_INACTIVE");

    Ok(())
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let app = spawn_app().await;

    let result = app
        .client
        .payment_confirm(&requests::PaymentConfirm {
            payment_key: "pk".into(),
            order_id: "camp-doesnotexist".into(),
            amount: 1,
        })
        .await;
    assert_status_code(result, StatusCode::NOT_FOUND);
}
