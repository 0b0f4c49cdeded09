use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use chrono_tz::Tz;
use serde_json::{json, Value};
use tower::ServiceExt;
use vacationstay_auth::JwtKeys;
use vacationstay_bookings::{routes::routes, BookingsState};
use vacationstay_common::time::today_in;
use vacationstay_db::{
    init_all_schemas, DbClient, NewUser, PropertyDraft, PropertyRepository, Role, UserRepository,
    LOCAL_PROVIDER,
};

struct TestApp {
    router: Router,
    property_id: i64,
    guest_id: i64,
    guest: String,
    owner: String,
    stranger: String,
    admin: String,
}

async fn app() -> TestApp {
    app_on(DbClient::from_url("sqlite::memory:").await.unwrap()).await
}

async fn app_on(db_client: DbClient) -> TestApp {
    let repos = init_all_schemas(&db_client).await.unwrap();
    let jwt = Arc::new(JwtKeys::new(b"api-test-secret-api-test-secret-0", 3_600_000));

    let mut users = Vec::new();
    for (email, roles) in [
        ("guest@example.com", BTreeSet::from([Role::User])),
        ("owner@example.com", BTreeSet::from([Role::User])),
        ("stranger@example.com", BTreeSet::from([Role::User])),
        ("admin@example.com", BTreeSet::from([Role::User, Role::Admin])),
    ] {
        let user = repos
            .users
            .create(NewUser {
                name: email.split('@').next().unwrap().to_string(),
                email: email.to_string(),
                password_hash: None,
                image_url: None,
                provider: LOCAL_PROVIDER.to_string(),
                provider_id: None,
                roles,
            })
            .await
            .unwrap();
        let token = jwt.issue(&user).unwrap();
        users.push((user.id, token));
    }

    let property = repos
        .properties
        .create(
            Some(users[1].0),
            PropertyDraft {
                title: "Cabin".to_string(),
                description: "In the woods".to_string(),
                location: "Aspen, USA".to_string(),
                price: 15_000,
                bedrooms: 2,
                bathrooms: 1,
                max_guests: 4,
                amenities: vec!["fireplace".to_string()],
                images: vec!["https://img.example.com/cabin.jpg".to_string()],
            },
        )
        .await
        .unwrap();

    let router = routes(Arc::new(BookingsState {
        bookings: repos.bookings.clone(),
        properties: repos.properties.clone(),
        jwt,
        time_zone: Tz::UTC,
    }));

    TestApp {
        router,
        property_id: property.id,
        guest_id: users[0].0,
        guest: users[0].1.clone(),
        owner: users[1].1.clone(),
        stranger: users[2].1.clone(),
        admin: users[3].1.clone(),
    }
}

/// `offset` days from today, as sent by clients.
fn day(offset: i64) -> String {
    (today_in(Tz::UTC) + Duration::days(offset)).to_string()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn book(app: &TestApp, token: &str, start: i64, end: i64) -> (StatusCode, Value) {
    send(
        &app.router,
        "POST",
        "/bookings",
        Some(token),
        Some(json!({
            "propertyId": app.property_id,
            "startDate": day(start),
            "endDate": day(end)
        })),
    )
    .await
}

#[tokio::test]
async fn booking_is_priced_by_the_server() {
    let app = app().await;
    let (status, booking) = book(&app, &app.guest, 10, 13).await;

    assert_eq!(status, StatusCode::CREATED, "{booking}");
    assert_eq!(booking["totalPrice"], 45_000);
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["userId"], app.guest_id);
    assert_eq!(booking["startDate"], day(10));
}

#[tokio::test]
async fn overlapping_stays_are_rejected() {
    let app = app().await;
    assert_eq!(book(&app, &app.guest, 10, 13).await.0, StatusCode::CREATED);

    // Check-out day of the existing stay is blocked too.
    let (status, body) = book(&app, &app.stranger, 13, 15).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Property is not available for the selected dates");

    let (status, _) = book(&app, &app.stranger, 8, 10).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = book(&app, &app.stranger, 14, 16).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn invalid_requests() {
    let app = app().await;

    let (status, _) = book(&app, &app.guest, -1, 2).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&app, &app.guest, 5, 5).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        "POST",
        "/bookings",
        Some(&app.guest),
        Some(json!({ "propertyId": 999, "startDate": day(1), "endDate": day(2) })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app.router,
        "POST",
        "/bookings",
        None,
        Some(json!({ "propertyId": app.property_id, "startDate": day(1), "endDate": day(2) })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn availability_calendar_and_quote_are_public() {
    let app = app().await;
    book(&app, &app.guest, 3, 5).await;
    let base = format!("/bookings/property/{}", app.property_id);

    let (status, body) = send(
        &app.router,
        "GET",
        &format!("{}/availability?startDate={}&endDate={}", base, day(5), day(7)),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);

    let (_, body) = send(
        &app.router,
        "GET",
        &format!("{}/availability?startDate={}&endDate={}", base, day(6), day(7)),
        None,
        None,
    )
    .await;
    assert_eq!(body["available"], true);

    let (status, calendar) = send(
        &app.router,
        "GET",
        &format!("{}/calendar?from={}&to={}", base, day(-2), day(7)),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calendar["booked"].as_array().unwrap().len(), 1);
    assert_eq!(
        calendar["disabledDates"],
        json!([day(-2), day(-1), day(3), day(4), day(5)])
    );

    let (status, q) = send(
        &app.router,
        "GET",
        &format!("{}/quote?startDate={}&endDate={}", base, day(20), day(27)),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(q, json!({ "nights": 7, "nightlyRate": 15_000, "totalPrice": 105_000 }));

    let (status, _) = send(
        &app.router,
        "GET",
        &format!("{}/quote?startDate=tomorrow&endDate={}", base, day(27)),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancel_frees_dates_and_only_once() {
    let app = app().await;
    let (_, booking) = book(&app, &app.guest, 10, 12).await;
    let cancel_uri = format!("/bookings/{}/cancel", booking["id"]);

    let (status, _) = send(&app.router, "PATCH", &cancel_uri, Some(&app.stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The listing's owner may cancel.
    let (status, cancelled) = send(&app.router, "PATCH", &cancel_uri, Some(&app.owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (status, _) = send(&app.router, "PATCH", &cancel_uri, Some(&app.guest), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = book(&app, &app.stranger, 10, 12).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn reschedule_ignores_its_own_dates() {
    let app = app().await;
    let (_, booking) = book(&app, &app.guest, 10, 14).await;
    book(&app, &app.stranger, 20, 22).await;
    let uri = format!("/bookings/{}", booking["id"]);

    let (status, moved) = send(
        &app.router,
        "PUT",
        &uri,
        Some(&app.guest),
        Some(json!({ "startDate": day(11), "endDate": day(13) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{moved}");
    assert_eq!(moved["totalPrice"], 30_000);

    let (status, _) = send(
        &app.router,
        "PUT",
        &uri,
        Some(&app.guest),
        Some(json!({ "startDate": day(18), "endDate": day(20) })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app.router,
        "PUT",
        &uri,
        Some(&app.stranger),
        Some(json!({ "startDate": day(30), "endDate": day(31) })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn listing_permissions() {
    let app = app().await;
    let (_, booking) = book(&app, &app.guest, 10, 12).await;
    let booking_uri = format!("/bookings/{}", booking["id"]);

    let (status, _) = send(&app.router, "GET", "/bookings", Some(&app.guest), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, all) = send(&app.router, "GET", "/bookings", Some(&app.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    for (token, expected) in [
        (&app.guest, StatusCode::OK),
        (&app.owner, StatusCode::OK),
        (&app.stranger, StatusCode::FORBIDDEN),
    ] {
        let (status, _) = send(&app.router, "GET", &booking_uri, Some(token), None).await;
        assert_eq!(status, expected);
    }

    let user_uri = format!("/bookings/user/{}", app.guest_id);
    let (status, mine) = send(&app.router, "GET", &user_uri, Some(&app.guest), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (status, _) = send(&app.router, "GET", &user_uri, Some(&app.stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let property_uri = format!("/bookings/property/{}", app.property_id);
    let (status, _) = send(&app.router, "GET", &property_uri, Some(&app.owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app.router, "GET", &property_uri, Some(&app.guest), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app.router, "DELETE", &booking_uri, Some(&app.owner), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app.router, "DELETE", &booking_uri, Some(&app.guest), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app.router, "GET", &booking_uri, Some(&app.guest), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_shows_trips_and_listings() {
    let app = app().await;
    book(&app, &app.guest, 10, 12).await;

    let (status, dashboard) = send(&app.router, "GET", "/dashboard", Some(&app.guest), None).await;
    assert_eq!(status, StatusCode::OK);
    let trip = &dashboard["bookings"][0];
    assert_eq!(trip["propertyTitle"], "Cabin");
    assert_eq!(trip["propertyLocation"], "Aspen, USA");
    assert_eq!(trip["propertyImage"], "https://img.example.com/cabin.jpg");
    assert_eq!(trip["canCancel"], true);
    assert!(dashboard["properties"].as_array().unwrap().is_empty());

    let (_, owner_view) = send(&app.router, "GET", "/dashboard", Some(&app.owner), None).await;
    assert!(owner_view["bookings"].as_array().unwrap().is_empty());
    assert_eq!(owner_view["properties"][0]["title"], "Cabin");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_requests_for_the_same_nights_book_once() {
    let path = std::env::temp_dir().join(format!(
        "vacationstay-bookings-race-{}-{}.db",
        std::process::id(),
        chrono::Utc::now().timestamp_micros()
    ));
    let db_url = format!("sqlite:{}", path.display());
    let app = app_on(DbClient::from_url(&db_url).await.unwrap()).await;

    let mut tasks = Vec::new();
    for token in [&app.guest, &app.owner, &app.stranger, &app.admin, &app.guest, &app.owner] {
        let router = app.router.clone();
        let token = token.clone();
        let body = json!({
            "propertyId": app.property_id,
            "startDate": day(20),
            "endDate": day(24)
        });
        tasks.push(tokio::spawn(async move {
            send(&router, "POST", "/bookings", Some(&token), Some(body)).await
        }));
    }

    let mut statuses = Vec::new();
    for task in tasks {
        let (status, body) = task.await.unwrap();
        if status == StatusCode::CONFLICT {
            assert_eq!(body["message"], "Property is not available for the selected dates");
        }
        statuses.push(status);
    }
    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let conflicts = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
    assert_eq!((created, conflicts), (1, 5), "{:?}", statuses);

    drop(app);
    for suffix in ["", "-wal", "-shm", "-journal"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}
