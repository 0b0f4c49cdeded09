use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use vacationstay_config::DatabaseConfig;

use crate::models::{
    BookingStatus, NewBooking, NewReview, NewUser, PropertyDraft, PropertyFilter, Role,
    LOCAL_PROVIDER,
};
use crate::repositories::{
    init_all_schemas, BookingRepository, PropertyRepository, Repositories, ReviewRepository,
    UserRepository,
};
use crate::DbClient;

async fn setup() -> Repositories {
    let client = DbClient::from_url("sqlite::memory:").await.unwrap();
    init_all_schemas(&client).await.unwrap()
}

/// A database file behind a five-connection pool, so writers really overlap.
async fn setup_file(name: &str) -> (Repositories, PathBuf) {
    let path = std::env::temp_dir().join(format!(
        "vacationstay-{}-{}-{}.db",
        name,
        std::process::id(),
        Utc::now().timestamp_micros()
    ));
    let client = DbClient::from_config(&DatabaseConfig {
        url: format!("sqlite:{}", path.display()),
        max_connections: Some(5),
    })
    .await
    .unwrap();
    (init_all_schemas(&client).await.unwrap(), path)
}

fn remove_db_files(path: &Path) {
    for suffix in ["", "-wal", "-shm", "-journal"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(title: &str, location: &str, price: i64, bedrooms: i64, guests: i64) -> PropertyDraft {
    PropertyDraft {
        title: title.to_string(),
        description: format!("{} description", title),
        location: location.to_string(),
        price,
        bedrooms,
        bathrooms: 1,
        max_guests: guests,
        amenities: vec!["wifi".to_string(), "kitchen".to_string()],
        images: vec!["https://img.example.com/1.jpg".to_string()],
    }
}

async fn user(repos: &Repositories, email: &str) -> i64 {
    repos
        .users
        .create(NewUser {
            name: email.split('@').next().unwrap_or("guest").to_string(),
            email: email.to_string(),
            password_hash: None,
            image_url: None,
            provider: LOCAL_PROVIDER.to_string(),
            provider_id: None,
            roles: BTreeSet::from([Role::User]),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn property_round_trip_keeps_lists() {
    let repos = setup().await;
    let owner = user(&repos, "owner@example.com").await;

    let created = repos
        .properties
        .create(Some(owner), draft("Chalet", "Zermatt, Switzerland", 25_000, 3, 6))
        .await
        .unwrap();

    let found = repos.properties.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found.amenities, vec!["wifi", "kitchen"]);
    assert_eq!(found.images.len(), 1);
    assert_eq!(found.owner_id, Some(owner));
    assert!(found.created_at.is_some());
    assert!(repos.properties.find_by_id(created.id + 100).await.unwrap().is_none());
}

#[tokio::test]
async fn search_applies_every_filter() {
    let repos = setup().await;
    let owner = user(&repos, "owner@example.com").await;
    let props = &repos.properties;
    props.create(Some(owner), draft("Chalet", "Zermatt, Switzerland", 25_000, 3, 6)).await.unwrap();
    props.create(Some(owner), draft("Loft", "Zurich, Switzerland", 12_000, 1, 2)).await.unwrap();
    props.create(None, draft("Villa", "Nice, France", 40_000, 5, 10)).await.unwrap();

    let swiss = props
        .search(&PropertyFilter {
            location: Some("switzerland".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(swiss.len(), 2);

    // Price bounds are exclusive.
    let mid = props
        .search(&PropertyFilter {
            min_price: Some(12_000),
            max_price: Some(40_000),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(mid.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(), vec!["Chalet"]);

    // Room and guest counts are inclusive minimums.
    let big = props
        .search(&PropertyFilter {
            bedrooms: Some(3),
            guests: Some(6),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(big.len(), 2);

    let limited = props
        .search(&PropertyFilter {
            limit: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].title, "Chalet");

    assert_eq!(props.find_by_owner(owner).await.unwrap().len(), 2);
}

#[tokio::test]
async fn update_and_delete_property() {
    let repos = setup().await;
    let guest = user(&repos, "guest@example.com").await;
    let created = repos
        .properties
        .create(None, draft("Cabin", "Aspen, USA", 15_000, 2, 4))
        .await
        .unwrap();

    let mut changed = draft("Cabin", "Aspen, USA", 18_000, 2, 4);
    changed.amenities.clear();
    let updated = repos
        .properties
        .update(created.id, changed)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.price, 18_000);
    assert!(updated.amenities.is_empty());

    repos
        .reviews
        .create(NewReview {
            property_id: created.id,
            user_id: guest,
            rating: 4,
            comment: None,
        })
        .await
        .unwrap();

    assert!(repos.properties.delete(created.id).await.unwrap());
    assert!(!repos.properties.delete(created.id).await.unwrap());
    assert!(repos
        .reviews
        .ratings_for_property(created.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn create_if_passes_confirmed_bookings_to_the_check() {
    let repos = setup().await;
    let guest = user(&repos, "guest@example.com").await;
    let property = repos
        .properties
        .create(None, draft("Cabin", "Aspen, USA", 15_000, 2, 4))
        .await
        .unwrap();

    let first = repos
        .bookings
        .create_if(
            NewBooking {
                property_id: property.id,
                user_id: guest,
                start_date: date(2031, 3, 1),
                end_date: date(2031, 3, 5),
                total_price: 60_000,
            },
            |existing| existing.is_empty(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.status, BookingStatus::Confirmed);
    assert_eq!(first.start_date, date(2031, 3, 1));

    let mut seen = 0;
    let rejected = repos
        .bookings
        .create_if(
            NewBooking {
                property_id: property.id,
                user_id: guest,
                start_date: date(2031, 3, 4),
                end_date: date(2031, 3, 6),
                total_price: 30_000,
            },
            |existing| {
                seen = existing.len();
                false
            },
        )
        .await
        .unwrap();
    assert!(rejected.is_none());
    assert_eq!(seen, 1);
    assert_eq!(repos.bookings.find_by_property(property.id).await.unwrap().len(), 1);

    // Cancelled bookings are not handed to the check.
    repos
        .bookings
        .update_status(first.id, BookingStatus::Cancelled)
        .await
        .unwrap()
        .unwrap();
    assert!(repos
        .bookings
        .find_active_by_property(property.id)
        .await
        .unwrap()
        .is_empty());
    let retried = repos
        .bookings
        .create_if(
            NewBooking {
                property_id: property.id,
                user_id: guest,
                start_date: date(2031, 3, 4),
                end_date: date(2031, 3, 6),
                total_price: 30_000,
            },
            |existing| existing.is_empty(),
        )
        .await
        .unwrap();
    assert!(retried.is_some());
    assert_eq!(repos.bookings.find_by_user(guest).await.unwrap().len(), 2);
}

#[tokio::test]
async fn reschedule_excludes_the_booking_itself() {
    let repos = setup().await;
    let guest = user(&repos, "guest@example.com").await;
    let property = repos
        .properties
        .create(None, draft("Cabin", "Aspen, USA", 15_000, 2, 4))
        .await
        .unwrap();
    let booking = repos
        .bookings
        .create_if(
            NewBooking {
                property_id: property.id,
                user_id: guest,
                start_date: date(2031, 3, 1),
                end_date: date(2031, 3, 5),
                total_price: 60_000,
            },
            |_| true,
        )
        .await
        .unwrap()
        .unwrap();

    let moved = repos
        .bookings
        .reschedule_if(booking.id, date(2031, 3, 2), date(2031, 3, 4), 30_000, |others| {
            others.is_empty()
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.start_date, date(2031, 3, 2));
    assert_eq!(moved.total_price, 30_000);

    let missing = repos
        .bookings
        .reschedule_if(booking.id + 50, date(2031, 3, 2), date(2031, 3, 4), 30_000, |_| true)
        .await;
    assert!(matches!(missing, Err(crate::DbError::NotFound(_))));

    assert!(repos.bookings.delete(booking.id).await.unwrap());
    assert!(repos.bookings.find_by_id(booking.id).await.unwrap().is_none());
}

#[tokio::test]
async fn reviews_carry_author_names() {
    let repos = setup().await;
    let guest = user(&repos, "carol@example.com").await;
    let property = repos
        .properties
        .create(None, draft("Cabin", "Aspen, USA", 15_000, 2, 4))
        .await
        .unwrap();

    let review = repos
        .reviews
        .create(NewReview {
            property_id: property.id,
            user_id: guest,
            rating: 5,
            comment: Some("Lovely".to_string()),
        })
        .await
        .unwrap();
    repos
        .reviews
        .create(NewReview {
            property_id: property.id,
            user_id: guest,
            rating: 2,
            comment: None,
        })
        .await
        .unwrap();

    let listed = repos.reviews.find_by_property(property.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|r| r.user_name == "carol"));

    let mut ratings = repos.reviews.ratings_for_property(property.id).await.unwrap();
    ratings.sort();
    assert_eq!(ratings, vec![2, 5]);

    let edited = repos
        .reviews
        .update(review.id, 4, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edited.rating, 4);
    assert!(edited.comment.is_none());
    assert_eq!(repos.reviews.find_by_user(guest).await.unwrap().len(), 2);
    assert!(repos.reviews.delete(review.id).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_for_the_same_nights_admit_exactly_one() {
    let (repos, path) = setup_file("create-race").await;
    let guest = user(&repos, "guest@example.com").await;
    let property = repos
        .properties
        .create(None, draft("Cabin", "Aspen, USA", 15_000, 2, 4))
        .await
        .unwrap()
        .id;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let bookings = repos.bookings.clone();
        tasks.push(tokio::spawn(async move {
            bookings
                .create_if(
                    NewBooking {
                        property_id: property,
                        user_id: guest,
                        start_date: date(2030, 7, 1),
                        end_date: date(2030, 7, 5),
                        total_price: 60_000,
                    },
                    |existing| existing.is_empty(),
                )
                .await
        }));
    }

    let (mut created, mut rejected) = (0, 0);
    for task in tasks {
        match task.await.unwrap() {
            Ok(Some(_)) => created += 1,
            Ok(None) => rejected += 1,
            Err(e) => panic!("losing writer should be rejected, got error: {}", e),
        }
    }
    assert_eq!((created, rejected), (1, 7));

    let stored = repos.bookings.find_active_by_property(property).await.unwrap();
    assert_eq!(stored.len(), 1);

    drop(repos);
    remove_db_files(&path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reschedules_onto_the_same_nights_admit_exactly_one() {
    let (repos, path) = setup_file("reschedule-race").await;
    let guest = user(&repos, "guest@example.com").await;
    let property = repos
        .properties
        .create(None, draft("Cabin", "Aspen, USA", 15_000, 2, 4))
        .await
        .unwrap()
        .id;

    let mut ids = Vec::new();
    for month in 1..=4 {
        let booking = repos
            .bookings
            .create_if(
                NewBooking {
                    property_id: property,
                    user_id: guest,
                    start_date: date(2030, month, 10),
                    end_date: date(2030, month, 12),
                    total_price: 30_000,
                },
                |_| true,
            )
            .await
            .unwrap()
            .unwrap();
        ids.push(booking.id);
    }

    let target = (date(2030, 9, 1), date(2030, 9, 3));
    let mut tasks = Vec::new();
    for id in ids {
        let bookings = repos.bookings.clone();
        tasks.push(tokio::spawn(async move {
            bookings
                .reschedule_if(id, target.0, target.1, 30_000, move |others| {
                    others
                        .iter()
                        .all(|b| b.end_date < target.0 || b.start_date > target.1)
                })
                .await
        }));
    }

    let mut moved = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(Some(_)) => moved += 1,
            Ok(None) => {}
            Err(e) => panic!("losing writer should be rejected, got error: {}", e),
        }
    }
    assert_eq!(moved, 1);

    let in_september = repos
        .bookings
        .find_active_by_property(property)
        .await
        .unwrap()
        .into_iter()
        .filter(|b| b.start_date == target.0)
        .count();
    assert_eq!(in_september, 1);

    drop(repos);
    remove_db_files(&path);
}
