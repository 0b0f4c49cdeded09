use chrono::NaiveDate;
use vacationstay_db::{Booking, BookingStatus};

use crate::logic::*;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn booking(id: i64, start: NaiveDate, end: NaiveDate, status: BookingStatus) -> Booking {
    Booking {
        id,
        property_id: 1,
        user_id: 2,
        start_date: start,
        end_date: end,
        total_price: 0,
        status,
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn past_dates_are_disabled_but_today_is_not() {
    let today = d(2026, 6, 10);
    assert!(is_date_disabled(d(2026, 6, 9), today, &[]));
    assert!(!is_date_disabled(today, today, &[]));
    assert!(!is_date_disabled(d(2026, 6, 11), today, &[]));
}

#[test]
fn booked_interval_blocks_both_ends() {
    let today = d(2026, 6, 1);
    let booked = [BookedInterval::new(d(2026, 6, 10), d(2026, 6, 12))];

    assert!(!is_date_disabled(d(2026, 6, 9), today, &booked));
    assert!(is_date_disabled(d(2026, 6, 10), today, &booked));
    assert!(is_date_disabled(d(2026, 6, 11), today, &booked));
    assert!(is_date_disabled(d(2026, 6, 12), today, &booked));
    assert!(!is_date_disabled(d(2026, 6, 13), today, &booked));
}

#[test]
fn inverted_interval_disables_nothing() {
    let today = d(2026, 6, 1);
    let corrupt = [BookedInterval::new(d(2026, 6, 12), d(2026, 6, 10))];

    assert!(disabled_dates(d(2026, 6, 1), d(2026, 6, 30), today, &corrupt).is_empty());
    assert!(is_range_available(
        &DateRange::new(d(2026, 6, 9), d(2026, 6, 14)),
        today,
        &corrupt
    ));
}

#[test]
fn disabled_dates_lists_window_in_order() {
    let today = d(2026, 6, 3);
    let booked = [
        BookedInterval::new(d(2026, 6, 6), d(2026, 6, 7)),
        BookedInterval::new(d(2026, 6, 1), d(2026, 6, 1)),
    ];
    assert_eq!(
        disabled_dates(d(2026, 6, 1), d(2026, 6, 8), today, &booked),
        vec![d(2026, 6, 1), d(2026, 6, 2), d(2026, 6, 6), d(2026, 6, 7)]
    );
    assert!(disabled_dates(d(2026, 6, 8), d(2026, 6, 1), today, &booked).is_empty());
}

#[test]
fn nights_and_price() {
    assert_eq!(nights_between(d(2026, 2, 27), d(2026, 3, 2)), 3);
    assert_eq!(nights_between(d(2026, 3, 2), d(2026, 3, 2)), 0);
    assert_eq!(nights_between(d(2026, 3, 2), d(2026, 3, 1)), -1);
    assert_eq!(total_price(3, 12_500), Ok(37_500));
    assert_eq!(total_price(2, i64::MAX), Err(BookingError::PriceOverflow));
}

#[test]
fn range_validation() {
    let today = d(2026, 6, 10);
    assert_eq!(
        validate_range(&DateRange::new(d(2026, 6, 9), d(2026, 6, 12)), today),
        Err(BookingError::StartInPast)
    );
    assert_eq!(
        validate_range(&DateRange::new(today, today), today),
        Err(BookingError::EmptyRange)
    );
    assert_eq!(
        validate_range(&DateRange::new(d(2026, 6, 12), d(2026, 6, 11)), today),
        Err(BookingError::EmptyRange)
    );
    assert!(validate_range(&DateRange::new(today, d(2026, 6, 11)), today).is_ok());
}

#[test]
fn ranges_touching_a_booking_are_unavailable() {
    let today = d(2026, 6, 1);
    let booked = [BookedInterval::new(d(2026, 6, 10), d(2026, 6, 15))];
    let available = |start, end| is_range_available(&DateRange::new(start, end), today, &booked);

    assert!(available(d(2026, 6, 5), d(2026, 6, 9)));
    assert!(!available(d(2026, 6, 5), d(2026, 6, 10)));
    assert!(!available(d(2026, 6, 15), d(2026, 6, 18)));
    assert!(!available(d(2026, 6, 11), d(2026, 6, 12)));
    assert!(!available(d(2026, 6, 1), d(2026, 6, 30)));
    assert!(available(d(2026, 6, 16), d(2026, 6, 18)));
}

#[test]
fn only_confirmed_bookings_hold_dates() {
    let bookings = [
        booking(1, d(2026, 6, 1), d(2026, 6, 3), BookingStatus::Confirmed),
        booking(2, d(2026, 6, 5), d(2026, 6, 7), BookingStatus::Cancelled),
    ];
    assert_eq!(
        booked_intervals(&bookings),
        vec![BookedInterval::new(d(2026, 6, 1), d(2026, 6, 3))]
    );
}

#[test]
fn quote_prices_each_night() {
    let today = d(2026, 6, 1);
    let q = quote(&DateRange::new(d(2026, 6, 1), d(2026, 6, 5)), 9_900, today).unwrap();
    assert_eq!(
        q,
        Quote {
            nights: 4,
            nightly_rate: 9_900,
            total_price: 39_600
        }
    );
    assert!(quote(&DateRange::new(d(2026, 5, 30), d(2026, 6, 5)), 9_900, today).is_err());
}

#[test]
fn parses_iso_dates_only() {
    assert_eq!(parse_date("startDate", " 2026-07-01 "), Ok(d(2026, 7, 1)));
    let err = parse_date("startDate", "07/01/2026").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid startDate '07/01/2026', expected YYYY-MM-DD"
    );
    assert!(parse_range("2026-07-01", "2026-02-30").is_err());
}

#[test]
fn calendar_window_defaults_and_limits() {
    let today = d(2026, 6, 1);
    assert_eq!(
        calendar_window(None, None, today),
        Ok((today, d(2026, 8, 29)))
    );
    assert_eq!(
        calendar_window(Some("2026-07-01"), Some("2026-07-31"), today),
        Ok((d(2026, 7, 1), d(2026, 7, 31)))
    );
    assert_eq!(
        calendar_window(Some("2026-01-01"), Some("2027-06-01"), today),
        Err(BookingError::WindowTooLarge(MAX_CALENDAR_DAYS))
    );
}

#[test]
fn only_confirmed_bookings_can_be_cancelled() {
    let confirmed = booking(1, d(2026, 6, 1), d(2026, 6, 3), BookingStatus::Confirmed);
    let cancelled = booking(2, d(2026, 6, 1), d(2026, 6, 3), BookingStatus::Cancelled);

    assert!(ensure_cancellable(&confirmed).is_ok());
    assert_eq!(
        ensure_cancellable(&cancelled),
        Err(BookingError::NotCancellable(BookingStatus::Cancelled))
    );
    assert!(ensure_modifiable(&cancelled).is_err());
}

#[test]
fn errors_map_to_http_statuses() {
    use vacationstay_common::{HttpStatusCode, VacationStayError};

    let conflict: VacationStayError = BookingError::Unavailable.into();
    assert_eq!(conflict.status_code(), 409);
    assert_eq!(
        conflict.to_string(),
        "Property is not available for the selected dates"
    );
    let invalid: VacationStayError = BookingError::EmptyRange.into();
    assert_eq!(invalid.status_code(), 400);
}

#[test]
fn dashboard_entry_summarizes_listing() {
    let property = vacationstay_db::Property {
        id: 1,
        title: "Cabin".to_string(),
        description: "Woods".to_string(),
        location: "Aspen, USA".to_string(),
        price: 15_000,
        bedrooms: 2,
        bathrooms: 1,
        max_guests: 4,
        amenities: vec![],
        images: vec!["a.jpg".to_string(), "b.jpg".to_string()],
        owner_id: None,
        created_at: None,
        updated_at: None,
    };
    let entry = DashboardBooking::new(
        booking(5, d(2026, 6, 1), d(2026, 6, 3), BookingStatus::Confirmed),
        Some(&property),
    );
    assert!(entry.can_cancel);
    assert_eq!(entry.property_image.as_deref(), Some("a.jpg"));

    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["id"], 5);
    assert_eq!(json["startDate"], "2026-06-01");
    assert_eq!(json["propertyTitle"], "Cabin");
    assert_eq!(json["canCancel"], true);

    let orphan = DashboardBooking::new(
        booking(6, d(2026, 6, 1), d(2026, 6, 3), BookingStatus::Cancelled),
        None,
    );
    assert!(!orphan.can_cancel);
    assert!(orphan.property_title.is_none());
}
