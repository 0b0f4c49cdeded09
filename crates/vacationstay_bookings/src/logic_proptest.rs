#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    use crate::logic::*;

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    fn day(offset: i64) -> NaiveDate {
        base() + Duration::days(offset)
    }

    fn intervals() -> impl Strategy<Value = Vec<BookedInterval>> {
        prop::collection::vec((0..120i64, 0..10i64), 0..6).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(start, len)| BookedInterval::new(day(start), day(start + len)))
                .collect()
        })
    }

    proptest! {
        // A range is available only if none of its dates is disabled
        #[test]
        fn available_ranges_have_no_disabled_dates(
            booked in intervals(),
            today_offset in 0..60i64,
            start in 0..120i64,
            len in 1..20i64,
        ) {
            let today = day(today_offset);
            let range = DateRange::new(day(start), day(start + len));

            if is_range_available(&range, today, &booked) {
                prop_assert!(disabled_dates(range.start, range.end, today, &booked).is_empty());
            }
        }

        // The overlap test and the per-date check agree for valid ranges
        #[test]
        fn overlap_matches_per_date_check(
            booked in intervals(),
            start in 0..120i64,
            len in 1..20i64,
        ) {
            let today = base();
            let range = DateRange::new(day(start), day(start + len));
            let any_disabled = !disabled_dates(range.start, range.end, today, &booked).is_empty();

            prop_assert_eq!(is_range_available(&range, today, &booked), !any_disabled);
        }

        // Total price is nights times the nightly rate
        #[test]
        fn total_is_nights_times_rate(
            start in 0..365i64,
            len in 1..60i64,
            rate in 1..1_000_000i64,
        ) {
            let range = DateRange::new(day(start), day(start + len));
            let q = quote(&range, rate, base()).unwrap();

            prop_assert_eq!(q.nights, len);
            prop_assert_eq!(q.total_price, len * rate);
            prop_assert_eq!(
                total_price(nights_between(range.start, range.end), rate),
                Ok(len * rate)
            );
        }

        // Disabled dates stay inside the window and come out sorted
        #[test]
        fn disabled_dates_are_sorted_and_in_window(
            booked in intervals(),
            today_offset in 0..60i64,
            from in 0..100i64,
            len in 0..60i64,
        ) {
            let (from, to) = (day(from), day(from + len));
            let dates = disabled_dates(from, to, day(today_offset), &booked);

            prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(dates.iter().all(|d| *d >= from && *d <= to));
        }
    }
}
