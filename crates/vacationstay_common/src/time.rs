use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::{config_error, VacationStayError};

/// Parses an IANA zone name such as `Europe/Zurich`.
pub fn parse_time_zone(name: &str) -> Result<Tz, VacationStayError> {
    Tz::from_str(name).map_err(|_| config_error(format!("Unknown time zone: {}", name)))
}

/// The current calendar date in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}
