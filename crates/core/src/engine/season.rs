use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::location::SeasonMapping;

pub const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonSource {
    Mapping,
    CalendarDefault,
}

impl SeasonSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mapping => "mapping",
            Self::CalendarDefault => "calendar_default",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonResolution {
    pub season: String,
    pub month: String,
    pub source: SeasonSource,
}

pub fn month_name(date: NaiveDate) -> &'static str {
    MONTH_NAMES[date.month0() as usize]
}

/// Northern-hemisphere meteorological seasons. Ignores location climate, so
/// tropical and southern-hemisphere locations only resolve correctly through
/// their own mapping.
pub fn calendar_default_season(date: NaiveDate) -> &'static str {
    match date.month() {
        12 | 1 | 2 => "winter",
        3..=5 => "spring",
        6..=8 => "summer",
        _ => "fall",
    }
}

/// First season in declared order whose months include the date's month,
/// otherwise the calendar default.
pub fn resolve_season(mapping: &SeasonMapping, date: NaiveDate) -> SeasonResolution {
    let month = month_name(date);

    match mapping.season_for_month(month) {
        Some(season) => SeasonResolution {
            season: season.to_string(),
            month: month.to_string(),
            source: SeasonSource::Mapping,
        },
        None => SeasonResolution {
            season: calendar_default_season(date).to_string(),
            month: month.to_string(),
            source: SeasonSource::CalendarDefault,
        },
    }
}

/// Resolves from the stored JSON form. Unparseable mappings are logged and
/// treated as empty so a bad row never blocks a recommendation.
pub fn resolve_season_from_json(raw: &str, date: NaiveDate) -> SeasonResolution {
    let mapping = SeasonMapping::from_json(raw).unwrap_or_else(|error| {
        warn!(event_name = "season.mapping.malformed", error = %error, "using calendar default season");
        SeasonMapping::default()
    });
    resolve_season(&mapping, date)
}
