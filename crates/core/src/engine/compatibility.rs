//! Fixed-rule matrices mapping (crop attribute, location attribute) pairs to
//! qualitative levels.

use crate::domain::levels::{CompatibilityLevel, Level};

type Row<T> = (&'static str, &'static [(&'static str, T)]);

/// Two-level lookup table keyed by lowercase category names.
#[derive(Debug)]
pub struct CompatibilityMatrix<T: 'static> {
    rows: &'static [Row<T>],
    fallback: T,
}

impl<T: Copy + 'static> CompatibilityMatrix<T> {
    /// Case-insensitive lookup; pairs outside the table resolve to the fallback.
    pub fn lookup(&self, source: &str, target: &str) -> T {
        self.find(source, target).unwrap_or(self.fallback)
    }

    /// Like [`lookup`](Self::lookup) but reports unmapped pairs as `None`.
    pub fn find(&self, source: &str, target: &str) -> Option<T> {
        let source = source.to_ascii_lowercase();
        let target = target.to_ascii_lowercase();

        self.rows
            .iter()
            .find(|(row, _)| *row == source)
            .and_then(|(_, columns)| columns.iter().find(|(column, _)| *column == target))
            .map(|(_, value)| *value)
    }

    pub fn fallback(&self) -> T {
        self.fallback
    }
}

/// Crop preferred climate (rows) against location climate (columns).
pub const CLIMATE_MATCH: CompatibilityMatrix<CompatibilityLevel> = {
    use CompatibilityLevel::*;

    CompatibilityMatrix {
        rows: &[
            (
                "tropical",
                &[
                    ("tropical", Excellent),
                    ("subtropical", Good),
                    ("temperate", Poor),
                    ("mediterranean", Fair),
                ],
            ),
            (
                "subtropical",
                &[
                    ("tropical", Good),
                    ("subtropical", Excellent),
                    ("temperate", Fair),
                    ("mediterranean", Good),
                ],
            ),
            (
                "temperate",
                &[
                    ("tropical", Poor),
                    ("subtropical", Fair),
                    ("temperate", Excellent),
                    ("mediterranean", Good),
                ],
            ),
            (
                "mediterranean",
                &[
                    ("tropical", Fair),
                    ("subtropical", Good),
                    ("temperate", Good),
                    ("mediterranean", Excellent),
                ],
            ),
        ],
        fallback: Poor,
    }
};

/// Crop water need (rows) against location rainfall (columns), yielding the
/// effective water availability. Asymmetric: thirsty crops feel dry spells as
/// shortage, hardy crops feel surplus.
pub const WATER_AVAILABILITY: CompatibilityMatrix<Level> = {
    use Level::*;

    CompatibilityMatrix {
        rows: &[
            ("low", &[("low", Medium), ("medium", High), ("high", High)]),
            ("medium", &[("low", Low), ("medium", Medium), ("high", High)]),
            ("high", &[("low", Low), ("medium", Low), ("high", Medium)]),
        ],
        fallback: Medium,
    }
};

pub fn climate_match(crop_climate: &str, location_climate: &str) -> CompatibilityLevel {
    CLIMATE_MATCH.lookup(crop_climate, location_climate)
}

pub fn water_availability(crop_water_need: &str, location_rainfall: &str) -> Level {
    WATER_AVAILABILITY.lookup(crop_water_need, location_rainfall)
}

#[cfg(test)]
mod tests {
    use super::{climate_match, water_availability, CLIMATE_MATCH, WATER_AVAILABILITY};
    use crate::domain::levels::{CompatibilityLevel, Level};

    const CLIMATES: [&str; 4] = ["tropical", "subtropical", "temperate", "mediterranean"];

    #[test]
    fn climate_match_is_excellent_only_on_the_diagonal() {
        for crop in CLIMATES {
            for location in CLIMATES {
                let level = climate_match(crop, location);
                assert_eq!(
                    level == CompatibilityLevel::Excellent,
                    crop == location,
                    "{crop} vs {location} resolved to {level}"
                );
            }
        }
    }

    #[test]
    fn climate_lookup_ignores_case_without_touching_inputs() {
        let crop = String::from("Tropical");
        let location = String::from("SUBTROPICAL");

        assert_eq!(climate_match(&crop, &location), CompatibilityLevel::Good);
        assert_eq!(crop, "Tropical");
    }

    #[test]
    fn unmapped_climate_pair_is_poor() {
        assert_eq!(climate_match("arid", "tropical"), CompatibilityLevel::Poor);
        assert_eq!(climate_match("temperate", "polar"), CompatibilityLevel::Poor);
        assert_eq!(CLIMATE_MATCH.find("arid", "tropical"), None);
    }

    #[test]
    fn hand_specified_off_diagonal_entries() {
        assert_eq!(climate_match("tropical", "temperate"), CompatibilityLevel::Poor);
        assert_eq!(climate_match("tropical", "mediterranean"), CompatibilityLevel::Fair);
        assert_eq!(climate_match("subtropical", "temperate"), CompatibilityLevel::Fair);
        assert_eq!(climate_match("temperate", "mediterranean"), CompatibilityLevel::Good);
        assert_eq!(climate_match("mediterranean", "tropical"), CompatibilityLevel::Fair);
    }

    #[test]
    fn low_need_crop_with_heavy_rain_sees_high_availability() {
        assert_eq!(water_availability("low", "high"), Level::High);
        assert_eq!(water_availability("low", "low"), Level::Medium);
    }

    #[test]
    fn high_need_crop_with_little_rain_sees_low_availability() {
        assert_eq!(water_availability("high", "low"), Level::Low);
        assert_eq!(water_availability("high", "medium"), Level::Low);
        assert_eq!(water_availability("High", "HIGH"), Level::Medium);
    }

    #[test]
    fn medium_need_tracks_rainfall() {
        for level in Level::ALL {
            assert_eq!(water_availability("medium", level.as_str()), level);
        }
    }

    #[test]
    fn unmapped_rainfall_is_medium_for_any_need() {
        for need in ["low", "medium", "high", "unknown"] {
            assert_eq!(water_availability(need, "monsoonal"), Level::Medium);
        }
        assert_eq!(WATER_AVAILABILITY.fallback(), Level::Medium);
    }
}
