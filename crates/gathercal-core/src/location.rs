//! Location normalization.
//!
//! Submitted addresses are free text and often repeat fragments
//! (`"Library, Arlington, VA, Arlington, VA"`). This module collapses those
//! repeats, extracts a city and state when the address ends in
//! `<venue>, <city>, <STATE>[ <ZIP>][, USA]`, and decides whether a location
//! describes an online-only event.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::event::RawEventRecord;

/// Matches `<venue>, <city>, <STATE>[ <ZIP>][, USA]` at the end of an address.
static CITY_STATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([^,]+),\s*([^,]+),\s*([A-Z]{2})(?:\s+\d{5})?(?:,\s*USA)?$")
        .expect("Invalid city/state regex")
});

/// Matches a street address such as `1600 Pennsylvania Ave`.
static STREET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\d+\s+\w+\s+(st|street|ave|avenue|blvd|boulevard|dr|drive|rd|road|ct|court|ln|lane|way|pl|place)",
    )
    .expect("Invalid street regex")
});

/// Matches building, floor, and suite indicators.
static BUILDING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)suite|floor|#|room|building").expect("Invalid building regex")
});

/// Substrings that mark a location as online-only (matched case-insensitively).
pub const ONLINE_INDICATORS: &[&str] = &[
    "online",
    "virtual",
    "zoom",
    "webinar",
    "remote",
    "teams",
    "meet.google.com",
    "whereby.com",
    "hopin.com",
    "discord",
    "twitch",
];

/// State abbreviations that are dropped when repeated after a city segment.
const TRAILING_STATES: &[&str] = &["VA", "DC", "MD", "WV"];

/// City and state extracted from an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub city: Option<String>,
    pub state: Option<String>,
}

/// A normalized address with its extracted city and state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedLocation {
    pub address: String,
    #[serde(flatten)]
    pub info: LocationInfo,
}

/// Returns true if the location is missing, blank, or names an online venue.
pub fn is_online_only(location: Option<&str>) -> bool {
    let Some(location) = location.filter(|l| !l.trim().is_empty()) else {
        return true;
    };
    let lower = location.to_lowercase();
    ONLINE_INDICATORS
        .iter()
        .any(|indicator| lower.contains(indicator))
}

/// Removes redundant comma-separated fragments from an address.
///
/// Comparison is case-insensitive and the first spelling of a fragment wins.
/// Addresses with a single fragment are returned unchanged.
pub fn normalize_address(address: &str) -> String {
    let parts: Vec<&str> = address
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.len() <= 1 {
        return address.to_string();
    }

    let mut collapsed: Vec<&str> = Vec::with_capacity(parts.len());
    for part in parts {
        if collapsed
            .last()
            .is_none_or(|prev| prev.to_lowercase() != part.to_lowercase())
        {
            collapsed.push(part);
        }
    }

    // "City, State, City, State" -> "City, State"
    let n = collapsed.len();
    if n >= 4
        && collapsed[n - 1].to_lowercase() == collapsed[n - 3].to_lowercase()
        && collapsed[n - 2].to_lowercase() == collapsed[n - 4].to_lowercase()
    {
        collapsed.truncate(n - 2);
    }

    let mut seen = HashSet::new();
    let mut unique: Vec<&str> = collapsed
        .into_iter()
        .filter(|part| seen.insert(part.to_lowercase()))
        .collect();

    if unique.len() >= 2 {
        let last = unique[unique.len() - 1];
        let second_last = unique[unique.len() - 2];
        if TRAILING_STATES.contains(&last) && second_last.contains(last) {
            unique.pop();
        }
    }

    unique.join(", ")
}

/// Extracts city and state from an address.
///
/// Returns empty info rather than a wrong guess when the would-be city looks
/// like a street address, a building indicator, or runs longer than four
/// words. `DC` always maps to the city `Washington`.
pub fn extract_location_info(address: &str) -> LocationInfo {
    let Some(captures) = CITY_STATE_REGEX.captures(address) else {
        return LocationInfo::default();
    };

    let city = captures[2].trim();
    let state = captures[3].to_uppercase();

    if STREET_REGEX.is_match(city)
        || BUILDING_REGEX.is_match(city)
        || city.split(' ').count() > 4
    {
        return LocationInfo::default();
    }

    let city = if state == "DC" { "Washington" } else { city };

    LocationInfo {
        city: Some(city.to_string()),
        state: Some(state),
    }
}

/// Normalizes an address and extracts its city and state.
pub fn normalize_location(address: &str) -> NormalizedLocation {
    let address = normalize_address(address);
    let info = extract_location_info(&address);
    NormalizedLocation { address, info }
}

/// Applies [`normalize_location`] to a record in place.
///
/// Records without a location are left untouched.
pub fn normalize_record(record: &mut RawEventRecord) {
    let Some(location) = record.location.as_deref() else {
        return;
    };
    let normalized = normalize_location(location);
    record.location = Some(normalized.address);
    record.city = normalized.info.city;
    record.state = normalized.info.state;
}

/// Returns the display name of a region for a state abbreviation.
pub fn region_name(state: &str) -> &str {
    match state {
        "DC" => "Washington DC",
        "VA" => "Virginia",
        "MD" => "Maryland",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod online {
        use super::*;

        #[test]
        fn missing_location_is_online() {
            assert!(is_online_only(None));
            assert!(is_online_only(Some("")));
            assert!(is_online_only(Some("   ")));
        }

        #[test]
        fn indicators_match_any_case() {
            assert!(is_online_only(Some("Zoom")));
            assert!(is_online_only(Some("ZOOM")));
            assert!(is_online_only(Some("Virtual event")));
            assert!(is_online_only(Some("https://meet.google.com/abc-defg-hij")));
            assert!(is_online_only(Some("Streaming on Twitch")));
        }

        #[test]
        fn physical_venues_pass() {
            assert!(!is_online_only(Some("MLK Library, Washington, DC")));
            assert!(!is_online_only(Some("Capital One Hall, Tysons, VA")));
        }
    }

    mod normalize {
        use super::*;

        #[test]
        fn single_fragment_unchanged() {
            assert_eq!(normalize_address("The Hall"), "The Hall");
            assert_eq!(normalize_address("  The Hall  "), "  The Hall  ");
            assert_eq!(normalize_address(""), "");
        }

        #[test]
        fn consecutive_duplicates_removed() {
            assert_eq!(
                normalize_address("Capital One Hall, Capital One Hall, Tysons, VA"),
                "Capital One Hall, Tysons, VA"
            );
        }

        #[test]
        fn case_insensitive_keeps_first_spelling() {
            assert_eq!(
                normalize_address("Tech Hub, ARLINGTON, arlington, VA"),
                "Tech Hub, ARLINGTON, VA"
            );
        }

        #[test]
        fn repeated_city_state_tail_collapsed() {
            assert_eq!(
                normalize_address("Library, Arlington, VA, Arlington, VA"),
                "Library, Arlington, VA"
            );
        }

        #[test]
        fn non_consecutive_duplicates_removed() {
            assert_eq!(
                normalize_address("WeWork, Washington, 1440 G St NW, washington, DC"),
                "WeWork, Washington, 1440 G St NW, DC"
            );
        }

        #[test]
        fn trailing_state_repeated_in_previous_segment() {
            assert_eq!(
                normalize_address("Cafe, Arlington VA, VA"),
                "Cafe, Arlington VA"
            );
        }

        #[test]
        fn empty_fragments_dropped() {
            assert_eq!(
                normalize_address("Office, , Reston,  VA"),
                "Office, Reston, VA"
            );
        }
    }

    mod extract {
        use super::*;

        fn info(city: &str, state: &str) -> LocationInfo {
            LocationInfo {
                city: Some(city.to_string()),
                state: Some(state.to_string()),
            }
        }

        #[test]
        fn venue_city_state() {
            assert_eq!(
                extract_location_info("Capital One Hall, Tysons, VA"),
                info("Tysons", "VA")
            );
        }

        #[test]
        fn zip_and_country_suffixes() {
            assert_eq!(
                extract_location_info("Venue, Bethesda, MD 20814, USA"),
                info("Bethesda", "MD")
            );
            assert_eq!(
                extract_location_info("Venue, Reston, va 20190"),
                info("Reston", "VA")
            );
        }

        #[test]
        fn dc_is_always_washington() {
            assert_eq!(
                extract_location_info("MLK Library, Northwest Washington, DC"),
                info("Washington", "DC")
            );
        }

        #[test]
        fn street_addresses_are_not_cities() {
            assert_eq!(
                extract_location_info("Venue, 1600 Pennsylvania Ave, DC"),
                LocationInfo::default()
            );
        }

        #[test]
        fn building_indicators_are_not_cities() {
            assert_eq!(
                extract_location_info("Venue, Suite 200, VA"),
                LocationInfo::default()
            );
            assert_eq!(
                extract_location_info("Venue, 3rd Floor, MD"),
                LocationInfo::default()
            );
        }

        #[test]
        fn long_phrases_are_not_cities() {
            assert_eq!(
                extract_location_info("Venue, the old town center of alexandria, VA"),
                LocationInfo::default()
            );
        }

        #[test]
        fn unmatched_addresses_have_no_info() {
            assert_eq!(extract_location_info("Somewhere"), LocationInfo::default());
            assert_eq!(
                extract_location_info("Venue, Arlington, Virginia"),
                LocationInfo::default()
            );
        }
    }

    #[test]
    fn normalize_record_sets_city_and_state() {
        use chrono::NaiveDate;

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut record = RawEventRecord::new("e1", "Talk", date)
            .with_location("Library, Arlington, VA, Arlington, VA");
        normalize_record(&mut record);

        assert_eq!(record.location.as_deref(), Some("Library, Arlington, VA"));
        assert_eq!(record.city.as_deref(), Some("Arlington"));
        assert_eq!(record.state.as_deref(), Some("VA"));
    }

    #[test]
    fn region_names() {
        assert_eq!(region_name("DC"), "Washington DC");
        assert_eq!(region_name("VA"), "Virginia");
        assert_eq!(region_name("MD"), "Maryland");
        assert_eq!(region_name("WV"), "WV");
    }
}
