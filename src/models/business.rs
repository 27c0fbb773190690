use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::geo::Coordinates;
use crate::models::hours::WeeklyHours;

/// A business listing as returned by the spatial store.
///
/// The engine never persists these; the record of truth is owned by the
/// business CRUD collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Business {
    /// Unique identifier
    pub id: Uuid,

    /// Display name
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Categories this business is listed under
    pub categories: Vec<String>,

    /// Offered amenities (wifi, parking, ...)
    pub amenities: Vec<String>,

    /// Price tier, 1 (budget) through 4 (luxury)
    pub price_level: Option<u8>,

    /// Average review rating, 0.0-5.0
    pub rating: Option<f64>,

    /// Number of reviews behind the rating
    pub review_count: u32,

    /// Popularity signal, 0-100
    pub popularity: f64,

    /// Location
    pub coordinates: Coordinates,

    /// IANA timezone the business operates in
    pub timezone: String,

    /// Structured weekly opening hours
    pub hours: Option<WeeklyHours>,

    /// Whether the listing is live
    pub active: bool,

    /// Custom labels
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Business {
    /// Create a new active listing
    pub fn new(
        name: String,
        categories: Vec<String>,
        coordinates: Coordinates,
        timezone: String,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            name,
            categories,
            amenities: Vec::new(),
            price_level: None,
            rating: None,
            review_count: 0,
            popularity: 0.0,
            coordinates,
            timezone,
            hours: None,
            active: true,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the business is open at a UTC instant, evaluated in its own
    /// timezone. `None` when hours are not declared or the timezone is
    /// unparseable.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> Option<bool> {
        let hours = self.hours.as_ref()?;
        let tz = self.timezone.parse::<chrono_tz::Tz>().ok()?;
        Some(hours.is_open_at(now, &tz))
    }

    /// Case-insensitive OR-match against a category set; an empty set matches
    pub fn matches_categories(&self, wanted: &[String]) -> bool {
        if wanted.is_empty() {
            return true;
        }
        wanted.iter().any(|w| {
            self.categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(w))
        })
    }

    /// Case-insensitive AND-match: the business must offer every amenity
    pub fn has_amenities(&self, wanted: &[String]) -> bool {
        wanted.iter().all(|w| {
            self.amenities
                .iter()
                .any(|a| a.eq_ignore_ascii_case(w))
        })
    }

    /// Case-insensitive substring match against name and categories
    pub fn matches_text(&self, text: &str) -> bool {
        let needle = text.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self
                .categories
                .iter()
                .any(|c| c.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::hours::DayHours;
    use chrono::TimeZone;

    fn pizzeria() -> Business {
        let mut b = Business::new(
            "Tony's Pizzeria".to_string(),
            vec!["Pizza".to_string(), "Italian".to_string()],
            Coordinates::new(40.7128, -74.0060),
            "America/New_York".to_string(),
        );
        b.amenities = vec!["wifi".to_string(), "delivery".to_string()];
        b
    }

    #[test]
    fn test_category_or_matching() {
        let b = pizzeria();

        assert!(b.matches_categories(&[]));
        assert!(b.matches_categories(&["pizza".to_string()]));
        assert!(b.matches_categories(&["Sushi".to_string(), "italian".to_string()]));
        assert!(!b.matches_categories(&["Sushi".to_string()]));
    }

    #[test]
    fn test_amenity_and_matching() {
        let b = pizzeria();

        assert!(b.has_amenities(&[]));
        assert!(b.has_amenities(&["WiFi".to_string()]));
        assert!(b.has_amenities(&["wifi".to_string(), "delivery".to_string()]));
        assert!(!b.has_amenities(&["wifi".to_string(), "parking".to_string()]));
    }

    #[test]
    fn test_text_matching_covers_name_and_categories() {
        let b = pizzeria();

        assert!(b.matches_text("tony"));
        assert!(b.matches_text("italian"));
        assert!(!b.matches_text("sushi"));
    }

    #[test]
    fn test_open_at_unknown_without_hours_or_timezone() {
        let now = Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap();

        let mut b = pizzeria();
        assert_eq!(b.is_open_at(now), None);

        b.hours = Some(WeeklyHours::every_day(DayHours::from_hm(9, 0, 17, 0)));
        b.timezone = "Not/AZone".to_string();
        assert_eq!(b.is_open_at(now), None);
    }

    #[test]
    fn test_open_at_in_local_timezone() {
        let mut b = pizzeria();
        b.hours = Some(WeeklyHours::every_day(DayHours::from_hm(9, 0, 17, 0)));

        // 15:00 UTC is 11:00 in New York
        let open_utc = Utc.with_ymd_and_hms(2024, 6, 5, 15, 0, 0).unwrap();
        assert_eq!(b.is_open_at(open_utc), Some(true));

        // 22:00 UTC is 18:00 in New York
        let closed_utc = Utc.with_ymd_and_hms(2024, 6, 5, 22, 0, 0).unwrap();
        assert_eq!(b.is_open_at(closed_utc), Some(false));
    }
}
