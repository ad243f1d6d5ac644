//! Star rating attached to a testimonial.

use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// A 1-5 star rating.
///
/// Values coming from the backend are clamped into range so one bad row
/// cannot break a whole listing; values a visitor submits are validated with
/// [`Rating::new`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest rating.
    pub const MIN: u8 = 1;
    /// Highest rating, also the default for new submissions.
    pub const MAX: u8 = 5;

    /// Create a rating, rejecting values outside 1..=5.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::RatingOutOfRange` for anything outside 1..=5.
    pub fn new(stars: i64) -> Result<Self, ValidationError> {
        u8::try_from(stars)
            .ok()
            .filter(|s| (Self::MIN..=Self::MAX).contains(s))
            .map(Self)
            .ok_or(ValidationError::RatingOutOfRange(stars))
    }

    /// Number of stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl From<i64> for Rating {
    fn from(stars: i64) -> Self {
        // Clamped, so the narrowing cast below cannot truncate.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let stars = stars.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8;
        Self(stars)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_range() {
        assert_eq!(Rating::new(4).unwrap().stars(), 4);
        assert!(matches!(Rating::new(0), Err(ValidationError::RatingOutOfRange(0))));
        assert!(matches!(Rating::new(6), Err(ValidationError::RatingOutOfRange(6))));
        assert!(Rating::new(-1).is_err());
    }

    #[test]
    fn test_inbound_values_are_clamped() {
        let high: Rating = serde_json::from_str("9").unwrap();
        assert_eq!(high.stars(), 5);
        let low: Rating = serde_json::from_str("0").unwrap();
        assert_eq!(low.stars(), 1);
        assert_eq!(serde_json::to_string(&Rating::new(3).unwrap()).unwrap(), "3");
    }

    #[test]
    fn test_default_and_display() {
        assert_eq!(Rating::default().stars(), 5);
        assert_eq!(Rating::new(4).unwrap().to_string(), "4/5");
    }
}
