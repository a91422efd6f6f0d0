//! Reviews and the running rating average they feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Highest rating a review can give.
pub const MAX_RATING: f64 = 5.0;

/// Running mean rating and the number of reviews behind it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    pub mean: f64,
    pub count: u32,
}

impl RatingSummary {
    /// Fold one more rating into the mean.
    ///
    /// `(mean * count + rating) / (count + 1)`, with the count incremented.
    pub fn with_review(self, rating: f64) -> Self {
        let count = f64::from(self.count);
        Self {
            mean: (self.mean * count + rating) / (count + 1.0),
            count: self.count + 1,
        }
    }
}

/// A stored review of a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(rename = "tirthId")]
    pub site_id: String,
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// A review about to be submitted. The rating is validated on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "NewReviewRaw")]
pub struct NewReview {
    pub user_id: String,
    pub user_name: String,
    #[serde(rename = "tirthId")]
    pub site_id: String,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl NewReview {
    pub fn new(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        site_id: impl Into<String>,
        rating: f64,
        comment: Option<String>,
    ) -> Result<Self, DomainError> {
        if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
            return Err(DomainError::InvalidRating(rating));
        }
        let site_id = site_id.into();
        if site_id.trim().is_empty() {
            return Err(DomainError::EmptyField("tirthId"));
        }
        Ok(Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            site_id,
            rating,
            comment: comment.filter(|c| !c.trim().is_empty()),
        })
    }

    /// Materialise the review under an assigned id.
    pub fn into_review(self, id: String, date: DateTime<Utc>) -> Review {
        Review {
            id,
            user_id: self.user_id,
            user_name: self.user_name,
            site_id: self.site_id,
            rating: self.rating,
            comment: self.comment,
            date: Some(date),
        }
    }
}

/// Unvalidated wire shape, so deserialisation goes through [`NewReview::new`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewReviewRaw {
    user_id: String,
    user_name: String,
    #[serde(rename = "tirthId")]
    site_id: String,
    rating: f64,
    #[serde(default)]
    comment: Option<String>,
}

impl TryFrom<NewReviewRaw> for NewReview {
    type Error = DomainError;

    fn try_from(raw: NewReviewRaw) -> Result<Self, Self::Error> {
        NewReview::new(raw.user_id, raw.user_name, raw.site_id, raw.rating, raw.comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_review_sets_mean() {
        let s = RatingSummary::default().with_review(4.0);
        assert_eq!(s, RatingSummary { mean: 4.0, count: 1 });
    }

    #[test]
    fn running_mean() {
        let s = RatingSummary {
            mean: 4.8,
            count: 245,
        }
        .with_review(3.0);
        assert_eq!(s.count, 246);
        assert!((s.mean - (4.8 * 245.0 + 3.0) / 246.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        for bad in [-0.5, 5.5, f64::NAN, f64::INFINITY] {
            assert!(NewReview::new("u", "U", "1", bad, None).is_err(), "{bad}");
        }
        assert!(NewReview::new("u", "U", "1", 0.0, None).is_ok());
        assert!(NewReview::new("u", "U", "1", 5.0, None).is_ok());
    }

    #[test]
    fn blank_comment_is_dropped() {
        let r = NewReview::new("u", "U", "1", 4.0, Some("   ".into())).unwrap();
        assert_eq!(r.comment, None);
    }

    #[test]
    fn deserialising_validates() {
        let ok = serde_json::json!({
            "userId": "u1", "userName": "Asha", "tirthId": "1", "rating": 5.0
        });
        assert!(serde_json::from_value::<NewReview>(ok).is_ok());

        let bad = serde_json::json!({
            "userId": "u1", "userName": "Asha", "tirthId": "1", "rating": 9.0
        });
        assert!(serde_json::from_value::<NewReview>(bad).is_err());
    }
}
