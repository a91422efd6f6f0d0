//! Pilgrimage sites (tirths).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::geo::Coordinate;
use super::review::RatingSummary;

/// Sect a site belongs to.
///
/// Stored remotely as the site's `type` string. Parsed case-insensitively,
/// written capitalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Denomination {
    Digambar,
    Shwetambar,
}

impl Denomination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Denomination::Digambar => "Digambar",
            Denomination::Shwetambar => "Shwetambar",
        }
    }
}

impl FromStr for Denomination {
    type Err = DomainError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "digambar" => Ok(Denomination::Digambar),
            "shwetambar" | "svetambar" => Ok(Denomination::Shwetambar),
            _ => Err(DomainError::UnknownDenomination(s.to_string())),
        }
    }
}

impl TryFrom<String> for Denomination {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amenity classes the search filters care about.
///
/// Facility tags are free text entered by editors, so matching is by
/// keyword. One tag may name several amenities ("Dharamshala with
/// Bhojanshala").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Amenity {
    Accessibility,
    Food,
    Accommodation,
}

impl Amenity {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Amenity::Accessibility => &["wheelchair", "accessib", "ramp", "lift"],
            Amenity::Food => &["food", "bhojanshala", "canteen", "restaurant"],
            Amenity::Accommodation => &[
                "accommodation",
                "dharamshala",
                "dharmashala",
                "guest house",
                "lodging",
            ],
        }
    }

    /// Whether a facility tag mentions this amenity.
    pub fn matches(self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.keywords().iter().any(|w| tag.contains(w))
    }
}

/// A recurring or one-off observance listed on a site's page.
///
/// Dates are free text ("Every Full Moon", "April 14"), unlike [`super::Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteEvent {
    pub name: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A pilgrimage site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub denomination: Denomination,
    pub location: Coordinate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub timings: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, rename = "reviews", skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub significance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub events: Vec<SiteEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Site {
    /// Current rating, treating a site without reviews as 0 of 0.
    pub fn rating_summary(&self) -> RatingSummary {
        RatingSummary {
            mean: self.rating.unwrap_or(0.0),
            count: self.review_count.unwrap_or(0),
        }
    }

    /// Overwrite the rating pair.
    pub fn apply_rating(&mut self, summary: RatingSummary) {
        self.rating = Some(summary.mean);
        self.review_count = Some(summary.count);
    }

    /// Whether any facility tag mentions the given amenity.
    pub fn has_amenity(&self, amenity: Amenity) -> bool {
        self.facilities.iter().any(|f| amenity.matches(f))
    }

    /// Age in years relative to `current_year`, if the founding year is known.
    pub fn age_years(&self, current_year: i32) -> Option<i32> {
        self.founded_year.map(|y| current_year - y)
    }
}

/// Payload for creating a site; the gateway assigns the id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSite {
    pub name: String,
    #[serde(rename = "type")]
    pub denomination: Denomination,
    pub location: Coordinate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub timings: String,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub significance: Option<String>,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub events: Vec<SiteEvent>,
}

impl NewSite {
    /// Minimal site with just the required fields.
    pub fn new(name: impl Into<String>, denomination: Denomination, location: Coordinate) -> Self {
        Self {
            name: name.into(),
            denomination,
            location,
            description: String::new(),
            images: Vec::new(),
            timings: String::new(),
            facilities: Vec::new(),
            history: None,
            significance: None,
            founded_year: None,
            events: Vec::new(),
        }
    }

    /// Reject payloads the gateway should never store.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::EmptyField("name"));
        }
        Ok(())
    }

    /// Materialise the site under an assigned id.
    pub fn into_site(self, id: String, now: DateTime<Utc>) -> Site {
        Site {
            id,
            name: self.name,
            denomination: self.denomination,
            location: self.location,
            description: self.description,
            images: self.images,
            timings: self.timings,
            rating: None,
            review_count: None,
            facilities: self.facilities,
            history: self.history,
            significance: self.significance,
            founded_year: self.founded_year,
            events: self.events,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Partial update for a site. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub denomination: Option<Denomination>,
    #[serde(default)]
    pub location: Option<Coordinate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub timings: Option<String>,
    #[serde(default)]
    pub facilities: Option<Vec<String>>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub significance: Option<String>,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, rename = "reviews")]
    pub review_count: Option<u32>,
}

impl SiteUpdate {
    /// Update carrying only a new rating pair.
    pub fn rating(summary: RatingSummary) -> Self {
        Self {
            rating: Some(summary.mean),
            review_count: Some(summary.count),
            ..Self::default()
        }
    }

    /// Apply the present fields to `site` and stamp `updated_at`.
    pub fn apply_to(self, site: &mut Site, now: DateTime<Utc>) {
        if let Some(v) = self.name {
            site.name = v;
        }
        if let Some(v) = self.denomination {
            site.denomination = v;
        }
        if let Some(v) = self.location {
            site.location = v;
        }
        if let Some(v) = self.description {
            site.description = v;
        }
        if let Some(v) = self.images {
            site.images = v;
        }
        if let Some(v) = self.timings {
            site.timings = v;
        }
        if let Some(v) = self.facilities {
            site.facilities = v;
        }
        if self.history.is_some() {
            site.history = self.history;
        }
        if self.significance.is_some() {
            site.significance = self.significance;
        }
        if self.founded_year.is_some() {
            site.founded_year = self.founded_year;
        }
        if self.rating.is_some() {
            site.rating = self.rating;
        }
        if self.review_count.is_some() {
            site.review_count = self.review_count;
        }
        site.updated_at = Some(now);
    }
}
