//! Search filters applied to sites found along a route.

use serde::{Deserialize, Serialize};

use super::site::{Amenity, Denomination, Site};

/// Sites at least this old count as historical.
pub const HISTORICAL_AGE_YEARS: i32 = 100;

/// Active search filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    pub digambar: bool,
    pub shwetambar: bool,
    /// Maximum distance from the route, in kilometres.
    #[serde(rename = "maxDistance")]
    pub max_distance_km: f64,
    pub historical: bool,
    pub modern: bool,
    pub accessibility: bool,
    pub food_available: bool,
    pub accommodation_nearby: bool,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            digambar: true,
            shwetambar: true,
            max_distance_km: 5.0,
            historical: true,
            modern: true,
            accessibility: false,
            food_available: false,
            accommodation_nearby: false,
        }
    }
}

impl Filters {
    /// Merge a partial update; absent fields keep their value.
    pub fn merge(&mut self, patch: FiltersPatch) {
        let FiltersPatch {
            digambar,
            shwetambar,
            max_distance_km,
            historical,
            modern,
            accessibility,
            food_available,
            accommodation_nearby,
        } = patch;

        if let Some(v) = digambar {
            self.digambar = v;
        }
        if let Some(v) = shwetambar {
            self.shwetambar = v;
        }
        if let Some(v) = max_distance_km {
            self.max_distance_km = v;
        }
        if let Some(v) = historical {
            self.historical = v;
        }
        if let Some(v) = modern {
            self.modern = v;
        }
        if let Some(v) = accessibility {
            self.accessibility = v;
        }
        if let Some(v) = food_available {
            self.food_available = v;
        }
        if let Some(v) = accommodation_nearby {
            self.accommodation_nearby = v;
        }
    }

    /// Whether a site passes every non-distance filter.
    ///
    /// Sites without a founding year pass both era filters.
    pub fn admits(&self, site: &Site, current_year: i32) -> bool {
        let denomination_ok = match site.denomination {
            Denomination::Digambar => self.digambar,
            Denomination::Shwetambar => self.shwetambar,
        };
        if !denomination_ok {
            return false;
        }

        let era_ok = match site.age_years(current_year) {
            Some(age) if age >= HISTORICAL_AGE_YEARS => self.historical,
            Some(_) => self.modern,
            None => true,
        };
        if !era_ok {
            return false;
        }

        let required = [
            (self.accessibility, Amenity::Accessibility),
            (self.food_available, Amenity::Food),
            (self.accommodation_nearby, Amenity::Accommodation),
        ];
        required
            .iter()
            .filter(|(wanted, _)| *wanted)
            .all(|(_, amenity)| site.has_amenity(*amenity))
    }
}

/// Partial filter update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersPatch {
    #[serde(default)]
    pub digambar: Option<bool>,
    #[serde(default)]
    pub shwetambar: Option<bool>,
    #[serde(default, rename = "maxDistance")]
    pub max_distance_km: Option<f64>,
    #[serde(default)]
    pub historical: Option<bool>,
    #[serde(default)]
    pub modern: Option<bool>,
    #[serde(default)]
    pub accessibility: Option<bool>,
    #[serde(default)]
    pub food_available: Option<bool>,
    #[serde(default)]
    pub accommodation_nearby: Option<bool>,
}
