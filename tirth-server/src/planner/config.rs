//! Search configuration for the route planner.

use chrono::Duration;

/// Configuration parameters for route search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Assumed average road speed (km/h) for duration estimates.
    pub average_speed_kmh: f64,

    /// Maximum number of sites to attach to a route, nearest first.
    pub max_sites: usize,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(average_speed_kmh: f64, max_sites: usize) -> Self {
        Self {
            average_speed_kmh,
            max_sites,
        }
    }

    /// Estimated driving time for a straight-line distance, to the minute.
    pub fn travel_time(&self, distance_km: f64) -> Duration {
        if self.average_speed_kmh <= 0.0 || !distance_km.is_finite() {
            return Duration::zero();
        }
        let minutes = (distance_km / self.average_speed_kmh * 60.0).round();
        Duration::minutes(minutes as i64)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            average_speed_kmh: 60.0,
            max_sites: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SearchConfig::default();

        assert_eq!(config.average_speed_kmh, 60.0);
        assert_eq!(config.max_sites, 50);
    }

    #[test]
    fn travel_time_rounds_to_minutes() {
        let config = SearchConfig::default();

        // 60 km/h: one km per minute
        assert_eq!(config.travel_time(0.0), Duration::zero());
        assert_eq!(config.travel_time(90.0), Duration::minutes(90));
        assert_eq!(config.travel_time(237.53), Duration::minutes(238));
        assert_eq!(config.travel_time(0.4), Duration::zero());
    }

    #[test]
    fn custom_config() {
        let config = SearchConfig::new(40.0, 5);

        assert_eq!(config.max_sites, 5);
        assert_eq!(config.travel_time(20.0), Duration::minutes(30));
    }

    #[test]
    fn zero_speed_is_not_a_division() {
        let config = SearchConfig::new(0.0, 5);
        assert_eq!(config.travel_time(100.0), Duration::zero());
    }
}
