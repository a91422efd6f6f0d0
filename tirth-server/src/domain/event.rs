//! Dated events and their upcoming/past split.

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An event held at or near a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub location: String,
    pub date: NaiveDate,
    /// Free-text time window, e.g. "6:00 AM - 8:00 PM".
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, rename = "tirthId", skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Whether an event is still ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTiming {
    Upcoming,
    Past,
}

impl EventTiming {
    /// An event dated today still counts as upcoming.
    pub fn classify(date: NaiveDate, today: NaiveDate) -> Self {
        if date < today {
            EventTiming::Past
        } else {
            EventTiming::Upcoming
        }
    }
}

impl Event {
    pub fn timing(&self, today: NaiveDate) -> EventTiming {
        EventTiming::classify(self.date, today)
    }
}

/// Split events into (upcoming soonest-first, past most-recent-first).
pub fn partition_events(events: Vec<Event>, today: NaiveDate) -> (Vec<Event>, Vec<Event>) {
    let (mut upcoming, mut past): (Vec<_>, Vec<_>) = events
        .into_iter()
        .partition(|e| e.timing(today) == EventTiming::Upcoming);

    upcoming.sort_by_key(|e| e.date);
    past.sort_by_key(|e| Reverse(e.date));

    (upcoming, past)
}
