//! Conversion between Firestore documents and domain types.
//!
//! Field names follow the stored schema (`type`, `reviews`, `tirthId`,
//! `tirthCount`, ...). Readers are lenient where the stored data is known
//! to vary: numbers may be integers or doubles, dates may be `YYYY-MM-DD`
//! strings or timestamps, and coordinates may be maps or geo points.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{
    Coordinate, Denomination, Event, NewReview, NewRoute, NewSite, Review, Route, RoutePoint,
    Site, SiteEvent, SiteUpdate, UserPreferences, UserProfile,
};

use super::types::{Document, Fields, Value};

/// Error during document to domain conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// Required field absent or null
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Field present with an unexpected value kind
    #[error("field {field}: expected {expected}, found {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Field has the right kind but an unusable value
    #[error("field {field}: {message}")]
    InvalidValue { field: String, message: String },
}

fn wrong_type(field: &str, expected: &'static str, value: &Value) -> ConversionError {
    ConversionError::WrongType {
        field: field.to_string(),
        expected,
        found: value.kind(),
    }
}

fn invalid(field: &str, message: impl ToString) -> ConversionError {
    ConversionError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Non-null value of a field.
fn get<'a>(fields: &'a Fields, key: &str) -> Option<&'a Value> {
    match fields.get(key) {
        None | Some(Value::NullValue(())) => None,
        Some(v) => Some(v),
    }
}

fn require<'a>(fields: &'a Fields, key: &str) -> Result<&'a Value, ConversionError> {
    get(fields, key).ok_or_else(|| ConversionError::MissingField(key.to_string()))
}

fn opt_string(fields: &Fields, key: &str) -> Result<Option<String>, ConversionError> {
    match get(fields, key) {
        None => Ok(None),
        Some(Value::StringValue(s)) => Ok(Some(s.clone())),
        Some(v) => Err(wrong_type(key, "string", v)),
    }
}

fn string(fields: &Fields, key: &str) -> Result<String, ConversionError> {
    opt_string(fields, key)?.ok_or_else(|| ConversionError::MissingField(key.to_string()))
}

fn string_or_empty(fields: &Fields, key: &str) -> Result<String, ConversionError> {
    Ok(opt_string(fields, key)?.unwrap_or_default())
}

fn number(key: &str, value: &Value) -> Result<f64, ConversionError> {
    match value {
        Value::DoubleValue(n) => Ok(*n),
        Value::IntegerValue(s) => s.parse::<i64>().map(|n| n as f64).map_err(|e| invalid(key, e)),
        v => Err(wrong_type(key, "number", v)),
    }
}

fn opt_f64(fields: &Fields, key: &str) -> Result<Option<f64>, ConversionError> {
    get(fields, key).map(|v| number(key, v)).transpose()
}

fn opt_integer(fields: &Fields, key: &str) -> Result<Option<i64>, ConversionError> {
    match get(fields, key) {
        None => Ok(None),
        Some(Value::IntegerValue(s)) => s.parse().map(Some).map_err(|e| invalid(key, e)),
        // Client SDKs write whole numbers as doubles.
        Some(Value::DoubleValue(n)) if n.fract() == 0.0 => Ok(Some(*n as i64)),
        Some(v) => Err(wrong_type(key, "integer", v)),
    }
}

fn opt_u32(fields: &Fields, key: &str) -> Result<Option<u32>, ConversionError> {
    opt_integer(fields, key)?
        .map(|n| u32::try_from(n).map_err(|e| invalid(key, e)))
        .transpose()
}

fn opt_i32(fields: &Fields, key: &str) -> Result<Option<i32>, ConversionError> {
    opt_integer(fields, key)?
        .map(|n| i32::try_from(n).map_err(|e| invalid(key, e)))
        .transpose()
}

fn opt_bool(fields: &Fields, key: &str) -> Result<Option<bool>, ConversionError> {
    match get(fields, key) {
        None => Ok(None),
        Some(Value::BooleanValue(b)) => Ok(Some(*b)),
        Some(v) => Err(wrong_type(key, "boolean", v)),
    }
}

fn opt_timestamp(fields: &Fields, key: &str) -> Result<Option<DateTime<Utc>>, ConversionError> {
    match get(fields, key) {
        None => Ok(None),
        Some(Value::TimestampValue(s)) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| invalid(key, e)),
        Some(v) => Err(wrong_type(key, "timestamp", v)),
    }
}

fn date(fields: &Fields, key: &str) -> Result<NaiveDate, ConversionError> {
    match require(fields, key)? {
        Value::StringValue(s) => {
            // Tolerate full ISO datetimes stored as strings.
            let day = s.get(..10).unwrap_or(s.as_str());
            NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| invalid(key, e))
        }
        Value::TimestampValue(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc).date_naive())
            .map_err(|e| invalid(key, e)),
        v => Err(wrong_type(key, "date", v)),
    }
}

fn string_array(fields: &Fields, key: &str) -> Result<Vec<String>, ConversionError> {
    match get(fields, key) {
        None => Ok(Vec::new()),
        Some(Value::ArrayValue(array)) => array
            .values
            .iter()
            .map(|v| match v {
                Value::StringValue(s) => Ok(s.clone()),
                v => Err(wrong_type(key, "string", v)),
            })
            .collect(),
        Some(v) => Err(wrong_type(key, "array", v)),
    }
}

fn map<'a>(fields: &'a Fields, key: &str) -> Result<&'a Fields, ConversionError> {
    match require(fields, key)? {
        Value::MapValue(m) => Ok(&m.fields),
        v => Err(wrong_type(key, "map", v)),
    }
}

/// A location stored as a geo point, `{latitude, longitude}` or `{lat, lng}`.
fn coordinate(fields: &Fields, key: &str) -> Result<Coordinate, ConversionError> {
    if let Value::GeoPointValue(p) = require(fields, key)? {
        return Ok(Coordinate::new(p.latitude, p.longitude));
    }
    let inner = map(fields, key)?;
    let axis = |long: &str, short: &str| -> Result<f64, ConversionError> {
        let field = format!("{key}.{long}");
        match get(inner, long).or_else(|| get(inner, short)) {
            Some(v) => number(&field, v),
            None => Err(ConversionError::MissingField(field)),
        }
    };
    Ok(Coordinate::new(
        axis("latitude", "lat")?,
        axis("longitude", "lng")?,
    ))
}

fn denomination(fields: &Fields) -> Result<Denomination, ConversionError> {
    string(fields, "type")?
        .parse::<Denomination>()
        .map_err(|e| invalid("type", e))
}

fn site_events(fields: &Fields) -> Result<Vec<SiteEvent>, ConversionError> {
    let values = match get(fields, "events") {
        None => return Ok(Vec::new()),
        Some(Value::ArrayValue(array)) => &array.values,
        Some(v) => return Err(wrong_type("events", "array", v)),
    };
    values
        .iter()
        .map(|v| match v {
            Value::MapValue(m) => Ok(SiteEvent {
                name: string(&m.fields, "name")?,
                date: string_or_empty(&m.fields, "date")?,
                description: opt_string(&m.fields, "description")?,
            }),
            v => Err(wrong_type("events", "map", v)),
        })
        .collect()
}

pub fn site_from_document(doc: &Document) -> Result<Site, ConversionError> {
    let f = &doc.fields;
    Ok(Site {
        id: doc.id().to_string(),
        name: string(f, "name")?,
        denomination: denomination(f)?,
        location: coordinate(f, "location")?,
        description: string_or_empty(f, "description")?,
        images: string_array(f, "images")?,
        timings: string_or_empty(f, "timings")?,
        rating: opt_f64(f, "rating")?,
        review_count: opt_u32(f, "reviews")?,
        facilities: string_array(f, "facilities")?,
        history: opt_string(f, "history")?,
        significance: opt_string(f, "significance")?,
        founded_year: opt_i32(f, "foundedYear")?,
        events: site_events(f)?,
        created_at: opt_timestamp(f, "createdAt")?,
        updated_at: opt_timestamp(f, "updatedAt")?,
    })
}

pub fn route_from_document(doc: &Document) -> Result<Route, ConversionError> {
    let f = &doc.fields;
    let point = |key: &str| -> Result<RoutePoint, ConversionError> {
        let inner = map(f, key)?;
        Ok(RoutePoint::new(
            string(inner, "name")?,
            coordinate(inner, "location")?,
        ))
    };
    Ok(Route {
        id: doc.id().to_string(),
        user_id: string(f, "userId")?,
        origin: point("origin")?,
        destination: point("destination")?,
        date: date(f, "date")?,
        site_count: opt_u32(f, "tirthCount")?.unwrap_or(0),
        thumbnail: string_or_empty(f, "thumbnail")?,
        created_at: opt_timestamp(f, "createdAt")?,
    })
}

pub fn event_from_document(doc: &Document) -> Result<Event, ConversionError> {
    let f = &doc.fields;
    Ok(Event {
        id: doc.id().to_string(),
        name: string(f, "name")?,
        location: string_or_empty(f, "location")?,
        date: date(f, "date")?,
        time: string_or_empty(f, "time")?,
        description: string_or_empty(f, "description")?,
        image: string_or_empty(f, "image")?,
        site_id: opt_string(f, "tirthId")?,
        created_at: opt_timestamp(f, "createdAt")?,
    })
}

pub fn review_from_document(doc: &Document) -> Result<Review, ConversionError> {
    let f = &doc.fields;
    Ok(Review {
        id: doc.id().to_string(),
        user_id: string(f, "userId")?,
        user_name: string_or_empty(f, "userName")?,
        site_id: string(f, "tirthId")?,
        rating: opt_f64(f, "rating")?.unwrap_or(0.0),
        comment: opt_string(f, "comment")?,
        date: opt_timestamp(f, "date")?,
    })
}

fn preferences(fields: &Fields) -> Result<UserPreferences, ConversionError> {
    let defaults = UserPreferences::default();
    let f = match get(fields, "preferences") {
        None => return Ok(defaults),
        Some(Value::MapValue(m)) => &m.fields,
        Some(v) => return Err(wrong_type("preferences", "map", v)),
    };
    Ok(UserPreferences {
        notifications: opt_bool(f, "notifications")?.unwrap_or(defaults.notifications),
        dark_mode: opt_bool(f, "darkMode")?.unwrap_or(defaults.dark_mode),
        location_services: opt_bool(f, "locationServices")?
            .unwrap_or(defaults.location_services),
        offline_mode: opt_bool(f, "offlineMode")?.unwrap_or(defaults.offline_mode),
        auto_check_in: opt_bool(f, "autoCheckIn")?.unwrap_or(defaults.auto_check_in),
        language: opt_string(f, "language")?.unwrap_or(defaults.language),
    })
}

pub fn profile_from_document(doc: &Document) -> Result<UserProfile, ConversionError> {
    let f = &doc.fields;
    Ok(UserProfile {
        uid: opt_string(f, "uid")?.unwrap_or_else(|| doc.id().to_string()),
        email: opt_string(f, "email")?,
        display_name: opt_string(f, "displayName")?,
        preferences: preferences(f)?,
    })
}

fn string_value(s: &str) -> Value {
    Value::string(s)
}

fn opt_string_value(s: &Option<String>) -> Value {
    s.as_deref().map_or(Value::NullValue(()), string_value)
}

fn strings_value(items: &[String]) -> Value {
    Value::array(items.iter().map(|s| string_value(s)).collect())
}

fn coordinate_value(c: Coordinate) -> Value {
    Value::map(Fields::from([
        ("latitude".to_string(), Value::DoubleValue(c.latitude)),
        ("longitude".to_string(), Value::DoubleValue(c.longitude)),
    ]))
}

/// Route ends store their location as `{lat, lng}`.
fn route_point_value(p: &RoutePoint) -> Value {
    Value::map(Fields::from([
        ("name".to_string(), string_value(&p.name)),
        (
            "location".to_string(),
            Value::map(Fields::from([
                ("lat".to_string(), Value::DoubleValue(p.location.latitude)),
                ("lng".to_string(), Value::DoubleValue(p.location.longitude)),
            ])),
        ),
    ]))
}

fn site_events_value(events: &[SiteEvent]) -> Value {
    Value::array(
        events
            .iter()
            .map(|e| {
                let mut fields = Fields::from([
                    ("name".to_string(), string_value(&e.name)),
                    ("date".to_string(), string_value(&e.date)),
                ]);
                if let Some(d) = &e.description {
                    fields.insert("description".to_string(), string_value(d));
                }
                Value::map(fields)
            })
            .collect(),
    )
}

fn date_value(d: NaiveDate) -> Value {
    Value::string(d.format("%Y-%m-%d").to_string())
}

/// Fields of a new site, without the server timestamps.
pub fn new_site_fields(site: &NewSite) -> Fields {
    let mut f = Fields::new();
    f.insert("name".into(), string_value(&site.name));
    f.insert("type".into(), string_value(site.denomination.as_str()));
    f.insert("location".into(), coordinate_value(site.location));
    f.insert("description".into(), string_value(&site.description));
    f.insert("images".into(), strings_value(&site.images));
    f.insert("timings".into(), string_value(&site.timings));
    f.insert("facilities".into(), strings_value(&site.facilities));
    f.insert("history".into(), opt_string_value(&site.history));
    f.insert("significance".into(), opt_string_value(&site.significance));
    if let Some(year) = site.founded_year {
        f.insert("foundedYear".into(), Value::integer(year.into()));
    }
    f.insert("events".into(), site_events_value(&site.events));
    f
}

/// Fields of a partial update, with the matching update mask.
pub fn site_update_fields(update: &SiteUpdate) -> (Fields, Vec<String>) {
    let mut f = Fields::new();
    if let Some(v) = &update.name {
        f.insert("name".into(), string_value(v));
    }
    if let Some(v) = update.denomination {
        f.insert("type".into(), string_value(v.as_str()));
    }
    if let Some(v) = update.location {
        f.insert("location".into(), coordinate_value(v));
    }
    if let Some(v) = &update.description {
        f.insert("description".into(), string_value(v));
    }
    if let Some(v) = &update.images {
        f.insert("images".into(), strings_value(v));
    }
    if let Some(v) = &update.timings {
        f.insert("timings".into(), string_value(v));
    }
    if let Some(v) = &update.facilities {
        f.insert("facilities".into(), strings_value(v));
    }
    if let Some(v) = &update.history {
        f.insert("history".into(), string_value(v));
    }
    if let Some(v) = &update.significance {
        f.insert("significance".into(), string_value(v));
    }
    if let Some(v) = update.founded_year {
        f.insert("foundedYear".into(), Value::integer(v.into()));
    }
    if let Some(v) = update.rating {
        f.insert("rating".into(), Value::DoubleValue(v));
    }
    if let Some(v) = update.review_count {
        f.insert("reviews".into(), Value::integer(v.into()));
    }
    let mask = f.keys().cloned().collect();
    (f, mask)
}

pub fn new_route_fields(route: &NewRoute) -> Fields {
    Fields::from([
        ("userId".to_string(), string_value(&route.user_id)),
        ("origin".to_string(), route_point_value(&route.origin)),
        ("destination".to_string(), route_point_value(&route.destination)),
        ("date".to_string(), date_value(route.date)),
        ("tirthCount".to_string(), Value::integer(route.site_count.into())),
        ("thumbnail".to_string(), string_value(&route.thumbnail)),
    ])
}

pub fn new_review_fields(review: &NewReview) -> Fields {
    let mut f = Fields::from([
        ("userId".to_string(), string_value(&review.user_id)),
        ("userName".to_string(), string_value(&review.user_name)),
        ("tirthId".to_string(), string_value(&review.site_id)),
        ("rating".to_string(), Value::DoubleValue(review.rating)),
    ]);
    if let Some(c) = &review.comment {
        f.insert("comment".into(), string_value(c));
    }
    f
}

pub fn preferences_value(p: &UserPreferences) -> Value {
    Value::map(Fields::from([
        ("notifications".to_string(), Value::BooleanValue(p.notifications)),
        ("darkMode".to_string(), Value::BooleanValue(p.dark_mode)),
        ("locationServices".to_string(), Value::BooleanValue(p.location_services)),
        ("offlineMode".to_string(), Value::BooleanValue(p.offline_mode)),
        ("autoCheckIn".to_string(), Value::BooleanValue(p.auto_check_in)),
        ("language".to_string(), string_value(&p.language)),
    ]))
}

pub fn profile_fields(profile: &UserProfile) -> Fields {
    Fields::from([
        ("uid".to_string(), string_value(&profile.uid)),
        ("email".to_string(), opt_string_value(&profile.email)),
        ("displayName".to_string(), opt_string_value(&profile.display_name)),
        ("preferences".to_string(), preferences_value(&profile.preferences)),
    ])
}
