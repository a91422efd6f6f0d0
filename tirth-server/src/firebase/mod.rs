//! Firebase-backed gateway.
//!
//! Talks to the Firestore, Cloud Storage and Identity Toolkit REST APIs
//! directly with `reqwest`. Collections and field names match the stored
//! schema: `tirths`, `routes`, `events`, `reviews` and `users`.

mod auth;
mod client;
mod config;
mod convert;
mod error;
mod types;

pub use auth::FirebaseAuth;
pub use client::FirestoreGateway;
pub use config::FirebaseConfig;
pub use convert::ConversionError;
pub use error::FirebaseError;
pub use types::{Document, Value};
