//! User profile and preferences.

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Per-user settings, stored on the user record and mirrored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub notifications: bool,
    pub dark_mode: bool,
    pub location_services: bool,
    pub offline_mode: bool,
    pub auto_check_in: bool,
    pub language: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            notifications: true,
            dark_mode: false,
            location_services: true,
            offline_mode: false,
            auto_check_in: false,
            language: "en".to_string(),
        }
    }
}

/// A single preference, for settings toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreferenceKey {
    Notifications,
    DarkMode,
    LocationServices,
    OfflineMode,
    AutoCheckIn,
    Language,
}

impl PreferenceKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceKey::Notifications => "notifications",
            PreferenceKey::DarkMode => "darkMode",
            PreferenceKey::LocationServices => "locationServices",
            PreferenceKey::OfflineMode => "offlineMode",
            PreferenceKey::AutoCheckIn => "autoCheckIn",
            PreferenceKey::Language => "language",
        }
    }
}

/// Value for a [`PreferenceKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    Flag(bool),
    Text(String),
}

impl UserPreferences {
    /// Set one preference, rejecting a value of the wrong kind.
    pub fn set(&mut self, key: PreferenceKey, value: PreferenceValue) -> Result<(), DomainError> {
        match (key, value) {
            (PreferenceKey::Language, PreferenceValue::Text(lang)) => self.language = lang,
            (PreferenceKey::Language, PreferenceValue::Flag(_)) => {
                return Err(DomainError::PreferenceType {
                    key: key.as_str(),
                    expected: "string",
                });
            }
            (_, PreferenceValue::Text(_)) => {
                return Err(DomainError::PreferenceType {
                    key: key.as_str(),
                    expected: "boolean",
                });
            }
            (PreferenceKey::Notifications, PreferenceValue::Flag(f)) => self.notifications = f,
            (PreferenceKey::DarkMode, PreferenceValue::Flag(f)) => self.dark_mode = f,
            (PreferenceKey::LocationServices, PreferenceValue::Flag(f)) => {
                self.location_services = f
            }
            (PreferenceKey::OfflineMode, PreferenceValue::Flag(f)) => self.offline_mode = f,
            (PreferenceKey::AutoCheckIn, PreferenceValue::Flag(f)) => self.auto_check_in = f,
        }
        Ok(())
    }
}

/// The remote user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub preferences: UserPreferences,
}

impl UserProfile {
    /// Fresh profile with default preferences.
    pub fn new(
        uid: impl Into<String>,
        email: Option<String>,
        display_name: Option<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            email,
            display_name,
            preferences: UserPreferences::default(),
        }
    }
}
