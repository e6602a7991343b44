use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Colour scheme choice, persisted as the literal strings `"light"` and
/// `"dark"`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// Closed preference set. Unknown keys in a stored blob are rejected
/// instead of silently carried along.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<NaiveTime>,
}

impl Preferences {
    /// Nested shallow merge: fields absent from the patch keep their stored
    /// value.
    pub fn merged(&self, update: &PreferencesUpdate) -> Self {
        Self {
            theme: update.theme.unwrap_or(self.theme),
            reminder_time: update.reminder_time.or(self.reminder_time),
        }
    }
}

/// Field-wise patch for `Preferences`; `None` leaves the stored value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreferencesUpdate {
    pub theme: Option<Theme>,
    pub reminder_time: Option<NaiveTime>,
}

/// The single local account record. The password is stored only as a salted
/// one-way hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub preferences: Preferences,
}

/// Field-wise patch for the profile. A new password is re-hashed before it
/// is stored.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_merge_preserves_absent_fields() {
        let stored = Preferences {
            theme: Theme::Dark,
            reminder_time: NaiveTime::from_hms_opt(7, 30, 0),
        };
        let merged = stored.merged(&PreferencesUpdate {
            theme: Some(Theme::Light),
            reminder_time: None,
        });
        assert_eq!(merged.theme, Theme::Light);
        assert_eq!(merged.reminder_time, stored.reminder_time);
    }

    #[test]
    fn unknown_preference_keys_are_rejected() {
        let err = serde_json::from_str::<Preferences>(r#"{"theme":"dark","fontSize":12}"#);
        assert!(err.is_err());

        let ok: Preferences = serde_json::from_str(r#"{"theme":"dark"}"#).expect("decode");
        assert_eq!(ok.theme, Theme::Dark);
        assert_eq!(ok.reminder_time, None);
    }

    #[test]
    fn theme_round_trips_through_its_wire_spelling() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("light"), Some(Theme::Light));
        assert_eq!(Theme::parse("solarized"), None);
        assert_eq!(Theme::Dark.as_str(), "dark");
    }
}
