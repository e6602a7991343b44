use crate::store::{KeyValueStore, THEME_KEY};
use crate::user::Theme;

/// Stored theme choice; absent or unreadable state falls back to light.
pub fn load_theme(store: &dyn KeyValueStore) -> Theme {
    match store.get(THEME_KEY) {
        Ok(Some(value)) => Theme::parse(&value).unwrap_or_else(|| {
            tracing::warn!(%value, "unrecognised theme preference, falling back to light");
            Theme::default()
        }),
        Ok(None) => Theme::default(),
        Err(err) => {
            tracing::error!(%err, "unable to read theme preference");
            Theme::default()
        }
    }
}

pub fn save_theme(store: &dyn KeyValueStore, theme: Theme) -> bool {
    match store.set(THEME_KEY, theme.as_str()) {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(%err, "unable to persist theme preference");
            false
        }
    }
}
