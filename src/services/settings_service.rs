// src/services/settings_service.rs
//
// Persisted user preferences. Missing or unreadable entries mean "default";
// the values are read once per pass by the caller and passed down explicitly.

use std::sync::Arc;

use crate::domain::{DisplayPreferences, ProviderPreference};
use crate::error::AppResult;
use crate::repositories::{storage_keys, KeyValueRepository};
use crate::services::episode_cache::{load_json, save_json};

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn KeyValueRepository>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn KeyValueRepository>) -> Self {
        Self { store }
    }

    pub async fn provider_preference(&self) -> ProviderPreference {
        self.load_or_default(storage_keys::PROVIDER_PREFERENCE).await
    }

    pub async fn save_provider_preference(&self, preference: &ProviderPreference) -> AppResult<()> {
        save_json(&self.store, storage_keys::PROVIDER_PREFERENCE.to_string(), preference).await
    }

    pub async fn display_preferences(&self) -> DisplayPreferences {
        self.stored_display_preferences().await.unwrap_or_default()
    }

    /// `None` when the user never saved display settings (or they are unreadable).
    pub async fn stored_display_preferences(&self) -> Option<DisplayPreferences> {
        match load_json(&self.store, storage_keys::DISPLAY_PREFERENCES.to_string()).await {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Could not read display settings: {}", e);
                None
            }
        }
    }

    pub async fn save_display_preferences(&self, display: &DisplayPreferences) -> AppResult<()> {
        save_json(&self.store, storage_keys::DISPLAY_PREFERENCES.to_string(), display).await
    }

    async fn load_or_default<T>(&self, key: &str) -> T
    where
        T: serde::de::DeserializeOwned + Default + Send + 'static,
    {
        match load_json(&self.store, key.to_string()).await {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                log::warn!("Could not read setting '{}', using default: {}", key, e);
                T::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AudioPreference, ProviderKind, SortOrder};
    use crate::repositories::InMemoryKeyValueRepository;

    fn service() -> (SettingsService, Arc<dyn KeyValueRepository>) {
        let store: Arc<dyn KeyValueRepository> = Arc::new(InMemoryKeyValueRepository::new());
        (SettingsService::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn test_missing_settings_are_defaults() {
        let (settings, _) = service();
        assert_eq!(settings.provider_preference().await, ProviderPreference::default());
        assert_eq!(settings.display_preferences().await, DisplayPreferences::default());
        assert_eq!(settings.stored_display_preferences().await, None);
    }

    #[tokio::test]
    async fn test_round_trip_and_corruption() {
        let (settings, store) = service();
        let preference = ProviderPreference::new(ProviderKind::AnimePahe, AudioPreference::Both)
            .with_priority(vec![ProviderKind::HiAnime]);
        settings.save_provider_preference(&preference).await.unwrap();
        assert_eq!(settings.provider_preference().await, preference);

        let display = DisplayPreferences {
            sort_order: SortOrder::Descending,
            ..DisplayPreferences::default()
        };
        settings.save_display_preferences(&display).await.unwrap();
        assert_eq!(settings.display_preferences().await, display);

        store.set(storage_keys::DISPLAY_PREFERENCES, "[]").unwrap();
        assert_eq!(settings.display_preferences().await, DisplayPreferences::default());
    }
}
