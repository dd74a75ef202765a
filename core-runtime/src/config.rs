//! # Core Configuration Module
//!
//! Builder-based configuration for the catalog core.
//!
//! ## Overview
//!
//! `CoreConfig` carries the host bridges the catalog consumes plus the tunables
//! of the catalog engine. The builder fails fast when a required bridge is
//! missing or a tunable is out of range.
//!
//! ## Required Dependencies
//!
//! - `MediaStore` - Live tracks, albums, artists and playlists
//!
//! ## Optional Dependencies
//!
//! - `UsageStatistics` - Ranking for "most rated" and "popular"; defaults to an
//!   empty ranking
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CatalogSettings, CoreConfig};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .media_store(Arc::new(MyMediaStore::new()))
//!     .recent_tracks_limit(50)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{MediaStore, NoUsageStatistics, UsageStatistics};
use std::sync::Arc;

use crate::events::DEFAULT_EVENT_BUFFER_SIZE;

/// Number of tracks shown under "recently added" unless configured otherwise.
pub const DEFAULT_RECENT_TRACKS_LIMIT: usize = 25;

/// Parents loaded without an explicit subscription that stay cached.
pub const DEFAULT_IDLE_SUBSCRIPTION_CAPACITY: usize = 32;

/// Constants of the search relevance formula.
///
/// `score = base_score - match_start - candidate_length`, plus
/// `first_word_bonus` when the query matches at the very start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTuning {
    pub base_score: i64,
    pub first_word_bonus: i64,
}

impl Default for SearchTuning {
    fn default() -> Self {
        Self {
            base_score: 100,
            first_word_bonus: 30,
        }
    }
}

/// Tunables of the catalog engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSettings {
    /// Maximum number of tracks in the "recently added" category
    pub recent_tracks_limit: usize,
    /// Capacity of the LRU holding parents loaded without a subscription handle
    pub idle_subscription_capacity: usize,
    /// Buffer of the change-notification channel
    pub event_buffer_size: usize,
    pub search: SearchTuning,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            recent_tracks_limit: DEFAULT_RECENT_TRACKS_LIMIT,
            idle_subscription_capacity: DEFAULT_IDLE_SUBSCRIPTION_CAPACITY,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            search: SearchTuning::default(),
        }
    }
}

impl CatalogSettings {
    /// Validates the settings and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.recent_tracks_limit == 0 {
            return Err(Error::Config(
                "Recent tracks limit must be greater than 0".to_string(),
            ));
        }

        if self.idle_subscription_capacity == 0 {
            return Err(Error::Config(
                "Idle subscription capacity must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.search.first_word_bonus < 0 {
            return Err(Error::Config(
                "First word bonus cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Core configuration for the catalog.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Host media collections (required)
    pub media_store: Arc<dyn MediaStore>,

    /// Host listening statistics
    pub usage_statistics: Arc<dyn UsageStatistics>,

    pub catalog: CatalogSettings,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("media_store", &"MediaStore { ... }")
            .field("usage_statistics", &"UsageStatistics { ... }")
            .field("catalog", &self.catalog)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.catalog.validate()
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    media_store: Option<Arc<dyn MediaStore>>,
    usage_statistics: Option<Arc<dyn UsageStatistics>>,
    catalog: CatalogSettings,
}

impl CoreConfigBuilder {
    pub fn media_store(mut self, store: Arc<dyn MediaStore>) -> Self {
        self.media_store = Some(store);
        self
    }

    pub fn usage_statistics(mut self, statistics: Arc<dyn UsageStatistics>) -> Self {
        self.usage_statistics = Some(statistics);
        self
    }

    pub fn recent_tracks_limit(mut self, limit: usize) -> Self {
        self.catalog.recent_tracks_limit = limit;
        self
    }

    pub fn idle_subscription_capacity(mut self, capacity: usize) -> Self {
        self.catalog.idle_subscription_capacity = capacity;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.catalog.event_buffer_size = size;
        self
    }

    pub fn search_tuning(mut self, tuning: SearchTuning) -> Self {
        self.catalog.search = tuning;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// - `Error::CapabilityMissing` when no `MediaStore` was provided
    /// - `Error::Config` when a tunable is out of range
    pub fn build(self) -> Result<CoreConfig> {
        let media_store = self.media_store.ok_or_else(|| {
            Error::capability_missing(
                "MediaStore",
                "A MediaStore implementation is required to browse the library. \
                 Inject the host's on-device media index adapter, or an \
                 InMemoryMediaStore for hosts without one.",
            )
        })?;

        let usage_statistics = self.usage_statistics.unwrap_or_else(|| {
            tracing::debug!("No UsageStatistics provided; rankings will be empty");
            Arc::new(NoUsageStatistics)
        });

        let config = CoreConfig {
            media_store,
            usage_statistics,
            catalog: self.catalog,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::media::{
        AlbumRecord, ArtistRecord, LiveStream, PlaylistRecord, TrackRecord,
    };
    use futures::stream::{self, StreamExt};

    struct EmptyStore;

    impl MediaStore for EmptyStore {
        fn tracks(&self) -> LiveStream<Vec<TrackRecord>> {
            stream::iter(vec![Ok(Vec::new())]).boxed()
        }

        fn albums(&self) -> LiveStream<Vec<AlbumRecord>> {
            stream::iter(vec![Ok(Vec::new())]).boxed()
        }

        fn artists(&self) -> LiveStream<Vec<ArtistRecord>> {
            stream::iter(vec![Ok(Vec::new())]).boxed()
        }

        fn playlists(&self) -> LiveStream<Vec<PlaylistRecord>> {
            stream::iter(vec![Ok(Vec::new())]).boxed()
        }
    }

    #[test]
    fn test_missing_media_store_fails_fast() {
        let err = CoreConfig::builder().build().unwrap_err();
        match err {
            Error::CapabilityMissing { capability, .. } => assert_eq!(capability, "MediaStore"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = CoreConfig::builder()
            .media_store(Arc::new(EmptyStore))
            .build()
            .unwrap();

        assert_eq!(config.catalog.recent_tracks_limit, 25);
        assert_eq!(config.catalog.search.base_score, 100);
        assert_eq!(config.catalog.search.first_word_bonus, 30);
        assert_eq!(config.catalog.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
    }

    #[test]
    fn test_zero_limits_rejected() {
        let err = CoreConfig::builder()
            .media_store(Arc::new(EmptyStore))
            .recent_tracks_limit(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = CoreConfig::builder()
            .media_store(Arc::new(EmptyStore))
            .idle_subscription_capacity(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_custom_search_tuning() {
        let config = CoreConfig::builder()
            .media_store(Arc::new(EmptyStore))
            .search_tuning(SearchTuning {
                base_score: 200,
                first_word_bonus: 10,
            })
            .build()
            .unwrap();
        assert_eq!(config.catalog.search.base_score, 200);
    }
}
