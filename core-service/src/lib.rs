//! Core service façade.
//!
//! Wires the host bridges carried by [`CoreConfig`] into the catalog engine
//! and exposes the operations media browsers call: listing children, looking
//! up items, following changes, and searching.
//!
//! ```ignore
//! use core_service::{CatalogService, CoreConfig, MediaId};
//!
//! let config = CoreConfig::builder().media_store(store).build()?;
//! let service = CatalogService::new(config)?;
//!
//! let _albums = service.subscribe(&MediaId::parse("albums")?);
//! let albums = service.load_children(&MediaId::parse("albums")?, None).await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

pub use core_catalog::{
    AudioTrack, Children, ChildrenStream, MediaCategory, MediaContent, MediaId, Page, PageRequest,
    ParentSubscription, SearchQuery,
};
pub use core_runtime::config::{CatalogSettings, CoreConfig, SearchTuning};
pub use core_runtime::events::{CatalogEvent, CoreEvent, EventStream};

use core_catalog::{standard_tree, SearchEngine, SubscriptionRegistry};
use core_library::CachedMediaStore;
use core_runtime::events::EventBus;
use futures::stream::BoxStream;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Primary façade exposed to host applications.
///
/// Cloning is cheap; clones share subscriptions and caches. Must be created
/// and used within a Tokio runtime.
#[derive(Clone)]
pub struct CatalogService {
    registry: SubscriptionRegistry,
    search: Arc<SearchEngine>,
    settings: CatalogSettings,
}

impl fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogService")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish()
    }
}

impl CatalogService {
    /// Builds the standard catalog over the configured host bridges.
    ///
    /// Every host collection is observed at most once at a time, however
    /// many catalog nodes derive from it.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        let CoreConfig {
            media_store,
            usage_statistics,
            catalog,
        } = config;

        let store = Arc::new(CachedMediaStore::new(media_store));
        let tree = standard_tree(store.clone(), usage_statistics, &catalog)
            .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
        let events = EventBus::new(catalog.event_buffer_size);
        let registry =
            SubscriptionRegistry::new(Arc::new(tree), events, catalog.idle_subscription_capacity);

        info!(
            recent_tracks_limit = catalog.recent_tracks_limit,
            idle_subscription_capacity = catalog.idle_subscription_capacity,
            "Catalog service initialized"
        );
        Ok(Self {
            registry,
            search: Arc::new(SearchEngine::new(store, catalog.search)),
            settings: catalog,
        })
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Live children of `parent`, bypassing the shared cache.
    pub fn get_children(&self, parent: &MediaId) -> ChildrenStream {
        self.registry.tree().get_children(parent)
    }

    /// Current children of `parent`, served from the shared cache when
    /// possible.
    #[instrument(skip(self))]
    pub async fn load_children(&self, parent: &MediaId, page: Option<PageRequest>) -> Result<Children> {
        Ok(self.registry.load_children(parent, page).await?)
    }

    /// One page of the children of `parent` together with paging totals.
    pub async fn load_page(&self, parent: &MediaId, request: PageRequest) -> Result<Page<MediaContent>> {
        let all = self.registry.load_children(parent, None).await?;
        Ok(Page::from_listing(&all, request))
    }

    /// Item `id` from the cached listing of its parent.
    ///
    /// Never queries the host; see [`CatalogService::get_item`].
    pub fn cached_item(&self, id: &MediaId) -> Option<MediaContent> {
        self.registry.get_item(id)
    }

    /// Item `id`, looked up in the cache first and then in the catalog.
    ///
    /// Absence is `Ok(None)`, never an error.
    #[instrument(skip(self))]
    pub async fn get_item(&self, id: &MediaId) -> Result<Option<MediaContent>> {
        if let Some(item) = self.registry.get_item(id) {
            return Ok(Some(item));
        }
        debug!("Item not cached; reading parent listing");
        Ok(self.registry.tree().get_item(id).await?)
    }

    /// Keeps `parent` observed until the returned guard is dropped.
    pub fn subscribe(&self, parent: &MediaId) -> ParentSubscription {
        self.registry.subscribe(parent)
    }

    /// Parents whose cached listing changed, from now on.
    pub fn updated_parent_ids(&self) -> BoxStream<'static, MediaId> {
        self.registry.updated_parent_ids()
    }

    /// Every catalog event, including subscription failures.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.registry.events().subscribe())
    }

    /// Ranked matches for `query`; no match is an empty list.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<MediaContent>> {
        Ok(self.search.search(query).await?)
    }
}
