//! # Core Catalog
//!
//! Browsable media catalog over the host's live media collections.
//!
//! ## Overview
//!
//! - [`MediaId`] addresses every node with a compact string form
//!   (`type`, `type/category`, `type/category|track`)
//! - [`CatalogTree`] declares the hierarchy and turns a parent identifier into
//!   a live stream of its children
//! - [`ChildrenSource`] implementations derive listings from the host
//!   collections (see [`sources`])
//! - [`SubscriptionRegistry`] shares and caches live listings per parent and
//!   announces changes on the event bus
//! - [`SearchEngine`] ranks artists, albums and tracks against text queries
//!
//! ## Usage
//!
//! ```ignore
//! use core_catalog::{standard_tree, MediaId, SubscriptionRegistry};
//!
//! let tree = Arc::new(standard_tree(store, statistics, &settings)?);
//! let registry = SubscriptionRegistry::new(tree, events, settings.idle_subscription_capacity);
//!
//! let albums = registry.load_children(&MediaId::parse("albums")?, None).await?;
//! ```

pub mod content;
pub mod error;
pub mod id;
pub mod pagination;
pub mod registry;
pub mod search;
pub mod source;
pub mod sources;
pub mod standard;
pub mod tree;

pub use content::{AudioTrack, MediaCategory, MediaContent};
pub use error::{CatalogError, Result};
pub use id::{encode, MediaId, ROOT_TYPE};
pub use pagination::{Page, PageRequest};
pub use registry::{Children, ParentSubscription, SubscriptionRegistry};
pub use search::{SearchEngine, SearchQuery};
pub use source::{first_value, ChildrenSource, ChildrenStream};
pub use standard::standard_tree;
pub use tree::{CatalogTree, CatalogTreeBuilder, NodeInfo, TypeBuilder};
