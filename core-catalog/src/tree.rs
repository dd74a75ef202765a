//! Declarative catalog hierarchy
//!
//! The tree has a fixed shape near the root and live content further down:
//!
//! ```text
//! root
//! ├── <type>              one per declared media type
//! │   ├── <category>      fixed categories declared with the type
//! │   └── <category>...   categories produced by the type's dynamic source
//! │       └── <track>     listed by the category's source
//! ```
//!
//! A type may declare fixed categories, a dynamic source, or both. When it has
//! both, the fixed categories are listed first.
//!
//! # Example
//!
//! ```ignore
//! let tree = CatalogTree::builder()
//!     .media_type("tracks", NodeInfo::new("Tracks"), |tracks| {
//!         tracks.category("all", NodeInfo::new("All tracks").playable(true), all_tracks)
//!     })
//!     .media_type("albums", NodeInfo::new("Albums"), |albums| albums.dynamic(albums_source))
//!     .build()?;
//! ```

use crate::content::{MediaCategory, MediaContent};
use crate::error::{CatalogError, Result};
use crate::id::{MediaId, ROOT_TYPE};
use crate::source::{fail, first_value, fixed, ChildrenSource, ChildrenStream};
use futures::StreamExt;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Display attributes of a node declared up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub title: String,
    pub subtitle: Option<String>,
    pub icon_uri: Option<String>,
    pub playable: bool,
}

impl NodeInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            icon_uri: None,
            playable: false,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_icon(mut self, icon_uri: impl Into<String>) -> Self {
        self.icon_uri = Some(icon_uri.into());
        self
    }

    pub fn playable(mut self, playable: bool) -> Self {
        self.playable = playable;
        self
    }

    fn to_category(&self, id: MediaId) -> MediaCategory {
        MediaCategory {
            id,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            icon_uri: self.icon_uri.clone(),
            playable: self.playable,
            child_count: None,
        }
    }
}

struct CategoryNode {
    id: MediaId,
    info: NodeInfo,
    source: Arc<dyn ChildrenSource>,
}

struct TypeNode {
    id: MediaId,
    info: NodeInfo,
    categories: Vec<CategoryNode>,
    dynamic: Option<Arc<dyn ChildrenSource>>,
}

impl TypeNode {
    fn item(&self) -> MediaCategory {
        let category = self.info.to_category(self.id.clone());
        if self.dynamic.is_none() {
            category.with_child_count(self.categories.len() as u32)
        } else {
            category
        }
    }

    fn fixed_categories(&self) -> Vec<MediaContent> {
        self.categories
            .iter()
            .map(|category| category.info.to_category(category.id.clone()).into())
            .collect()
    }
}

/// Immutable catalog hierarchy, validated when built.
pub struct CatalogTree {
    root: NodeInfo,
    types: Vec<TypeNode>,
}

impl fmt::Debug for CatalogTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogTree")
            .field("types", &self.media_types().collect::<Vec<_>>())
            .finish()
    }
}

impl CatalogTree {
    pub fn builder() -> CatalogTreeBuilder {
        CatalogTreeBuilder::default()
    }

    /// Declared media type names in declaration order.
    pub fn media_types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|node| node.id.media_type())
    }

    fn find_type(&self, media_type: &str) -> Option<&TypeNode> {
        self.types.iter().find(|node| node.id.media_type() == media_type)
    }

    /// Entry describing the root itself.
    pub fn root_item(&self) -> MediaContent {
        self.root
            .to_category(MediaId::root())
            .with_child_count(self.types.len() as u32)
            .into()
    }

    /// Live children of `parent`.
    ///
    /// Errors are delivered through the stream: `NotBrowsable` for tracks and
    /// `NotFound` for unknown types or categories.
    pub fn get_children(&self, parent: &MediaId) -> ChildrenStream {
        if parent.is_root() {
            let types = self.types.iter().map(|node| node.item().into()).collect();
            return fixed(types);
        }

        if parent.category().is_none() {
            let Some(node) = self.find_type(parent.media_type()) else {
                return fail(CatalogError::NotFound(parent.to_string()));
            };
            let listed = node.fixed_categories();
            return match &node.dynamic {
                Some(dynamic) => dynamic
                    .children(parent)
                    .map(move |result| {
                        result.map(|mut produced| {
                            let mut children = listed.clone();
                            children.append(&mut produced);
                            children
                        })
                    })
                    .boxed(),
                None => fixed(listed),
            };
        }

        if parent.track().is_some() {
            return fail(CatalogError::NotBrowsable(parent.to_string()));
        }

        let Some(node) = self.find_type(parent.media_type()) else {
            return fail(CatalogError::NotFound(parent.to_string()));
        };
        if let Some(category) = node.categories.iter().find(|category| &category.id == parent) {
            return category.source.children(parent);
        }
        match &node.dynamic {
            Some(dynamic) => dynamic.children(parent),
            None => fail(CatalogError::NotFound(parent.to_string())),
        }
    }

    /// Looks up a single node by reading the current listing of its parent.
    ///
    /// Returns `Ok(None)` when the node, or its parent, does not exist.
    pub async fn get_item(&self, id: &MediaId) -> Result<Option<MediaContent>> {
        let Some(parent) = id.parent() else {
            return Ok(Some(self.root_item()));
        };

        if parent.is_root() {
            return Ok(self.find_type(id.media_type()).map(|node| node.item().into()));
        }

        match first_value(self.get_children(&parent)).await {
            Ok(children) => Ok(children.into_iter().find(|child| child.id() == id)),
            Err(CatalogError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Collects type declarations; validation happens in [`CatalogTreeBuilder::build`].
pub struct CatalogTreeBuilder {
    root: NodeInfo,
    types: Vec<TypeBuilder>,
}

impl Default for CatalogTreeBuilder {
    fn default() -> Self {
        Self {
            root: NodeInfo::new("Library"),
            types: Vec::new(),
        }
    }
}

impl CatalogTreeBuilder {
    pub fn root_info(mut self, info: NodeInfo) -> Self {
        self.root = info;
        self
    }

    /// Declares a media type; `configure` adds its categories and sources.
    pub fn media_type<F>(mut self, name: &str, info: NodeInfo, configure: F) -> Self
    where
        F: FnOnce(TypeBuilder) -> TypeBuilder,
    {
        let declared = configure(TypeBuilder {
            name: name.to_string(),
            info,
            categories: Vec::new(),
            dynamic: Vec::new(),
        });
        self.types.push(declared);
        self
    }

    /// Validates every declaration and builds the tree.
    ///
    /// Fails with [`CatalogError::Configuration`] on a duplicate or malformed
    /// type or category name, on a type named after the root, on a type with
    /// nothing to list, or on a type with more than one dynamic source.
    pub fn build(self) -> Result<CatalogTree> {
        let mut seen_types = HashSet::new();
        let mut types = Vec::with_capacity(self.types.len());

        for declared in self.types {
            if declared.name == ROOT_TYPE {
                return Err(CatalogError::Configuration(format!(
                    "media type '{}' is reserved for the catalog root",
                    ROOT_TYPE
                )));
            }
            let type_id = MediaId::of_type(&declared.name)
                .map_err(|err| CatalogError::Configuration(err.to_string()))?;
            if !seen_types.insert(declared.name.clone()) {
                return Err(CatalogError::Configuration(format!(
                    "media type '{}' declared twice",
                    declared.name
                )));
            }
            if declared.dynamic.len() > 1 {
                return Err(CatalogError::Configuration(format!(
                    "media type '{}' has more than one dynamic source",
                    declared.name
                )));
            }
            if declared.categories.is_empty() && declared.dynamic.is_empty() {
                return Err(CatalogError::Configuration(format!(
                    "media type '{}' has neither categories nor a dynamic source",
                    declared.name
                )));
            }

            let mut seen_categories = HashSet::new();
            let mut categories = Vec::with_capacity(declared.categories.len());
            for (name, info, source) in declared.categories {
                let id = type_id
                    .category_of(&name)
                    .map_err(|err| CatalogError::Configuration(err.to_string()))?;
                if !seen_categories.insert(name.clone()) {
                    return Err(CatalogError::Configuration(format!(
                        "category '{}' declared twice under '{}'",
                        name, declared.name
                    )));
                }
                categories.push(CategoryNode { id, info, source });
            }

            debug!(
                media_type = %declared.name,
                categories = categories.len(),
                dynamic = !declared.dynamic.is_empty(),
                "Declared media type"
            );
            types.push(TypeNode {
                id: type_id,
                info: declared.info,
                categories,
                dynamic: declared.dynamic.into_iter().next(),
            });
        }

        info!(media_types = types.len(), "Catalog tree built");
        Ok(CatalogTree {
            root: self.root,
            types,
        })
    }
}

/// Declarations of one media type.
pub struct TypeBuilder {
    name: String,
    info: NodeInfo,
    categories: Vec<(String, NodeInfo, Arc<dyn ChildrenSource>)>,
    dynamic: Vec<Arc<dyn ChildrenSource>>,
}

impl TypeBuilder {
    /// Adds a fixed category listed by `source`.
    pub fn category(mut self, name: &str, info: NodeInfo, source: Arc<dyn ChildrenSource>) -> Self {
        self.categories.push((name.to_string(), info, source));
        self
    }

    /// Sets the source producing this type's remaining categories and their
    /// children.
    pub fn dynamic(mut self, source: Arc<dyn ChildrenSource>) -> Self {
        self.dynamic.push(source);
        self
    }
}
