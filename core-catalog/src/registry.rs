//! Shared, cached subscriptions to children listings
//!
//! The registry keeps at most one live observation per parent identifier. The
//! first request for a parent subscribes to the catalog tree; later requests
//! reuse the cached listing until it changes. Every distinct new listing is
//! announced on the [`EventBus`] as [`CatalogEvent::ChildrenUpdated`].
//!
//! ## Lifecycle
//!
//! - [`SubscriptionRegistry::subscribe`] returns a [`ParentSubscription`]
//!   guard. The observation lives while any guard for the parent is alive and
//!   is cancelled when the last one is dropped.
//! - [`SubscriptionRegistry::load_children`] without a guard keeps the parent
//!   in a bounded LRU of idle observations. The least recently loaded idle
//!   parent is cancelled once the LRU is full.
//! - A failure before the first listing is returned to every waiting caller
//!   and the parent is forgotten, so the next request retries. A failure after
//!   the first listing drops the observation and is announced as
//!   [`CatalogEvent::SubscriptionFailed`].
//!
//! The table of parents is guarded by one mutex held only for insertions and
//! removals. Listings themselves live in per-parent `watch` channels.

use crate::content::MediaContent;
use crate::error::{CatalogError, Result};
use crate::id::MediaId;
use crate::pagination::PageRequest;
use crate::tree::CatalogTree;
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus, EventStream};
use futures::future::ready;
use futures::stream::{BoxStream, StreamExt};
use lru::LruCache;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Children listing shared between every caller that loaded it.
pub type Children = Arc<Vec<MediaContent>>;

#[derive(Clone)]
enum Slot {
    Pending,
    Ready(Children),
    Failed(CatalogError),
}

impl Slot {
    fn is_settled(&self) -> bool {
        !matches!(self, Slot::Pending)
    }
}

struct Entry {
    /// Distinguishes successive observations of the same parent.
    serial: u64,
    state: watch::Receiver<Slot>,
    pump: JoinHandle<()>,
}

impl Drop for Entry {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

struct Tracked {
    entry: Arc<Entry>,
    holders: usize,
}

struct Table {
    entries: HashMap<MediaId, Tracked>,
    /// Parents loaded without a guard, least recently loaded first out.
    idle: LruCache<MediaId, ()>,
    next_serial: u64,
}

struct Shared {
    tree: Arc<CatalogTree>,
    events: EventBus,
    table: Mutex<Table>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Entry for `parent`, starting its observation if there is none.
    fn tracked<'t>(self: &Arc<Self>, table: &'t mut Table, parent: &MediaId) -> &'t mut Tracked {
        let Table {
            entries,
            next_serial,
            ..
        } = table;

        entries.entry(parent.clone()).or_insert_with(|| {
            let serial = *next_serial;
            *next_serial += 1;
            Tracked {
                entry: Arc::new(self.start(parent.clone(), serial)),
                holders: 0,
            }
        })
    }

    /// Spawns the observation of `parent`. The tree, and through it the host,
    /// is only reached from the spawned task, never under the table lock.
    fn start(self: &Arc<Self>, parent: MediaId, serial: u64) -> Entry {
        debug!(parent = %parent, serial, "Subscribing to children");
        let (sender, state) = watch::channel(Slot::Pending);
        let pump = tokio::spawn(pump(
            parent,
            serial,
            Arc::clone(&self.tree),
            sender,
            self.events.clone(),
            Arc::downgrade(self),
        ));
        Entry {
            serial,
            state,
            pump,
        }
    }
}

/// Forgets `parent` if it is still observed by the pump with `serial`.
fn detach(registry: &Weak<Shared>, parent: &MediaId, serial: u64) {
    let Some(shared) = registry.upgrade() else {
        return;
    };
    let mut table = shared.lock();
    if table.entries.get(parent).map(|tracked| tracked.entry.serial) == Some(serial) {
        table.entries.remove(parent);
        table.idle.pop(parent);
    }
}

async fn pump(
    parent: MediaId,
    serial: u64,
    tree: Arc<CatalogTree>,
    state: watch::Sender<Slot>,
    events: EventBus,
    registry: Weak<Shared>,
) {
    let mut children = tree.get_children(&parent);
    let mut delivered = false;

    while let Some(item) = children.next().await {
        match item {
            Ok(listing) => {
                let changed = state.send_if_modified(|slot| match slot {
                    Slot::Ready(current) if **current == listing => false,
                    _ => {
                        *slot = Slot::Ready(Arc::new(listing));
                        true
                    }
                });
                delivered = true;

                if changed {
                    trace!(parent = %parent, "Children updated");
                    let _ = events.emit(CoreEvent::Catalog(CatalogEvent::ChildrenUpdated {
                        parent_id: parent.to_string(),
                    }));
                }
            }
            Err(err) => {
                if delivered {
                    warn!(parent = %parent, error = %err, "Children subscription failed; dropping it");
                    let _ = events.emit(CoreEvent::Catalog(CatalogEvent::SubscriptionFailed {
                        parent_id: parent.to_string(),
                        message: err.to_string(),
                    }));
                } else {
                    debug!(parent = %parent, error = %err, "Children could not be loaded");
                }
                state.send_replace(Slot::Failed(err));
                detach(&registry, &parent, serial);
                return;
            }
        }
    }

    if delivered {
        debug!(parent = %parent, "Children stream completed; keeping last listing");
    } else {
        state.send_replace(Slot::Failed(CatalogError::SourceUnavailable(format!(
            "children of '{}' ended without a value",
            parent
        ))));
        detach(&registry, &parent, serial);
    }
}

/// Cache of live children subscriptions, keyed by parent identifier.
///
/// Cloning yields another handle to the same registry. Must be used from
/// within a Tokio runtime.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    shared: Arc<Shared>,
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.shared.lock();
        f.debug_struct("SubscriptionRegistry")
            .field("active", &table.entries.len())
            .field("idle", &table.idle.len())
            .finish()
    }
}

impl SubscriptionRegistry {
    /// Creates a registry over `tree` announcing changes on `events`.
    ///
    /// `idle_capacity` bounds the number of parents kept alive without a
    /// [`ParentSubscription`]; zero is treated as one.
    pub fn new(tree: Arc<CatalogTree>, events: EventBus, idle_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(idle_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            shared: Arc::new(Shared {
                tree,
                events,
                table: Mutex::new(Table {
                    entries: HashMap::new(),
                    idle: LruCache::new(capacity),
                    next_serial: 0,
                }),
            }),
        }
    }

    pub fn tree(&self) -> &Arc<CatalogTree> {
        &self.shared.tree
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    /// Keeps the children of `parent` observed until the guard is dropped.
    pub fn subscribe(&self, parent: &MediaId) -> ParentSubscription {
        let mut table = self.shared.lock();
        let (serial, holders) = {
            let tracked = self.shared.tracked(&mut table, parent);
            tracked.holders += 1;
            (tracked.entry.serial, tracked.holders)
        };
        table.idle.pop(parent);
        debug!(parent = %parent, holders, "Parent subscribed");

        ParentSubscription {
            parent: parent.clone(),
            serial,
            registry: Arc::downgrade(&self.shared),
        }
    }

    /// Current children of `parent`, optionally narrowed to one page.
    ///
    /// Waits for the first listing when the parent is not cached yet. Without
    /// a page the returned listing is the cached one itself.
    pub async fn load_children(&self, parent: &MediaId, page: Option<PageRequest>) -> Result<Children> {
        if !parent.is_browsable() {
            return Err(CatalogError::NotBrowsable(parent.to_string()));
        }

        // Held until the listing settles so eviction cannot cancel it mid-wait
        let entry = self.touch(parent);
        let mut state = entry.state.clone();

        let settled = match state.wait_for(Slot::is_settled).await {
            Ok(slot) => slot.clone(),
            Err(_) => {
                return Err(CatalogError::SourceUnavailable(format!(
                    "loading children of '{}' was cancelled",
                    parent
                )))
            }
        };
        drop(entry);

        match settled {
            Slot::Ready(children) => Ok(match page {
                Some(page) => Arc::new(page.slice(&children)),
                None => children,
            }),
            Slot::Failed(err) => Err(err),
            Slot::Pending => Err(CatalogError::SourceUnavailable(parent.to_string())),
        }
    }

    /// Entry for `parent`, recorded as recently used when no guard holds it.
    fn touch(&self, parent: &MediaId) -> Arc<Entry> {
        let mut table = self.shared.lock();
        let (entry, holders) = {
            let tracked = self.shared.tracked(&mut table, parent);
            (Arc::clone(&tracked.entry), tracked.holders)
        };

        if holders == 0 {
            if let Some((evicted, ())) = table.idle.push(parent.clone(), ()) {
                let unheld = table
                    .entries
                    .get(&evicted)
                    .is_some_and(|tracked| tracked.holders == 0);
                if &evicted != parent && unheld {
                    debug!(parent = %evicted, "Evicting idle subscription");
                    table.entries.remove(&evicted);
                }
            }
        }
        entry
    }

    /// Looks up `id` in the cached listing of its parent.
    ///
    /// Never queries the tree: returns `None` unless the parent is currently
    /// observed and has delivered a listing containing `id`.
    pub fn get_item(&self, id: &MediaId) -> Option<MediaContent> {
        let Some(parent) = id.parent() else {
            return Some(self.shared.tree.root_item());
        };

        let table = self.shared.lock();
        let tracked = table.entries.get(&parent)?;
        let slot = tracked.entry.state.borrow();
        let found = match &*slot {
            Slot::Ready(children) => children.iter().find(|child| child.id() == id).cloned(),
            _ => None,
        };
        found
    }

    /// Whether `parent` currently has a live observation.
    pub fn is_active(&self, parent: &MediaId) -> bool {
        self.shared.lock().entries.contains_key(parent)
    }

    /// Number of parents currently observed.
    pub fn active_count(&self) -> usize {
        self.shared.lock().entries.len()
    }

    /// Identifiers of parents whose listing changed, from now on.
    pub fn updated_parent_ids(&self) -> BoxStream<'static, MediaId> {
        EventStream::new(self.shared.events.subscribe())
            .filter(|event| {
                matches!(
                    event,
                    CoreEvent::Catalog(CatalogEvent::ChildrenUpdated { .. })
                )
            })
            .into_stream()
            .filter_map(|event| {
                let parent = match &event {
                    CoreEvent::Catalog(catalog) => MediaId::parse(catalog.parent_id()).ok(),
                };
                ready(parent)
            })
            .boxed()
    }
}

/// Keeps one parent observed; dropping the last guard cancels the observation.
pub struct ParentSubscription {
    parent: MediaId,
    serial: u64,
    registry: Weak<Shared>,
}

impl ParentSubscription {
    pub fn parent(&self) -> &MediaId {
        &self.parent
    }
}

impl fmt::Debug for ParentSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentSubscription")
            .field("parent", &self.parent.to_string())
            .finish()
    }
}

impl Drop for ParentSubscription {
    fn drop(&mut self) {
        let Some(shared) = self.registry.upgrade() else {
            return;
        };

        let removed = {
            let mut table = shared.lock();
            let released = match table.entries.get_mut(&self.parent) {
                Some(tracked) if tracked.entry.serial == self.serial => {
                    tracked.holders = tracked.holders.saturating_sub(1);
                    tracked.holders == 0
                }
                _ => false,
            };
            if released {
                table.entries.remove(&self.parent)
            } else {
                None
            }
        };

        if removed.is_some() {
            debug!(parent = %self.parent, "Last subscription released; cancelling observation");
        }
    }
}
