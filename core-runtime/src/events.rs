//! # Event Bus System
//!
//! Broadcasts catalog change notifications using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: [`CoreEvent`] wraps domain-specific event enums
//! - **EventBus**: clonable publisher handle
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ```text
//! ┌──────────────────────┐  emit   ┌───────────┐  subscribe  ┌────────────┐
//! │ SubscriptionRegistry ├────────>│ EventBus  ├────────────>│ Subscriber │
//! └──────────────────────┘         │ (broadcast│             └────────────┘
//!                                  │  channel) ├────────────>┌────────────┐
//!                                  └───────────┘             │ Subscriber │
//!                                                            └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit(CoreEvent::Catalog(CatalogEvent::ChildrenUpdated {
//!     parent_id: "albums/12".to_string(),
//! }))
//! .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Catalog children updated");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind and missed `n` events.
//!   Non-fatal; keep receiving.
//! - **`RecvError::Closed`**: every sender was dropped. Treat as shutdown.

use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall further behind than this receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published through the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Catalog browse tree events
    Catalog(CatalogEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Catalog(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Catalog(CatalogEvent::SubscriptionFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Catalog(CatalogEvent::ChildrenUpdated { .. }) => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Catalog Events
// ============================================================================

/// Events describing changes to browsable catalog nodes.
///
/// Identifiers travel in their encoded string form so events stay
/// serializable across the host boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CatalogEvent {
    /// The children list of a subscribed parent was replaced.
    ChildrenUpdated {
        /// Encoded identifier of the parent node.
        parent_id: String,
    },
    /// An established subscription failed upstream and was dropped.
    SubscriptionFailed {
        /// Encoded identifier of the parent node.
        parent_id: String,
        /// Human-readable error message.
        message: String,
    },
}

impl CatalogEvent {
    fn description(&self) -> &str {
        match self {
            CatalogEvent::ChildrenUpdated { .. } => "Catalog children updated",
            CatalogEvent::SubscriptionFailed { .. } => "Catalog subscription failed",
        }
    }

    /// Encoded identifier of the parent this event concerns.
    pub fn parent_id(&self) -> &str {
        match self {
            CatalogEvent::ChildrenUpdated { parent_id }
            | CatalogEvent::SubscriptionFailed { parent_id, .. } => parent_id,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central publisher for [`CoreEvent`]s.
///
/// Cloning is cheap; every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0. `CoreConfig::validate` rejects such values
    /// before a bus is ever built from configuration.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when nobody is listening.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates an independent receiver for all future events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional filter.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Converts into a `Stream` that ends only when the bus closes.
    ///
    /// Lag notifications are logged and skipped so one slow consumer never
    /// terminates its own stream.
    pub fn into_stream(self) -> BoxStream<'static, CoreEvent> {
        stream::unfold(self, |mut events| async move {
            loop {
                match events.recv().await {
                    Ok(event) => return Some((event, events)),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Event subscriber lagged; skipping missed events");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn updated(parent_id: &str) -> CoreEvent {
        CoreEvent::Catalog(CatalogEvent::ChildrenUpdated {
            parent_id: parent_id.to_string(),
        })
    }

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(updated("albums")).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = updated("albums/3");
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe()).filter(|event| {
            matches!(
                event,
                CoreEvent::Catalog(CatalogEvent::SubscriptionFailed { .. })
            )
        });

        bus.emit(updated("tracks/all")).ok();
        let failure = CoreEvent::Catalog(CatalogEvent::SubscriptionFailed {
            parent_id: "playlists/4".to_string(),
            message: "Permission denied".to_string(),
        });
        bus.emit(failure.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), failure);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(updated(&format!("albums/{}", i))).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[tokio::test]
    async fn test_into_stream_survives_lag() {
        let bus = EventBus::new(2);
        let mut stream = EventStream::new(bus.subscribe()).into_stream();

        for i in 0..5 {
            bus.emit(updated(&format!("albums/{}", i))).ok();
        }

        // The two most recent events are still delivered after the lag
        assert_eq!(stream.next().await.unwrap(), updated("albums/3"));
        assert_eq!(stream.next().await.unwrap(), updated("albums/4"));

        drop(bus);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_event_severity_and_parent() {
        let failure = CatalogEvent::SubscriptionFailed {
            parent_id: "artists/9".to_string(),
            message: "gone".to_string(),
        };
        assert_eq!(failure.parent_id(), "artists/9");
        assert_eq!(
            CoreEvent::Catalog(failure).severity(),
            EventSeverity::Warning
        );
        assert_eq!(updated("root").severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_serialization() {
        let event = updated("albums/12");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("albums/12"));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }
}
