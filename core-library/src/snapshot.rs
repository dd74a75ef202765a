//! Latest-value replay for live collections
//!
//! A [`SnapshotCache`] owns one slot for one upstream live stream. The first
//! subscriber starts the upstream observation; every emission overwrites the
//! slot and is fanned out to all current subscribers in upstream order. A
//! subscriber that arrives after the first emission receives the slot's value
//! immediately, before any later upstream emission.
//!
//! The slot only holds a value while the upstream is observed. Once the
//! observation stops (last subscriber gone, upstream ended or failed) the slot
//! is cleared, and the next subscriber waits for the upstream's fresh value.
//!
//! The slot and the subscriber list share one mutex, held only for the
//! in-memory fan-out and never across an `.await`.

use bridge_traits::error::Result;
use bridge_traits::media::LiveStream;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::stream::{Stream, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

type Connect<T> = Box<dyn Fn() -> LiveStream<T> + Send + Sync>;

struct Subscriber<T> {
    id: u64,
    sender: UnboundedSender<Result<T>>,
}

struct Slot<T> {
    latest: Option<T>,
    subscribers: Vec<Subscriber<T>>,
    next_subscriber_id: u64,
    /// Bumped every time the upstream observation is stopped, so a pump that
    /// was cancelled mid-iteration can recognise it is stale.
    generation: u64,
    pump: Option<JoinHandle<()>>,
}

impl<T> Slot<T> {
    /// Ends the current observation; nothing observed so far is replayed.
    fn stop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.latest = None;
        self.generation += 1;
    }
}

struct Shared<T> {
    key: &'static str,
    connect: Connect<T>,
    slot: Mutex<Slot<T>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // A panic while fanning out cannot leave the slot half-written
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Memoizing wrapper around one upstream live stream.
///
/// Cloning yields another handle to the same slot.
pub struct SnapshotCache<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for SnapshotCache<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for SnapshotCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.shared.lock();
        f.debug_struct("SnapshotCache")
            .field("key", &self.shared.key)
            .field("has_value", &slot.latest.is_some())
            .field("subscribers", &slot.subscribers.len())
            .finish()
    }
}

impl<T> SnapshotCache<T>
where
    T: Clone + Send + 'static,
{
    /// Creates a cache for the stream produced by `connect`.
    ///
    /// `connect` is invoked whenever the upstream observation has to be
    /// (re)started: on the first subscription, and after the last subscriber
    /// left or the upstream ended.
    pub fn new<F>(key: &'static str, connect: F) -> Self
    where
        F: Fn() -> LiveStream<T> + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                key,
                connect: Box::new(connect),
                slot: Mutex::new(Slot {
                    latest: None,
                    subscribers: Vec::new(),
                    next_subscriber_id: 0,
                    generation: 0,
                    pump: None,
                }),
            }),
        }
    }

    /// Most recently observed value of the running observation, or `None`
    /// when nothing is observed or nothing was emitted yet.
    pub fn latest(&self) -> Option<T> {
        self.shared.lock().latest.clone()
    }

    /// Number of live subscriber streams.
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers.len()
    }

    /// Subscribes to the cached stream.
    ///
    /// Must be called from within a Tokio runtime: the first subscriber spawns
    /// the task observing the upstream.
    pub fn subscribe(&self) -> SnapshotStream<T> {
        let (sender, receiver) = mpsc::unbounded();
        let mut slot = self.shared.lock();

        if let Some(latest) = &slot.latest {
            // Receiver is held locally, the send cannot fail
            let _ = sender.unbounded_send(Ok(latest.clone()));
        }

        let id = slot.next_subscriber_id;
        slot.next_subscriber_id += 1;
        slot.subscribers.push(Subscriber { id, sender });

        if slot.pump.is_none() {
            debug!(key = self.shared.key, "Starting upstream observation");
            let generation = slot.generation;
            let shared = Arc::clone(&self.shared);
            slot.pump = Some(tokio::spawn(pump(shared, generation)));
        }

        SnapshotStream {
            receiver,
            id,
            shared: Arc::clone(&self.shared),
        }
    }
}

async fn pump<T>(shared: Arc<Shared<T>>, generation: u64)
where
    T: Clone + Send + 'static,
{
    let mut upstream = (shared.connect)();

    while let Some(item) = upstream.next().await {
        let mut slot = shared.lock();
        if slot.generation != generation {
            return;
        }

        match item {
            Ok(value) => {
                trace!(key = shared.key, subscribers = slot.subscribers.len(), "Upstream emitted");
                slot.subscribers
                    .retain(|subscriber| subscriber.sender.unbounded_send(Ok(value.clone())).is_ok());
                slot.latest = Some(value);
            }
            Err(err) => {
                warn!(key = shared.key, error = %err, "Upstream failed");
                for subscriber in slot.subscribers.drain(..) {
                    let _ = subscriber.sender.unbounded_send(Err(err.clone()));
                }
                slot.stop();
                return;
            }
        }
    }

    let mut slot = shared.lock();
    if slot.generation == generation {
        debug!(key = shared.key, "Upstream completed");
        slot.subscribers.clear();
        slot.stop();
    }
}

/// Subscriber side of a [`SnapshotCache`].
///
/// Dropping the last stream of a cache cancels the upstream observation and
/// clears the cached value.
pub struct SnapshotStream<T> {
    receiver: UnboundedReceiver<Result<T>>,
    id: u64,
    shared: Arc<Shared<T>>,
}

impl<T> Stream for SnapshotStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}

impl<T> Drop for SnapshotStream<T> {
    fn drop(&mut self) {
        let mut slot = self.shared.lock();
        slot.subscribers.retain(|subscriber| subscriber.id != self.id);

        if slot.subscribers.is_empty() && slot.pump.is_some() {
            debug!(key = self.shared.key, "Last subscriber left; stopping upstream observation");
            slot.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::BridgeError;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc as tokio_mpsc;
    use tokio::sync::watch;

    /// Upstream fed by hand through a Tokio channel.
    fn manual_upstream() -> (
        tokio_mpsc::UnboundedSender<Result<u32>>,
        Arc<Mutex<Option<tokio_mpsc::UnboundedReceiver<Result<u32>>>>>,
    ) {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        (tx, Arc::new(Mutex::new(Some(rx))))
    }

    fn cache_over(
        receiver: Arc<Mutex<Option<tokio_mpsc::UnboundedReceiver<Result<u32>>>>>,
        connects: Arc<AtomicUsize>,
    ) -> SnapshotCache<u32> {
        SnapshotCache::new("numbers", move || {
            connects.fetch_add(1, Ordering::SeqCst);
            let rx = receiver.lock().unwrap().take();
            match rx {
                Some(rx) => futures::stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|item| (item, rx))
                })
                .boxed(),
                None => futures::stream::pending().boxed(),
            }
        })
    }

    #[tokio::test]
    async fn test_late_subscriber_receives_latest_first() {
        let (tx, rx) = manual_upstream();
        let cache = cache_over(rx, Arc::new(AtomicUsize::new(0)));

        let mut early = cache.subscribe();
        tx.send(Ok(1)).unwrap();
        tx.send(Ok(2)).unwrap();
        assert_eq!(early.next().await.unwrap().unwrap(), 1);
        assert_eq!(early.next().await.unwrap().unwrap(), 2);

        let mut late = cache.subscribe();
        assert_eq!(late.next().await.unwrap().unwrap(), 2);

        tx.send(Ok(3)).unwrap();
        assert_eq!(late.next().await.unwrap().unwrap(), 3);
        assert_eq!(early.next().await.unwrap().unwrap(), 3);
        assert_eq!(cache.latest(), Some(3));
    }

    #[tokio::test]
    async fn test_no_value_before_first_emission() {
        let (_tx, rx) = manual_upstream();
        let cache = cache_over(rx, Arc::new(AtomicUsize::new(0)));

        let mut stream = cache.subscribe();
        assert_eq!(cache.latest(), None);
        assert!(stream.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn test_upstream_is_shared_between_subscribers() {
        let (tx, rx) = manual_upstream();
        let connects = Arc::new(AtomicUsize::new(0));
        let cache = cache_over(rx, Arc::clone(&connects));

        let mut a = cache.subscribe();
        let mut b = cache.subscribe();
        tx.send(Ok(10)).unwrap();

        assert_eq!(a.next().await.unwrap().unwrap(), 10);
        assert_eq!(b.next().await.unwrap().unwrap(), 10);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(cache.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_errors_are_forwarded_and_end_streams() {
        let (tx, rx) = manual_upstream();
        let cache = cache_over(rx, Arc::new(AtomicUsize::new(0)));

        let mut stream = cache.subscribe();
        tx.send(Ok(5)).unwrap();
        tx.send(Err(BridgeError::PermissionDenied("storage".to_string())))
            .unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), 5);
        assert!(matches!(
            stream.next().await,
            Some(Err(BridgeError::PermissionDenied(_)))
        ));
        assert!(stream.next().await.is_none());
        assert_eq!(cache.latest(), None);
    }

    #[tokio::test]
    async fn test_last_unsubscribe_stops_upstream() {
        let (tx, rx) = manual_upstream();
        let connects = Arc::new(AtomicUsize::new(0));
        let cache = cache_over(rx, Arc::clone(&connects));

        let mut stream = cache.subscribe();
        tx.send(Ok(1)).unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        drop(stream);
        assert_eq!(cache.subscriber_count(), 0);
        assert_eq!(cache.latest(), None);

        let _again = cache.subscribe();
        tokio::task::yield_now().await;
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resubscribe_sees_changes_made_while_idle() {
        let (tx, rx) = watch::channel(vec![1u32]);
        let cache = SnapshotCache::new("numbers", move || {
            let rx = rx.clone();
            futures::stream::unfold((rx, true), |(mut rx, first)| async move {
                if !first {
                    rx.changed().await.ok()?;
                }
                let value = rx.borrow_and_update().clone();
                Some((Ok(value), (rx, false)))
            })
            .boxed()
        });

        let mut stream = cache.subscribe();
        assert_eq!(stream.next().await.unwrap().unwrap(), vec![1]);
        drop(stream);

        tx.send_replace(vec![1, 2]);

        let mut again = cache.subscribe();
        assert_eq!(again.next().await.unwrap().unwrap(), vec![1, 2]);
    }
}
