//! In-process media store
//!
//! Backs each collection with a `tokio::sync::watch` channel. Readers get the
//! current list immediately and a fresh list after every mutation; rapid
//! successive mutations may be coalesced into the latest list.

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::media::{
    AlbumRecord, ArtistRecord, LiveStream, MediaItemId, MediaStore, PlaylistRecord, TrackRecord,
    UsageStatistics,
};
use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tracing::debug;

type Collection<T> = std::result::Result<Vec<T>, BridgeError>;

fn live<T>(receiver: watch::Receiver<Collection<T>>) -> LiveStream<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    // State: (receiver, first emission pending, stream finished)
    stream::unfold((receiver, true, false), |(mut receiver, first, done)| async move {
        if done {
            return None;
        }
        if !first {
            receiver.changed().await.ok()?;
        }
        let value = receiver.borrow_and_update().clone();
        let failed = value.is_err();
        Some((value, (receiver, false, failed)))
    })
    .boxed()
}

fn publish<T>(sender: &watch::Sender<Collection<T>>, value: Vec<T>) {
    sender.send_replace(Ok(value));
}

/// Mutable media store living in process memory.
///
/// Every mutator replaces the full collection and notifies live readers.
pub struct InMemoryMediaStore {
    tracks: watch::Sender<Collection<TrackRecord>>,
    albums: watch::Sender<Collection<AlbumRecord>>,
    artists: watch::Sender<Collection<ArtistRecord>>,
    playlists: watch::Sender<Collection<PlaylistRecord>>,
}

impl Default for InMemoryMediaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMediaStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            tracks: watch::channel(Ok(Vec::new())).0,
            albums: watch::channel(Ok(Vec::new())).0,
            artists: watch::channel(Ok(Vec::new())).0,
            playlists: watch::channel(Ok(Vec::new())).0,
        }
    }

    pub fn set_tracks(&self, tracks: Vec<TrackRecord>) {
        debug!(count = tracks.len(), "Replacing tracks");
        publish(&self.tracks, tracks);
    }

    pub fn set_albums(&self, albums: Vec<AlbumRecord>) {
        debug!(count = albums.len(), "Replacing albums");
        publish(&self.albums, albums);
    }

    pub fn set_artists(&self, artists: Vec<ArtistRecord>) {
        debug!(count = artists.len(), "Replacing artists");
        publish(&self.artists, artists);
    }

    pub fn set_playlists(&self, playlists: Vec<PlaylistRecord>) {
        debug!(count = playlists.len(), "Replacing playlists");
        publish(&self.playlists, playlists);
    }

    /// Appends a track, keeping the rest of the collection.
    pub fn add_track(&self, track: TrackRecord) {
        self.tracks.send_modify(|tracks| {
            if let Ok(tracks) = tracks {
                tracks.push(track);
            }
        });
    }

    /// Makes every collection fail with `PermissionDenied`, as a host does when
    /// storage access is revoked. Live readers receive the error and end.
    pub fn revoke_access(&self, reason: &str) {
        debug!(reason, "Revoking media access");
        let err = BridgeError::PermissionDenied(reason.to_string());
        self.tracks.send_replace(Err(err.clone()));
        self.albums.send_replace(Err(err.clone()));
        self.artists.send_replace(Err(err.clone()));
        self.playlists.send_replace(Err(err));
    }
}

impl MediaStore for InMemoryMediaStore {
    fn tracks(&self) -> LiveStream<Vec<TrackRecord>> {
        live(self.tracks.subscribe())
    }

    fn albums(&self) -> LiveStream<Vec<AlbumRecord>> {
        live(self.albums.subscribe())
    }

    fn artists(&self) -> LiveStream<Vec<ArtistRecord>> {
        live(self.artists.subscribe())
    }

    fn playlists(&self) -> LiveStream<Vec<PlaylistRecord>> {
        live(self.playlists.subscribe())
    }
}

/// Mutable usage rankings living in process memory.
pub struct InMemoryUsageStatistics {
    most_rated: watch::Sender<Collection<MediaItemId>>,
    popular: watch::Sender<Collection<MediaItemId>>,
}

impl Default for InMemoryUsageStatistics {
    fn default() -> Self {
        Self {
            most_rated: watch::channel(Ok(Vec::new())).0,
            popular: watch::channel(Ok(Vec::new())).0,
        }
    }
}

impl InMemoryUsageStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_most_rated(&self, ranking: Vec<MediaItemId>) {
        publish(&self.most_rated, ranking);
    }

    pub fn set_popular(&self, ranking: Vec<MediaItemId>) {
        publish(&self.popular, ranking);
    }
}

impl UsageStatistics for InMemoryUsageStatistics {
    fn most_rated(&self) -> LiveStream<Vec<MediaItemId>> {
        live(self.most_rated.subscribe())
    }

    fn popular(&self) -> LiveStream<Vec<MediaItemId>> {
        live(self.popular.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn playlist(id: u64, title: &str) -> PlaylistRecord {
        PlaylistRecord {
            id,
            title: title.to_string(),
            track_ids: vec![],
        }
    }

    #[tokio::test]
    async fn test_reader_gets_current_then_updates() {
        let store = InMemoryMediaStore::new();
        store.set_playlists(vec![playlist(1, "Workout")]);

        let mut playlists = store.playlists();
        assert_eq!(playlists.next().await.unwrap().unwrap().len(), 1);
        assert!(playlists.next().now_or_never().is_none());

        store.set_playlists(vec![playlist(1, "Workout"), playlist(2, "Chill")]);
        assert_eq!(playlists.next().await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_revoked_access_fails_and_ends_stream() {
        let store = InMemoryMediaStore::new();
        let mut albums = store.albums();
        assert!(albums.next().await.unwrap().unwrap().is_empty());

        store.revoke_access("READ_MEDIA_AUDIO not granted");
        let err = albums.next().await.unwrap().unwrap_err();
        assert!(err.is_permission_denied());
        assert!(albums.next().await.is_none());
    }

    #[tokio::test]
    async fn test_usage_rankings() {
        let stats = InMemoryUsageStatistics::new();
        stats.set_popular(vec![3, 1, 2]);

        let mut popular = stats.popular();
        assert_eq!(popular.next().await.unwrap().unwrap(), vec![3, 1, 2]);
    }
}
