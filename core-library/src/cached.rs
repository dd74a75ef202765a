//! Shared observation of the host media store

use crate::snapshot::SnapshotCache;
use bridge_traits::media::{
    AlbumRecord, ArtistRecord, LiveStream, MediaStore, PlaylistRecord, TrackRecord,
};
use futures::StreamExt;
use std::sync::Arc;

/// `MediaStore` decorator backed by one [`SnapshotCache`] per collection.
///
/// However many catalog nodes observe the tracks collection, the host is
/// queried through a single stream, and a node subscribed late is served the
/// current list without waiting for the next change.
#[derive(Clone, Debug)]
pub struct CachedMediaStore {
    tracks: SnapshotCache<Vec<TrackRecord>>,
    albums: SnapshotCache<Vec<AlbumRecord>>,
    artists: SnapshotCache<Vec<ArtistRecord>>,
    playlists: SnapshotCache<Vec<PlaylistRecord>>,
}

impl CachedMediaStore {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        let tracks_store = Arc::clone(&store);
        let albums_store = Arc::clone(&store);
        let artists_store = Arc::clone(&store);
        let playlists_store = store;

        Self {
            tracks: SnapshotCache::new("tracks", move || tracks_store.tracks()),
            albums: SnapshotCache::new("albums", move || albums_store.albums()),
            artists: SnapshotCache::new("artists", move || artists_store.artists()),
            playlists: SnapshotCache::new("playlists", move || playlists_store.playlists()),
        }
    }
}

impl MediaStore for CachedMediaStore {
    fn tracks(&self) -> LiveStream<Vec<TrackRecord>> {
        self.tracks.subscribe().boxed()
    }

    fn albums(&self) -> LiveStream<Vec<AlbumRecord>> {
        self.albums.subscribe().boxed()
    }

    fn artists(&self) -> LiveStream<Vec<ArtistRecord>> {
        self.artists.subscribe().boxed()
    }

    fn playlists(&self) -> LiveStream<Vec<PlaylistRecord>> {
        self.playlists.subscribe().boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use mockall::mock;

    mock! {
        Store {}

        impl MediaStore for Store {
            fn tracks(&self) -> LiveStream<Vec<TrackRecord>>;
            fn albums(&self) -> LiveStream<Vec<AlbumRecord>>;
            fn artists(&self) -> LiveStream<Vec<ArtistRecord>>;
            fn playlists(&self) -> LiveStream<Vec<PlaylistRecord>>;
        }
    }

    fn artist(id: u64, name: &str) -> ArtistRecord {
        ArtistRecord {
            id,
            name: name.to_string(),
            album_count: 1,
            track_count: 3,
        }
    }

    #[tokio::test]
    async fn test_host_is_observed_once_for_concurrent_readers() {
        let mut store = MockStore::new();
        store.expect_artists().times(1).returning(|| {
            stream::once(async { Ok(vec![artist(1, "Foo Fighters")]) })
                .chain(stream::pending())
                .boxed()
        });

        let cached = CachedMediaStore::new(Arc::new(store));
        let mut first = cached.artists();
        let mut second = cached.artists();

        assert_eq!(first.next().await.unwrap().unwrap()[0].name, "Foo Fighters");
        assert_eq!(second.next().await.unwrap().unwrap()[0].name, "Foo Fighters");
    }
}
