//! Media Store Abstractions
//!
//! The host platform owns on-device media storage. The core never reads files or
//! queries the OS media index itself; it consumes the host's collections as live
//! streams that re-emit the full collection whenever anything in it changes.
//!
//! # Contract
//!
//! - Every stream yields the current full list first, then a new full list after
//!   each change. Streams are perpetual until dropped.
//! - Dropping a stream cancels the underlying observation.
//! - Access failures (e.g. storage permission revoked) are reported as an `Err`
//!   item, after which the stream ends.

use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Host-assigned numeric identifier of a track, album, artist or playlist.
pub type MediaItemId = u64;

/// Live view of a host collection.
pub type LiveStream<T> = BoxStream<'static, Result<T>>;

/// A playable audio file known to the host media index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: MediaItemId,
    pub title: String,
    /// Display name of the performing artist
    pub artist: String,
    pub artist_id: MediaItemId,
    /// Display name of the album this track belongs to
    pub album: String,
    pub album_id: MediaItemId,
    /// Disc number for multi-disc albums (1-based, 0 when unknown)
    pub disc_number: u32,
    /// Track position on its disc (0 when unknown)
    pub track_number: u32,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Location the playback layer resolves to open the file
    pub media_uri: String,
    pub album_art_uri: Option<String>,
    /// When the file became available on the device (Unix epoch seconds)
    pub date_added: i64,
}

/// Album as reported by the host media index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRecord {
    pub id: MediaItemId,
    pub title: String,
    /// Album artist display name
    pub artist: String,
    pub track_count: u32,
    pub album_art_uri: Option<String>,
}

/// Artist as reported by the host media index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub id: MediaItemId,
    pub name: String,
    pub album_count: u32,
    pub track_count: u32,
}

/// User playlist. Track order is the playback order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRecord {
    pub id: MediaItemId,
    pub title: String,
    pub track_ids: Vec<MediaItemId>,
}

/// Read-only access to the host's media collections.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::media::MediaStore;
/// use futures::StreamExt;
///
/// async fn count_tracks(store: &dyn MediaStore) -> usize {
///     match store.tracks().next().await {
///         Some(Ok(tracks)) => tracks.len(),
///         _ => 0,
///     }
/// }
/// ```
pub trait MediaStore: Send + Sync {
    /// All tracks, re-emitted on any change.
    fn tracks(&self) -> LiveStream<Vec<TrackRecord>>;

    /// All albums, re-emitted on any change.
    fn albums(&self) -> LiveStream<Vec<AlbumRecord>>;

    /// All artists, re-emitted on any change.
    fn artists(&self) -> LiveStream<Vec<ArtistRecord>>;

    /// All playlists, re-emitted on any change.
    fn playlists(&self) -> LiveStream<Vec<PlaylistRecord>>;
}

/// Listening statistics maintained by the host.
///
/// The order of each list is authoritative: the core presents tracks exactly in
/// the order supplied here.
pub trait UsageStatistics: Send + Sync {
    /// Track ids ordered from highest to lowest user rating.
    fn most_rated(&self) -> LiveStream<Vec<MediaItemId>>;

    /// Track ids ordered from most to least played.
    fn popular(&self) -> LiveStream<Vec<MediaItemId>>;
}

/// Statistics source used when the host does not track usage.
///
/// Emits a single empty ranking and then stays open.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUsageStatistics;

impl NoUsageStatistics {
    fn empty() -> LiveStream<Vec<MediaItemId>> {
        stream::once(async { Ok(Vec::new()) })
            .chain(stream::pending())
            .boxed()
    }
}

impl UsageStatistics for NoUsageStatistics {
    fn most_rated(&self) -> LiveStream<Vec<MediaItemId>> {
        Self::empty()
    }

    fn popular(&self) -> LiveStream<Vec<MediaItemId>> {
        Self::empty()
    }
}
