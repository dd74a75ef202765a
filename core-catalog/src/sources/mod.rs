//! Children sources of the standard catalog
//!
//! - [`AllTracksSource`], [`RecentlyAddedSource`], [`RankedTracksSource`]:
//!   fixed categories under the tracks type
//! - [`AlbumsSource`], [`ArtistsSource`], [`PlaylistsSource`]: dynamic
//!   categories, one per host album, artist and playlist

mod albums;
mod artists;
mod playlists;
mod tracks;

pub use albums::{album_category, AlbumsSource};
pub use artists::{artist_category, ArtistsSource};
pub use playlists::PlaylistsSource;
pub use tracks::{AllTracksSource, Ranking, RankedTracksSource, RecentlyAddedSource};

use crate::content::{AudioTrack, MediaContent};
use crate::error::{CatalogError, Result};
use crate::id::MediaId;
use bridge_traits::media::{MediaItemId, TrackRecord};

/// Lists `records` as tracks of `parent`, in iteration order.
pub(crate) fn track_listing<'a>(
    parent: &MediaId,
    records: impl IntoIterator<Item = &'a TrackRecord>,
) -> Result<Vec<MediaContent>> {
    records
        .into_iter()
        .map(|record| AudioTrack::from_record(parent, record).map(MediaContent::from))
        .collect()
}

/// Host item id named by a dynamic category, `NotFound` when the category
/// cannot name one.
pub(crate) fn category_item_id(parent: &MediaId) -> Result<MediaItemId> {
    parent
        .category()
        .and_then(|category| category.parse().ok())
        .ok_or_else(|| CatalogError::NotFound(parent.to_string()))
}
