use crate::content::{MediaCategory, MediaContent};
use crate::error::{CatalogError, Result};
use crate::id::MediaId;
use crate::source::{derive, fail, reject_leaf, ChildrenSource, ChildrenStream};
use crate::sources::{category_item_id, track_listing};
use bridge_traits::media::{AlbumRecord, MediaStore, TrackRecord};
use std::sync::Arc;

/// Browsable entry for one album under the type identifier `albums_type`.
pub fn album_category(albums_type: &MediaId, album: &AlbumRecord) -> Result<MediaCategory> {
    Ok(
        MediaCategory::new(albums_type.category_of(&album.id.to_string())?, album.title.clone())
            .with_subtitle(album.artist.clone())
            .with_icon(album.album_art_uri.clone())
            .playable(true)
            .with_child_count(album.track_count),
    )
}

/// One category per album; each lists the album's tracks by disc and track
/// number.
///
/// An album without tracks is reported as `NotFound`.
pub struct AlbumsSource {
    store: Arc<dyn MediaStore>,
}

impl AlbumsSource {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }

    fn albums(&self, albums_type: MediaId) -> ChildrenStream {
        derive(self.store.albums(), move |mut albums: Vec<AlbumRecord>| {
            albums.sort_by_cached_key(|album| (album.title.to_lowercase(), album.id));
            albums
                .iter()
                .map(|album| album_category(&albums_type, album).map(MediaContent::from))
                .collect()
        })
    }

    fn album_tracks(&self, album: MediaId) -> ChildrenStream {
        let album_id = match category_item_id(&album) {
            Ok(id) => id,
            Err(err) => return fail(err),
        };
        derive(self.store.tracks(), move |tracks: Vec<TrackRecord>| {
            let mut tracks: Vec<&TrackRecord> =
                tracks.iter().filter(|track| track.album_id == album_id).collect();
            if tracks.is_empty() {
                return Err(CatalogError::NotFound(album.to_string()));
            }
            tracks.sort_by_key(|track| (track.disc_number, track.track_number, track.id));
            track_listing(&album, tracks)
        })
    }
}

impl ChildrenSource for AlbumsSource {
    fn children(&self, parent: &MediaId) -> ChildrenStream {
        if let Some(rejected) = reject_leaf(parent) {
            return rejected;
        }
        match parent.category() {
            None => self.albums(parent.clone()),
            Some(_) => self.album_tracks(parent.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{album, ids, track_on};
    use core_library::InMemoryMediaStore;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_albums_listed_as_playable_categories() {
        let store = Arc::new(InMemoryMediaStore::new());
        store.set_albums(vec![album(7, "Wish You Were Here"), album(3, "Animals")]);

        let source = AlbumsSource::new(store);
        let listing = source
            .children(&MediaId::of_type("albums").unwrap())
            .next()
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ids(&listing), vec!["albums/3", "albums/7"]);
        assert!(listing.iter().all(|item| item.is_browsable() && item.is_playable()));
    }

    #[tokio::test]
    async fn test_album_tracks_ordered_by_disc_then_number() {
        let store = Arc::new(InMemoryMediaStore::new());
        store.set_tracks(vec![
            track_on(1, "Side B opener", 3, 2, 1),
            track_on(2, "Closer", 3, 1, 9),
            track_on(3, "Opener", 3, 1, 1),
            track_on(4, "Elsewhere", 8, 1, 1),
        ]);

        let source = AlbumsSource::new(store);
        let listing = source
            .children(&MediaId::parse("albums/3").unwrap())
            .next()
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ids(&listing), vec!["albums/3|3", "albums/3|2", "albums/3|1"]);
    }

    #[tokio::test]
    async fn test_unknown_or_empty_album_not_found() {
        let store = Arc::new(InMemoryMediaStore::new());
        store.set_tracks(vec![track_on(1, "Only", 3, 1, 1)]);
        let source = AlbumsSource::new(store);

        for parent in ["albums/4", "albums/abc"] {
            let result = source
                .children(&MediaId::parse(parent).unwrap())
                .next()
                .await
                .unwrap();
            assert!(matches!(result, Err(CatalogError::NotFound(_))), "{}", parent);
        }
    }
}
