use crate::content::{MediaCategory, MediaContent};
use crate::error::{CatalogError, Result};
use crate::id::MediaId;
use crate::source::{derive, fail, reject_leaf, ChildrenSource, ChildrenStream};
use crate::sources::{category_item_id, track_listing};
use bridge_traits::media::{ArtistRecord, MediaStore, TrackRecord};
use std::sync::Arc;

/// Browsable entry for one artist under the type identifier `artists_type`.
pub fn artist_category(artists_type: &MediaId, artist: &ArtistRecord) -> Result<MediaCategory> {
    let albums = match artist.album_count {
        1 => "1 album".to_string(),
        n => format!("{} albums", n),
    };
    Ok(
        MediaCategory::new(artists_type.category_of(&artist.id.to_string())?, artist.name.clone())
            .with_subtitle(albums)
            .playable(true)
            .with_child_count(artist.track_count),
    )
}

/// One category per artist; each lists the artist's tracks grouped by album.
pub struct ArtistsSource {
    store: Arc<dyn MediaStore>,
}

impl ArtistsSource {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }
}

impl ChildrenSource for ArtistsSource {
    fn children(&self, parent: &MediaId) -> ChildrenStream {
        if let Some(rejected) = reject_leaf(parent) {
            return rejected;
        }

        let parent = parent.clone();
        if parent.category().is_none() {
            return derive(self.store.artists(), move |mut artists: Vec<ArtistRecord>| {
                artists.sort_by_cached_key(|artist| (artist.name.to_lowercase(), artist.id));
                artists
                    .iter()
                    .map(|artist| artist_category(&parent, artist).map(MediaContent::from))
                    .collect()
            });
        }

        let artist_id = match category_item_id(&parent) {
            Ok(id) => id,
            Err(err) => return fail(err),
        };
        derive(self.store.tracks(), move |tracks: Vec<TrackRecord>| {
            let mut tracks: Vec<&TrackRecord> =
                tracks.iter().filter(|track| track.artist_id == artist_id).collect();
            if tracks.is_empty() {
                return Err(CatalogError::NotFound(parent.to_string()));
            }
            tracks.sort_by_cached_key(|track| {
                (track.album.to_lowercase(), track.disc_number, track.track_number, track.id)
            });
            track_listing(&parent, tracks)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ids, track};
    use core_library::InMemoryMediaStore;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_artist_tracks_grouped_by_album() {
        let store = Arc::new(InMemoryMediaStore::new());
        let mut records = vec![track(1, "Money"), track(2, "Breathe"), track(3, "Dogs"), track(4, "Other")];
        for (record, (album, number)) in records
            .iter_mut()
            .zip([("The Dark Side of the Moon", 6), ("The Dark Side of the Moon", 2), ("Animals", 3), ("X", 1)])
        {
            record.album = album.to_string();
            record.track_number = number;
            record.artist_id = 5;
        }
        records[3].artist_id = 6;
        store.set_tracks(records);

        let source = ArtistsSource::new(store);
        let listing = source
            .children(&MediaId::parse("artists/5").unwrap())
            .next()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ids(&listing), vec!["artists/5|3", "artists/5|2", "artists/5|1"]);
    }

    #[tokio::test]
    async fn test_artist_categories() {
        let store = Arc::new(InMemoryMediaStore::new());
        store.set_artists(vec![ArtistRecord {
            id: 5,
            name: "Pink Floyd".to_string(),
            album_count: 1,
            track_count: 3,
        }]);

        let source = ArtistsSource::new(store);
        let listing = source
            .children(&MediaId::of_type("artists").unwrap())
            .next()
            .await
            .unwrap()
            .unwrap();
        match &listing[0] {
            MediaContent::Category(category) => {
                assert_eq!(category.id.to_string(), "artists/5");
                assert_eq!(category.subtitle.as_deref(), Some("1 album"));
                assert_eq!(category.child_count, Some(3));
            }
            other => panic!("expected a category, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_artist_without_tracks_not_found() {
        let source = ArtistsSource::new(Arc::new(InMemoryMediaStore::new()));
        let result = source
            .children(&MediaId::parse("artists/5").unwrap())
            .next()
            .await
            .unwrap();
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }
}
