use crate::content::{MediaCategory, MediaContent};
use crate::error::{CatalogError, Result};
use crate::id::MediaId;
use crate::source::{combine_latest, derive, fail, reject_leaf, ChildrenSource, ChildrenStream};
use crate::sources::{category_item_id, track_listing};
use bridge_traits::media::{MediaItemId, MediaStore, PlaylistRecord, TrackRecord};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Track ids of `playlist` in order, each listed once at its first position.
fn distinct_entries(playlist: &PlaylistRecord) -> impl Iterator<Item = MediaItemId> + '_ {
    let mut seen = HashSet::new();
    playlist
        .track_ids
        .iter()
        .copied()
        .filter(move |id| seen.insert(*id))
}

fn playlist_category(playlists_type: &MediaId, playlist: &PlaylistRecord) -> Result<MediaCategory> {
    let entries = distinct_entries(playlist).count();
    Ok(
        MediaCategory::new(playlists_type.category_of(&playlist.id.to_string())?, playlist.title.clone())
            .playable(entries > 0)
            .with_child_count(entries as u32),
    )
}

/// One category per playlist; each lists tracks in playlist order.
///
/// Playlist entries whose track no longer exists are skipped, and a track
/// listed more than once appears only at its first position, so every child
/// identifier is unique. A playlist that exists but holds no tracks is a
/// valid, empty category.
pub struct PlaylistsSource {
    store: Arc<dyn MediaStore>,
}

impl PlaylistsSource {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }
}

impl ChildrenSource for PlaylistsSource {
    fn children(&self, parent: &MediaId) -> ChildrenStream {
        if let Some(rejected) = reject_leaf(parent) {
            return rejected;
        }

        let parent = parent.clone();
        if parent.category().is_none() {
            return derive(self.store.playlists(), move |playlists: Vec<PlaylistRecord>| {
                playlists
                    .iter()
                    .map(|playlist| playlist_category(&parent, playlist).map(MediaContent::from))
                    .collect()
            });
        }

        let playlist_id = match category_item_id(&parent) {
            Ok(id) => id,
            Err(err) => return fail(err),
        };
        combine_latest(
            self.store.playlists(),
            self.store.tracks(),
            move |playlists: &Vec<PlaylistRecord>, tracks: &Vec<TrackRecord>| {
                let playlist = playlists
                    .iter()
                    .find(|playlist| playlist.id == playlist_id)
                    .ok_or_else(|| CatalogError::NotFound(parent.to_string()))?;
                let by_id: HashMap<MediaItemId, &TrackRecord> =
                    tracks.iter().map(|track| (track.id, track)).collect();
                track_listing(
                    &parent,
                    distinct_entries(playlist).filter_map(|id| by_id.get(&id).copied()),
                )
            },
        )
    }
}
