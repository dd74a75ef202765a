use crate::id::MediaId;
use crate::source::{combine_latest, derive, reject_leaf, ChildrenSource, ChildrenStream};
use crate::sources::track_listing;
use bridge_traits::media::{MediaItemId, MediaStore, TrackRecord, UsageStatistics};
use std::collections::HashMap;
use std::sync::Arc;

/// Every track, ordered by title (case-insensitive).
pub struct AllTracksSource {
    store: Arc<dyn MediaStore>,
}

impl AllTracksSource {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }
}

impl ChildrenSource for AllTracksSource {
    fn children(&self, parent: &MediaId) -> ChildrenStream {
        if let Some(rejected) = reject_leaf(parent) {
            return rejected;
        }
        let parent = parent.clone();
        derive(self.store.tracks(), move |mut tracks: Vec<TrackRecord>| {
            tracks.sort_by_cached_key(|track| (track.title.to_lowercase(), track.id));
            track_listing(&parent, &tracks)
        })
    }
}

/// Most recently added tracks first, capped at `limit`.
pub struct RecentlyAddedSource {
    store: Arc<dyn MediaStore>,
    limit: usize,
}

impl RecentlyAddedSource {
    pub fn new(store: Arc<dyn MediaStore>, limit: usize) -> Self {
        Self { store, limit }
    }
}

impl ChildrenSource for RecentlyAddedSource {
    fn children(&self, parent: &MediaId) -> ChildrenStream {
        if let Some(rejected) = reject_leaf(parent) {
            return rejected;
        }
        let parent = parent.clone();
        let limit = self.limit;
        derive(self.store.tracks(), move |mut tracks: Vec<TrackRecord>| {
            tracks.sort_by(|a, b| b.date_added.cmp(&a.date_added).then(b.id.cmp(&a.id)));
            track_listing(&parent, tracks.iter().take(limit))
        })
    }
}

/// Host-maintained ranking a [`RankedTracksSource`] follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ranking {
    MostRated,
    Popular,
}

/// Tracks in the order of a usage ranking.
///
/// Ranked ids the media store does not know are skipped.
pub struct RankedTracksSource {
    store: Arc<dyn MediaStore>,
    statistics: Arc<dyn UsageStatistics>,
    ranking: Ranking,
}

impl RankedTracksSource {
    pub fn new(
        store: Arc<dyn MediaStore>,
        statistics: Arc<dyn UsageStatistics>,
        ranking: Ranking,
    ) -> Self {
        Self {
            store,
            statistics,
            ranking,
        }
    }
}

impl ChildrenSource for RankedTracksSource {
    fn children(&self, parent: &MediaId) -> ChildrenStream {
        if let Some(rejected) = reject_leaf(parent) {
            return rejected;
        }
        let ranking = match self.ranking {
            Ranking::MostRated => self.statistics.most_rated(),
            Ranking::Popular => self.statistics.popular(),
        };
        let parent = parent.clone();
        combine_latest(
            self.store.tracks(),
            ranking,
            move |tracks: &Vec<TrackRecord>, ranked: &Vec<MediaItemId>| {
                let by_id: HashMap<MediaItemId, &TrackRecord> =
                    tracks.iter().map(|track| (track.id, track)).collect();
                track_listing(&parent, ranked.iter().filter_map(|id| by_id.get(id).copied()))
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ids, track};
    use core_library::{InMemoryMediaStore, InMemoryUsageStatistics};
    use futures::StreamExt;

    fn tracks_under(category: &str) -> MediaId {
        MediaId::parse(&format!("tracks/{}", category)).unwrap()
    }

    #[tokio::test]
    async fn test_all_tracks_sorted_by_title() {
        let store = Arc::new(InMemoryMediaStore::new());
        store.set_tracks(vec![track(1, "zebra"), track(2, "Apple"), track(3, "mango")]);

        let source = AllTracksSource::new(store);
        let listing = source.children(&tracks_under("all")).next().await.unwrap().unwrap();
        assert_eq!(ids(&listing), vec!["tracks/all|2", "tracks/all|3", "tracks/all|1"]);
    }

    #[tokio::test]
    async fn test_recent_newest_first_and_capped() {
        let store = Arc::new(InMemoryMediaStore::new());
        let tracks = (1..=5)
            .map(|id| {
                let mut record = track(id, &format!("song {}", id));
                record.date_added = id as i64 * 100;
                record
            })
            .collect();
        store.set_tracks(tracks);

        let source = RecentlyAddedSource::new(store, 3);
        let listing = source.children(&tracks_under("recent")).next().await.unwrap().unwrap();
        assert_eq!(
            ids(&listing),
            vec!["tracks/recent|5", "tracks/recent|4", "tracks/recent|3"]
        );
    }

    #[tokio::test]
    async fn test_ranking_order_kept_and_unknown_ids_skipped() {
        let store = Arc::new(InMemoryMediaStore::new());
        store.set_tracks(vec![track(1, "a"), track(2, "b"), track(3, "c")]);
        let statistics = Arc::new(InMemoryUsageStatistics::new());
        statistics.set_popular(vec![3, 99, 1]);

        let source = RankedTracksSource::new(store, statistics.clone(), Ranking::Popular);
        let mut children = source.children(&tracks_under("popular"));
        let listing = children.next().await.unwrap().unwrap();
        assert_eq!(ids(&listing), vec!["tracks/popular|3", "tracks/popular|1"]);

        statistics.set_popular(vec![2]);
        let listing = children.next().await.unwrap().unwrap();
        assert_eq!(ids(&listing), vec!["tracks/popular|2"]);
    }

    #[tokio::test]
    async fn test_track_parent_not_browsable() {
        let source = AllTracksSource::new(Arc::new(InMemoryMediaStore::new()));
        let result = source
            .children(&MediaId::parse("tracks/all|1").unwrap())
            .next()
            .await
            .unwrap();
        assert!(matches!(result, Err(crate::CatalogError::NotBrowsable(_))));
    }
}
