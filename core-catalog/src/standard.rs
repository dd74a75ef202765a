//! The catalog hierarchy served to media browsers
//!
//! ```text
//! root
//! ├── tracks      all | recent | rated | popular
//! ├── albums      one category per album
//! ├── artists     one category per artist
//! └── playlists   one category per playlist
//! ```

use crate::error::Result;
use crate::sources::{
    AlbumsSource, AllTracksSource, ArtistsSource, PlaylistsSource, RankedTracksSource, Ranking,
    RecentlyAddedSource,
};
use crate::tree::{CatalogTree, NodeInfo};
use bridge_traits::media::{MediaStore, UsageStatistics};
use core_runtime::config::CatalogSettings;
use std::sync::Arc;

pub const TRACKS_TYPE: &str = "tracks";
pub const ALBUMS_TYPE: &str = "albums";
pub const ARTISTS_TYPE: &str = "artists";
pub const PLAYLISTS_TYPE: &str = "playlists";

pub const ALL_TRACKS_CATEGORY: &str = "all";
pub const RECENT_TRACKS_CATEGORY: &str = "recent";
pub const MOST_RATED_CATEGORY: &str = "rated";
pub const POPULAR_CATEGORY: &str = "popular";

/// Builds the standard tree over the host collections.
pub fn standard_tree(
    store: Arc<dyn MediaStore>,
    statistics: Arc<dyn UsageStatistics>,
    settings: &CatalogSettings,
) -> Result<CatalogTree> {
    let all = Arc::new(AllTracksSource::new(Arc::clone(&store)));
    let recent = Arc::new(RecentlyAddedSource::new(
        Arc::clone(&store),
        settings.recent_tracks_limit,
    ));
    let rated = Arc::new(RankedTracksSource::new(
        Arc::clone(&store),
        Arc::clone(&statistics),
        Ranking::MostRated,
    ));
    let popular = Arc::new(RankedTracksSource::new(
        Arc::clone(&store),
        statistics,
        Ranking::Popular,
    ));

    CatalogTree::builder()
        .root_info(NodeInfo::new("Library"))
        .media_type(TRACKS_TYPE, NodeInfo::new("Tracks"), |tracks| {
            tracks
                .category(ALL_TRACKS_CATEGORY, NodeInfo::new("All tracks").playable(true), all)
                .category(
                    RECENT_TRACKS_CATEGORY,
                    NodeInfo::new("Recently added").playable(true),
                    recent,
                )
                .category(MOST_RATED_CATEGORY, NodeInfo::new("Most rated").playable(true), rated)
                .category(POPULAR_CATEGORY, NodeInfo::new("Popular").playable(true), popular)
        })
        .media_type(ALBUMS_TYPE, NodeInfo::new("Albums"), |albums| {
            albums.dynamic(Arc::new(AlbumsSource::new(Arc::clone(&store))))
        })
        .media_type(ARTISTS_TYPE, NodeInfo::new("Artists"), |artists| {
            artists.dynamic(Arc::new(ArtistsSource::new(Arc::clone(&store))))
        })
        .media_type(PLAYLISTS_TYPE, NodeInfo::new("Playlists"), |playlists| {
            playlists.dynamic(Arc::new(PlaylistsSource::new(store)))
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ids;
    use crate::id::MediaId;
    use crate::source::first_value;
    use bridge_traits::media::{LiveStream, MediaItemId};
    use core_library::InMemoryMediaStore;
    use futures::stream::{self, StreamExt};
    use mockall::mock;

    mock! {
        Statistics {}

        impl UsageStatistics for Statistics {
            fn most_rated(&self) -> LiveStream<Vec<MediaItemId>>;
            fn popular(&self) -> LiveStream<Vec<MediaItemId>>;
        }
    }

    fn tree() -> CatalogTree {
        let mut statistics = MockStatistics::new();
        statistics.expect_most_rated().never();
        statistics.expect_popular().never();
        standard_tree(
            Arc::new(InMemoryMediaStore::new()),
            Arc::new(statistics),
            &CatalogSettings::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_root_and_tracks_shape() {
        let tree = tree();

        let root = first_value(tree.get_children(&MediaId::root())).await.unwrap();
        assert_eq!(ids(&root), vec!["tracks", "albums", "artists", "playlists"]);

        let tracks = first_value(tree.get_children(&MediaId::parse("tracks").unwrap()))
            .await
            .unwrap();
        assert_eq!(
            ids(&tracks),
            vec!["tracks/all", "tracks/recent", "tracks/rated", "tracks/popular"]
        );
    }

    #[tokio::test]
    async fn test_rankings_only_read_when_listed() {
        let mut statistics = MockStatistics::new();
        statistics
            .expect_popular()
            .times(1)
            .returning(|| stream::once(async { Ok(vec![]) }).boxed());
        statistics.expect_most_rated().never();

        let tree = standard_tree(
            Arc::new(InMemoryMediaStore::new()),
            Arc::new(statistics),
            &CatalogSettings::default(),
        )
        .unwrap();
        let popular = first_value(tree.get_children(&MediaId::parse("tracks/popular").unwrap()))
            .await
            .unwrap();
        assert!(popular.is_empty());
    }
}
