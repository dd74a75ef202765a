//! Browses a small in-memory library and prints what a media browser would see.
//!
//! Run with `RUST_LOG=debug` to watch subscriptions come and go.

use anyhow::Context;
use bridge_traits::media::{AlbumRecord, TrackRecord};
use core_library::InMemoryMediaStore;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::{CatalogService, CoreConfig, MediaContent, MediaId, SearchQuery};
use futures::StreamExt;
use std::sync::Arc;

fn track(id: u64, title: &str, number: u32) -> TrackRecord {
    TrackRecord {
        id,
        title: title.to_string(),
        artist: "Pink Floyd".to_string(),
        artist_id: 1,
        album: "Wish You Were Here".to_string(),
        album_id: 1,
        disc_number: 1,
        track_number: number,
        duration_ms: 300_000,
        media_uri: format!("file:///music/wywh/{:02}.flac", number),
        album_art_uri: None,
        date_added: 1_600_000_000 + id as i64,
    }
}

fn print_listing(parent: &MediaId, children: &[MediaContent]) {
    println!("{}", parent);
    for child in children {
        let marker = if child.is_browsable() { "+" } else { "-" };
        println!("  {} {} ({})", marker, child.title(), child.id());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))
        .context("initializing logging")?;

    let store = Arc::new(InMemoryMediaStore::new());
    store.set_albums(vec![AlbumRecord {
        id: 1,
        title: "Wish You Were Here".to_string(),
        artist: "Pink Floyd".to_string(),
        track_count: 3,
        album_art_uri: None,
    }]);
    store.set_tracks(vec![
        track(10, "Have a Cigar", 3),
        track(11, "Shine On You Crazy Diamond", 1),
        track(12, "Welcome to the Machine", 2),
    ]);

    let config = CoreConfig::builder()
        .media_store(store.clone())
        .build()
        .context("building configuration")?;
    let service = CatalogService::new(config)?;

    for encoded in ["root", "tracks", "albums", "albums/1"] {
        let parent = MediaId::parse(encoded)?;
        let children = service.load_children(&parent, None).await?;
        print_listing(&parent, &children);
    }

    let album = MediaId::parse("albums/1")?;
    let _watch = service.subscribe(&album);
    let mut updates = service.updated_parent_ids();
    store.add_track(track(13, "Wish You Were Here", 4));
    if let Some(changed) = updates.next().await {
        print_listing(&changed, &service.load_children(&changed, None).await?);
    }

    let results = service
        .search(&SearchQuery::Unspecified("wish".to_string()))
        .await?;
    println!("search \"wish\":");
    for result in results {
        println!("  {} ({})", result.title(), result.id());
    }

    Ok(())
}
