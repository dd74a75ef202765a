//! Text search over the media collections
//!
//! Searching is stateless: every query reads the current value of the
//! collections it needs and ranks the candidates on the spot.
//!
//! ## Ranking
//!
//! A candidate matches when the lower-cased query is a substring of its
//! lower-cased text. A match scores
//!
//! ```text
//! base_score - match_start - candidate_length (+ first_word_bonus if match_start == 0)
//! ```
//!
//! with positions and lengths counted in characters. Results are ordered by
//! descending score; equal scores keep the order they were produced in, which
//! is artists, then albums, then tracks, each in collection order.

use crate::content::{AudioTrack, MediaContent};
use crate::error::{CatalogError, Result};
use crate::id::MediaId;
use crate::sources::{album_category, artist_category};
use crate::standard::{ALBUMS_TYPE, ALL_TRACKS_CATEGORY, ARTISTS_TYPE, TRACKS_TYPE};
use bridge_traits::media::{AlbumRecord, ArtistRecord, LiveStream, MediaStore, TrackRecord};
use core_runtime::config::SearchTuning;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// What to look for.
///
/// Focused variants search one collection; [`SearchQuery::Unspecified`]
/// searches artists, albums and tracks together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Matches nothing.
    Empty,
    Artist {
        name: Option<String>,
    },
    Album {
        artist: Option<String>,
        title: Option<String>,
    },
    Song {
        artist: Option<String>,
        album: Option<String>,
        title: Option<String>,
    },
    /// Free text matched against artist names, album titles and track titles.
    Unspecified(String),
}

/// Lower-cased query fields with blank ones dropped. Surrounding whitespace
/// is kept and takes part in matching.
fn normalized(field: Option<&str>) -> Option<String> {
    field
        .filter(|text| !text.trim().is_empty())
        .map(str::to_lowercase)
}

fn contains(candidate: &str, needle: &Option<String>) -> bool {
    match needle {
        Some(needle) => candidate.to_lowercase().contains(needle.as_str()),
        None => true,
    }
}

/// Ranks collection entries against text queries.
pub struct SearchEngine {
    store: Arc<dyn MediaStore>,
    tuning: SearchTuning,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn MediaStore>, tuning: SearchTuning) -> Self {
        Self { store, tuning }
    }

    /// Score of `candidate` for the lower-cased `needle`, `None` when it does
    /// not match.
    pub fn score(&self, needle: &str, candidate: &str) -> Option<i64> {
        let haystack = candidate.to_lowercase();
        let byte_start = haystack.find(needle)?;
        let start = haystack[..byte_start].chars().count() as i64;
        let length = haystack.chars().count() as i64;

        let mut score = self.tuning.base_score - start - length;
        if start == 0 {
            score += self.tuning.first_word_bonus;
        }
        Some(score)
    }

    /// Runs `query`, returning matches best first.
    ///
    /// An empty result is not an error; only failures of the underlying
    /// collections are.
    #[instrument(skip(self), level = "debug")]
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<MediaContent>> {
        let mut scored = match query {
            SearchQuery::Empty => Vec::new(),
            SearchQuery::Artist { name } => match normalized(name.as_deref()) {
                Some(name) => {
                    let artists = current(self.store.artists()).await?;
                    self.rank_artists(&artists, &name)?
                }
                None => Vec::new(),
            },
            SearchQuery::Album { artist, title } => {
                let artist = normalized(artist.as_deref());
                let title = normalized(title.as_deref());
                match (title, artist) {
                    (None, None) => Vec::new(),
                    (Some(title), artist) => {
                        let albums = current(self.store.albums()).await?;
                        self.rank_albums(&albums, &title, |album| album.title.as_str(), |album| {
                            contains(&album.artist, &artist)
                        })?
                    }
                    (None, Some(artist)) => {
                        let albums = current(self.store.albums()).await?;
                        self.rank_albums(&albums, &artist, |album| album.artist.as_str(), |_| true)?
                    }
                }
            }
            SearchQuery::Song {
                artist,
                album,
                title,
            } => {
                let artist = normalized(artist.as_deref());
                let album = normalized(album.as_deref());
                let title = normalized(title.as_deref());
                if artist.is_none() && album.is_none() && title.is_none() {
                    Vec::new()
                } else {
                    let tracks = current(self.store.tracks()).await?;
                    self.rank_songs(&tracks, artist, album, title)?
                }
            }
            SearchQuery::Unspecified(text) => match normalized(Some(text)) {
                Some(text) => {
                    let (artists, albums, tracks) = futures::try_join!(
                        current(self.store.artists()),
                        current(self.store.albums()),
                        current(self.store.tracks()),
                    )?;
                    let mut scored = self.rank_artists(&artists, &text)?;
                    scored.extend(self.rank_albums(
                        &albums,
                        &text,
                        |album| album.title.as_str(),
                        |_| true,
                    )?);
                    scored.extend(self.rank_tracks(&tracks, &text, |track| track.title.as_str(), |_| true)?);
                    scored
                }
                None => Vec::new(),
            },
        };

        // Stable: equal scores keep production order
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        debug!(results = scored.len(), "Search completed");
        Ok(scored.into_iter().map(|(_, content)| content).collect())
    }

    fn rank_artists(&self, artists: &[ArtistRecord], needle: &str) -> Result<Vec<(i64, MediaContent)>> {
        let artists_type = MediaId::of_type(ARTISTS_TYPE)?;
        let mut scored = Vec::new();
        for artist in artists {
            if let Some(score) = self.score(needle, &artist.name) {
                scored.push((score, artist_category(&artists_type, artist)?.into()));
            }
        }
        Ok(scored)
    }

    fn rank_albums<K, F>(
        &self,
        albums: &[AlbumRecord],
        needle: &str,
        key: K,
        keep: F,
    ) -> Result<Vec<(i64, MediaContent)>>
    where
        K: Fn(&AlbumRecord) -> &str,
        F: Fn(&AlbumRecord) -> bool,
    {
        let albums_type = MediaId::of_type(ALBUMS_TYPE)?;
        let mut scored = Vec::new();
        for album in albums.iter().filter(|album| keep(album)) {
            if let Some(score) = self.score(needle, key(album)) {
                scored.push((score, album_category(&albums_type, album)?.into()));
            }
        }
        Ok(scored)
    }

    fn rank_tracks<K, F>(
        &self,
        tracks: &[TrackRecord],
        needle: &str,
        key: K,
        keep: F,
    ) -> Result<Vec<(i64, MediaContent)>>
    where
        K: Fn(&TrackRecord) -> &str,
        F: Fn(&TrackRecord) -> bool,
    {
        let all_tracks = MediaId::of_type(TRACKS_TYPE)?.category_of(ALL_TRACKS_CATEGORY)?;
        let mut scored = Vec::new();
        for track in tracks.iter().filter(|track| keep(track)) {
            if let Some(score) = self.score(needle, key(track)) {
                scored.push((score, AudioTrack::from_record(&all_tracks, track)?.into()));
            }
        }
        Ok(scored)
    }

    /// Scores the most specific field given; the others only filter.
    fn rank_songs(
        &self,
        tracks: &[TrackRecord],
        artist: Option<String>,
        album: Option<String>,
        title: Option<String>,
    ) -> Result<Vec<(i64, MediaContent)>> {
        if let Some(title) = title {
            self.rank_tracks(tracks, &title, |track| track.title.as_str(), |track| {
                contains(&track.artist, &artist) && contains(&track.album, &album)
            })
        } else if let Some(album) = album {
            self.rank_tracks(tracks, &album, |track| track.album.as_str(), |track| {
                contains(&track.artist, &artist)
            })
        } else if let Some(artist) = artist {
            self.rank_tracks(tracks, &artist, |track| track.artist.as_str(), |_| true)
        } else {
            Ok(Vec::new())
        }
    }
}

/// Current value of a host collection.
async fn current<T>(mut collection: LiveStream<Vec<T>>) -> Result<Vec<T>> {
    match collection.next().await {
        Some(value) => value.map_err(CatalogError::from),
        None => Err(CatalogError::SourceUnavailable(
            "media collection ended without a value".to_string(),
        )),
    }
}
