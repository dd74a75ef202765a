//! Catalog entries handed to browsing clients

use crate::error::Result;
use crate::id::MediaId;
use bridge_traits::media::TrackRecord;
use serde::{Deserialize, Serialize};

/// Browsable node: the root, a media type, or a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCategory {
    pub id: MediaId,
    pub title: String,
    pub subtitle: Option<String>,
    pub icon_uri: Option<String>,
    /// Whether the whole node can be queued for playback.
    pub playable: bool,
    /// Number of direct children when known without listing them.
    pub child_count: Option<u32>,
}

impl MediaCategory {
    pub fn new(id: MediaId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            subtitle: None,
            icon_uri: None,
            playable: false,
            child_count: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_icon(mut self, icon_uri: Option<String>) -> Self {
        self.icon_uri = icon_uri;
        self
    }

    pub fn playable(mut self, playable: bool) -> Self {
        self.playable = playable;
        self
    }

    pub fn with_child_count(mut self, count: u32) -> Self {
        self.child_count = Some(count);
        self
    }
}

/// Playable leaf.
///
/// The identifier encodes the branch the track was listed under, so the same
/// recording appears as `albums/3|17` and `tracks/all|17`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub id: MediaId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
    pub disc_number: u32,
    pub track_number: u32,
    pub media_uri: String,
    pub album_art_uri: Option<String>,
    /// Unix timestamp (seconds) the host indexed the file.
    pub date_added: i64,
}

impl AudioTrack {
    /// Lists `record` under the category `parent`.
    pub fn from_record(parent: &MediaId, record: &TrackRecord) -> Result<Self> {
        Ok(Self {
            id: parent.track_of(record.id)?,
            title: record.title.clone(),
            artist: record.artist.clone(),
            album: record.album.clone(),
            duration_ms: record.duration_ms,
            disc_number: record.disc_number,
            track_number: record.track_number,
            media_uri: record.media_uri.clone(),
            album_art_uri: record.album_art_uri.clone(),
            date_added: record.date_added,
        })
    }
}

/// One entry of a children listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaContent {
    Category(MediaCategory),
    Track(AudioTrack),
}

impl MediaContent {
    pub fn id(&self) -> &MediaId {
        match self {
            MediaContent::Category(category) => &category.id,
            MediaContent::Track(track) => &track.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            MediaContent::Category(category) => &category.title,
            MediaContent::Track(track) => &track.title,
        }
    }

    pub fn is_browsable(&self) -> bool {
        matches!(self, MediaContent::Category(_))
    }

    pub fn is_playable(&self) -> bool {
        match self {
            MediaContent::Category(category) => category.playable,
            MediaContent::Track(_) => true,
        }
    }

    pub fn as_track(&self) -> Option<&AudioTrack> {
        match self {
            MediaContent::Track(track) => Some(track),
            MediaContent::Category(_) => None,
        }
    }
}

impl From<MediaCategory> for MediaContent {
    fn from(category: MediaCategory) -> Self {
        MediaContent::Category(category)
    }
}

impl From<AudioTrack> for MediaContent {
    fn from(track: AudioTrack) -> Self {
        MediaContent::Track(track)
    }
}
