//! # Host Bridge Traits
//!
//! Contracts that each host platform implements for the catalog core.
//!
//! ## Traits
//!
//! ### Media access
//! - [`MediaStore`](media::MediaStore) - Live tracks, albums, artists and playlists
//!   from on-device storage
//! - [`UsageStatistics`](media::UsageStatistics) - Pre-ordered "most rated" and
//!   "popular" track rankings
//!
//! ### Utilities
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits report failures as [`BridgeError`](error::BridgeError).
//! Storage permission problems must be reported as
//! `BridgeError::PermissionDenied`; the core propagates them untouched so the
//! host can prompt for access again.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single implementation can be
//! shared by every concurrent browse session.

pub mod error;
pub mod log;
pub mod media;

pub use error::{BridgeError, Result};

pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{
    AlbumRecord, ArtistRecord, LiveStream, MediaItemId, MediaStore, NoUsageStatistics,
    PlaylistRecord, TrackRecord, UsageStatistics,
};
