//! # Library Data Layer
//!
//! Sits between the host media store and the catalog engine.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`SnapshotCache`](snapshot::SnapshotCache): replays the latest value of a live
//!   collection to late subscribers while preserving upstream ordering
//! - [`CachedMediaStore`](cached::CachedMediaStore): a `MediaStore` decorator that
//!   shares one host observation per collection across all readers
//! - [`InMemoryMediaStore`](memory::InMemoryMediaStore): a mutable in-process store
//!   for hosts without a native media index, and for tests

pub mod cached;
pub mod memory;
pub mod snapshot;

pub use cached::CachedMediaStore;
pub use memory::{InMemoryMediaStore, InMemoryUsageStatistics};
pub use snapshot::{SnapshotCache, SnapshotStream};
