//! Workspace facade crate.
//!
//! Host applications depend on `mpc-workspace` to pull in the catalog service
//! without wiring each workspace crate individually.

pub use core_service::*;
