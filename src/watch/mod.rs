// src/watch/mod.rs

//! File watching.
//!
//! - [`patterns`] compiles the watch table: which path triggers which action.
//! - [`watcher`] bridges `notify` into the runtime channel, with debouncing.
//! - [`hash`] provides content fingerprints for `use_hash` mode.

pub mod hash;
pub mod patterns;
pub mod watcher;

pub use hash::{compute_hash_for_paths, GroupFingerprints};
pub use patterns::{registrations_from_config, WatchRegistration, WatchTable};
pub use watcher::{actions_for_event, spawn_watcher, WatchOptions, WatcherHandle};
