//! Viewer service library
//!
//! Loads the GeoJSON layers from a local data folder, holds the in-memory
//! occurrence set and selection state, and serves the engine's outputs to
//! the browser collaborators over HTTP plus SSE.

pub mod api;
pub mod config;
pub mod loader;
pub mod state;
