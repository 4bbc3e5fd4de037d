//! coursepulse-store — On-disk store and configuration.
//!
//! Provides the JSON-file-per-key [`JsonDirStore`](json_dir::JsonDirStore)
//! behind the core `KeyValueStore` trait, and loads `coursepulse.toml`.

pub mod config;
pub mod json_dir;
