//! Configuration management for tsupdate
//!
//! A single optional TOML file tunes where packages come from, which
//! package-manager source files are managed, and network/progress timing.
//! See [`UpdateConfig`] for the file format and lookup order.

mod global;

pub use global::{
    CONFIG_ENV, DistributionConfig, DownloadConfig, NetworkConfig, PathsConfig, UpdateConfig,
};
