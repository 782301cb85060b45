#![warn(clippy::all)]

//! Core logic for the Switch game gallery.
//!
//! This crate hosts configuration loading, the IGDB token exchange, query
//! builder and metadata client, response normalization, and the page loaders
//! used by the terminal gallery and any future frontends.

pub mod config;
pub mod gallery;
pub mod igdb;
pub mod models;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::AppConfig;
pub use gallery::Gallery;
pub use igdb::{IgdbClient, IgdbError, QueryDescription};
pub use models::{Artwork, Cover, GameCard, GameDetail};
