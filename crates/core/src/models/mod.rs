//! Page-level game views built from normalized IGDB records.

use serde::{Deserialize, Serialize};

/// Cover art reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cover {
    #[serde(default)]
    pub id: Option<u64>,
    /// CDN image id, used with [`crate::igdb::image_url`].
    pub image_id: String,
}

/// Artwork reference shown in the detail gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: u64,
    pub image_id: String,
}

/// One card on the game list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCard {
    /// IGDB game id.
    pub id: u64,
    /// Upstream (English) title.
    pub name: String,
    /// Title for the configured region.
    pub localized_name: String,
    /// Short description, if IGDB has one.
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub cover: Option<Cover>,
}

impl GameCard {
    /// Text for the front of the card: the summary, or the name when there is none.
    pub fn front_text(&self) -> &str {
        self.summary
            .as_deref()
            .filter(|summary| !summary.trim().is_empty())
            .unwrap_or(&self.name)
    }

    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self.localized_name.to_lowercase().contains(&needle)
            || self.id.to_string() == needle
    }
}

/// The detail page of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDetail {
    pub id: u64,
    pub localized_name: String,
    #[serde(default)]
    pub artworks: Vec<Artwork>,
}
