//! Upstream music-chart source and the normalized track shape served to clients.

pub mod deezer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use deezer::DeezerClient;

/// Track summary as cached and returned by `/api/music/nepalese`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: u64,
    pub title: String,
    /// Artist name.
    pub description: String,
    /// Medium-size album cover URL.
    pub image: String,
}

/// Raw chart payload as returned by the upstream API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartPayload {
    pub tracks: TrackPage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackPage {
    pub data: Vec<RawTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTrack {
    pub id: u64,
    pub title: String,
    pub artist: RawArtist,
    pub album: RawAlbum,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAlbum {
    pub cover_medium: String,
}

impl From<RawTrack> for TrackSummary {
    fn from(track: RawTrack) -> Self {
        Self {
            id: track.id,
            title: track.title,
            description: track.artist.name,
            image: track.album.cover_medium,
        }
    }
}

impl ChartPayload {
    pub fn into_summaries(self) -> Vec<TrackSummary> {
        self.tracks.data.into_iter().map(TrackSummary::from).collect()
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("chart request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed chart response: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[async_trait]
pub trait ChartSource: Send + Sync {
    async fn fetch_chart(&self) -> Result<ChartPayload, UpstreamError>;
}
