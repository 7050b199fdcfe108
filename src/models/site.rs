//! Records parsed from scraped pages and embedded cover-view data.

use serde::Deserialize;

/// One `coverViewJsonData[..]` assignment from a browse page.
#[derive(Debug, Clone, Deserialize)]
pub struct CoverViewPage {
    #[serde(rename = "Movies", default)]
    pub movies: Vec<CoverViewMovie>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverViewMovie {
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: Option<String>,
    #[serde(rename = "Cover", default)]
    pub cover: Option<String>,
    #[serde(rename = "GroupingQualities", default)]
    pub grouping_qualities: Vec<GroupingQuality>,
}

impl CoverViewMovie {
    /// All torrents, flattened across grouping qualities.
    pub fn torrents(&self) -> impl Iterator<Item = &CoverViewTorrent> {
        self.grouping_qualities.iter().flat_map(|group| group.torrents.iter())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupingQuality {
    #[serde(rename = "Quality", default)]
    pub quality: Option<String>,
    #[serde(rename = "Torrents", default)]
    pub torrents: Vec<CoverViewTorrent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverViewTorrent {
    #[serde(rename = "TorrentId", default)]
    pub torrent_id: Option<u64>,
    /// Markup fragment: an anchor whose href points at the torrent page.
    #[serde(rename = "Title", default)]
    pub title: String,
}

/// A torrent the site wants seeded, with its resolved download-page link.
#[derive(Debug, Clone)]
pub struct SeedRequest {
    pub title: String,
    pub link: String,
}

/// One row of the contest leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestLeader {
    pub user: String,
    pub points: String,
}

/// One entry of the site log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub time: String,
    pub message: String,
}
