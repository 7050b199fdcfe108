//! Records returned by the JSON search endpoint.
//!
//! Field names mirror the site's PascalCase JSON; numbers arrive as strings
//! and stay that way.

use serde::Deserialize;

fn unknown_imdb_id() -> String {
    "0".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "TotalResults", default)]
    pub total_results: Option<String>,
    #[serde(rename = "Movies", default)]
    pub movies: Vec<Movie>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Movie {
    #[serde(rename = "GroupId", default)]
    pub group_id: Option<String>,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: Option<String>,
    #[serde(rename = "Cover", default)]
    pub cover: Option<String>,
    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,
    /// Absent for some groups; defaults to empty.
    #[serde(rename = "Directors", default)]
    pub directors: Vec<Director>,
    /// Absent when the group has no IMDb link; defaults to `"0"`.
    #[serde(rename = "ImdbId", default = "unknown_imdb_id")]
    pub imdb_id: String,
    #[serde(rename = "Torrents", default)]
    pub torrents: Vec<Torrent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Director {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Torrent {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    #[serde(rename = "Quality", default)]
    pub quality: Option<String>,
    #[serde(rename = "Source", default)]
    pub source: Option<String>,
    #[serde(rename = "Container", default)]
    pub container: Option<String>,
    #[serde(rename = "Codec", default)]
    pub codec: Option<String>,
    #[serde(rename = "Resolution", default)]
    pub resolution: Option<String>,
    #[serde(rename = "Scene", default)]
    pub scene: bool,
    #[serde(rename = "GoldenPopcorn", default)]
    pub golden_popcorn: bool,
    #[serde(rename = "RemasterTitle", default)]
    pub remaster_title: Option<String>,
    #[serde(rename = "Size", default)]
    pub size: Option<String>,
    #[serde(rename = "UploadTime", default)]
    pub upload_time: Option<String>,
    #[serde(rename = "Snatched", default)]
    pub snatched: Option<String>,
    #[serde(rename = "Seeders", default)]
    pub seeders: Option<String>,
    #[serde(rename = "Leechers", default)]
    pub leechers: Option<String>,
}
