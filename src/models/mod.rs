//! Data models for records returned by the tracker.
//!
//! - `Movie`, `Director`, `Torrent`: the JSON search surface
//! - `CoverViewMovie` and friends: embedded browse-page data
//! - `SeedRequest`, `ContestLeader`, `LogEntry`: scraped page records

pub mod movie;
pub mod site;

pub use movie::{Director, Movie, SearchResponse, Torrent};
pub use site::{
    ContestLeader, CoverViewMovie, CoverViewPage, CoverViewTorrent, GroupingQuality, LogEntry,
    SeedRequest,
};
