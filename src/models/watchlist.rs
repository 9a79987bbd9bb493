use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Candidate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

/// A saved title, as persisted in the watchlist blob
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistItem {
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub media_type: MediaType,
    pub vote_average: f64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    pub added_at: DateTime<Utc>,
}

/// A watchlist item before it is stamped with `added_at`
#[derive(Debug, Clone, PartialEq)]
pub struct NewWatchlistItem {
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub media_type: MediaType,
    pub vote_average: f64,
    pub release_date: Option<String>,
    pub genre_ids: Vec<u32>,
}

impl NewWatchlistItem {
    pub fn added_at(self, added_at: DateTime<Utc>) -> WatchlistItem {
        WatchlistItem {
            id: self.id,
            title: self.title,
            poster_path: self.poster_path,
            media_type: self.media_type,
            vote_average: self.vote_average,
            release_date: self.release_date,
            genre_ids: self.genre_ids,
            added_at,
        }
    }
}

impl From<&Candidate> for NewWatchlistItem {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id,
            title: candidate.title.clone(),
            poster_path: candidate.poster_path.clone(),
            media_type: MediaType::Movie,
            vote_average: candidate.vote_average,
            release_date: candidate.release_date.clone(),
            genre_ids: candidate.genre_ids.clone(),
        }
    }
}
