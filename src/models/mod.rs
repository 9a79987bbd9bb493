use serde::{Deserialize, Serialize};

pub mod preferences;
pub mod streaming_service;
pub mod watchlist;

pub use preferences::{
    Mood, PreferenceSelection, ReleaseWindow, SortPreference, VibeLink, VibeParams, WatchWith,
};
pub use streaming_service::{CountryOption, StreamingServiceOption};
pub use watchlist::{MediaType, NewWatchlistItem, WatchlistItem};

/// A movie or show returned by the metadata upstream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: u64,
    /// TV results carry `name` instead of `title`
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default, alias = "first_air_date")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub imdb_id: Option<String>,
}

impl Candidate {
    /// Fills runtime and external id from a detail lookup
    pub fn enrich(&mut self, details: CandidateDetails) {
        if details.runtime.is_some() {
            self.runtime = details.runtime;
        }
        if details.imdb_id.is_some() {
            self.imdb_id = details.imdb_id;
        }
    }

    /// Runtime in minutes, treating the upstream's `0` as unknown
    pub fn known_runtime(&self) -> Option<u32> {
        self.runtime.filter(|minutes| *minutes > 0)
    }
}

/// Subset of `movie/{id}` used for enrichment
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CandidateDetails {
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub imdb_id: Option<String>,
}

/// A scored title returned to the client
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendedTitle {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub match_score: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_deserialization_from_discover() {
        let json = r#"{
            "id": 550,
            "title": "Fight Club",
            "poster_path": "/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg",
            "vote_average": 8.4,
            "popularity": 61.4,
            "release_date": "1999-10-15",
            "genre_ids": [18, 53]
        }"#;

        let candidate: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.id, 550);
        assert_eq!(candidate.title, "Fight Club");
        assert_eq!(candidate.genre_ids, vec![18, 53]);
        assert_eq!(candidate.runtime, None);
        assert_eq!(candidate.imdb_id, None);
    }

    #[test]
    fn test_candidate_accepts_tv_field_names() {
        let json = r#"{"id": 1396, "name": "Breaking Bad", "first_air_date": "2008-01-20"}"#;

        let candidate: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.title, "Breaking Bad");
        assert_eq!(candidate.release_date.as_deref(), Some("2008-01-20"));
        assert!(candidate.genre_ids.is_empty());
        assert_eq!(candidate.vote_average, 0.0);
    }

    #[test]
    fn test_enrich_keeps_existing_values_when_details_are_empty() {
        let mut candidate: Candidate =
            serde_json::from_str(r#"{"id": 1, "title": "A", "runtime": 95}"#).unwrap();
        candidate.enrich(CandidateDetails::default());
        assert_eq!(candidate.runtime, Some(95));

        candidate.enrich(CandidateDetails {
            runtime: Some(101),
            imdb_id: Some("tt0000001".to_string()),
        });
        assert_eq!(candidate.runtime, Some(101));
        assert_eq!(candidate.imdb_id.as_deref(), Some("tt0000001"));
    }

    #[test]
    fn test_zero_runtime_is_unknown() {
        let candidate: Candidate =
            serde_json::from_str(r#"{"id": 1, "title": "A", "runtime": 0}"#).unwrap();
        assert_eq!(candidate.known_runtime(), None);
    }

    #[test]
    fn test_recommended_title_flattens_candidate() {
        let candidate: Candidate = serde_json::from_str(r#"{"id": 7, "title": "Seven"}"#).unwrap();
        let value = serde_json::to_value(RecommendedTitle {
            candidate,
            match_score: 81,
        })
        .unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["title"], "Seven");
        assert_eq!(value["match_score"], 81);
    }
}
