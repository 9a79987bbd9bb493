use chrono::{Months, NaiveDate};

use crate::models::{Mood, PreferenceSelection, ReleaseWindow, SortPreference};

/// Upper bound for the "classics" release window
const CLASSICS_CUTOFF: (i32, u32, u32) = (2000, 12, 31);

/// TMDB `sort_by` values used by discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    PopularityDesc,
    VoteAverageDesc,
    VoteCountDesc,
    ReleaseDateDesc,
    ReleaseDateAsc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::PopularityDesc => "popularity.desc",
            SortKey::VoteAverageDesc => "vote_average.desc",
            SortKey::VoteCountDesc => "vote_count.desc",
            SortKey::ReleaseDateDesc => "primary_release_date.desc",
            SortKey::ReleaseDateAsc => "primary_release_date.asc",
        }
    }
}

/// An explicit sort always wins; "best match" lets the mood decide.
pub fn resolve_sort_key(mood: Option<Mood>, sort: SortPreference) -> SortKey {
    match sort {
        SortPreference::RatingDesc => SortKey::VoteAverageDesc,
        SortPreference::PopularityDesc => SortKey::PopularityDesc,
        SortPreference::NewestDesc => SortKey::ReleaseDateDesc,
        SortPreference::OldestAsc => SortKey::ReleaseDateAsc,
        SortPreference::BestMatch => match mood {
            Some(Mood::Happy) | Some(Mood::Excited) => SortKey::PopularityDesc,
            Some(Mood::Sad) | Some(Mood::Thoughtful) => SortKey::VoteAverageDesc,
            _ => SortKey::VoteCountDesc,
        },
    }
}

/// Returns `(gte, lte)` release-date bounds. At most one side is set.
pub fn release_date_range(
    window: ReleaseWindow,
    today: NaiveDate,
) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match window {
        ReleaseWindow::Any => (None, None),
        ReleaseWindow::Last3Years => (today.checked_sub_months(Months::new(36)), None),
        ReleaseWindow::Last10Years => (today.checked_sub_months(Months::new(120)), None),
        ReleaseWindow::Classics => {
            let (y, m, d) = CLASSICS_CUTOFF;
            (None, NaiveDate::from_ymd_opt(y, m, d))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFilter {
    pub provider_id: u32,
    /// Upper-case country code
    pub watch_region: String,
}

/// A `discover/movie` request derived from a preference selection
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverQuery {
    pub genres: Vec<u32>,
    pub sort_by: SortKey,
    pub min_rating: Option<f64>,
    pub min_votes: Option<u32>,
    pub release_from: Option<NaiveDate>,
    pub release_until: Option<NaiveDate>,
    pub original_language: Option<String>,
    pub region: String,
    pub provider: Option<ProviderFilter>,
}

/// Builds the primary discovery query for `selection`
///
/// Pure: the same selection and date always produce the same query.
pub fn build_discover_query(selection: &PreferenceSelection, today: NaiveDate) -> DiscoverQuery {
    let (release_from, release_until) = release_date_range(selection.release_window, today);
    let region = selection.country.to_ascii_uppercase();

    DiscoverQuery {
        genres: selection.genres.clone(),
        sort_by: resolve_sort_key(selection.mood, selection.sort),
        min_rating: Some(selection.min_rating).filter(|rating| *rating > 0.0),
        min_votes: Some(selection.min_votes).filter(|votes| *votes > 0),
        release_from,
        release_until,
        original_language: selection.language_filter().map(str::to_string),
        provider: Some(ProviderFilter {
            provider_id: selection.service.provider_id,
            watch_region: region.clone(),
        }),
        region,
    }
}

impl DiscoverQuery {
    /// Same query without any streaming-provider restriction
    pub fn relax_provider(&self) -> Self {
        Self {
            provider: None,
            ..self.clone()
        }
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let mut push = |name: &str, value: String| params.push((name.to_string(), value));

        if !self.genres.is_empty() {
            let genres: Vec<String> = self.genres.iter().map(u32::to_string).collect();
            push("with_genres", genres.join(","));
        }
        push("sort_by", self.sort_by.as_str().to_string());
        if let Some(rating) = self.min_rating {
            push("vote_average.gte", rating.to_string());
        }
        if let Some(votes) = self.min_votes {
            push("vote_count.gte", votes.to_string());
        }
        if let Some(from) = self.release_from {
            push("primary_release_date.gte", from.format("%Y-%m-%d").to_string());
        }
        if let Some(until) = self.release_until {
            push("primary_release_date.lte", until.format("%Y-%m-%d").to_string());
        }
        if let Some(language) = &self.original_language {
            push("with_original_language", language.clone());
        }
        push("region", self.region.clone());
        if let Some(provider) = &self.provider {
            push("with_watch_providers", provider.provider_id.to_string());
            push("watch_monetization_types", "flatrate".to_string());
            push("watch_region", provider.watch_region.clone());
        }

        params
    }
}
