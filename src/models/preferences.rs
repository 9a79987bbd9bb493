use std::fmt::Display;
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::streaming_service::{StreamingServiceOption, DEFAULT_SERVICE_KEY};

pub const DEFAULT_MAX_RUNTIME: u32 = 120;
pub const DEFAULT_MIN_RATING: f64 = 6.5;
pub const DEFAULT_MIN_VOTES: u32 = 300;
pub const ANY_LANGUAGE: &str = "any";

/// Declares a snake_case selection enum with `as_str`, `FromStr`, and `Display`
macro_rules! selection_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($name), other)),
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

selection_enum! {
    /// The user's current emotional state
    Mood {
        Happy => "happy",
        Sad => "sad",
        Excited => "excited",
        Relaxed => "relaxed",
        Thoughtful => "thoughtful",
        Energetic => "energetic",
    }
}

selection_enum! {
    /// Result ordering requested by the user
    SortPreference {
        BestMatch => "best_match",
        RatingDesc => "rating_desc",
        PopularityDesc => "popularity_desc",
        NewestDesc => "newest_desc",
        OldestAsc => "oldest_asc",
    }
}

selection_enum! {
    /// Release-date window filter
    ReleaseWindow {
        Any => "any",
        Last3Years => "last_3_years",
        Last10Years => "last_10_years",
        Classics => "classics",
    }
}

selection_enum! {
    /// Who the user is watching with
    WatchWith {
        Solo => "solo",
        Partner => "partner",
        Friends => "friends",
        Family => "family",
    }
}

impl Mood {
    /// TMDB genre ids that fit this mood, used by the match score
    pub fn preferred_genres(&self) -> &'static [u32] {
        match self {
            Mood::Happy => &[35, 10749, 16, 10751, 12, 10402],
            Mood::Sad => &[18, 10749, 10402, 36, 9648],
            Mood::Excited => &[28, 12, 878, 53, 80],
            Mood::Relaxed => &[35, 99, 16, 10749, 10402],
            Mood::Thoughtful => &[18, 99, 36, 9648, 878],
            Mood::Energetic => &[28, 12, 80, 53, 878, 27],
        }
    }
}

impl Default for SortPreference {
    fn default() -> Self {
        SortPreference::BestMatch
    }
}

impl Default for ReleaseWindow {
    fn default() -> Self {
        ReleaseWindow::Any
    }
}

impl Default for WatchWith {
    fn default() -> Self {
        WatchWith::Solo
    }
}

/// Everything a single search is resolved from
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PreferenceSelection {
    pub mood: Option<Mood>,
    pub genres: Vec<u32>,
    pub max_runtime: u32,
    pub min_rating: f64,
    pub min_votes: u32,
    pub release_window: ReleaseWindow,
    /// ISO 639-1 code, or "any"
    pub language: String,
    pub watch_with: WatchWith,
    pub sort: SortPreference,
    pub service: &'static StreamingServiceOption,
    /// Lower-case country code offered by `service`
    pub country: &'static str,
}

impl Default for PreferenceSelection {
    fn default() -> Self {
        let service = StreamingServiceOption::by_key(DEFAULT_SERVICE_KEY);
        Self {
            mood: None,
            genres: Vec::new(),
            max_runtime: DEFAULT_MAX_RUNTIME,
            min_rating: DEFAULT_MIN_RATING,
            min_votes: DEFAULT_MIN_VOTES,
            release_window: ReleaseWindow::Any,
            language: ANY_LANGUAGE.to_string(),
            watch_with: WatchWith::Solo,
            sort: SortPreference::BestMatch,
            service,
            country: service.valid_country(None),
        }
    }
}

impl PreferenceSelection {
    /// Original-language filter, `None` for "any"
    pub fn language_filter(&self) -> Option<&str> {
        let language = self.language.trim();
        if language.is_empty() || language.eq_ignore_ascii_case(ANY_LANGUAGE) {
            None
        } else {
            Some(language)
        }
    }
}

/// Raw vibe-link query parameters, as they arrive on the wire
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VibeParams {
    pub mood: Option<String>,
    pub genres: Option<String>,
    pub runtime: Option<String>,
    pub rating: Option<String>,
    pub votes: Option<String>,
    pub sort: Option<String>,
    pub window: Option<String>,
    pub lang: Option<String>,
    #[serde(rename = "with")]
    pub watch_with: Option<String>,
    pub service: Option<String>,
    pub country: Option<String>,
    pub auto: Option<String>,
}

/// A shareable link that fully reconstructs a preference selection
#[derive(Debug, Clone, PartialEq)]
pub struct VibeLink {
    pub selection: PreferenceSelection,
    /// Run the search as soon as the link is opened
    pub auto_search: bool,
}

fn parse_or<T: FromStr>(value: Option<&str>, field: &str, default: T) -> T {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::debug!(field = field, value = %raw, "Ignoring unparsable vibe link value");
            default
        }),
        None => default,
    }
}

fn parse_genres(raw: Option<&str>) -> Vec<u32> {
    let mut genres: Vec<u32> = Vec::new();
    for id in raw
        .unwrap_or_default()
        .split(',')
        .filter_map(|part| part.trim().parse::<u32>().ok())
    {
        if !genres.contains(&id) {
            genres.push(id);
        }
    }
    genres
}

/// ISO 639 style code: two or three ASCII letters
fn is_language_code(lang: &str) -> bool {
    (2..=3).contains(&lang.len()) && lang.bytes().all(|b| b.is_ascii_alphabetic())
}

impl From<VibeParams> for VibeLink {
    fn from(params: VibeParams) -> Self {
        let mood = params
            .mood
            .as_deref()
            .and_then(|raw| raw.parse::<Mood>().ok());

        let max_runtime = parse_or(params.runtime.as_deref(), "runtime", DEFAULT_MAX_RUNTIME);
        let max_runtime = if max_runtime == 0 {
            DEFAULT_MAX_RUNTIME
        } else {
            max_runtime
        };

        let min_rating = parse_or(params.rating.as_deref(), "rating", DEFAULT_MIN_RATING);
        let min_rating = if min_rating.is_finite() {
            min_rating.clamp(0.0, 10.0)
        } else {
            DEFAULT_MIN_RATING
        };

        let language = params
            .lang
            .as_deref()
            .map(str::trim)
            .filter(|lang| is_language_code(lang))
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| ANY_LANGUAGE.to_string());

        let service = StreamingServiceOption::by_key(
            params.service.as_deref().map(str::trim).unwrap_or(DEFAULT_SERVICE_KEY),
        );
        let country = service.valid_country(params.country.as_deref());

        let selection = PreferenceSelection {
            mood,
            genres: parse_genres(params.genres.as_deref()),
            max_runtime,
            min_rating,
            min_votes: parse_or(params.votes.as_deref(), "votes", DEFAULT_MIN_VOTES),
            release_window: parse_or(params.window.as_deref(), "window", ReleaseWindow::Any),
            language,
            watch_with: parse_or(params.watch_with.as_deref(), "with", WatchWith::Solo),
            sort: parse_or(params.sort.as_deref(), "sort", SortPreference::BestMatch),
            service,
            country,
        };

        let auto_search = params.auto.as_deref().map(str::trim) == Some("1") && mood.is_some();

        VibeLink {
            selection,
            auto_search,
        }
    }
}

impl VibeLink {
    pub fn new(selection: PreferenceSelection) -> Self {
        Self {
            selection,
            auto_search: false,
        }
    }

    /// Decodes a vibe link from a full URL
    pub fn parse(url: &Url) -> Self {
        let mut params = VibeParams::default();
        for (key, value) in url.query_pairs() {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "mood" => params.mood = value,
                "genres" => params.genres = value,
                "runtime" => params.runtime = value,
                "rating" => params.rating = value,
                "votes" => params.votes = value,
                "sort" => params.sort = value,
                "window" => params.window = value,
                "lang" => params.lang = value,
                "with" => params.watch_with = value,
                "service" => params.service = value,
                "country" => params.country = value,
                "auto" => params.auto = value,
                _ => {}
            }
        }
        VibeLink::from(params)
    }

    /// Encodes the link onto `base`, replacing its path and query
    pub fn to_url(&self, base: &Url) -> Url {
        let selection = &self.selection;
        let mut url = base.clone();
        url.set_path("/recommendations");
        url.set_query(None);
        url.set_fragment(None);

        {
            let mut query = url.query_pairs_mut();
            if let Some(mood) = selection.mood {
                query.append_pair("mood", mood.as_str());
            }
            if !selection.genres.is_empty() {
                let genres: Vec<String> = selection.genres.iter().map(u32::to_string).collect();
                query.append_pair("genres", &genres.join(","));
            }
            query
                .append_pair("runtime", &selection.max_runtime.to_string())
                .append_pair("rating", &selection.min_rating.to_string())
                .append_pair("votes", &selection.min_votes.to_string())
                .append_pair("sort", selection.sort.as_str())
                .append_pair("window", selection.release_window.as_str())
                .append_pair("lang", &selection.language)
                .append_pair("with", selection.watch_with.as_str())
                .append_pair("service", selection.service.key)
                .append_pair("country", selection.country);
            if self.auto_search {
                query.append_pair("auto", "1");
            }
        }

        url
    }
}
