use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::{Candidate, Mood, SortPreference};

const SCORE_FLOOR: f64 = 62.0;
const SCORE_SPAN: f64 = 37.0;
const GENRE_WEIGHT: f64 = 0.6;
const MOOD_WEIGHT: f64 = 0.4;

/// Overlap divisor cap for the mood score
const MOOD_OVERLAP_TARGET: usize = 3;

fn overlap(candidate_genres: &[u32], wanted: &[u32]) -> usize {
    candidate_genres
        .iter()
        .filter(|genre| wanted.contains(genre))
        .count()
}

/// Fraction of the selected genres the candidate carries, 1.0 with no selection
pub fn genre_score(candidate_genres: &[u32], selected: &[u32]) -> f64 {
    if selected.is_empty() {
        return 1.0;
    }
    (overlap(candidate_genres, selected) as f64 / selected.len() as f64).min(1.0)
}

/// Fit against the mood's preferred genres, 0.5 when there is nothing to compare
pub fn mood_score(candidate_genres: &[u32], preferred: &[u32]) -> f64 {
    if preferred.is_empty() {
        return 0.5;
    }
    let divisor = preferred.len().min(MOOD_OVERLAP_TARGET) as f64;
    (overlap(candidate_genres, preferred) as f64 / divisor).min(1.0)
}

/// Display score in [62, 99]
pub fn match_score(candidate_genres: &[u32], mood: Option<Mood>, selected: &[u32]) -> u8 {
    let preferred = mood.map(|m| m.preferred_genres()).unwrap_or(&[]);
    let raw = GENRE_WEIGHT * genre_score(candidate_genres, selected)
        + MOOD_WEIGHT * mood_score(candidate_genres, preferred);
    (SCORE_FLOOR + raw * SCORE_SPAN).round() as u8
}

fn release_or(candidate: &Candidate, fallback: NaiveDate) -> NaiveDate {
    candidate
        .release_date
        .as_deref()
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .unwrap_or(fallback)
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Reorders an enriched pool for display. Stable; `BestMatch` keeps upstream order.
pub fn sort_client_side(mut candidates: Vec<Candidate>, sort: SortPreference) -> Vec<Candidate> {
    // Missing dates sink to the end in both date orders
    let oldest = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
    let newest = NaiveDate::from_ymd_opt(2100, 1, 1).unwrap_or(NaiveDate::MAX);

    match sort {
        SortPreference::BestMatch => {}
        SortPreference::RatingDesc => {
            candidates.sort_by(|a, b| desc(a.vote_average, b.vote_average))
        }
        SortPreference::PopularityDesc => {
            candidates.sort_by(|a, b| desc(a.popularity, b.popularity))
        }
        SortPreference::NewestDesc => {
            candidates.sort_by(|a, b| release_or(b, oldest).cmp(&release_or(a, oldest)))
        }
        SortPreference::OldestAsc => {
            candidates.sort_by(|a, b| release_or(a, newest).cmp(&release_or(b, newest)))
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u64, rating: f64, popularity: f64, release: Option<&str>) -> Candidate {
        Candidate {
            id,
            title: format!("Movie {}", id),
            poster_path: None,
            overview: None,
            vote_average: rating,
            popularity,
            runtime: None,
            release_date: release.map(str::to_string),
            genre_ids: Vec::new(),
            imdb_id: None,
        }
    }

    fn ids(candidates: &[Candidate]) -> Vec<u64> {
        candidates.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_thoughtful_documentary_example() {
        // genre 1/2, mood 1/3 → round(62 + 0.4333 * 37)
        assert_eq!(match_score(&[18], Some(Mood::Thoughtful), &[18, 99]), 78);
    }

    #[test]
    fn test_score_bounds() {
        assert_eq!(match_score(&[], Some(Mood::Sad), &[28, 12]), 62);
        assert_eq!(match_score(&[28, 12, 878], Some(Mood::Excited), &[28]), 99);
        for mood in Mood::ALL {
            for genres in [&[][..], &[18][..], &[28, 35, 18, 99, 878][..]] {
                let score = match_score(genres, Some(*mood), &[35, 18]);
                assert!((62..=99).contains(&score));
            }
        }
    }

    #[test]
    fn test_no_mood_scores_half() {
        assert_eq!(mood_score(&[18, 35], &[]), 0.5);
        // genre 1.0, mood 0.5 → round(62 + 0.8 * 37)
        assert_eq!(match_score(&[18], None, &[]), 92);
    }

    #[test]
    fn test_more_overlap_never_scores_lower() {
        let selected = [35, 10749, 16];
        let mut previous = 0;
        for genres in [&[][..], &[35][..], &[35, 10749][..], &[35, 10749, 16][..]] {
            let score = match_score(genres, Some(Mood::Happy), &selected);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_genre_score_caps_at_one() {
        assert_eq!(genre_score(&[18, 18, 18], &[18]), 1.0);
        assert_eq!(genre_score(&[1, 2], &[]), 1.0);
    }

    #[test]
    fn test_best_match_keeps_upstream_order() {
        let pool = vec![
            candidate(3, 5.0, 1.0, None),
            candidate(1, 9.0, 3.0, None),
            candidate(2, 7.0, 2.0, None),
        ];
        assert_eq!(ids(&sort_client_side(pool, SortPreference::BestMatch)), vec![3, 1, 2]);
    }

    #[test]
    fn test_rating_and_popularity_sorts() {
        let pool = vec![
            candidate(1, 6.0, 50.0, None),
            candidate(2, 8.5, 10.0, None),
            candidate(3, 7.0, 90.0, None),
        ];
        assert_eq!(
            ids(&sort_client_side(pool.clone(), SortPreference::RatingDesc)),
            vec![2, 3, 1]
        );
        assert_eq!(
            ids(&sort_client_side(pool, SortPreference::PopularityDesc)),
            vec![3, 1, 2]
        );
    }

    #[test]
    fn test_missing_release_dates_sort_last() {
        let pool = vec![
            candidate(1, 0.0, 0.0, None),
            candidate(2, 0.0, 0.0, Some("1999-10-15")),
            candidate(3, 0.0, 0.0, Some("2021-03-01")),
            candidate(4, 0.0, 0.0, Some("not a date")),
        ];
        assert_eq!(
            ids(&sort_client_side(pool.clone(), SortPreference::NewestDesc)),
            vec![3, 2, 1, 4]
        );
        assert_eq!(
            ids(&sort_client_side(pool, SortPreference::OldestAsc)),
            vec![2, 3, 1, 4]
        );
    }
}
