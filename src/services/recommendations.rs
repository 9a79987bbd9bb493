use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{Candidate, PreferenceSelection, RecommendedTitle},
    services::{
        fallback::{resolve_pool, FallbackTier},
        providers::MetadataProvider,
        query_builder::build_discover_query,
        scoring::{match_score, sort_client_side},
    },
};

/// Candidates that get a detail lookup
pub const ENRICH_LIMIT: usize = 12;
/// Titles returned per search
pub const RESULT_LIMIT: usize = 6;

#[derive(Debug, Clone)]
pub struct Recommendations {
    pub tier: FallbackTier,
    pub titles: Vec<RecommendedTitle>,
}

/// Generates mood-matched recommendations for one selection
///
/// Resolves the candidate pool (relaxing the provider filter if needed),
/// enriches the head of the pool with runtimes, drops titles that run too
/// long, applies the requested ordering and scores what is left.
pub async fn recommend(
    provider: &dyn MetadataProvider,
    selection: &PreferenceSelection,
    today: NaiveDate,
) -> AppResult<Recommendations> {
    let query = build_discover_query(selection, today);
    let (pool, tier) = resolve_pool(provider, &query).await?;

    let pool_size = pool.len();
    let enriched = enrich(provider, pool.into_iter().take(ENRICH_LIMIT).collect()).await;

    let within_runtime: Vec<Candidate> = enriched
        .into_iter()
        .filter(|candidate| {
            candidate
                .known_runtime()
                .map_or(true, |minutes| minutes <= selection.max_runtime)
        })
        .collect();

    let titles: Vec<RecommendedTitle> = sort_client_side(within_runtime, selection.sort)
        .into_iter()
        .take(RESULT_LIMIT)
        .map(|candidate| RecommendedTitle {
            match_score: match_score(&candidate.genre_ids, selection.mood, &selection.genres),
            candidate,
        })
        .collect();

    tracing::info!(
        mood = selection.mood.map(|m| m.as_str()).unwrap_or("none"),
        service = selection.service.key,
        country = selection.country,
        tier = ?tier,
        pool = pool_size,
        returned = titles.len(),
        "Recommendations generated"
    );

    Ok(Recommendations { tier, titles })
}

async fn enrich(provider: &dyn MetadataProvider, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    let ids = candidates.iter().map(|c| c.id).collect();
    let details = provider.movie_details_batch(ids).await;

    for (candidate, details) in candidates.iter_mut().zip(details) {
        if let Some(details) = details {
            candidate.enrich(details);
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateDetails, Mood, SortPreference};
    use crate::services::providers::MockMetadataProvider;

    fn candidate(id: u64, genres: &[u32], rating: f64) -> Candidate {
        Candidate {
            id,
            title: format!("Movie {}", id),
            poster_path: None,
            overview: None,
            vote_average: rating,
            popularity: 0.0,
            runtime: None,
            release_date: None,
            genre_ids: genres.to_vec(),
            imdb_id: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn runtime(minutes: u32) -> Option<CandidateDetails> {
        Some(CandidateDetails {
            runtime: Some(minutes),
            imdb_id: None,
        })
    }

    #[tokio::test]
    async fn test_long_titles_are_dropped_and_unknown_runtimes_kept() {
        let mut mock = MockMetadataProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_discover().times(1).returning(|_| {
            Ok(vec![
                candidate(1, &[18], 7.0),
                candidate(2, &[18], 7.0),
                candidate(3, &[18], 7.0),
                candidate(4, &[18], 7.0),
            ])
        });
        mock.expect_movie_details_batch()
            .withf(|ids| ids == &vec![1, 2, 3, 4])
            .returning(|_| vec![runtime(95), runtime(180), None, runtime(0)]);

        let selection = PreferenceSelection {
            mood: Some(Mood::Thoughtful),
            genres: vec![18, 99],
            ..Default::default()
        };
        let result = recommend(&mock, &selection, today()).await.unwrap();

        let ids: Vec<u64> = result.titles.iter().map(|t| t.candidate.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(result.titles[0].candidate.runtime, Some(95));
        assert_eq!(result.titles[0].match_score, 78);
        assert_eq!(result.tier, FallbackTier::Primary);
    }

    #[tokio::test]
    async fn test_only_first_twelve_are_enriched_and_six_returned() {
        let mut mock = MockMetadataProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_discover()
            .returning(|_| Ok((1..=20).map(|id| candidate(id, &[], id as f64 / 2.0)).collect()));
        mock.expect_movie_details_batch()
            .withf(|ids| ids.len() == ENRICH_LIMIT)
            .times(1)
            .returning(|ids| ids.iter().map(|_| runtime(100)).collect());

        let selection = PreferenceSelection {
            sort: SortPreference::RatingDesc,
            ..Default::default()
        };
        let result = recommend(&mock, &selection, today()).await.unwrap();

        let ids: Vec<u64> = result.titles.iter().map(|t| t.candidate.id).collect();
        assert_eq!(ids, vec![12, 11, 10, 9, 8, 7]);
    }

    #[tokio::test]
    async fn test_empty_pool_yields_no_titles() {
        let mut mock = MockMetadataProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_discover().times(2).returning(|_| Ok(Vec::new()));
        mock.expect_movie_details_batch().returning(|_| Vec::new());

        let result = recommend(&mock, &PreferenceSelection::default(), today())
            .await
            .unwrap();
        assert!(result.titles.is_empty());
        assert_eq!(result.tier, FallbackTier::ProviderRelaxed);
    }
}
