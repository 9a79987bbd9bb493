//! Metadata provider abstraction
//!
//! Everything the service knows about titles comes through this trait: the
//! raw proxy passthrough, discovery queries, and per-title detail lookups.
//! The production implementation is TMDB; tests plug in scripted providers.

use crate::{
    error::AppResult,
    models::{Candidate, CandidateDetails},
};

pub mod tmdb;

/// Trait for title metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch an upstream endpoint with already-sanitized parameters
    ///
    /// Returns the upstream JSON body untouched.
    async fn fetch_json(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> AppResult<serde_json::Value>;

    /// Whether upstream credentials are configured
    fn has_credentials(&self) -> bool {
        true
    }

    /// Run a `discover/movie` query and return the candidates on the first page
    ///
    /// Individual results that fail to deserialize are skipped.
    async fn discover(&self, params: &[(String, String)]) -> AppResult<Vec<Candidate>> {
        let body = self.fetch_json("discover/movie", params).await?;

        let candidates: Vec<Candidate> = body["results"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .filter_map(|result| serde_json::from_value::<Candidate>(result.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        tracing::debug!(
            results = candidates.len(),
            provider = self.name(),
            "Discover query completed"
        );

        Ok(candidates)
    }

    /// Fetch runtime and external id for one movie
    async fn movie_details(&self, id: u64) -> AppResult<CandidateDetails> {
        let body = self.fetch_json(&format!("movie/{}", id), &[]).await?;
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    /// Fetch details for multiple movies in parallel
    ///
    /// Results line up with `ids`. A failed lookup yields `None` and is logged;
    /// it never fails the batch.
    async fn movie_details_batch(&self, ids: Vec<u64>) -> Vec<Option<CandidateDetails>> {
        let mut tasks = Vec::new();

        for id in ids {
            let provider = self.clone_for_task();
            let task = tokio::spawn(async move { provider.movie_details(id).await });
            tasks.push((id, task));
        }

        let mut results = Vec::with_capacity(tasks.len());
        let mut error_count = 0;

        for (id, task) in tasks {
            match task.await {
                Ok(Ok(details)) => results.push(Some(details)),
                Ok(Err(e)) => {
                    tracing::warn!(movie_id = id, error = %e, "Detail lookup failed");
                    error_count += 1;
                    results.push(None);
                }
                Err(e) => {
                    tracing::error!(movie_id = id, error = %e, "Task join error");
                    error_count += 1;
                    results.push(None);
                }
            }
        }

        if error_count > 0 {
            tracing::warn!(
                success_count = results.len() - error_count,
                error_count = error_count,
                "Partial detail lookup failure"
            );
        }

        results
    }

    /// Clone provider for parallel task execution
    ///
    /// Required because providers need to be moved into tokio tasks.
    fn clone_for_task(&self) -> Box<dyn MetadataProvider>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
