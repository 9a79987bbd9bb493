use serde::Serialize;

use crate::{
    error::AppResult,
    models::Candidate,
    services::{providers::MetadataProvider, query_builder::DiscoverQuery},
};

/// Which query produced the candidate pool
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    /// The full query, including the streaming-provider filter
    Primary,
    /// Provider filter dropped; every other filter kept
    ProviderRelaxed,
}

/// Resolves the candidate pool for a discovery query
///
/// Errors from the primary query are returned to the caller. The relaxed
/// query runs only when the primary one comes back empty, and whatever it
/// yields (an error counts as nothing) is final.
pub async fn resolve_pool(
    provider: &dyn MetadataProvider,
    query: &DiscoverQuery,
) -> AppResult<(Vec<Candidate>, FallbackTier)> {
    let primary = provider.discover(&query.to_params()).await?;
    if !primary.is_empty() {
        tracing::debug!(results = primary.len(), tier = "primary", "Candidate pool resolved");
        return Ok((primary, FallbackTier::Primary));
    }

    tracing::info!(
        provider = provider.name(),
        "Primary query returned nothing; relaxing provider filter"
    );

    let relaxed = match provider.discover(&query.relax_provider().to_params()).await {
        Ok(results) => results,
        Err(e) => {
            tracing::warn!(error = %e, "Relaxed query failed; treating as empty");
            Vec::new()
        }
    };

    tracing::info!(
        results = relaxed.len(),
        tier = "provider_relaxed",
        "Candidate pool resolved"
    );

    Ok((relaxed, FallbackTier::ProviderRelaxed))
}
