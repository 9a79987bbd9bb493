/// A macro to simplify response caching.
///
/// This macro checks if a value is present in the cache.
/// If found, it returns the cached value.
/// If not found, it executes the provided block to compute the value,
/// stores it in the cache, and then returns the computed value.
/// Errors from the block are returned as-is and never cached.
///
/// # Arguments
/// * `$cache`: The cache instance to use for retrieval and storage. The cache must have
///   async `get_from_cache` and `store` methods.
/// * `$key`: The key to use for caching the value.
/// * `$ttl`: The time-to-live for the cached value, as a `Duration`.
/// * `$block`: The future to await if the value is not found in cache.
///
/// # Example
/// ```rust,ignore
/// let value = cached!(cache, key, key.ttl(), async move {
///     fetch_from_upstream().await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        // Attempt to get the value from cache
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok(cached)
        } else {
            // If not in cache, execute the block to compute the value
            let value = $block.await?;
            // Store the computed value in cache
            $cache.store(&$key, &value, $ttl).await;
            Ok(value)
        }
    }};
}
