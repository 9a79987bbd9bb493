use std::collections::HashSet;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    db::KeyValueStore,
    models::{NewWatchlistItem, WatchlistItem},
};

pub const WATCHLIST_KEY: &str = "movie_mood_watchlist";
pub const LIKED_KEY: &str = "movie_mood_liked";

/// Saved titles and liked ids for one user
///
/// State is loaded once at construction. Every mutation writes the whole
/// affected collection back; write failures are logged and the in-memory
/// state stays authoritative.
pub struct WatchlistStore<S: KeyValueStore> {
    store: S,
    items: Vec<WatchlistItem>,
    item_ids: HashSet<u64>,
    liked: Vec<u64>,
    liked_ids: HashSet<u64>,
}

fn load_blob<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Vec<T> {
    let Some(bytes) = store.get(key) else {
        return Vec::new();
    };

    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        tracing::warn!(key = key, error = %e, "Discarding unreadable stored collection");
        Vec::new()
    })
}

impl<S: KeyValueStore> WatchlistStore<S> {
    pub fn load(store: S) -> Self {
        let mut item_ids = HashSet::new();
        let items: Vec<WatchlistItem> = load_blob::<WatchlistItem>(&store, WATCHLIST_KEY)
            .into_iter()
            .filter(|item| item_ids.insert(item.id))
            .collect();

        let mut liked_ids = HashSet::new();
        let liked: Vec<u64> = load_blob::<u64>(&store, LIKED_KEY)
            .into_iter()
            .filter(|id| liked_ids.insert(*id))
            .collect();

        tracing::debug!(items = items.len(), liked = liked.len(), "Watchlist loaded");

        Self {
            store,
            items,
            item_ids,
            liked,
            liked_ids,
        }
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_vec(value)
            .map_err(std::io::Error::from)
            .and_then(|bytes| self.store.set(key, &bytes));

        if let Err(e) = result {
            tracing::warn!(key = key, error = %e, "Failed to persist collection");
        }
    }

    /// Most recently added first
    pub fn items(&self) -> &[WatchlistItem] {
        &self.items
    }

    pub fn liked(&self) -> &[u64] {
        &self.liked
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_in_watchlist(&self, id: u64) -> bool {
        self.item_ids.contains(&id)
    }

    pub fn is_liked(&self, id: u64) -> bool {
        self.liked_ids.contains(&id)
    }

    /// Adds an item stamped with the current time. Returns `false` if the id
    /// is already saved, in which case nothing changes.
    pub fn add(&mut self, item: NewWatchlistItem) -> bool {
        if !self.item_ids.insert(item.id) {
            return false;
        }

        tracing::debug!(id = item.id, title = %item.title, "Adding to watchlist");
        self.items.insert(0, item.added_at(Utc::now()));
        self.persist(WATCHLIST_KEY, &self.items);
        true
    }

    pub fn remove(&mut self, id: u64) -> bool {
        if !self.item_ids.remove(&id) {
            return false;
        }

        self.items.retain(|item| item.id != id);
        self.persist(WATCHLIST_KEY, &self.items);
        true
    }

    /// Flips the liked state and returns the new one
    pub fn toggle_like(&mut self, id: u64) -> bool {
        let liked = if self.liked_ids.remove(&id) {
            self.liked.retain(|liked| *liked != id);
            false
        } else {
            self.liked_ids.insert(id);
            self.liked.push(id);
            true
        };

        self.persist(LIKED_KEY, &self.liked);
        liked
    }

    /// Empties the watchlist. Liked ids are kept.
    pub fn clear(&mut self) {
        self.items.clear();
        self.item_ids.clear();
        self.persist(WATCHLIST_KEY, &self.items);
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::db::{FileStore, MemoryStore};
    use crate::models::{Candidate, MediaType};

    fn item(id: u64) -> NewWatchlistItem {
        NewWatchlistItem {
            id,
            title: format!("Movie {}", id),
            poster_path: None,
            media_type: MediaType::Movie,
            vote_average: 7.5,
            release_date: Some("2020-01-01".to_string()),
            genre_ids: vec![18],
        }
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Option<Vec<u8>> {
            None
        }

        fn set(&self, _key: &str, _value: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    #[test]
    fn test_add_prepends_and_ignores_duplicates() {
        let mut watchlist = WatchlistStore::load(MemoryStore::new());

        assert!(watchlist.add(item(1)));
        assert!(watchlist.add(item(2)));
        assert!(!watchlist.add(item(1)));

        let ids: Vec<u64> = watchlist.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(watchlist.is_in_watchlist(1));
        assert!(!watchlist.is_in_watchlist(3));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut watchlist = WatchlistStore::load(MemoryStore::new());
        watchlist.add(item(1));
        watchlist.add(item(2));

        assert!(watchlist.remove(1));
        assert!(!watchlist.remove(1));
        assert_eq!(watchlist.len(), 1);

        watchlist.toggle_like(2);
        watchlist.clear();
        assert!(watchlist.is_empty());
        assert!(!watchlist.is_in_watchlist(2));
        assert!(watchlist.is_liked(2));
    }

    #[test]
    fn test_add_then_remove_restores_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut watchlist = WatchlistStore::load(FileStore::open(dir.path()).unwrap());
        watchlist.add(item(1));
        watchlist.add(item(2));

        let before = watchlist.items().to_vec();
        let stored_before = FileStore::open(dir.path()).unwrap().get(WATCHLIST_KEY);

        assert!(watchlist.add(item(3)));
        assert!(watchlist.remove(3));

        assert_eq!(watchlist.items(), before.as_slice());
        assert!(!watchlist.is_in_watchlist(3));
        assert_eq!(
            FileStore::open(dir.path()).unwrap().get(WATCHLIST_KEY),
            stored_before
        );
    }

    #[test]
    fn test_toggle_like() {
        let mut watchlist = WatchlistStore::load(MemoryStore::new());

        assert!(watchlist.toggle_like(550));
        assert!(watchlist.is_liked(550));
        assert!(!watchlist.toggle_like(550));
        assert!(!watchlist.is_liked(550));
        assert!(watchlist.liked().is_empty());
    }

    #[test]
    fn test_state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut watchlist = WatchlistStore::load(FileStore::open(dir.path()).unwrap());
            watchlist.add(item(7));
            watchlist.toggle_like(7);
            watchlist.toggle_like(8);
        }

        let watchlist = WatchlistStore::load(FileStore::open(dir.path()).unwrap());
        assert_eq!(watchlist.items()[0].id, 7);
        assert_eq!(watchlist.items()[0].title, "Movie 7");
        assert_eq!(watchlist.liked(), &[7, 8]);
    }

    #[test]
    fn test_corrupt_blob_loads_empty() {
        let store = MemoryStore::new();
        store.set(WATCHLIST_KEY, b"{not json").unwrap();
        store.set(LIKED_KEY, b"[1, 1, 2]").unwrap();

        let watchlist = WatchlistStore::load(store);
        assert!(watchlist.is_empty());
        assert_eq!(watchlist.liked(), &[1, 2]);
    }

    #[test]
    fn test_write_failures_are_swallowed() {
        let mut watchlist = WatchlistStore::load(FailingStore);
        assert!(watchlist.add(item(1)));
        assert!(watchlist.toggle_like(1));
        assert!(watchlist.is_in_watchlist(1));
    }

    #[test]
    fn test_add_from_search_result() {
        let candidate: Candidate = serde_json::from_str(
            r#"{"id": 550, "title": "Fight Club", "vote_average": 8.4, "genre_ids": [18]}"#,
        )
        .unwrap();

        let mut watchlist = WatchlistStore::load(MemoryStore::new());
        assert!(watchlist.add(NewWatchlistItem::from(&candidate)));

        let saved = &watchlist.items()[0];
        assert_eq!(saved.id, 550);
        assert_eq!(saved.media_type, MediaType::Movie);
        assert_eq!(saved.genre_ids, vec![18]);
    }
}
