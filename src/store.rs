//! Shows store
//!
//! Holds the list of loaded shows together with the loading flag and the last
//! error message. Index pages are served from a local snapshot while it is
//! fresh and covers the requested pages; otherwise they are fetched in
//! parallel and the snapshot is replaced.

use crate::cache::CacheStorage;
use crate::show_index::{Show, ShowIndexError, ShowSource};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Key under which the index snapshot is persisted
pub const INDEX_CACHE_KEY: &str = "tv-dashboard:index-cache-v1";

/// How long an index snapshot stays usable
pub const INDEX_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Persisted copy of the loaded show index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    /// When the snapshot was written, in milliseconds since the Unix epoch
    pub saved_at: i64,
    /// Index pages the snapshot was built from
    pub pages: Vec<u32>,
    pub shows: Vec<Show>,
}

impl IndexSnapshot {
    /// Creates a snapshot stamped with the current time
    pub fn new(pages: Vec<u32>, shows: Vec<Show>) -> Self {
        Self {
            saved_at: Utc::now().timestamp_millis(),
            pages,
            shows,
        }
    }

    /// Checks whether the snapshot is still within `ttl` at `now_ms`
    ///
    /// A snapshot exactly `ttl` old still counts as fresh.
    pub fn is_fresh_at(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.saved_at) <= ttl_ms
    }

    /// Checks whether every requested page is part of the snapshot
    pub fn covers(&self, pages: &[u32]) -> bool {
        pages.iter().all(|page| self.pages.contains(page))
    }
}

/// Shared, read-only view of a store's loading flag
///
/// Cloned handles stay connected to the store, so a UI thread can poll the
/// flag while the store is busy fetching on another thread.
#[derive(Debug, Clone, Default)]
pub struct LoadingIndicator(Arc<AtomicBool>);

impl LoadingIndicator {
    /// Whether the store is currently fetching index pages
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Raises the loading flag and lowers it again when dropped
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// In-memory show list backed by the index snapshot cache
///
/// The store owns its state; callers hold it and pass it around by
/// reference. Only the store's own operations mutate it.
#[derive(Debug)]
pub struct ShowsStore<S> {
    source: S,
    cache: Option<CacheStorage<IndexSnapshot>>,
    shows: Vec<Show>,
    loading: LoadingIndicator,
    error_message: Option<String>,
}

impl<S: ShowSource> ShowsStore<S> {
    /// Creates an empty store reading from `source` and caching into `cache`
    pub fn new(source: S, cache: CacheStorage<IndexSnapshot>) -> Self {
        Self {
            source,
            cache: Some(cache),
            shows: Vec::new(),
            loading: LoadingIndicator::default(),
            error_message: None,
        }
    }

    /// Creates an empty store that always goes to the network
    pub fn without_cache(source: S) -> Self {
        Self {
            source,
            cache: None,
            shows: Vec::new(),
            loading: LoadingIndicator::default(),
            error_message: None,
        }
    }

    /// The currently loaded shows
    pub fn shows(&self) -> &[Show] {
        &self.shows
    }

    /// Whether an index fetch is in flight
    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Handle for watching the loading flag from another thread
    pub fn loading_indicator(&self) -> LoadingIndicator {
        self.loading.clone()
    }

    /// Message describing why the last index load failed, if it did
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Index of the loaded shows by identifier, built on demand
    pub fn show_by_id(&self) -> HashMap<u32, &Show> {
        self.shows.iter().map(|show| (show.id, show)).collect()
    }

    /// Loads the given index pages into the store
    ///
    /// A fresh snapshot covering all `pages` is used as-is without touching
    /// the network. Otherwise every page is fetched at the same time, the
    /// results are merged by show identifier and the snapshot is replaced.
    /// The loading flag is raised for the duration of the fetch.
    ///
    /// # Arguments
    ///
    /// * `pages` - Index page numbers to load (e.g. `&[0, 1]`)
    ///
    /// # Returns
    ///
    /// Nothing. On success [`shows`](Self::shows) holds the merged list. If
    /// any page fails the show list is left unchanged and the failure is
    /// recorded in [`error_message`](Self::error_message).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tvdash::{ShowsStore, TvMazeClient};
    ///
    /// let mut store = ShowsStore::without_cache(TvMazeClient::new());
    /// store.load_index_pages(&[0, 1]);
    ///
    /// match store.error_message() {
    ///     Some(message) => eprintln!("Could not load shows: {}", message),
    ///     None => println!("Loaded {} show(s)", store.shows().len()),
    /// }
    /// ```
    pub fn load_index_pages(&mut self, pages: &[u32]) {
        self.error_message = None;

        if let Some(snapshot) = self.read_snapshot(pages) {
            tracing::debug!(?pages, count = snapshot.shows.len(), "index served from cache");
            self.shows = snapshot.shows;
            return;
        }

        let result = {
            let _loading = LoadingGuard::raise(&self.loading.0);
            fetch_pages(&self.source, pages)
        };

        match result {
            Ok(shows) => {
                tracing::info!(?pages, count = shows.len(), "index pages loaded");
                let snapshot = IndexSnapshot::new(pages.to_vec(), shows);
                self.write_snapshot(&snapshot);
                self.shows = snapshot.shows;
            }
            Err(e) => {
                tracing::warn!(?pages, error = %e, "failed to load index pages");
                self.error_message = Some(e.to_string());
            }
        }
    }

    /// Returns a show by identifier, fetching it if it is not loaded yet
    ///
    /// A fetched show is appended to the in-memory list; the index snapshot is
    /// not updated.
    ///
    /// # Errors
    ///
    /// Returns the `ShowIndexError` of the underlying lookup. The store's
    /// error message is left alone.
    pub fn get_show_details(&mut self, id: u32) -> Result<Show, ShowIndexError> {
        if let Some(show) = self.shows.iter().rev().find(|show| show.id == id) {
            return Ok(show.clone());
        }

        let show = self.source.fetch_by_id(id)?;
        self.shows.push(show.clone());
        Ok(show)
    }

    /// Searches the index by name, ignoring relevance scores
    ///
    /// A blank query returns no results without a request. The loaded show
    /// list and the cache are not touched.
    ///
    /// # Errors
    ///
    /// Returns the `ShowIndexError` of the underlying search.
    pub fn search_remote(&self, query: &str) -> Result<Vec<Show>, ShowIndexError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let results = self.source.search_by_name(query)?;
        Ok(results.into_iter().map(|result| result.show).collect())
    }

    /// Reads a snapshot that is fresh and covers `pages`
    ///
    /// Unreadable or corrupt snapshots count as a miss.
    fn read_snapshot(&self, pages: &[u32]) -> Option<IndexSnapshot> {
        let cache = self.cache.as_ref()?;

        let snapshot = match cache.load(INDEX_CACHE_KEY) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable index cache");
                return None;
            }
        };

        if !snapshot.is_fresh_at(Utc::now().timestamp_millis(), INDEX_CACHE_TTL) {
            tracing::debug!(saved_at = snapshot.saved_at, "index cache expired");
            return None;
        }

        if !snapshot.covers(pages) {
            tracing::debug!(cached = ?snapshot.pages, requested = ?pages, "index cache misses pages");
            return None;
        }

        Some(snapshot)
    }

    /// Persists a snapshot, best effort
    fn write_snapshot(&self, snapshot: &IndexSnapshot) {
        let Some(cache) = &self.cache else {
            return;
        };

        if let Err(e) = cache.store(INDEX_CACHE_KEY, snapshot) {
            tracing::warn!(error = %e, "failed to write index cache");
        }
    }
}

/// Fetches all pages at once and merges them by show identifier
///
/// Each page gets its own thread in a dedicated pool, so every request is in
/// flight at the same time. Any failing page fails the whole batch.
fn fetch_pages<S: ShowSource>(source: &S, pages: &[u32]) -> Result<Vec<Show>, ShowIndexError> {
    if pages.is_empty() {
        return Ok(Vec::new());
    }

    let mut results: Vec<Result<Vec<Show>, ShowIndexError>> =
        pages.iter().map(|_| Ok(Vec::new())).collect();

    match rayon::ThreadPoolBuilder::new()
        .num_threads(pages.len())
        .thread_name(|index| format!("tvdash-page-{index}"))
        .build()
    {
        Ok(pool) => pool.scope(|scope| {
            for (slot, &page) in results.iter_mut().zip(pages) {
                scope.spawn(move |_| *slot = source.fetch_page(page));
            }
        }),
        Err(e) => {
            tracing::warn!(error = %e, "no fetch pool available, loading pages one by one");
            for (slot, &page) in results.iter_mut().zip(pages) {
                *slot = source.fetch_page(page);
            }
        }
    }

    let fetched = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    Ok(merge_by_id(fetched.into_iter().flatten()))
}

/// Deduplicates shows by identifier
///
/// Later entries replace earlier ones but keep the position where the
/// identifier first appeared. Pages are merged in request order, so a later
/// page wins over an earlier one.
fn merge_by_id(shows: impl IntoIterator<Item = Show>) -> Vec<Show> {
    let mut merged: Vec<Show> = Vec::new();
    let mut positions: HashMap<u32, usize> = HashMap::new();

    for show in shows {
        match positions.get(&show.id) {
            Some(&index) => merged[index] = show,
            None => {
                positions.insert(show.id, merged.len());
                merged.push(show);
            }
        }
    }

    merged
}
