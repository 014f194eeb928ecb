//! tvdash - Browse and search television shows from the TVMaze index
//!
//! This library provides the core of the dashboard: a client for the public
//! show index, a store that keeps the loaded shows together with a 24 hour
//! local snapshot, and helpers that shape shows for display.

mod cache;
mod show_index;
mod shows;
mod store;

// Re-export error types
pub use cache::CacheError;
pub use show_index::ShowIndexError;

pub use cache::CacheStorage;
pub use show_index::{
    DEFAULT_BASE_URL, Rating, SearchResult, Show, ShowImage, ShowSource, TvMazeClient,
};
pub use shows::{
    GenreBuckets, OTHER_GENRE, format_rating, group_by_genre, rating_value, show_count_label,
    sort_by_rating_desc, strip_summary,
};
pub use store::{
    INDEX_CACHE_KEY, INDEX_CACHE_TTL, IndexSnapshot, LoadingIndicator, ShowsStore,
};

use std::path::Path;
use thiserror::Error;

/// Top-level error type for tvdash operations
#[derive(Debug, Error)]
pub enum TvDashError {
    /// Error while talking to the show index
    #[error("Show index error: {0}")]
    ShowIndex(#[from] ShowIndexError),

    /// Error during cache operations
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Loading the index pages failed; carries the store's error message
    #[error("Failed to load shows: {0}")]
    LoadFailed(String),
}

/// Opens the index snapshot cache
///
/// Uses `cache_dir` when given, otherwise the platform cache directory.
///
/// # Errors
///
/// Returns `TvDashError::Cache` if the cache directory cannot be located or
/// created.
pub fn open_index_cache(
    cache_dir: Option<&Path>,
) -> Result<CacheStorage<IndexSnapshot>, TvDashError> {
    let cache = match cache_dir {
        Some(dir) => CacheStorage::open_in(dir)?,
        None => CacheStorage::open("index")?,
    };

    Ok(cache)
}

/// Loads index pages into the store, turning a recorded failure into an error
///
/// # Errors
///
/// Returns `TvDashError::LoadFailed` with the store's message if any page
/// could not be loaded.
pub fn load_index<S: ShowSource>(
    store: &mut ShowsStore<S>,
    pages: &[u32],
) -> Result<(), TvDashError> {
    store.load_index_pages(pages);

    match store.error_message() {
        Some(message) => Err(TvDashError::LoadFailed(message.to_string())),
        None => Ok(()),
    }
}
