/// Data structures and traits for reading the public show index.
///
/// This module provides the show records returned by the index service, the
/// errors a lookup can fail with, and the trait every show source implements.
mod tvmaze;
mod tvmaze_types;

pub use tvmaze::{DEFAULT_BASE_URL, TvMazeClient};
pub use tvmaze_types::{Rating, SearchResult, Show, ShowImage};

use thiserror::Error;

/// Errors that can occur while talking to the show index.
#[derive(Debug, Error)]
pub enum ShowIndexError {
    /// The service answered with a non-success HTTP status
    #[error("Request failed: {status} {status_text}")]
    RequestError { status: u16, status_text: String },

    /// The request never produced a response (DNS, TLS, connection reset, ...)
    #[error("Request could not be sent: {0}")]
    Transport(String),

    /// Failed to parse the service's JSON response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

/// Trait for sources that can answer show index queries.
///
/// The store only ever talks to this trait, so tests can substitute a fake
/// source and the HTTP client stays a thin adapter. Pages are fetched from
/// several threads at once, hence the `Sync` bound.
pub trait ShowSource: Sync {
    /// Fetches one page of the full show index.
    ///
    /// # Errors
    ///
    /// Returns a `ShowIndexError` if the request fails or the body is not a
    /// list of shows.
    fn fetch_page(&self, page: u32) -> Result<Vec<Show>, ShowIndexError>;

    /// Fetches a single show by its identifier.
    ///
    /// # Errors
    ///
    /// Returns a `ShowIndexError` if the request fails or the body is not a
    /// show.
    fn fetch_by_id(&self, id: u32) -> Result<Show, ShowIndexError>;

    /// Searches shows by name.
    ///
    /// Results come back in the order the service ranked them.
    ///
    /// # Errors
    ///
    /// Returns a `ShowIndexError` if the request fails or the body is not a
    /// list of search results.
    fn search_by_name(&self, query: &str) -> Result<Vec<SearchResult>, ShowIndexError>;
}

impl<T: ShowSource + ?Sized> ShowSource for &T {
    fn fetch_page(&self, page: u32) -> Result<Vec<Show>, ShowIndexError> {
        (**self).fetch_page(page)
    }

    fn fetch_by_id(&self, id: u32) -> Result<Show, ShowIndexError> {
        (**self).fetch_by_id(id)
    }

    fn search_by_name(&self, query: &str) -> Result<Vec<SearchResult>, ShowIndexError> {
        (**self).search_by_name(query)
    }
}
