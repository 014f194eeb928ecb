//! Show presentation helpers
//!
//! Pure functions that shape loaded shows for display: summary cleanup,
//! rating ordering and genre grouping. Nothing in here touches the network
//! or the cache.

use crate::show_index::Show;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Bucket name used for shows without any genre
pub const OTHER_GENRE: &str = "Other";

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("failed to compile tag regex"));

static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("failed to compile whitespace regex"));

/// Shows grouped by genre, keyed by genre name
pub type GenreBuckets<'a> = BTreeMap<String, Vec<&'a Show>>;

/// Converts an HTML summary into a single line of plain text
///
/// Removes everything that looks like a tag (`<...>`), collapses runs of
/// whitespace to a single space and trims both ends. This is not an HTML
/// parser: entities are left alone.
///
/// # Examples
///
/// ```
/// use tvdash::strip_summary;
///
/// assert_eq!(strip_summary(Some("<p>Hello <b>World</b></p>")), "Hello World");
/// assert_eq!(strip_summary(None), "");
/// ```
pub fn strip_summary(html: Option<&str>) -> String {
    let Some(html) = html else {
        return String::new();
    };

    let without_tags = TAG_PATTERN.replace_all(html, "");
    WHITESPACE_PATTERN
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

/// Returns the rating used for ordering shows
///
/// Unrated shows sort as `0.0`. Use [`format_rating`] for display, which
/// keeps "no rating" apart from a zero rating.
pub fn rating_value(show: &Show) -> f64 {
    show.rating.average.unwrap_or(0.0)
}

/// Formats a rating for display: one decimal place, or `N/A` when unrated
pub fn format_rating(average: Option<f64>) -> String {
    match average {
        Some(value) => format!("{value:.1}"),
        None => "N/A".to_string(),
    }
}

/// Heading suffix for a genre row ("1 show", "12 shows")
pub fn show_count_label(count: usize) -> String {
    if count == 1 {
        "1 show".to_string()
    } else {
        format!("{count} shows")
    }
}

fn compare_by_rating_desc(a: &Show, b: &Show) -> Ordering {
    rating_value(b)
        .total_cmp(&rating_value(a))
        .then_with(|| a.name.cmp(&b.name))
}

/// Sorts shows by rating (highest first), then by name
///
/// The sort is stable and leaves the input untouched.
pub fn sort_by_rating_desc<'a, I>(shows: I) -> Vec<&'a Show>
where
    I: IntoIterator<Item = &'a Show>,
{
    let mut sorted: Vec<&Show> = shows.into_iter().collect();
    sorted.sort_by(|a, b| compare_by_rating_desc(a, b));
    sorted
}

/// Groups shows into one bucket per genre
///
/// A show with several genres appears in each of their buckets; a show with
/// no genres goes into the [`OTHER_GENRE`] bucket only. Every bucket is
/// sorted with [`sort_by_rating_desc`].
pub fn group_by_genre(shows: &[Show]) -> GenreBuckets<'_> {
    let mut buckets: GenreBuckets<'_> = BTreeMap::new();

    for show in shows {
        if show.genres.is_empty() {
            buckets
                .entry(OTHER_GENRE.to_string())
                .or_default()
                .push(show);
            continue;
        }

        for genre in &show.genres {
            buckets.entry(genre.clone()).or_default().push(show);
        }
    }

    for bucket in buckets.values_mut() {
        bucket.sort_by(|a, b| compare_by_rating_desc(a, b));
    }

    buckets
}
