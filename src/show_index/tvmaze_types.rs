/// TVMaze show records.
///
/// These structures mirror the JSON format of the TVMaze API and double as the
/// shape persisted in the local index cache.
use serde::{Deserialize, Deserializer, Serialize};

/// A single television series from the show index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    /// Unique TVMaze identifier
    pub id: u32,
    /// The name of the show
    pub name: String,
    /// Link to the show's page on tvmaze.com
    #[serde(default)]
    pub url: Option<String>,
    /// Kind of show ("Scripted", "Reality", ...)
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// Genre names, possibly empty
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    /// Airing status ("Running", "Ended", ...)
    #[serde(default)]
    pub status: Option<String>,
    /// Episode runtime in minutes
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Premiere date as reported by the service (YYYY-MM-DD)
    #[serde(default)]
    pub premiered: Option<String>,
    #[serde(default)]
    pub official_site: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: Rating,
    #[serde(default)]
    pub image: Option<ShowImage>,
    /// Summary in HTML format
    #[serde(default)]
    pub summary: Option<String>,
}

/// Average user rating of a show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// `None` when the show has not been rated yet
    #[serde(default)]
    pub average: Option<f64>,
}

/// Poster image URLs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShowImage {
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub original: Option<String>,
}

/// A single hit from the name search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Relevance score assigned by the service
    pub score: f64,
    pub show: Show,
}

/// Treats an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
