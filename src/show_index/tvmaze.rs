/// TVMaze show index client implementation.
use super::tvmaze_types::{SearchResult, Show};
use super::{ShowIndexError, ShowSource};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// Default location of the public TVMaze API
pub const DEFAULT_BASE_URL: &str = "https://api.tvmaze.com";

/// Show source backed by the TVMaze REST API.
///
/// Talks to three endpoints: the paged show index (`/shows?page=`), single
/// show lookup (`/shows/{id}`) and name search (`/search/shows?q=`). There
/// are no retries or rate limiting; failures go straight back to the caller.
#[derive(Debug, Clone)]
pub struct TvMazeClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl TvMazeClient {
    /// Creates a client for the public TVMaze API.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client talking to a different deployment of the API.
    ///
    /// Trailing slashes on `base_url` are ignored.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Returns the base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Performs a GET request and decodes the JSON body.
    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ShowIndexError> {
        let url = self.endpoint(path);
        tracing::debug!(%url, ?query, "requesting show index");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| ShowIndexError::Transport(e.to_string()))?;

        ensure_success(response.status())?;

        response
            .json()
            .map_err(|e| ShowIndexError::ParseError(e.to_string()))
    }
}

impl Default for TvMazeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ShowSource for TvMazeClient {
    fn fetch_page(&self, page: u32) -> Result<Vec<Show>, ShowIndexError> {
        let page = page.to_string();
        self.get_json("shows", &[("page", page.as_str())])
    }

    fn fetch_by_id(&self, id: u32) -> Result<Show, ShowIndexError> {
        self.get_json(&format!("shows/{id}"), &[])
    }

    fn search_by_name(&self, query: &str) -> Result<Vec<SearchResult>, ShowIndexError> {
        self.get_json("search/shows", &[("q", query)])
    }
}

/// Maps a non-success HTTP status to a `RequestError`.
fn ensure_success(status: StatusCode) -> Result<(), ShowIndexError> {
    if status.is_success() {
        return Ok(());
    }

    Err(ShowIndexError::RequestError {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Runs a blocking client call off the async runtime.
    ///
    /// The blocking client owns its own runtime, so it is created and dropped
    /// inside the blocking task.
    async fn call_blocking<T, F>(base_url: String, call: F) -> T
    where
        T: Send + 'static,
        F: FnOnce(&TvMazeClient) -> T + Send + 'static,
    {
        tokio::task::spawn_blocking(move || call(&TvMazeClient::with_base_url(&base_url)))
            .await
            .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_is_ignored() {
        let client = TvMazeClient::with_base_url("http://localhost:1234/");
        assert_eq!(client.base_url(), "http://localhost:1234");
        assert_eq!(client.endpoint("shows/5"), "http://localhost:1234/shows/5");
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(TvMazeClient::new().base_url(), "https://api.tvmaze.com");
    }

    #[test]
    fn test_ensure_success() {
        assert!(ensure_success(StatusCode::OK).is_ok());

        match ensure_success(StatusCode::NOT_FOUND) {
            Err(ShowIndexError::RequestError {
                status,
                status_text,
            }) => {
                assert_eq!(status, 404);
                assert_eq!(status_text, "Not Found");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_request_error_message() {
        let err = ensure_success(StatusCode::INTERNAL_SERVER_ERROR).unwrap_err();
        assert_eq!(err.to_string(), "Request failed: 500 Internal Server Error");
    }

    #[tokio::test]
    async fn test_fetch_page_via_http() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shows"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "name": "A", "genres": []}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let shows = call_blocking(mock_server.uri(), |client| client.fetch_page(2))
            .await
            .unwrap();

        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].name, "A");
    }

    #[tokio::test]
    async fn test_fetch_by_id_via_http() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shows/42"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": 42, "name": "Answer"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let show = call_blocking(mock_server.uri(), |client| client.fetch_by_id(42))
            .await
            .unwrap();

        assert_eq!(show.id, 42);
        assert_eq!(show.name, "Answer");
    }

    #[tokio::test]
    async fn test_search_via_http_keeps_service_order() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/shows"))
            .and(query_param("q", "the office"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"score": 0.5, "show": {"id": 2, "name": "Second"}},
                {"score": 0.9, "show": {"id": 1, "name": "First"}}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let results = call_blocking(mock_server.uri(), |client| {
            client.search_by_name("the office")
        })
        .await
        .unwrap();

        let ids: Vec<u32> = results.iter().map(|r| r.show.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(results[0].score, 0.5);
    }

    #[tokio::test]
    async fn test_non_success_status_is_request_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shows"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let err = call_blocking(mock_server.uri(), |client| client.fetch_page(0))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShowIndexError::RequestError { status: 503, .. }
        ));
        assert_eq!(err.to_string(), "Request failed: 503 Service Unavailable");
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shows/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&mock_server)
            .await;

        let err = call_blocking(mock_server.uri(), |client| client.fetch_by_id(1))
            .await
            .unwrap_err();

        assert!(matches!(err, ShowIndexError::ParseError(_)));
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        // Grab a free port, then release it so nothing is listening there
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = TvMazeClient::with_base_url(&format!("http://{addr}"));

        let err = client.fetch_page(0).unwrap_err();

        assert!(matches!(err, ShowIndexError::Transport(_)));
        assert!(err.to_string().starts_with("Request could not be sent"));
    }
}
