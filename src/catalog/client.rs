//! Result fetcher: one GET against `search.json` per search.
//!
//! No retries, no cancellation. Every failure, whether transport, HTTP status
//! or undecodable body, collapses into [`FetchError::RequestFailed`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::models::{BookDetail, Query, parse_search_response};
use crate::base_system::context::Config;

/// Fixed `limit` parameter of every search request.
pub const RESULT_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("catalog request failed: {0}")]
    RequestFailed(String),
}

/// Minimal HTTP seam: GET a URL and decode the body as JSON.
pub trait Transport: Send + Sync {
    fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // reqwest is built without gzip support
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("book-finder")),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        debug!(target: "catalog", "响应状态: {}", status.as_u16());
        if !status.is_success() {
            return Err(FetchError::RequestFailed(format!("HTTP {}", status.as_u16())));
        }

        resp.json::<Value>()
            .map_err(|e| FetchError::RequestFailed(format!("invalid json: {e}")))
    }
}

/// Builds search URLs and decodes responses; the HTTP work goes through a [`Transport`].
#[derive(Clone)]
pub struct CatalogClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl CatalogClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config.user_agent, config.request_timeout())?;
        Ok(Self::new(Arc::new(transport), config.catalog_root()))
    }

    pub fn fetch(&self, query: &Query) -> Result<Vec<BookDetail>, FetchError> {
        let url = build_search_url(&self.base_url, query);
        debug!(target: "catalog", "GET {url}");

        match self.transport.get_json(&url) {
            Ok(data) => {
                let books = parse_search_response(&data);
                debug!(target: "catalog", "收到 {} 条记录", books.len());
                Ok(books)
            }
            Err(err) => {
                warn!(target: "catalog", "搜索请求失败: {err}");
                Err(err)
            }
        }
    }
}

/// `{base}/search.json?{param}={encoded text}&limit=20`
pub fn build_search_url(base_url: &str, query: &Query) -> String {
    format!(
        "{}/search.json?{}={}&limit={}",
        base_url.trim_end_matches('/'),
        query.mode().param(),
        urlencoding::encode(query.text()),
        RESULT_LIMIT
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every requested URL and answers with a canned result.
    pub(crate) struct RecordingTransport {
        pub(crate) urls: Mutex<Vec<String>>,
        response: Mutex<Result<Value, FetchError>>,
    }

    impl RecordingTransport {
        pub(crate) fn new(response: Result<Value, FetchError>) -> Arc<Self> {
            Arc::new(Self {
                urls: Mutex::new(Vec::new()),
                response: Mutex::new(response),
            })
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        fn get_json(&self, url: &str) -> Result<Value, FetchError> {
            self.urls.lock().unwrap().push(url.to_string());
            self.response.lock().unwrap().clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use serde_json::json;

    use super::testing::RecordingTransport;
    use super::*;
    use crate::catalog::SearchMode;

    fn query(text: &str, mode: SearchMode) -> Query {
        Query::new(text, mode).unwrap()
    }

    #[test]
    fn url_parameter_follows_mode() {
        let base = "https://openlibrary.org";
        assert_eq!(
            build_search_url(base, &query("Harry Potter", SearchMode::Title)),
            "https://openlibrary.org/search.json?title=Harry%20Potter&limit=20"
        );
        assert_eq!(
            build_search_url(base, &query("Tolkien", SearchMode::Author)),
            "https://openlibrary.org/search.json?author=Tolkien&limit=20"
        );
        assert_eq!(
            build_search_url(base, &query("Science Fiction", SearchMode::Subject)),
            "https://openlibrary.org/search.json?subject=Science%20Fiction&limit=20"
        );
        assert_eq!(
            build_search_url("https://openlibrary.org/", &query("dune", SearchMode::FreeText)),
            "https://openlibrary.org/search.json?q=dune&limit=20"
        );
    }

    #[test]
    fn url_text_is_percent_encoded() {
        let url = build_search_url("http://x", &query("C++ & you/me?", SearchMode::Title));
        assert_eq!(url, "http://x/search.json?title=C%2B%2B%20%26%20you%2Fme%3F&limit=20");

        let url = build_search_url("http://x", &query("Les Misérables", SearchMode::Title));
        assert_eq!(url, "http://x/search.json?title=Les%20Mis%C3%A9rables&limit=20");
    }

    #[test]
    fn fetch_issues_exactly_one_request() {
        let transport = RecordingTransport::new(Ok(json!({
            "docs": [{"title": "The Hobbit"}, {"title": "The Silmarillion"}]
        })));
        let client = CatalogClient::new(transport.clone(), "https://openlibrary.org");

        let books = client.fetch(&query("Tolkien", SearchMode::Author)).unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[1].summary.display_title(), "The Silmarillion");
        assert_eq!(
            transport.requests(),
            vec!["https://openlibrary.org/search.json?author=Tolkien&limit=20".to_string()]
        );
    }

    #[test]
    fn fetch_passes_transport_failure_through() {
        let transport =
            RecordingTransport::new(Err(FetchError::RequestFailed("connection reset".into())));
        let client = CatalogClient::new(transport, "https://openlibrary.org");
        let err = client.fetch(&query("x", SearchMode::Title)).unwrap_err();
        assert_eq!(err, FetchError::RequestFailed("connection reset".into()));
    }

    /// Serve exactly one canned HTTP response on a loopback port.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let mut seen = Vec::new();
                while let Ok(n) = stream.read(&mut buf) {
                    if n == 0 {
                        break;
                    }
                    seen.extend_from_slice(&buf[..n]);
                    if seen.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });
        format!("http://{addr}")
    }

    fn loopback_transport() -> HttpTransport {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        HttpTransport::with_client(client)
    }

    #[test]
    fn http_error_status_maps_to_request_failed() {
        let base = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let err = loopback_transport()
            .get_json(&format!("{base}/search.json"))
            .unwrap_err();
        assert_eq!(err, FetchError::RequestFailed("HTTP 500".into()));
    }

    #[test]
    fn http_success_decodes_json() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 27\r\nConnection: close\r\n\r\n{\"docs\":[{\"title\":\"Emma\"}]}",
        );
        let value = loopback_transport()
            .get_json(&format!("{base}/search.json"))
            .unwrap();
        assert_eq!(value["docs"][0]["title"], "Emma");
    }

    #[test]
    fn undecodable_body_maps_to_request_failed() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot json!",
        );
        let err = loopback_transport()
            .get_json(&format!("{base}/search.json"))
            .unwrap_err();
        assert!(matches!(err, FetchError::RequestFailed(msg) if msg.starts_with("invalid json")));
    }

    #[test]
    fn refused_connection_maps_to_request_failed() {
        // bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let err = loopback_transport()
            .get_json(&format!("http://127.0.0.1:{port}/search.json"))
            .unwrap_err();
        assert!(matches!(err, FetchError::RequestFailed(_)));
    }
}
