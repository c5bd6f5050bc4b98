//! HTTP test client.
//!
//! [`TestClient`] sends simulated requests through an axum [`Router`] with
//! [`tower::ServiceExt::oneshot`] and returns a [`TestResponse`]. Cookies set
//! by responses are stored and sent back on later requests; a cookie set to
//! an empty value or with `Max-Age=0` is removed from the jar.
//!
//! ```rust,no_run
//! use axum::routing::get;
//! use axum::Router;
//! use eventos_test::client::TestClient;
//!
//! async fn example() {
//!     let app = Router::new().route("/hola", get(|| async { "Hola" }));
//!     let mut client = TestClient::new(app);
//!
//!     let response = client.get("/hola").await;
//!     assert_eq!(response.status_code(), 200);
//!     assert_eq!(response.text(), "Hola");
//! }
//! ```

use std::collections::HashMap;

use axum::Router;
use bytes::Bytes;
use eventos_core::EventosError;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tower::ServiceExt;

/// Characters escaped in `application/x-www-form-urlencoded` bodies; spaces
/// become `+` separately.
const FORM_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b' ');

/// Builds form data from literal pairs.
pub fn form_data(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// A client that makes in-process requests against an axum application.
pub struct TestClient {
    app: Router,
    cookies: HashMap<String, String>,
}

impl TestClient {
    /// Wraps `app`.
    pub fn new(app: Router) -> Self {
        Self {
            app,
            cookies: HashMap::new(),
        }
    }

    /// Sends a GET request.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.request(Method::GET, path, None).await
    }

    /// Sends a POST request with URL-encoded form data.
    pub async fn post(&mut self, path: &str, data: &HashMap<String, String>) -> TestResponse {
        let body = Self::encode_form_data(data);
        self.request(
            Method::POST,
            path,
            Some((body.into_bytes(), "application/x-www-form-urlencoded")),
        )
        .await
    }

    /// Follows the `Location` of a redirect with a GET.
    ///
    /// # Panics
    ///
    /// Panics if the response has no `Location` header.
    pub async fn follow(&mut self, response: &TestResponse) -> TestResponse {
        let location = response
            .location()
            .unwrap_or_else(|| panic!("Response {} has no Location header", response.status))
            .to_string();
        self.get(&location).await
    }

    /// Sets a cookie sent with subsequent requests.
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    /// The current value of a cookie.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Clears all cookies.
    pub fn clear_cookies(&mut self) {
        self.cookies.clear();
    }

    /// Encodes form data as `application/x-www-form-urlencoded`.
    pub fn encode_form_data(data: &HashMap<String, String>) -> String {
        let encode = |s: &str| utf8_percent_encode(s, FORM_VALUE).to_string().replace(' ', "+");
        let mut pairs: Vec<String> = data
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect();
        pairs.sort();
        pairs.join("&")
    }

    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let mut pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        pairs.sort();
        Some(pairs.join("; "))
    }

    async fn request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<(Vec<u8>, &str)>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = self.cookie_header() {
            builder = builder.header("cookie", cookie);
        }
        let req = match body {
            Some((bytes, content_type)) => builder
                .header("content-type", content_type)
                .body(axum::body::Body::from(bytes)),
            None => builder.body(axum::body::Body::empty()),
        }
        .expect("request builder should not fail");

        self.send(req).await
    }

    async fn send(&mut self, req: Request<axum::body::Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(req)
            .await
            .expect("router should not error");

        let status = response.status();
        let headers = response.headers().clone();

        let mut response_cookies = HashMap::new();
        for value in headers.get_all(http::header::SET_COOKIE) {
            let Ok(cookie_str) = value.to_str() else {
                continue;
            };
            let mut parts = cookie_str.split(';');
            let Some((name, val)) = parts.next().and_then(|pair| pair.split_once('=')) else {
                continue;
            };
            let name = name.trim().to_string();
            let val = val.trim().to_string();
            let expired = parts.any(|attr| attr.trim().eq_ignore_ascii_case("max-age=0"));
            if expired || val.is_empty() {
                self.cookies.remove(&name);
            } else {
                self.cookies.insert(name.clone(), val.clone());
            }
            response_cookies.insert(name, val);
        }

        let body_bytes = response
            .into_body()
            .collect()
            .await
            .map_or_else(|_| Bytes::new(), http_body_util::Collected::to_bytes);

        TestResponse {
            status,
            headers,
            body: body_bytes.to_vec(),
            cookies: response_cookies,
        }
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

/// The response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    /// The HTTP status.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The raw body.
    pub body: Vec<u8>,
    /// Cookies set by the response, deletions included (as empty values).
    pub cookies: HashMap<String, String>,
}

impl TestResponse {
    /// The body as UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, EventosError> {
        serde_json::from_slice(&self.body).map_err(EventosError::from)
    }

    /// The numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// A header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns `true` if the header is present.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// The `Location` header.
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Returns `true` if the body contains `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.text().contains(text)
    }
}
