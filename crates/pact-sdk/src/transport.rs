//! Transport layer for HTTP communication

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use crate::SdkError;

/// Status and body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Raw body
    pub body: String,
}

impl HttpResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 response carrying a JSON body
    pub fn ok_json(body: &Value) -> Self {
        Self::new(200, body.to_string())
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the status is 404
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Fail with [`SdkError::Http`] unless the status is 2xx
    pub fn error_for_status(self) -> Result<Self, SdkError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SdkError::Http {
                status: self.status,
                body: self.body,
            })
        }
    }

    /// Parse the body; a body of the wrong shape is a protocol fault
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, SdkError> {
        serde_json::from_str(&self.body).map_err(|e| SdkError::Protocol(e.to_string()))
    }
}

/// Transport trait for HTTP communication (object-safe)
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a URL, optionally overriding the accept header
    async fn get(&self, url: &str, accept: Option<&str>) -> Result<HttpResponse, SdkError>;

    /// POST a JSON body
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, SdkError>;
}

/// HTTP method of a recorded request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Method
    pub method: Method,
    /// Full URL
    pub url: String,
    /// Accept header override
    pub accept: Option<String>,
    /// JSON body of a POST
    pub body: Option<Value>,
}

type Handler = Arc<dyn Fn(&Value) -> HttpResponse + Send + Sync>;

#[derive(Clone)]
enum Route {
    Fixed(HttpResponse),
    Dynamic(Handler),
}

/// Mock transport for testing.
///
/// Routes are keyed by a URL fragment; a request is answered by the longest
/// fragment its URL contains. Unrouted requests get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<(String, Route)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Create a mock with no routes
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests matching `fragment` with a 200 JSON body
    pub fn set_json(&self, fragment: &str, body: Value) {
        self.set_response(fragment, HttpResponse::ok_json(&body));
    }

    /// Answer requests matching `fragment` with a fixed response
    pub fn set_response(&self, fragment: &str, response: HttpResponse) {
        self.insert(fragment, Route::Fixed(response));
    }

    /// Answer requests matching `fragment` by calling `handler` with the
    /// request body (`null` for GET)
    pub fn set_handler<F>(&self, fragment: &str, handler: F)
    where
        F: Fn(&Value) -> HttpResponse + Send + Sync + 'static,
    {
        self.insert(fragment, Route::Dynamic(Arc::new(handler)));
    }

    fn insert(&self, fragment: &str, route: Route) {
        let mut routes = self.routes.lock();
        routes.retain(|(f, _)| f != fragment);
        routes.push((fragment.to_string(), route));
    }

    /// Clear routes and recorded requests
    pub fn clear(&self) {
        self.routes.lock().clear();
        self.requests.lock().clear();
    }

    /// All requests seen so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests whose URL contains `fragment`
    pub fn request_count(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }

    fn respond(&self, request: RecordedRequest) -> HttpResponse {
        let route = self
            .routes
            .lock()
            .iter()
            .filter(|(fragment, _)| request.url.contains(fragment.as_str()))
            .max_by_key(|(fragment, _)| fragment.len())
            .map(|(_, route)| route.clone());

        let body = request.body.clone().unwrap_or(Value::Null);
        let url = request.url.clone();
        self.requests.lock().push(request);

        match route {
            Some(Route::Fixed(response)) => response,
            Some(Route::Dynamic(handler)) => handler(&body),
            None => HttpResponse::new(404, format!("no route for {}", url)),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, accept: Option<&str>) -> Result<HttpResponse, SdkError> {
        Ok(self.respond(RecordedRequest {
            method: Method::Get,
            url: url.to_string(),
            accept: accept.map(str::to_string),
            body: None,
        }))
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, SdkError> {
        Ok(self.respond(RecordedRequest {
            method: Method::Post,
            url: url.to_string(),
            accept: None,
            body: Some(body.clone()),
        }))
    }
}

/// HTTP transport backed by reqwest
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a transport with a per-request timeout
    pub fn new(timeout: std::time::Duration) -> Result<Self, SdkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SdkError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> Result<HttpResponse, SdkError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, accept: Option<&str>) -> Result<HttpResponse, SdkError> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;
        Self::read(response).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, SdkError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;
        Self::read(response).await
    }
}
