//! Transport trait and implementations for issuing API calls.
//!
//! The [`Transport`] trait is the seam between the typed gateways and the
//! wire. [`http::HttpTransport`] talks to a real endpoint; [`MockTransport`]
//! records calls in memory and answers from scripted responses.
//!
//! # Testing
//!
//! ```
//! use restkit::transport::{Method, MockResponse, MockTransport, Transport};
//! use serde_json::json;
//!
//! let mock = MockTransport::new();
//! mock.respond(Method::Get, "/events", MockResponse::Json(json!([{"name": "deploy"}])));
//!
//! let body = mock.get("/events", Some("token")).unwrap();
//! assert_eq!(body[0]["name"], "deploy");
//! assert_eq!(mock.calls().len(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// HTTP verbs used by the management API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Upper-case verb name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether repeating the call cannot create a second resource.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Self::Post)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single API call.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub method: Method,
    /// Path relative to the configured endpoint, starting with `/`
    pub path: &'a str,
    pub payload: Option<&'a Value>,
    /// Bearer token, when the call is authenticated
    pub token: Option<&'a str>,
}

/// Issues API calls and decodes their JSON bodies.
///
/// A 2xx response yields the decoded body (`Value::Null` when empty, an
/// object or an array otherwise). Any other status yields
/// [`Error::Http`] carrying the status and raw body.
pub trait Transport: Send + Sync {
    /// Send one request.
    fn send(&self, request: Request<'_>) -> Result<Value>;

    /// `GET path`
    fn get(&self, path: &str, token: Option<&str>) -> Result<Value> {
        self.send(Request {
            method: Method::Get,
            path,
            payload: None,
            token,
        })
    }

    /// `POST path` with a JSON payload
    fn post(&self, path: &str, payload: &Value, token: Option<&str>) -> Result<Value> {
        self.send(Request {
            method: Method::Post,
            path,
            payload: Some(payload),
            token,
        })
    }

    /// `PUT path` with an optional JSON payload
    fn put(&self, path: &str, payload: Option<&Value>, token: Option<&str>) -> Result<Value> {
        self.send(Request {
            method: Method::Put,
            path,
            payload,
            token,
        })
    }

    /// `DELETE path`
    fn delete(&self, path: &str, token: Option<&str>) -> Result<Value> {
        self.send(Request {
            method: Method::Delete,
            path,
            payload: None,
            token,
        })
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: Request<'_>) -> Result<Value> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: Request<'_>) -> Result<Value> {
        (**self).send(request)
    }
}

// =============================================================================
// Mock transport
// =============================================================================

/// Scripted answer for [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    /// 2xx with this body
    Json(Value),
    /// Non-2xx status with this raw body
    Status(u16, String),
    /// Connection-level failure
    Network(String),
}

impl MockResponse {
    fn into_result(self) -> Result<Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Status(status, body) => Err(Error::http(status, body)),
            Self::Network(message) => Err(Error::Network(message)),
        }
    }
}

/// A call observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub payload: Option<Value>,
    pub token: Option<String>,
}

impl RecordedCall {
    /// `"METHOD path"`, convenient for asserting call order.
    pub fn line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

type Route = (Method, String);

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<RecordedCall>,
    once: HashMap<Route, VecDeque<MockResponse>>,
    always: HashMap<Route, MockResponse>,
}

/// In-memory transport for tests.
///
/// Responses are looked up by exact method and path: a queued one-shot
/// response first, then a persistent one. Unscripted `GET`s answer 404 so
/// existence checks see "absent"; every other unscripted call answers `{}`.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a mock with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Answer every matching call with `response`.
    pub fn respond(&self, method: Method, path: impl Into<String>, response: MockResponse) {
        self.with_state(|s| {
            s.always.insert((method, path.into()), response);
        });
    }

    /// Answer the next matching call with `response`, ahead of any
    /// persistent answer.
    pub fn respond_once(&self, method: Method, path: impl Into<String>, response: MockResponse) {
        self.with_state(|s| {
            s.once
                .entry((method, path.into()))
                .or_default()
                .push_back(response);
        });
    }

    /// All calls observed so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.with_state(|s| s.calls.clone())
    }

    /// Observed calls rendered as `"METHOD path"` lines.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls().iter().map(RecordedCall::line).collect()
    }

    /// Observed calls with the given method, rendered as paths.
    pub fn paths_for(&self, method: Method) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .map(|c| c.path)
            .collect()
    }

    /// Forget recorded calls, keeping scripted responses.
    pub fn clear_calls(&self) {
        self.with_state(|s| s.calls.clear());
    }
}

impl Transport for MockTransport {
    fn send(&self, request: Request<'_>) -> Result<Value> {
        let response = self.with_state(|s| {
            s.calls.push(RecordedCall {
                method: request.method,
                path: request.path.to_string(),
                payload: request.payload.cloned(),
                token: request.token.map(str::to_string),
            });

            let route = (request.method, request.path.to_string());
            if let Some(next) = s.once.get_mut(&route).and_then(VecDeque::pop_front) {
                return next;
            }
            match s.always.get(&route) {
                Some(response) => response.clone(),
                None if request.method == Method::Get => {
                    MockResponse::Status(404, "not found".to_string())
                }
                None => MockResponse::Json(Value::Object(serde_json::Map::new())),
            }
        });

        response.into_result()
    }
}
