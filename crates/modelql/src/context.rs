//! Request context handed to guards and resolver methods.
//!
//! The surrounding transport attaches a [`ResContext`] to each request
//! (`async_graphql::Request::data`). Guards receive its request and response
//! handles; resolver methods receive the whole context as their final
//! argument.
//!
//! # Example
//!
//! ```ignore
//! let context = ResContext::builder()
//!     .with_request_id("req-123")
//!     .with_header("authorization", "Bearer abc")
//!     .build();
//!
//! let request = async_graphql::Request::new(query).data(context);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Read-only view of the incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestHandle {
    /// Request ID for tracing and correlation.
    pub request_id: Option<String>,
    /// Request headers with lowercased names.
    pub headers: HashMap<String, String>,
}

impl RequestHandle {
    /// Returns a header value, matching the name case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[derive(Debug, Default)]
struct ResponseState {
    status: Option<u16>,
    headers: HashMap<String, String>,
}

/// Response side a guard can write to, e.g. to report why it denied a call.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle {
    state: Arc<Mutex<ResponseState>>,
}

impl ResponseHandle {
    pub fn set_status(&self, status: u16) {
        self.state.lock().status = Some(status);
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.state.lock().status
    }

    pub fn set_header(&self, name: &str, value: impl Into<String>) {
        self.state
            .lock()
            .headers
            .insert(name.to_ascii_lowercase(), value.into());
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .headers
            .get(&name.to_ascii_lowercase())
            .cloned()
    }
}

/// Per-request context: the request and response handles.
#[derive(Debug, Clone, Default)]
pub struct ResContext {
    pub req: RequestHandle,
    pub res: ResponseHandle,
}

impl ResContext {
    /// Creates a new builder for `ResContext`.
    #[must_use]
    pub fn builder() -> ResContextBuilder {
        ResContextBuilder::default()
    }
}

/// Builder for constructing a [`ResContext`].
#[derive(Default)]
pub struct ResContextBuilder {
    request_id: Option<String>,
    headers: HashMap<String, String>,
    response: Option<ResponseHandle>,
}

impl ResContextBuilder {
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Shares an existing response handle, so the caller can inspect what
    /// guards wrote after execution.
    #[must_use]
    pub fn with_response(mut self, response: ResponseHandle) -> Self {
        self.response = Some(response);
        self
    }

    #[must_use]
    pub fn build(self) -> ResContext {
        ResContext {
            req: RequestHandle {
                request_id: self.request_id,
                headers: self.headers,
            },
            res: self.response.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_normalizes_header_names() {
        let context = ResContext::builder()
            .with_request_id("req-1")
            .with_header("Authorization", "Bearer token")
            .build();

        assert_eq!(context.req.request_id.as_deref(), Some("req-1"));
        assert_eq!(context.req.header("authorization"), Some("Bearer token"));
        assert_eq!(context.req.header("AUTHORIZATION"), Some("Bearer token"));
    }

    #[test]
    fn test_response_handle_is_shared_between_clones() {
        let response = ResponseHandle::default();
        let context = ResContext::builder().with_response(response.clone()).build();

        context.res.set_status(401);
        context.res.set_header("WWW-Authenticate", "Bearer");

        assert_eq!(response.status(), Some(401));
        assert_eq!(response.header("www-authenticate").as_deref(), Some("Bearer"));
    }
}
