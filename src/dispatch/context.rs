//! Request/response context handed to middlewares, the resolver and handlers.
//!
//! # Responsibilities
//! - Snapshot the incoming request (path params, query, headers, parsed body)
//! - Hold mutable response state until the chain finishes
//! - Share that state with handlers through their context argument
//! - Render the final response
//!
//! # Design Decisions
//! - Parsing happens once per request, before the middleware chain runs
//! - A path segment that is not valid UTF-8 rejects the request with 400
//! - Repeated query keys collapse into a JSON array
//! - Headers keep `HeaderMap` semantics (case-insensitive lookup)

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    body::Body,
    extract::{rejection::RawPathParamsRejection, FromRequestParts, RawPathParams, Request},
    http::{header, Extensions, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::dispatch::error::{ClientError, DispatchError};
use crate::http::RequestIdExt;

/// Read-only view of one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: HashMap<String, String>,
    query: Map<String, Value>,
    body: Value,
    extensions: Extensions,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri) -> Self {
        let query = uri
            .query()
            .map(|q| parse_pairs(q.as_bytes()))
            .unwrap_or_default();
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            path_params: HashMap::new(),
            query,
            body: Value::Null,
            extensions: Extensions::new(),
        }
    }

    /// Build the context from an axum request matched by the router.
    pub async fn from_request(request: Request, body_limit: usize) -> Result<Self, DispatchError> {
        let (mut parts, body) = request.into_parts();

        let path_params = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(params) => params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            Err(RawPathParamsRejection::InvalidUtf8InPathParam(e)) => {
                return Err(ClientError::new(StatusCode::BAD_REQUEST, e.body_text()).into());
            }
            Err(e) => {
                tracing::debug!(uri = %parts.uri, error = %e, "No path parameters captured");
                HashMap::new()
            }
        };

        let body = read_body(&parts.headers, body, body_limit).await?;

        let mut ctx = Self::new(parts.method, parts.uri);
        ctx.headers = parts.headers;
        ctx.path_params = path_params;
        ctx.body = body;
        ctx.extensions = parts.extensions;
        Ok(ctx)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::from_str(value)) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text; the name is matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    pub fn query_param(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }

    /// Parsed request body; `Null` when there was none.
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn body_field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.headers.request_id()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Re-key captured path parameters from their mounted names to declared names.
    pub(crate) fn rename_path_params(&mut self, names: &[(String, String)]) {
        let mut captured = std::mem::take(&mut self.path_params);
        for (mounted, declared) in names {
            if let Some(value) = captured.remove(mounted) {
                self.path_params.insert(declared.clone(), value);
            }
        }
    }
}

/// Response fields mutated by middlewares and the translator.
#[derive(Debug, Default)]
pub struct ResponseState {
    status: Option<StatusCode>,
    body: Value,
    headers: HeaderMap,
    location: Option<String>,
}

impl ResponseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status, 200 when none was set.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn set_body(&mut self, body: Value) {
        self.body = body;
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Redirect to `url`. A non-3xx status is replaced by 302 and the body
    /// becomes a `Redirecting to <url>.` notice.
    pub fn redirect(&mut self, url: impl Into<String>) {
        let url = url.into();
        if !self.status().is_redirection() {
            self.status = Some(StatusCode::FOUND);
        }
        self.body = Value::String(format!("Redirecting to {}.", url));
        self.location = Some(url);
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl IntoResponse for ResponseState {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = match self.body {
            Value::Null => Body::empty().into_response(),
            Value::String(text) => text.into_response(),
            other => Json(other).into_response(),
        };
        *response.status_mut() = status;
        response.headers_mut().extend(self.headers);

        if let Some(location) = self.location {
            match HeaderValue::from_str(&location) {
                Ok(value) => {
                    response.headers_mut().insert(header::LOCATION, value);
                }
                Err(e) => tracing::warn!(location = %location, error = %e, "Dropping invalid redirect target"),
            }
        }
        response
    }
}

/// Response state shared between an exchange and the handler it is running.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle(Arc<Mutex<ResponseState>>);

impl ResponseHandle {
    pub fn new(state: ResponseState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut ResponseState) -> R) -> R {
        let mut state = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Take the state back. Clones that outlive the handler see an empty state.
    pub fn into_inner(self) -> ResponseState {
        match Arc::try_unwrap(self.0) {
            Ok(state) => state.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => {
                let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                std::mem::take(&mut *state)
            }
        }
    }
}

/// The context argument a handler receives: the request plus write access
/// to the response the route is building.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    request: RequestContext,
    response: ResponseHandle,
}

impl HandlerContext {
    pub fn new(request: RequestContext, response: ResponseHandle) -> Self {
        Self { request, response }
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn response(&self) -> &ResponseHandle {
        &self.response
    }

    pub fn status(&self) -> StatusCode {
        self.response.with(|state| state.status())
    }

    pub fn set_status(&self, status: StatusCode) {
        self.response.with(|state| state.set_status(status));
    }

    pub fn set_body(&self, body: Value) {
        self.response.with(|state| state.set_body(body));
    }

    pub fn set_header(&self, name: HeaderName, value: HeaderValue) {
        self.response.with(|state| {
            state.headers_mut().insert(name, value);
        });
    }

    pub fn redirect(&self, url: impl Into<String>) {
        self.response.with(|state| state.redirect(url));
    }
}

/// Request context plus response state, threaded through one route chain.
#[derive(Debug)]
pub struct Exchange {
    pub request: RequestContext,
    pub response: ResponseState,
}

impl Exchange {
    pub fn new(request: RequestContext) -> Self {
        Self {
            request,
            response: ResponseState::new(),
        }
    }
}

async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Value, DispatchError> {
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| ClientError::new(StatusCode::PAYLOAD_TOO_LARGE, "request body too large"))?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        Ok(Value::Object(parse_pairs(&bytes)))
    } else if content_type.contains("json") {
        serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::new(StatusCode::BAD_REQUEST, format!("invalid JSON body: {}", e)).into()
        })
    } else {
        Ok(Value::Null)
    }
}

fn parse_pairs(input: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    map
}
