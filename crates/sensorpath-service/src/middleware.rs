//! Request correlation and per-route telemetry.
//!
//! [`TelemetryLayer`] gives every request a [`RequestId`] (taken from
//! `X-Request-ID` or freshly generated), makes it available to handlers,
//! echoes it on the response and records `http_requests_total` and
//! `http_request_duration_seconds` labelled by the matched route template.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::{FromRequestParts, MatchedPath};
use http::request::Parts;
use http::{HeaderMap, HeaderName, HeaderValue, Request, Response, StatusCode};
use pin_project_lite::pin_project;
use tower::{Layer, Service};
use tracing::{info_span, Span};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Route label for requests no route matched, so probing clients cannot
/// inflate label cardinality.
const UNMATCHED_ROUTE: &str = "unmatched";

/// Correlation ID of one request; also the `instance` of problem responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Time-sortable UUID v7.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| extract_or_generate_request_id(&parts.headers)))
    }
}

/// Use a non-empty `X-Request-ID` header if present, otherwise generate one.
pub fn extract_or_generate_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(RequestId::from)
        .unwrap_or_else(RequestId::generate)
}

fn status_class(status: StatusCode) -> &'static str {
    if status.is_success() {
        "2xx"
    } else if status.is_redirection() {
        "3xx"
    } else if status.is_client_error() {
        "4xx"
    } else if status.is_server_error() {
        "5xx"
    } else {
        "other"
    }
}

/// What is known about a request before the handler runs.
#[derive(Debug)]
struct RequestTelemetry {
    request_id: RequestId,
    method: String,
    route: String,
    started: Instant,
}

impl RequestTelemetry {
    fn from_request<B>(req: &Request<B>) -> Self {
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map_or(UNMATCHED_ROUTE, MatchedPath::as_str)
            .to_string();

        Self {
            request_id: extract_or_generate_request_id(req.headers()),
            method: req.method().to_string(),
            route,
            started: Instant::now(),
        }
    }

    fn span(&self) -> Span {
        info_span!(
            "request",
            request_id = %self.request_id,
            method = %self.method,
            route = %self.route,
        )
    }

    fn record(&self, status: Option<StatusCode>) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let class = status.map_or("5xx", status_class);

        metrics::counter!(
            "http_requests_total",
            "method" => self.method.clone(),
            "route" => self.route.clone(),
            "status" => class
        )
        .increment(1);
        metrics::histogram!(
            "http_request_duration_seconds",
            "method" => self.method.clone(),
            "route" => self.route.clone()
        )
        .record(elapsed);

        match status {
            Some(status) => tracing::info!(
                status = status.as_u16(),
                latency_ms = elapsed * 1000.0,
                "request completed"
            ),
            None => tracing::error!(latency_ms = elapsed * 1000.0, "request failed"),
        }
    }
}

/// Tower layer wrapping the router with [`RequestId`] handling and telemetry.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryLayer;

impl<S> Layer<S> for TelemetryLayer {
    type Service = Telemetry<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Telemetry { inner }
    }
}

#[derive(Debug, Clone)]
pub struct Telemetry<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for Telemetry<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = TelemetryFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let telemetry = RequestTelemetry::from_request(&req);
        req.extensions_mut().insert(telemetry.request_id.clone());
        let span = telemetry.span();

        TelemetryFuture {
            inner: span.in_scope(|| self.inner.call(req)),
            telemetry,
            span,
        }
    }
}

pin_project! {
    pub struct TelemetryFuture<F> {
        #[pin]
        inner: F,
        telemetry: RequestTelemetry,
        span: Span,
    }
}

impl<F, ResBody, E> Future for TelemetryFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _enter = this.span.enter();

        let mut result = match this.inner.poll(cx) {
            Poll::Ready(result) => result,
            Poll::Pending => return Poll::Pending,
        };

        match &mut result {
            Ok(response) => {
                this.telemetry.record(Some(response.status()));
                if let Ok(value) = HeaderValue::from_str(this.telemetry.request_id.as_str()) {
                    response.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
            }
            Err(_) => this.telemetry.record(None),
        }

        Poll::Ready(result)
    }
}
