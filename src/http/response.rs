//! HTTP response writing module
//!
//! Handlers produce a [`Reply`]; [`ResponseWriter::finish`] turns it into the
//! single response for the request and records the matching log entry.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_TYPE, SERVER};
use hyper::{Method, Response, StatusCode, Uri};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::logger::request_log::RequestLog;
use crate::logger::{self, RequestLogEntry};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Content type shared by every response of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Json,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Json(Value),
    Text(String),
}

/// A handler result waiting to be written
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: ReplyBody,
    /// Extra text for the request log only
    pub detail: Option<String>,
    pub allow: Option<&'static str>,
}

impl Reply {
    pub const fn json(status: StatusCode, value: Value) -> Self {
        Self {
            status,
            body: ReplyBody::Json(value),
            detail: None,
            allow: None,
        }
    }

    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self {
            status,
            body: ReplyBody::Text(text.into()),
            detail: None,
            allow: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Error reply in the route's family; the full error only reaches the log
    pub fn from_error(family: Family, err: &ApiError) -> Self {
        let status = err.status();
        let message = err.public_message();
        let reply = match family {
            Family::Json => Self::json(status, json!({ "error": message })),
            Family::Text => Self::text(status, message),
        };
        reply.with_detail(err.to_string())
    }

    pub fn method_not_allowed(family: Family, allow: &'static str) -> Self {
        let mut reply = Self::from_error(family, &ApiError::MethodNotAllowed);
        reply.allow = Some(allow);
        reply
    }

    pub fn not_found(family: Family) -> Self {
        Self::from_error(
            family,
            &ApiError::NotFound("Página no encontrada".to_string()),
        )
    }
}

/// Writes exactly one response per request, then logs it.
///
/// `finish` and `abort` consume the writer, so a request cannot be answered
/// or logged twice.
pub struct ResponseWriter {
    log: RequestLog,
    server_name: String,
    method: String,
    target: String,
}

impl ResponseWriter {
    pub fn new(log: RequestLog, server_name: &str, method: &Method, uri: &Uri) -> Self {
        let target = uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), ToString::to_string);
        Self {
            log,
            server_name: server_name.to_string(),
            method: method.to_string(),
            target,
        }
    }

    /// The log entry carries the status actually sent, even on a fallback
    pub fn finish(self, reply: Reply) -> Response<Full<Bytes>> {
        let response = build_response(&reply, &self.server_name);
        self.log.record(
            RequestLogEntry::new(self.method, self.target, response.status().as_u16())
                .with_detail(reply.detail),
        );
        response
    }

    /// The request ends without a response (connection reset); log it anyway
    pub fn abort(self, status: StatusCode, detail: &str) {
        self.log.record(
            RequestLogEntry::new(self.method, self.target, status.as_u16())
                .with_detail(Some(detail.to_string())),
        );
    }
}

fn build_response(reply: &Reply, server_name: &str) -> Response<Full<Bytes>> {
    let (content_type, body) = match &reply.body {
        ReplyBody::Json(value) => match serde_json::to_vec(value) {
            Ok(bytes) => (JSON_CONTENT_TYPE, Bytes::from(bytes)),
            Err(e) => {
                logger::log_error(&format!("Failed to serialize response: {e}"));
                return internal_error_response(server_name);
            }
        },
        ReplyBody::Text(text) => (TEXT_CONTENT_TYPE, Bytes::from(text.clone())),
    };

    let mut builder = Response::builder()
        .status(reply.status)
        .header(CONTENT_TYPE, content_type)
        .header(SERVER, server_name);
    if let Some(allow) = reply.allow {
        builder = builder.header(ALLOW, allow);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error(reply.status, &e);
        internal_error_response(server_name)
    })
}

fn internal_error_response(server_name: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(SERVER, server_name)
        .body(Full::new(Bytes::from_static(
            br#"{"error":"Error interno del servidor"}"#,
        )))
        .unwrap_or_else(|_| {
            // Only reachable with an unusable server name; drop the header
            let mut response = Response::new(Full::new(Bytes::from_static(
                br#"{"error":"Error interno del servidor"}"#,
            )));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}
