//! Request body decoding
//!
//! Bodies are collected frame by frame and abandoned as soon as they grow
//! past the configured limit, so an oversized upload never reaches a handler.

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, CONTENT_LENGTH};
use serde_json::{Map, Value};
use std::fmt::Display;
use thiserror::Error;

pub const DEFAULT_MAX_BODY_SIZE: usize = 1_000_000;

#[derive(Error, Debug)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Read(String),
}

/// Reject a declared `Content-Length` above the limit before reading anything
pub fn check_content_length(headers: &HeaderMap, limit: usize) -> Result<(), BodyError> {
    let Some(value) = headers.get(CONTENT_LENGTH) else {
        return Ok(());
    };
    match value.to_str().ok().and_then(|s| s.trim().parse::<u64>().ok()) {
        Some(size) if size > limit as u64 => Err(BodyError::PayloadTooLarge { limit }),
        // Unparseable lengths are left to the streaming check
        _ => Ok(()),
    }
}

/// Collect the body, failing once more than `limit` bytes have arrived
pub async fn read_limited<B>(body: B, limit: usize) -> Result<Bytes, BodyError>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let mut body = std::pin::pin!(body);
    let mut buf: Vec<u8> = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| BodyError::Read(e.to_string()))?;
        if let Ok(data) = frame.into_data() {
            if buf.len() + data.len() > limit {
                return Err(BodyError::PayloadTooLarge { limit });
            }
            buf.extend_from_slice(&data);
        }
    }

    Ok(Bytes::from(buf))
}

/// Parse a collected body as JSON. No bytes at all is an empty object.
pub fn decode_json(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    if bytes.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
}
