//! Response encoding and `Accept` negotiation

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::catalog::ResourceDescriptor;
use crate::error::{Result, ServerError};
use crate::payload::ResponsePayload;

/// Pick the media type to answer with.
///
/// `accept` is a comma-separated preference list; parameters such as `q=`
/// are ignored and the first listed range covering `produced` wins. A missing
/// or blank header accepts anything.
pub fn negotiate(accept: Option<&str>, produced: &'static str) -> Option<&'static str> {
    let Some(accept) = accept.filter(|value| !value.trim().is_empty()) else {
        return Some(produced);
    };
    accept
        .split(',')
        .map(|range| range.split(';').next().unwrap_or_default().trim())
        .find(|range| media_range_matches(range, produced))
        .map(|_| produced)
}

fn media_range_matches(range: &str, produced: &str) -> bool {
    if range == "*/*" || range.eq_ignore_ascii_case(produced) {
        return true;
    }
    match (range.split_once('/'), produced.split_once('/')) {
        (Some((kind, "*")), Some((produced_kind, _))) => kind.eq_ignore_ascii_case(produced_kind),
        _ => false,
    }
}

/// A successful response ready to go on the wire
#[derive(Debug)]
pub struct Encoded {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl IntoResponse for Encoded {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(self.content_type))],
            self.body,
        )
            .into_response()
    }
}

/// Serialize `payload` as the resource's canonical media type, or fail with
/// 406 when the client accepts none of it
pub fn encode(
    payload: &ResponsePayload,
    descriptor: &ResourceDescriptor,
    accept: Option<&str>,
) -> Result<Encoded> {
    let produced = descriptor.response_media_type;
    let content_type =
        negotiate(accept, produced).ok_or_else(|| ServerError::NotAcceptable {
            accept: accept.unwrap_or_default().to_string(),
            produced,
        })?;

    let body = serde_json::to_vec(payload)
        .map_err(|e| ServerError::Internal(format!("failed to encode response: {e}")))?;

    Ok(Encoded {
        status: StatusCode::OK,
        content_type,
        body,
    })
}
