//! # Dispatch
//!
//! Request semantics for the favicon and probe routes, independent of the
//! HTTP framework. Each function receives the registry and the request's cache
//! validators explicitly and returns the reply to send.

use axum::{
    http::{
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use supercookie_codec::{encode, quoted_etag, Bitmap};
use supercookie_core::{generate_identifier, mask_identifier, ProbeOutcome, TrackingRecord, TrackingRegistry};
use tracing::info;

use crate::error::RouteError;

/// Long-lived and shared. There is deliberately no `Vary`: the cached favicon
/// must be reused across contexts.
pub const CACHE_POLICY: &str = "public, max-age=31536000, immutable";
pub const BITMAP_CONTENT_TYPE: &str = "image/bmp";

/// Conditional-request headers of an incoming request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    pub if_none_match: Option<String>,
    pub if_modified_since: bool,
}

impl Validators {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            if_none_match: headers
                .get(IF_NONE_MATCH)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned()),
            if_modified_since: headers.contains_key(IF_MODIFIED_SINCE),
        }
    }

    pub fn with_if_none_match(token: impl Into<String>) -> Self {
        Self {
            if_none_match: Some(token.into()),
            if_modified_since: false,
        }
    }

    /// Exact comparison against a quoted ETag.
    pub fn matches(&self, quoted_etag: &str) -> bool {
        self.if_none_match.as_deref() == Some(quoted_etag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaviconReply {
    /// 304. `cache_control` repeats the caching policy alongside the ETag.
    NotModified { etag: String, cache_control: bool },
    /// 200 with the full bitmap.
    Fresh { etag: String, bitmap: Bitmap },
}

impl FaviconReply {
    pub fn status(&self) -> StatusCode {
        match self {
            FaviconReply::NotModified { .. } => StatusCode::NOT_MODIFIED,
            FaviconReply::Fresh { .. } => StatusCode::OK,
        }
    }

    pub fn etag(&self) -> &str {
        match self {
            FaviconReply::NotModified { etag, .. } | FaviconReply::Fresh { etag, .. } => etag,
        }
    }
}

impl IntoResponse for FaviconReply {
    fn into_response(self) -> Response {
        match self {
            FaviconReply::NotModified { etag, cache_control: true } => (
                StatusCode::NOT_MODIFIED,
                [(CACHE_CONTROL, CACHE_POLICY.to_string()), (ETAG, etag)],
            )
                .into_response(),
            FaviconReply::NotModified { etag, cache_control: false } => {
                (StatusCode::NOT_MODIFIED, [(ETAG, etag)]).into_response()
            }
            FaviconReply::Fresh { etag, bitmap } => (
                StatusCode::OK,
                [
                    (CONTENT_TYPE, BITMAP_CONTENT_TYPE.to_string()),
                    (CONTENT_LENGTH, bitmap.len().to_string()),
                    (CACHE_CONTROL, CACHE_POLICY.to_string()),
                    (ETAG, etag),
                ],
                Bytes::from(bitmap),
            )
                .into_response(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SetResult {
    pub identifier: String,
    pub record: TrackingRecord,
    pub reply: FaviconReply,
}

/// Issues or re-validates the tracking favicon.
///
/// A missing or empty `tid` gets a freshly generated identifier. Caller-chosen
/// identifiers exist for demos and tests; a real tracker would derive them
/// from passive signals instead.
pub fn set_favicon(registry: &TrackingRegistry, tid: Option<&str>, validators: &Validators) -> SetResult {
    let identifier = match tid {
        Some(tid) if !tid.is_empty() => tid.to_owned(),
        _ => generate_identifier(),
    };

    let etag = quoted_etag(&identifier);
    let token_matched = validators.matches(&etag);
    let record = registry.observe_set(&identifier, token_matched);

    let reply = if token_matched {
        info!("CACHE HIT for tracking ID: {}", mask_identifier(&identifier));
        FaviconReply::NotModified {
            etag,
            cache_control: true,
        }
    } else {
        info!("SET tracking favicon for: {}", mask_identifier(&identifier));
        FaviconReply::Fresh {
            bitmap: encode(&identifier),
            etag,
        }
    };

    SetResult {
        identifier,
        record,
        reply,
    }
}

#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub index: String,
    pub outcome: ProbeOutcome,
    /// Whether the classification was kept in the registry's tally.
    pub tallied: bool,
    pub reply: FaviconReply,
}

/// First segment of the path below `/probe/`.
pub fn probe_index(rest: &str) -> Result<&str, RouteError> {
    match rest.split('/').next() {
        Some(index) if !index.is_empty() => Ok(index),
        _ => Err(RouteError::MalformedProbe),
    }
}

/// Classifies one probe request and records the recovered bit.
///
/// The probe bitmap is derived from `"probe:{index}"` alone, not from any
/// tracking identifier, so a hit means this browser fetched the same index
/// before. Every index gets a reply, but only decimal indices below
/// `PROBE_WIDTH` are tallied.
pub fn probe(registry: &TrackingRegistry, index: &str, validators: &Validators) -> Result<ProbeResult, RouteError> {
    if index.is_empty() {
        return Err(RouteError::MalformedProbe);
    }

    let outcome = ProbeOutcome::classify(validators.if_none_match.is_some(), validators.if_modified_since);
    let tallied = index
        .parse::<u32>()
        .ok()
        .and_then(|bit| registry.record_probe(bit, outcome))
        .is_some();
    info!(
        "PROBE {index}: {}",
        if outcome.is_hit() { "CACHE HIT" } else { "CACHE MISS" }
    );

    let key = format!("probe:{index}");
    let etag = quoted_etag(&key);

    // Only If-None-Match short-circuits; If-Modified-Since alone still gets a body.
    let reply = if validators.if_none_match.is_some() {
        FaviconReply::NotModified {
            etag,
            cache_control: false,
        }
    } else {
        FaviconReply::Fresh {
            bitmap: encode(&key),
            etag,
        }
    };

    Ok(ProbeResult {
        index: index.to_owned(),
        outcome,
        tallied,
        reply,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_index_takes_first_segment() {
        assert_eq!(probe_index("12").unwrap(), "12");
        assert_eq!(probe_index("12/ignored").unwrap(), "12");
        assert!(matches!(probe_index(""), Err(RouteError::MalformedProbe)));
        assert!(matches!(probe_index("/12"), Err(RouteError::MalformedProbe)));
    }

    #[test]
    fn set_favicon_branches_on_exact_token() {
        let registry = TrackingRegistry::new();

        let miss = set_favicon(&registry, Some("abc"), &Validators::default());
        assert_eq!(miss.reply.status(), StatusCode::OK);
        assert_eq!(miss.reply.etag(), quoted_etag("abc"));

        let hit = set_favicon(&registry, Some("abc"), &Validators::with_if_none_match(quoted_etag("abc")));
        assert_eq!(hit.reply.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(hit.record.hit_count, 2);
    }

    #[test]
    fn anonymous_set_generates_identifier() {
        let registry = TrackingRegistry::new();
        let result = set_favicon(&registry, None, &Validators::default());

        assert!(!result.identifier.is_empty());
        assert!(registry.get(&result.identifier).is_some());
        assert!(matches!(result.reply, FaviconReply::Fresh { .. }));
    }

    #[test]
    fn probe_ignores_tracking_identifiers() {
        let registry = TrackingRegistry::new();
        let result = probe(&registry, "3", &Validators::default()).unwrap();

        assert_eq!(result.outcome, ProbeOutcome::Miss);
        assert!(result.tallied);
        assert_eq!(result.reply.etag(), quoted_etag("probe:3"));
        assert!(registry.is_empty());
        assert!(probe(&registry, "", &Validators::default()).is_err());
    }

    #[test]
    fn out_of_range_index_is_served_but_not_tallied() {
        let registry = TrackingRegistry::new();

        for index in ["junk", "32", "-1", "4294967296"] {
            let result = probe(&registry, index, &Validators::default()).unwrap();
            assert!(!result.tallied, "{index}");
            assert_eq!(result.reply.status(), StatusCode::OK);
        }
        assert!(registry.snapshot().probes.is_empty());
    }
}
