//! Request identification and payloads.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) unless the caller sent one
//! - Echo the ID on the response and attach it to the request span
//! - Define query and body shapes for the appointment endpoints
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Node preferences are plain ids; unknown ids fall back to the default node
//! - A preference that is not a usable id (empty, null, non-numeric) means
//!   "no preference" rather than a rejected request

use std::fmt;

use axum::body::Body;
use axum::http::{HeaderName, Request};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

use crate::load_balancer::node::NodeId;

pub const X_REQUEST_ID: &str = "x-request-id";

pub fn set_request_id() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), MakeRequestUuid)
}

pub fn propagate_request_id() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// Span for `TraceLayer`, tagged with the request ID.
pub fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// `?node=<id>`
#[derive(Debug, Default, Deserialize)]
pub struct NodeQuery {
    #[serde(default, deserialize_with = "node_preference")]
    pub node: Option<u32>,
}

impl NodeQuery {
    pub fn preference(&self) -> Option<NodeId> {
        self.node.map(NodeId)
    }
}

/// `?itemsPerPage=&page=&node=`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub items_per_page: Option<usize>,
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "node_preference")]
    pub node: Option<u32>,
}

/// Body of PUT and PATCH: `{ "data": ..., "node": <id>? }`
#[derive(Debug, Deserialize)]
pub struct WriteBody<T> {
    pub data: T,
    #[serde(default, deserialize_with = "node_preference")]
    pub node: Option<u32>,
}

impl<T> WriteBody<T> {
    pub fn preference(&self) -> Option<NodeId> {
        self.node.map(NodeId)
    }
}

/// Accepts `2`, `"2"`, `""`, `null`. Anything that is not a node id reads
/// as no preference.
fn node_preference<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    struct NodeVisitor;

    impl<'de> Visitor<'de> for NodeVisitor {
        type Value = Option<u32>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a node id as a number or string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(u32::try_from(v).ok())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(u32::try_from(v).ok())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            // Truncates like an integer parse of the decimal text.
            if (0.0..=f64::from(u32::MAX)).contains(&v) {
                Ok(Some(v as u32))
            } else {
                Ok(None)
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.trim().parse().ok())
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(NodeVisitor)
}
