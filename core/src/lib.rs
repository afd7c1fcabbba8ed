//! Data-access layer for a blog frontend backed by a headless content API.
//!
//! # Overview
//! `ContentClient` builds `HttpRequest` values and reshapes the service's
//! nested `{ data, attributes }` envelopes into flat view models without
//! touching the network. `ContentGateway` runs those requests through a
//! `Transport` and turns every failure into a typed empty value, so UI code
//! only ever sees data or "no data".
//!
//! # Design
//! - The base endpoint lives in `GatewayConfig`, resolved once at startup
//!   (`config::init`) and read-only afterwards.
//! - Relations are modeled by `schema::Relation`, so a missing cover or tag
//!   list reshapes to `None` / `[]` instead of failing.
//! - `popular_posts` fans out one rating request per post and joins on all
//!   of them, optionally capped and timed out through `GatewayConfig`.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod query;
pub mod schema;
pub mod transport;
pub mod types;

pub use client::{resolve_cover_url, resolve_image_url, ContentClient};
pub use config::GatewayConfig;
pub use error::ApiError;
pub use gateway::ContentGateway;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    Pagination, PopularPost, PostDetail, PostFeed, PostPage, PostSummary, ReviewSummary, Seo,
    TagRef, TagView,
};
