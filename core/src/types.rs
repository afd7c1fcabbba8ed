//! View models handed to UI code.
//!
//! These are flat, freshly built on every call and serialize in camelCase so
//! they can be passed straight to a rendering layer.

use serde::{Deserialize, Serialize};

/// Pagination metadata, passed through from the service unmodified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Keys outside the page-based scheme, such as `start`/`limit`.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// SEO component attached to a post. Field names follow the content model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "SeoTitle", default, skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    #[serde(rename = "SeoDescription", default, skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    /// Any other component fields, kept for the detail view.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A tag as it appears on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// An entry of the tag index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagView {
    pub id: u64,
    pub name: String,
    pub slug: Option<String>,
    pub image: Option<String>,
}

/// A post as shown in a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: u64,
    pub title: String,
    pub slug: String,
    pub cover_url: Option<String>,
    pub tags: Vec<TagRef>,
    pub created_at: String,
}

/// A post with its body and SEO metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub id: u64,
    pub title: String,
    pub slug: String,
    pub content: Option<String>,
    pub cover: Option<String>,
    pub tags: Vec<TagRef>,
    pub seo: Option<Seo>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularPost {
    #[serde(flatten)]
    pub post: PostSummary,
    pub average_rating: f64,
}

/// One page of post summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPage {
    pub data: Vec<PostSummary>,
    pub pagination: Pagination,
}

impl PostPage {
    /// `{ data: [], pagination: { pageCount: 1 } }`
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            pagination: Pagination {
                page_count: Some(1),
                ..Pagination::default()
            },
        }
    }
}

/// One page of full posts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostFeed {
    pub posts: Vec<PostDetail>,
    pub meta: Pagination,
}

/// Reviews left on a post and their aggregate score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub comments: Vec<serde_json::Value>,
    pub average_score: f64,
    pub reviews_count: u64,
}

/// Payload of `POST /api/ratings/reviews/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct NewReview<'a> {
    pub comment: &'a str,
    pub score: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}
