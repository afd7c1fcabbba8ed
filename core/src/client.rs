//! Stateless request builder and reshaper for the content service.
//!
//! # Design
//! `ContentClient` holds only the base URL. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `reshape_*` method
//! that maps the decoded wire envelope into a view model. Neither side does
//! I/O; `ContentGateway` wires them to a `Transport`.

use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::query::{FilterOp, QueryString, SortOrder};
use crate::schema::{Collection, Entry, Media, PostAttributes, Relation, ReviewStats, TagAttributes};
use crate::types::{
    LoginRequest, NewReview, PostDetail, PostFeed, PostPage, PostSummary, RegisterRequest,
    ReviewSummary, Seo, TagRef, TagView,
};

pub const DEFAULT_PAGE: u32 = 1;
pub const LATEST_PAGE_SIZE: u32 = 4;
pub const LISTING_PAGE_SIZE: u32 = 8;

const POSTS: &str = "/api/posts";
const TAGS: &str = "/api/tags";
const REVIEWS: &str = "/api/ratings/reviews";

/// Which tag fields a listing exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagFields {
    Name,
    NameAndSlug,
}

#[derive(Debug, Clone)]
pub struct ContentClient {
    base_url: String,
}

impl ContentClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, query: &QueryString) -> String {
        if query.is_empty() {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}{path}?{query}", self.base_url)
        }
    }

    // -- requests -----------------------------------------------------------

    pub fn build_latest_posts(&self, page: Option<u32>, page_size: Option<u32>) -> HttpRequest {
        let query = QueryString::new()
            .populate(&["cover"])
            .page(page.unwrap_or(DEFAULT_PAGE), page_size.unwrap_or(LATEST_PAGE_SIZE))
            .sort("createdAt", SortOrder::Desc);
        HttpRequest::get(self.url(POSTS, &query))
    }

    pub fn build_post_by_slug(&self, slug: &str) -> HttpRequest {
        let query = QueryString::new()
            .filter(&["slug"], FilterOp::Eq, slug)
            .populate(&["cover", "seo", "tags"]);
        HttpRequest::get(self.url(POSTS, &query))
    }

    pub fn build_posts_by_tag(
        &self,
        tag_slug: &str,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> HttpRequest {
        let query = QueryString::new()
            .filter(&["tags", "slug"], FilterOp::Eq, tag_slug)
            .populate(&["cover", "tags"])
            .page(page.unwrap_or(DEFAULT_PAGE), page_size.unwrap_or(LISTING_PAGE_SIZE))
            .sort("createdAt", SortOrder::Desc);
        HttpRequest::get(self.url(POSTS, &query))
    }

    /// One `filters[tags][name][$eq]` clause per tag; the service ORs them.
    pub fn build_similar_posts<S: AsRef<str>>(&self, tag_names: &[S]) -> HttpRequest {
        let query = tag_names
            .iter()
            .fold(QueryString::new(), |query, name| {
                query.filter(&["tags", "name"], FilterOp::Eq, name.as_ref())
            })
            .populate(&["cover", "tags"]);
        HttpRequest::get(self.url(POSTS, &query))
    }

    pub fn build_posts_by_page(&self, page: u32, page_size: u32) -> HttpRequest {
        let query = QueryString::new()
            .page(page, page_size)
            .populate(&["cover", "seo", "tags"]);
        HttpRequest::get(self.url(POSTS, &query))
    }

    pub fn build_search_posts(
        &self,
        text: &str,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> HttpRequest {
        let query = QueryString::new()
            .filter(&["title"], FilterOp::ContainsI, text)
            .page(page.unwrap_or(DEFAULT_PAGE), page_size.unwrap_or(LISTING_PAGE_SIZE))
            .populate(&["cover", "tags"]);
        HttpRequest::get(self.url(POSTS, &query))
    }

    pub fn build_all_posts(&self) -> HttpRequest {
        let query = QueryString::new().populate(&["cover", "tags"]);
        HttpRequest::get(self.url(POSTS, &query))
    }

    pub fn build_rating_stats(&self, slug: &str) -> HttpRequest {
        let path = format!("{REVIEWS}/{}/stats", urlencoding::encode(slug));
        HttpRequest::get(self.url(&path, &QueryString::new()))
    }

    pub fn build_reviews(&self, slug: &str) -> HttpRequest {
        let path = format!("{REVIEWS}/{}", urlencoding::encode(slug));
        HttpRequest::get(self.url(&path, &QueryString::new()))
    }

    pub fn build_submit_rating(
        &self,
        post_id: u64,
        comment: &str,
        score: u8,
        token: &str,
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json(&NewReview { comment, score })?;
        let path = format!("{REVIEWS}/{post_id}");
        Ok(HttpRequest::post_json(self.url(&path, &QueryString::new()), body).bearer(token))
    }

    pub fn build_tags(&self) -> HttpRequest {
        let query = QueryString::new().populate(&["image"]);
        HttpRequest::get(self.url(TAGS, &query))
    }

    pub fn build_login(&self, identifier: &str, password: &str) -> Result<HttpRequest, ApiError> {
        let body = to_json(&LoginRequest {
            identifier,
            password,
        })?;
        Ok(HttpRequest::post_json(
            self.url("/api/auth/local", &QueryString::new()),
            body,
        ))
    }

    pub fn build_register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json(&RegisterRequest {
            username,
            email,
            password,
        })?;
        Ok(HttpRequest::post_json(
            self.url("/api/auth/local/register", &QueryString::new()),
            body,
        ))
    }

    pub fn build_profile(&self, token: &str) -> HttpRequest {
        HttpRequest::get(self.url("/api/users/me", &QueryString::new())).bearer(token)
    }

    // -- reshaping ----------------------------------------------------------

    pub fn reshape_latest_posts(&self, collection: Collection<PostAttributes>) -> PostPage {
        self.summary_page(collection, TagFields::Name)
    }

    /// `None` when nothing matched the slug.
    pub fn reshape_post_by_slug(&self, collection: Collection<PostAttributes>) -> Option<PostDetail> {
        let post = collection.data.into_iter().next()?;
        Some(self.detail(post, TagFields::NameAndSlug, true))
    }

    pub fn reshape_posts_by_tag(&self, collection: Collection<PostAttributes>) -> PostPage {
        self.summary_page(collection, TagFields::NameAndSlug)
    }

    /// Drops `current_id` from the result.
    pub fn reshape_similar_posts(
        &self,
        collection: Collection<PostAttributes>,
        current_id: u64,
    ) -> Vec<PostSummary> {
        collection
            .data
            .into_iter()
            .filter(|post| post.id != current_id)
            .map(|post| self.summary(post, TagFields::NameAndSlug))
            .collect()
    }

    pub fn reshape_posts_by_page(&self, collection: Collection<PostAttributes>) -> PostFeed {
        let meta = collection.pagination();
        let posts = collection
            .data
            .into_iter()
            .map(|post| self.detail(post, TagFields::Name, false))
            .collect();
        PostFeed { posts, meta }
    }

    pub fn reshape_search_posts(&self, collection: Collection<PostAttributes>) -> PostPage {
        self.summary_page(collection, TagFields::Name)
    }

    pub fn reshape_all_posts(&self, collection: Collection<PostAttributes>) -> Vec<PostSummary> {
        collection
            .data
            .into_iter()
            .map(|post| self.summary(post, TagFields::Name))
            .collect()
    }

    pub fn reshape_reviews(&self, stats: Option<ReviewStats>) -> ReviewSummary {
        let stats = stats.unwrap_or_default();
        ReviewSummary {
            comments: stats.reviews.unwrap_or_default(),
            average_score: stats.average_score.unwrap_or(0.0),
            reviews_count: stats.reviews_count.unwrap_or(0),
        }
    }

    pub fn reshape_tags(&self, collection: Collection<TagAttributes>) -> Vec<TagView> {
        collection
            .data
            .into_iter()
            .map(|tag| TagView {
                id: tag.id,
                image: resolve_image_url(&self.base_url, tag.attributes.image.as_ref()),
                name: tag.attributes.name,
                slug: tag.attributes.slug,
            })
            .collect()
    }

    fn summary_page(&self, collection: Collection<PostAttributes>, fields: TagFields) -> PostPage {
        let pagination = collection.pagination();
        let data = collection
            .data
            .into_iter()
            .map(|post| self.summary(post, fields))
            .collect();
        PostPage { data, pagination }
    }

    fn summary(&self, post: Entry<PostAttributes>, fields: TagFields) -> PostSummary {
        let attributes = post.attributes;
        PostSummary {
            id: post.id,
            cover_url: resolve_cover_url(&self.base_url, attributes.cover.as_ref()),
            tags: tag_refs(attributes.tags.as_ref(), fields),
            title: attributes.title,
            slug: attributes.slug,
            created_at: attributes.created_at,
        }
    }

    /// `full_seo` keeps every SEO field; otherwise only id, title and
    /// description survive.
    fn detail(&self, post: Entry<PostAttributes>, fields: TagFields, full_seo: bool) -> PostDetail {
        let attributes = post.attributes;
        let seo = attributes.seo.map(|seo| {
            if full_seo {
                seo
            } else {
                Seo {
                    extra: Default::default(),
                    ..seo
                }
            }
        });
        PostDetail {
            id: post.id,
            cover: resolve_cover_url(&self.base_url, attributes.cover.as_ref()),
            tags: tag_refs(attributes.tags.as_ref(), fields),
            title: attributes.title,
            slug: attributes.slug,
            content: attributes.content,
            seo,
            created_at: attributes.created_at,
        }
    }
}

fn tag_refs(tags: Option<&Relation<TagAttributes>>, fields: TagFields) -> Vec<TagRef> {
    let Some(tags) = tags else {
        return Vec::new();
    };
    tags.entries()
        .iter()
        .map(|tag| TagRef {
            name: tag.attributes.name.clone(),
            slug: match fields {
                TagFields::Name => None,
                TagFields::NameAndSlug => tag.attributes.slug.clone(),
            },
        })
        .collect()
}

fn media_url(base_url: &str, media: Option<&Entry<Media>>) -> Option<String> {
    let path = media?.attributes.url.as_deref()?;
    if path.is_empty() {
        return None;
    }
    Some(format!("{base_url}{path}"))
}

/// `base_url` + the first cover entry's relative URL, or `None`.
pub fn resolve_cover_url(base_url: &str, cover: Option<&Relation<Media>>) -> Option<String> {
    media_url(base_url, cover?.first())
}

/// `base_url` + the image's relative URL, or `None`.
pub fn resolve_image_url(base_url: &str, image: Option<&Relation<Media>>) -> Option<String> {
    media_url(base_url, image?.first())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::SerializationError(e.to_string()))
}
