//! The content gateway: transport primitive plus the query functions UI code
//! calls.
//!
//! # Design
//! Every query builds a request with `ContentClient`, runs it through
//! `fetch`, and reshapes the decoded envelope. `fetch` collapses transport,
//! status and decoding failures into `None` after logging them, so each
//! query function returns its typed sentinel and never an error.

use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::client::ContentClient;
use crate::config::{self, GatewayConfig};
use crate::error::ApiError;
use crate::http::{decode_json, HttpRequest};
use crate::schema::{Collection, PostAttributes, ReviewStats, TagAttributes};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{PopularPost, PostDetail, PostFeed, PostPage, PostSummary, ReviewSummary, TagView};

pub struct ContentGateway<T = ReqwestTransport> {
    config: GatewayConfig,
    client: ContentClient,
    transport: T,
}

impl ContentGateway<ReqwestTransport> {
    /// Gateway over `reqwest` using the process-wide configuration.
    pub fn from_global() -> Result<Self, ApiError> {
        Ok(Self::new(config::get()?.clone(), ReqwestTransport::default()))
    }
}

impl<T: Transport> ContentGateway<T> {
    pub fn new(config: GatewayConfig, transport: T) -> Self {
        let client = ContentClient::new(config.base_url());
        Self {
            config,
            client,
            transport,
        }
    }

    pub fn client(&self) -> &ContentClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Execute `request` and decode a 2xx JSON body, keeping the failure.
    pub async fn try_fetch<R: DeserializeOwned>(&self, request: HttpRequest) -> Result<R, ApiError> {
        debug!("{} {}", request.method.as_str(), request.path);
        let response = self.transport.execute(request).await?;
        decode_json(&response)
    }

    /// Execute `request`; any failure is logged and becomes `None`.
    pub async fn fetch<R: DeserializeOwned>(&self, request: HttpRequest) -> Option<R> {
        let path = request.path.clone();
        match self.try_fetch(request).await {
            Ok(value) => Some(value),
            Err(err) => {
                error!("Fetch error for {}: {}", path, err);
                None
            }
        }
    }

    /// Newest posts first. `None` when the service gave no usable answer.
    pub async fn latest_posts(&self, page: Option<u32>, page_size: Option<u32>) -> Option<PostPage> {
        let request = self.client.build_latest_posts(page, page_size);
        let collection = self.fetch::<Collection<PostAttributes>>(request).await?;
        Some(self.client.reshape_latest_posts(collection))
    }

    pub async fn post_by_slug(&self, slug: &str) -> Option<PostDetail> {
        let request = self.client.build_post_by_slug(slug);
        let collection = self.fetch::<Collection<PostAttributes>>(request).await?;
        self.client.reshape_post_by_slug(collection)
    }

    pub async fn posts_by_tag(
        &self,
        tag_slug: &str,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> PostPage {
        let request = self.client.build_posts_by_tag(tag_slug, page, page_size);
        match self.fetch::<Collection<PostAttributes>>(request).await {
            Some(collection) => self.client.reshape_posts_by_tag(collection),
            None => PostPage::empty(),
        }
    }

    /// Posts sharing any of `tag_names`, minus the post being viewed.
    pub async fn similar_posts<S: AsRef<str>>(&self, tag_names: &[S], current_id: u64) -> Vec<PostSummary> {
        let request = self.client.build_similar_posts(tag_names);
        match self.fetch::<Collection<PostAttributes>>(request).await {
            Some(collection) => self.client.reshape_similar_posts(collection, current_id),
            None => Vec::new(),
        }
    }

    pub async fn posts_by_page(&self, page: u32, page_size: u32) -> PostFeed {
        let request = self.client.build_posts_by_page(page, page_size);
        match self.fetch::<Collection<PostAttributes>>(request).await {
            Some(collection) => self.client.reshape_posts_by_page(collection),
            None => PostFeed::default(),
        }
    }

    /// Case-insensitive title search.
    pub async fn search_posts(&self, text: &str, page: Option<u32>, page_size: Option<u32>) -> PostPage {
        let request = self.client.build_search_posts(text, page, page_size);
        match self.fetch::<Collection<PostAttributes>>(request).await {
            Some(collection) => self.client.reshape_search_posts(collection),
            None => PostPage::empty(),
        }
    }

    /// Every post with its average rating, best rated first.
    ///
    /// One stats request is issued per post and all of them are awaited
    /// together. A failed lookup rates the post `0`. Equal ratings keep the
    /// service's order.
    pub async fn popular_posts(&self) -> Vec<PopularPost> {
        let request = self.client.build_all_posts();
        let Some(collection) = self.fetch::<Collection<PostAttributes>>(request).await else {
            return Vec::new();
        };
        let posts = self.client.reshape_all_posts(collection);
        let ratings = self.average_ratings(&posts).await;

        let mut popular: Vec<PopularPost> = posts
            .into_iter()
            .zip(ratings)
            .map(|(post, average_rating)| PopularPost {
                post,
                average_rating,
            })
            .collect();
        popular.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
        popular
    }

    /// Ratings in the same order as `posts`.
    async fn average_ratings(&self, posts: &[PostSummary]) -> Vec<f64> {
        let lookups = posts.iter().map(|post| self.average_rating(&post.slug));
        match self.config.fanout_limit() {
            None => join_all(lookups).await,
            Some(limit) => stream::iter(lookups).buffered(limit).collect().await,
        }
    }

    async fn average_rating(&self, slug: &str) -> f64 {
        let lookup = self.try_fetch::<ReviewStats>(self.client.build_rating_stats(slug));
        let outcome = match self.config.rating_timeout() {
            Some(limit) => tokio::time::timeout(limit, lookup)
                .await
                .unwrap_or_else(|_| Err(ApiError::Transport(format!("timed out after {limit:?}")))),
            None => lookup.await,
        };
        match outcome {
            Ok(stats) => stats.average_score.unwrap_or(0.0),
            Err(err) => {
                warn!("Rating lookup for {} failed: {}", slug, err);
                0.0
            }
        }
    }

    pub async fn reviews_by_slug(&self, slug: &str) -> ReviewSummary {
        let stats = self.fetch::<ReviewStats>(self.client.build_reviews(slug)).await;
        self.client.reshape_reviews(stats)
    }

    /// Raw service answer, `None` on any failure.
    pub async fn submit_rating(
        &self,
        post_id: u64,
        comment: &str,
        score: u8,
        token: &str,
    ) -> Option<serde_json::Value> {
        let request = self.build_or_log(self.client.build_submit_rating(post_id, comment, score, token))?;
        self.fetch(request).await
    }

    pub async fn tags(&self) -> Vec<TagView> {
        match self.fetch::<Collection<TagAttributes>>(self.client.build_tags()).await {
            Some(collection) => self.client.reshape_tags(collection),
            None => Vec::new(),
        }
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Option<serde_json::Value> {
        let request = self.build_or_log(self.client.build_login(identifier, password))?;
        self.fetch(request).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Option<serde_json::Value> {
        let request = self.build_or_log(self.client.build_register(username, email, password))?;
        self.fetch(request).await
    }

    pub async fn profile(&self, token: &str) -> Option<serde_json::Value> {
        self.fetch(self.client.build_profile(token)).await
    }

    fn build_or_log(&self, built: Result<HttpRequest, ApiError>) -> Option<HttpRequest> {
        built
            .map_err(|err| error!("Could not build request: {}", err))
            .ok()
    }
}
