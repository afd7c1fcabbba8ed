//! In-memory stand-in for the content service.
//!
//! Serves `/api/posts`, `/api/tags`, the ratings plugin routes and the
//! local-auth routes with the same `{ data: [{ id, attributes }], meta }`
//! envelopes the real service uses. Relations are only included when named
//! in `populate`.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: u64 = 25;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub cover: Option<String>,
    pub tag_ids: Vec<u64>,
    pub seo: Option<Value>,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    pub post_id: u64,
    pub user_id: u64,
    pub comment: String,
    pub score: u8,
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl User {
    fn public(&self) -> Value {
        json!({ "id": self.id, "username": self.username, "email": self.email })
    }
}

#[derive(Debug, Default)]
pub struct Store {
    pub posts: Vec<Post>,
    pub tags: Vec<Tag>,
    pub reviews: Vec<Review>,
    pub users: Vec<User>,
    pub sessions: HashMap<String, u64>,
}

impl Store {
    /// A small blog: four posts, three tags, one reader and a few reviews.
    pub fn seeded() -> Self {
        let tag = |id: u64, name: &str, slug: &str, image: Option<&str>| Tag {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
            image: image.map(str::to_string),
        };
        let post = |id: u64, title: &str, cover: Option<&str>, tag_ids: &[u64], day: u32| Post {
            id,
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            content: format!("# {title}\n\nBody of {title}."),
            cover: cover.map(str::to_string),
            tag_ids: tag_ids.to_vec(),
            seo: Some(json!({
                "id": id,
                "SeoTitle": title,
                "SeoDescription": format!("About {title}"),
            })),
            created_at: format!("2024-05-{day:02}T09:00:00.000Z"),
        };
        let review = |id: u64, post_id: u64, score: u8| Review {
            id,
            post_id,
            user_id: 1,
            comment: format!("Review {id}"),
            score,
        };

        Self {
            tags: vec![
                tag(1, "Rust", "rust", Some("/uploads/rust.svg")),
                tag(2, "Async", "async", None),
                tag(3, "Web Dev", "web-dev", Some("/uploads/web.svg")),
            ],
            posts: vec![
                post(1, "Ownership Basics", Some("/uploads/ownership.png"), &[1], 1),
                post(2, "Async Rust", Some("/uploads/async.png"), &[1, 2], 2),
                post(3, "Serving Http", None, &[3], 3),
                post(4, "Untagged Notes", None, &[], 4),
            ],
            reviews: vec![
                review(1, 1, 3),
                review(2, 2, 5),
                review(3, 2, 5),
                review(4, 3, 4),
            ],
            users: vec![User {
                id: 1,
                username: "reader".to_string(),
                email: "reader@example.com".to_string(),
                password: "password".to_string(),
            }],
            sessions: HashMap::new(),
        }
    }

    fn post_by_slug(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    fn tags_of(&self, post: &Post) -> Vec<&Tag> {
        post.tag_ids
            .iter()
            .filter_map(|id| self.tags.iter().find(|t| t.id == *id))
            .collect()
    }

    fn reviews_of(&self, post_id: u64) -> Vec<&Review> {
        self.reviews.iter().filter(|r| r.post_id == post_id).collect()
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<&User> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let user_id = self.sessions.get(token)?;
        self.users.iter().find(|u| u.id == *user_id)
    }

    fn open_session(&mut self, user_id: u64) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), user_id);
        token
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/api/posts", get(list_posts))
        .route("/api/tags", get(list_tags))
        .route("/api/ratings/reviews/{key}", get(list_reviews).post(create_review))
        .route("/api/ratings/reviews/{key}/stats", get(review_stats))
        .route("/api/auth/local", post(login))
        .route("/api/auth/local/register", post(register))
        .route("/api/users/me", get(me))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn strapi_error(status: StatusCode, name: &str, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "data": null,
            "error": { "status": status.as_u16(), "name": name, "message": message }
        })),
    )
}

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// The subset of the query-string syntax the blog frontend sends.
#[derive(Debug, Default, PartialEq)]
struct PostQuery {
    slug: Option<String>,
    tag_slug: Option<String>,
    tag_names: Vec<String>,
    title_contains: Option<String>,
    populate: Vec<String>,
    page: Option<u64>,
    page_size: Option<u64>,
    newest_first: bool,
}

impl PostQuery {
    fn parse(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "filters[slug][$eq]" => query.slug = Some(value),
                "filters[tags][slug][$eq]" => query.tag_slug = Some(value),
                "filters[tags][name][$eq]" => query.tag_names.push(value),
                "filters[title][$containsi]" => query.title_contains = Some(value.to_lowercase()),
                "populate" => query
                    .populate
                    .extend(value.split(',').map(|f| f.trim().to_string())),
                "pagination[page]" => query.page = value.parse().ok(),
                "pagination[pageSize]" => query.page_size = value.parse().ok(),
                "sort[0]" => query.newest_first = value == "createdAt:desc",
                _ => {}
            }
        }
        query
    }

    fn populates(&self, field: &str) -> bool {
        self.populate.iter().any(|f| f == field || f == "*")
    }

    fn matches(&self, post: &Post, tags: &[&Tag]) -> bool {
        if self.slug.as_ref().is_some_and(|slug| *slug != post.slug) {
            return false;
        }
        if let Some(slug) = &self.tag_slug {
            if !tags.iter().any(|t| t.slug == *slug) {
                return false;
            }
        }
        if !self.tag_names.is_empty() && !tags.iter().any(|t| self.tag_names.contains(&t.name)) {
            return false;
        }
        if let Some(needle) = &self.title_contains {
            if !post.title.to_lowercase().contains(needle) {
                return false;
            }
        }
        true
    }
}

fn media(id: u64, url: &Option<String>) -> Value {
    match url {
        Some(url) => json!({ "id": id, "attributes": { "url": url } }),
        None => Value::Null,
    }
}

fn render_post(post: &Post, tags: &[&Tag], query: &PostQuery) -> Value {
    let mut attributes = json!({
        "title": post.title,
        "slug": post.slug,
        "content": post.content,
        "createdAt": post.created_at,
        "updatedAt": post.created_at,
    });
    if query.populates("cover") {
        let data = match media(post.id + 100, &post.cover) {
            Value::Null => Value::Null,
            entry => json!([entry]),
        };
        attributes["cover"] = json!({ "data": data });
    }
    if query.populates("tags") {
        let entries: Vec<Value> = tags
            .iter()
            .map(|t| json!({ "id": t.id, "attributes": { "name": t.name, "slug": t.slug } }))
            .collect();
        attributes["tags"] = json!({ "data": entries });
    }
    if query.populates("seo") {
        attributes["seo"] = post.seo.clone().unwrap_or(Value::Null);
    }
    json!({ "id": post.id, "attributes": attributes })
}

async fn list_posts(State(db): State<Db>, Query(pairs): Query<Vec<(String, String)>>) -> Json<Value> {
    let query = PostQuery::parse(pairs);
    let store = db.read().await;

    let mut matching: Vec<&Post> = store
        .posts
        .iter()
        .filter(|post| query.matches(post, &store.tags_of(post)))
        .collect();
    if query.newest_first {
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    let total = matching.len() as u64;
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let page_count = total.div_ceil(page_size);
    let data: Vec<Value> = matching
        .into_iter()
        .skip(((page - 1) * page_size) as usize)
        .take(page_size as usize)
        .map(|post| render_post(post, &store.tags_of(post), &query))
        .collect();

    Json(json!({
        "data": data,
        "meta": { "pagination": {
            "page": page,
            "pageSize": page_size,
            "pageCount": page_count,
            "total": total,
        } }
    }))
}

async fn list_tags(State(db): State<Db>, Query(pairs): Query<Vec<(String, String)>>) -> Json<Value> {
    let with_image = pairs
        .iter()
        .any(|(k, v)| k == "populate" && v.split(',').any(|f| f == "image"));
    let store = db.read().await;
    let data: Vec<Value> = store
        .tags
        .iter()
        .map(|tag| {
            let mut attributes = json!({ "name": tag.name, "slug": tag.slug });
            if with_image {
                attributes["image"] = json!({ "data": media(tag.id + 200, &tag.image) });
            }
            json!({ "id": tag.id, "attributes": attributes })
        })
        .collect();
    let total = data.len();
    Json(json!({
        "data": data,
        "meta": { "pagination": { "page": 1, "pageSize": DEFAULT_PAGE_SIZE, "pageCount": 1, "total": total } }
    }))
}

fn average(reviews: &[&Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    reviews.iter().map(|r| f64::from(r.score)).sum::<f64>() / reviews.len() as f64
}

async fn list_reviews(State(db): State<Db>, Path(slug): Path<String>) -> ApiResult {
    let store = db.read().await;
    let post = store
        .post_by_slug(&slug)
        .ok_or_else(|| strapi_error(StatusCode::NOT_FOUND, "NotFoundError", "Post not found"))?;
    let reviews = store.reviews_of(post.id);
    let entries: Vec<Value> = reviews
        .iter()
        .map(|r| {
            let author = store.users.iter().find(|u| u.id == r.user_id).map(|u| u.username.clone());
            json!({ "id": r.id, "comment": r.comment, "score": r.score, "author": { "username": author } })
        })
        .collect();
    Ok(Json(json!({
        "reviews": entries,
        "averageScore": average(&reviews),
        "reviewsCount": reviews.len(),
    })))
}

async fn review_stats(State(db): State<Db>, Path(slug): Path<String>) -> ApiResult {
    let store = db.read().await;
    let post = store
        .post_by_slug(&slug)
        .ok_or_else(|| strapi_error(StatusCode::NOT_FOUND, "NotFoundError", "Post not found"))?;
    let reviews = store.reviews_of(post.id);
    Ok(Json(json!({
        "averageScore": average(&reviews),
        "reviewsCount": reviews.len(),
    })))
}

#[derive(Deserialize)]
pub struct NewReview {
    pub comment: String,
    pub score: u8,
}

async fn create_review(
    State(db): State<Db>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(input): Json<NewReview>,
) -> ApiResult {
    let mut store = db.write().await;
    let user_id = store
        .user_for(&headers)
        .map(|u| u.id)
        .ok_or_else(|| strapi_error(StatusCode::UNAUTHORIZED, "UnauthorizedError", "Missing or invalid credentials"))?;
    let post_id: u64 = key
        .parse()
        .map_err(|_| strapi_error(StatusCode::BAD_REQUEST, "ValidationError", "Invalid post id"))?;
    if !store.posts.iter().any(|p| p.id == post_id) {
        return Err(strapi_error(StatusCode::NOT_FOUND, "NotFoundError", "Post not found"));
    }
    if !(1..=5).contains(&input.score) {
        return Err(strapi_error(StatusCode::BAD_REQUEST, "ValidationError", "Score must be between 1 and 5"));
    }

    let review = Review {
        id: store.reviews.iter().map(|r| r.id).max().unwrap_or(0) + 1,
        post_id,
        user_id,
        comment: input.comment,
        score: input.score,
    };
    store.reviews.push(review.clone());
    Ok(Json(json!({ "id": review.id, "comment": review.comment, "score": review.score })))
}

#[derive(Deserialize)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

async fn login(State(db): State<Db>, Json(input): Json<Credentials>) -> ApiResult {
    let mut store = db.write().await;
    let user = store
        .users
        .iter()
        .find(|u| {
            (u.username == input.identifier || u.email == input.identifier) && u.password == input.password
        })
        .cloned()
        .ok_or_else(|| strapi_error(StatusCode::BAD_REQUEST, "ValidationError", "Invalid identifier or password"))?;
    let jwt = store.open_session(user.id);
    Ok(Json(json!({ "jwt": jwt, "user": user.public() })))
}

#[derive(Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

async fn register(State(db): State<Db>, Json(input): Json<Registration>) -> ApiResult {
    let mut store = db.write().await;
    if store
        .users
        .iter()
        .any(|u| u.username == input.username || u.email == input.email)
    {
        return Err(strapi_error(StatusCode::BAD_REQUEST, "ApplicationError", "Email or Username are already taken"));
    }
    let user = User {
        id: store.users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
        username: input.username,
        email: input.email,
        password: input.password,
    };
    let public = user.public();
    let user_id = user.id;
    store.users.push(user);
    let jwt = store.open_session(user_id);
    Ok(Json(json!({ "jwt": jwt, "user": public })))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let store = db.read().await;
    store
        .user_for(&headers)
        .map(|u| Json(u.public()))
        .ok_or_else(|| strapi_error(StatusCode::UNAUTHORIZED, "UnauthorizedError", "Missing or invalid credentials"))
}
