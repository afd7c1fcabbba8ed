use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with, Store};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn login_token(app: &axum::Router) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/local",
            r#"{"identifier":"reader","password":"password"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["jwt"].as_str().unwrap().to_string()
}

// --- posts ---

#[tokio::test]
async fn list_posts_returns_envelope_with_pagination() {
    let resp = app().oneshot(get("/api/posts")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert_eq!(body["meta"]["pagination"]["total"], 4);
    assert_eq!(body["meta"]["pagination"]["pageCount"], 1);
    assert!(body["data"][0]["attributes"].get("cover").is_none());
}

#[tokio::test]
async fn empty_store_lists_no_posts() {
    let resp = app_with(Store::default()).oneshot(get("/api/posts")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn pagination_and_sort_are_applied() {
    let resp = app()
        .oneshot(get(
            "/api/posts?populate=cover&pagination[page]=1&pagination[pageSize]=2&sort[0]=createdAt:desc",
        ))
        .await
        .unwrap();

    let body = body_json(resp).await;
    let ids: Vec<u64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, [4, 3]);
    assert_eq!(body["meta"]["pagination"]["pageCount"], 2);
    assert_eq!(body["data"][0]["attributes"]["cover"]["data"], Value::Null);
}

#[tokio::test]
async fn slug_filter_populates_requested_relations() {
    let resp = app()
        .oneshot(get("/api/posts?filters[slug][$eq]=async-rust&populate=cover,seo,tags"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    let post = &body["data"][0]["attributes"];
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(post["cover"]["data"][0]["attributes"]["url"], "/uploads/async.png");
    assert_eq!(post["tags"]["data"].as_array().unwrap().len(), 2);
    assert_eq!(post["seo"]["SeoTitle"], "Async Rust");
}

#[tokio::test]
async fn repeated_tag_name_filters_are_ored() {
    let resp = app()
        .oneshot(get(
            "/api/posts?filters[tags][name][$eq]=Async&filters[tags][name][$eq]=Web%20Dev&populate=tags",
        ))
        .await
        .unwrap();

    let body = body_json(resp).await;
    let ids: Vec<u64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, [2, 3]);
}

#[tokio::test]
async fn title_search_without_match_is_empty() {
    let resp = app()
        .oneshot(get("/api/posts?filters[title][$containsi]=haskell"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["pagination"]["pageCount"], 0);
}

// --- tags ---

#[tokio::test]
async fn tags_include_image_when_populated() {
    let resp = app().oneshot(get("/api/tags?populate=image")).await.unwrap();

    let body = body_json(resp).await;
    assert_eq!(body["data"][0]["attributes"]["image"]["data"]["attributes"]["url"], "/uploads/rust.svg");
    assert_eq!(body["data"][1]["attributes"]["image"]["data"], Value::Null);
}

// --- ratings ---

#[tokio::test]
async fn review_stats_average_scores() {
    let resp = app()
        .oneshot(get("/api/ratings/reviews/async-rust/stats"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["averageScore"], 5.0);
    assert_eq!(body["reviewsCount"], 2);
}

#[tokio::test]
async fn reviews_for_unknown_post_is_404() {
    let resp = app().oneshot(get("/api/ratings/reviews/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_review_requires_token() {
    let resp = app()
        .oneshot(json_request("POST", "/api/ratings/reviews/1", r#"{"comment":"hi","score":4}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_review_with_token_updates_stats() {
    let app = app();
    let token = login_token(&app).await;

    let mut request = json_request("POST", "/api/ratings/reviews/4", r#"{"comment":"solid","score":2}"#);
    request
        .headers_mut()
        .insert(http::header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
    let resp = app.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(get("/api/ratings/reviews/untagged-notes"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["reviewsCount"], 1);
    assert_eq!(body["reviews"][0]["comment"], "solid");
}

#[tokio::test]
async fn create_review_rejects_malformed_json() {
    let resp = app()
        .oneshot(json_request("POST", "/api/ratings/reviews/1", r#"{"score":"high"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!body_bytes(resp).await.is_empty());
}

// --- auth ---

#[tokio::test]
async fn login_with_wrong_password_is_400() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/auth/local",
            r#"{"identifier":"reader","password":"wrong"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_then_fetch_profile() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/local/register",
            r#"{"username":"ana","email":"ana@example.com","password":"pw"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token = body_json(resp).await["jwt"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri("/api/users/me")
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap();
    let resp = app.oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["username"], "ana");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn register_duplicate_email_is_400() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/auth/local/register",
            r#"{"username":"other","email":"reader@example.com","password":"pw"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_without_token_is_401() {
    let resp = app().oneshot(get("/api/users/me")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
