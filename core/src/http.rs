//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `ContentClient` builds
//! `HttpRequest` values without touching the network; a `Transport`
//! implementation executes them and hands back an `HttpResponse`, which
//! `decode_json` turns into a typed payload.

use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `path` is absolute: the configured base URL joined with the resource path
/// and query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(path: String) -> Self {
        Self {
            method: HttpMethod::Get,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(path: String, body: String) -> Self {
        Self {
            method: HttpMethod::Post,
            path,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.headers
            .push(("authorization".to_string(), format!("Bearer {token}")));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Accept any 2xx response and deserialize its body.
pub fn decode_json<R: DeserializeOwned>(response: &HttpResponse) -> Result<R, ApiError> {
    check_status(response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn any_2xx_is_decoded() {
        let value: serde_json::Value = decode_json(&response(201, r#"{"ok":true}"#)).unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn not_found_maps_to_dedicated_variant() {
        let err = decode_json::<serde_json::Value>(&response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn server_error_keeps_status_and_body() {
        let err = decode_json::<serde_json::Value>(&response(500, "boom")).unwrap_err();
        match err {
            ApiError::HttpError { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_body_is_a_deserialization_error() {
        let err = decode_json::<serde_json::Value>(&response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn bearer_adds_authorization_header() {
        let req = HttpRequest::get("http://cms/api/users/me".to_string()).bearer("abc");
        assert_eq!(req.header("Authorization"), Some("Bearer abc"));
    }
}
