use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE, LOCATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::HalResult;

pub mod property;
pub mod template;
pub mod uri_template;

/// Media type of HAL-FORMS documents
pub const HAL_FORMS_JSON: &str = "application/prs.hal-forms+json";
/// Media type of plain HAL documents
pub const HAL_JSON: &str = "application/hal+json";
/// The only content type the form builder can produce
pub const APPLICATION_JSON: &str = "application/json";

/// A request handed to the HTTP collaborator
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URI, or a reference resolved against the executor base URI
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a body together with its content type
    pub fn content(mut self, content_type: impl Into<String>, body: impl Into<String>) -> Self {
        self.headers
            .push((CONTENT_TYPE.as_str().to_string(), content_type.into()));
        self.body = Some(body.into());
        self
    }

    /// First header value matching `name`, case-insensitively
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw result of an exchange with the HTTP collaborator
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// URI the request was sent to, after resolution
    pub uri: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> HalResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// True when the content type essence equals `media_type`, ignoring parameters
    pub fn has_media_type(&self, media_type: &str) -> bool {
        self.content_type()
            .map(|value| media_type_essence(value).eq_ignore_ascii_case(media_type))
            .unwrap_or(false)
    }
}

/// Strip parameters such as `charset` from a content type
pub fn media_type_essence(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

/// Port to the host harness's HTTP layer.
///
/// Calls are awaited one at a time; the engine never issues concurrent
/// requests and never retries.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> HalResult<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_media_type_essence() {
        assert_eq!(
            media_type_essence("application/json; charset=utf-8"),
            "application/json"
        );
        assert_eq!(media_type_essence(HAL_FORMS_JSON), HAL_FORMS_JSON);
    }

    #[test]
    fn test_response_media_type_ignores_parameters() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/prs.hal-forms+json;charset=UTF-8"),
        );
        let response = HttpResponse {
            uri: "http://localhost/".to_string(),
            status: StatusCode::OK,
            headers,
            body: Bytes::new(),
        };
        assert!(response.has_media_type(HAL_FORMS_JSON));
        assert!(!response.has_media_type(HAL_JSON));
    }

    #[test]
    fn test_request_content_sets_content_type() {
        let request = HttpRequest::new(Method::POST, "/orders").content(APPLICATION_JSON, "{}");
        assert_eq!(request.header_value("content-type"), Some(APPLICATION_JSON));
        assert_eq!(request.body.as_deref(), Some("{}"));
    }
}
