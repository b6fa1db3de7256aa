//! reqwest-backed HTTP collaborator
//!
//! Resolves relative references against a base URI, adds the hypermedia
//! `Accept` header and per-client default headers to every request.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

use crate::config::ClientSettings;
use crate::domain::{HttpExecutor, HttpRequest, HttpResponse, HAL_FORMS_JSON};
use crate::error::{HalError, HalResult};

pub struct ReqwestExecutor {
    client: Client,
    base_uri: Url,
    accept: String,
    default_headers: HeaderMap,
}

impl ReqwestExecutor {
    pub fn new(base_uri: &str) -> HalResult<Self> {
        Ok(Self {
            client: Client::new(),
            base_uri: parse_uri(base_uri)?,
            accept: HAL_FORMS_JSON.to_string(),
            default_headers: HeaderMap::new(),
        })
    }

    /// Build an executor from client settings
    pub fn from_settings(settings: &ClientSettings) -> HalResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        let mut executor = Self {
            client,
            base_uri: parse_uri(&settings.base_uri)?,
            accept: settings.accept.clone(),
            default_headers: HeaderMap::new(),
        };
        for (name, value) in &settings.headers {
            executor = executor.with_header(name, value)?;
        }
        Ok(executor)
    }

    /// Add a header sent with every request
    pub fn with_header(mut self, name: &str, value: &str) -> HalResult<Self> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HalError::Configuration(format!("Invalid header key `{name}`: {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| HalError::Configuration(format!("Invalid header value `{value}`: {e}")))?;
        self.default_headers.append(header_name, header_value);
        Ok(self)
    }

    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    /// Resolve `reference` against the base URI
    pub fn resolve(&self, reference: &str) -> HalResult<Url> {
        self.base_uri
            .join(reference)
            .map_err(|_| HalError::InvalidUri(reference.to_string()))
    }
}

fn parse_uri(uri: &str) -> HalResult<Url> {
    Url::parse(uri).map_err(|_| HalError::InvalidUri(uri.to_string()))
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: HttpRequest) -> HalResult<HttpResponse> {
        let url = self.resolve(&request.uri)?;
        let mut req_builder = self
            .client
            .request(request.method.clone(), url.clone())
            .headers(self.default_headers.clone());

        if request.header_value(ACCEPT.as_str()).is_none() {
            req_builder = req_builder.header(ACCEPT, self.accept.as_str());
        }
        for (name, value) in &request.headers {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!(method = %request.method, uri = %url, status = status.as_u16(), "HTTP exchange");

        Ok(HttpResponse {
            uri: url.to_string(),
            status,
            headers,
            body,
        })
    }
}
