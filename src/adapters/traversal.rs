//! Hypermedia traversal
//!
//! Starting from a base URI, each hop GETs the current resource, looks up a
//! relation in its `_links` and expands the link with the hop parameters.
//!
//! ```rust,no_run
//! use halcheck::adapters::http_client::ReqwestExecutor;
//! use halcheck::adapters::traversal::HalClient;
//! use std::sync::Arc;
//!
//! # async fn run() -> halcheck::HalResult<()> {
//! let executor = Arc::new(ReqwestExecutor::new("http://localhost:8080/")?);
//! let mut form = HalClient::new(executor, "/")
//!     .follow(["orders"])
//!     .templates()
//!     .await?
//!     .by_key("create")?
//!     .create_form();
//! form.with_string("name", Some("john")).await?;
//! form.submit().await?;
//! # Ok(())
//! # }
//! ```

use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::templates::{created_location, Templates};
use crate::domain::template::link_href;
use crate::domain::{
    uri_template, HttpExecutor, HttpRequest, HttpResponse, APPLICATION_JSON, HAL_FORMS_JSON,
    HAL_JSON,
};
use crate::error::{HalError, HalResult};

/// One step of a traversal: a relation name plus URI template parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    relation: String,
    parameters: BTreeMap<String, String>,
}

impl Hop {
    pub fn relation(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.parameters.insert(name.into(), value.to_string());
        self
    }

    pub fn relation_name(&self) -> &str {
        &self.relation
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }
}

impl From<&str> for Hop {
    fn from(relation: &str) -> Self {
        Hop::relation(relation)
    }
}

impl From<String> for Hop {
    fn from(relation: String) -> Self {
        Hop::relation(relation)
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hop[relationName='{}', parameters={:?}]", self.relation, self.parameters)
    }
}

/// Entry point of traversals
#[derive(Clone)]
pub struct HalClient {
    executor: Arc<dyn HttpExecutor>,
    base_uri: String,
}

impl HalClient {
    pub fn new(executor: Arc<dyn HttpExecutor>, base_uri: impl Into<String>) -> Self {
        Self {
            executor,
            base_uri: base_uri.into(),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Continue from the `Location` of a `201 Created` response
    pub fn shift_to_created(
        executor: Arc<dyn HttpExecutor>,
        method: &str,
        response: &HttpResponse,
    ) -> HalResult<Self> {
        let location = created_location(method, response)?;
        let location = uri_template::resolve(&response.uri, &location);
        debug!(location = %location, "Shifting traversal to created resource");
        Ok(Self::new(executor, location))
    }

    pub fn follow<H: Into<Hop>>(&self, hops: impl IntoIterator<Item = H>) -> Traversal {
        Traversal {
            executor: self.executor.clone(),
            base_uri: self.base_uri.clone(),
            hops: hops.into_iter().map(Into::into).collect(),
        }
    }
}

/// A sequence of hops waiting for a terminal operation
pub struct Traversal {
    executor: Arc<dyn HttpExecutor>,
    base_uri: String,
    hops: Vec<Hop>,
}

impl Traversal {
    pub fn follow(mut self, hop: impl Into<Hop>) -> Self {
        self.hops.push(hop.into());
        self
    }

    /// Templates advertised by the final resource
    pub async fn templates(&self) -> HalResult<Templates> {
        let response = self.get().await?;
        Templates::from_response(self.executor.clone(), &response)
    }

    pub async fn get(&self) -> HalResult<HttpResponse> {
        self.request(Method::GET, None).await
    }

    pub async fn post(&self, json_content: Option<String>) -> HalResult<HttpResponse> {
        self.request(Method::POST, json_content).await
    }

    pub async fn put(&self, json_content: Option<String>) -> HalResult<HttpResponse> {
        self.request(Method::PUT, json_content).await
    }

    pub async fn patch(&self, json_content: Option<String>) -> HalResult<HttpResponse> {
        self.request(Method::PATCH, json_content).await
    }

    pub async fn delete(&self) -> HalResult<HttpResponse> {
        self.request(Method::DELETE, None).await
    }

    /// Send a request to the final resource
    pub async fn request(
        &self,
        method: Method,
        json_content: Option<String>,
    ) -> HalResult<HttpResponse> {
        let mut request = HttpRequest::new(method, self.target_uri().await?);
        if let Some(content) = json_content {
            request = request.content(APPLICATION_JSON, content);
        }
        self.executor.execute(request).await
    }

    /// Resolve every hop and return the URI of the final resource
    pub async fn target_uri(&self) -> HalResult<String> {
        let mut target_uri = self.base_uri.clone();
        for hop in &self.hops {
            let response = self.executor.execute(HttpRequest::get(target_uri.clone())).await?;
            if !(response.status.is_success() || response.status.is_redirection()) {
                return Err(HalError::UnexpectedResponse {
                    method: "GET".to_string(),
                    uri: target_uri,
                    status: response.status.as_u16(),
                    body: response.text(),
                });
            }
            if !(response.has_media_type(HAL_FORMS_JSON) || response.has_media_type(HAL_JSON)) {
                return Err(HalError::IncompatibleContentType {
                    uri: target_uri,
                    content_type: response.content_type().map(str::to_string),
                    expected: format!("{HAL_FORMS_JSON} or {HAL_JSON}"),
                });
            }

            let href = find_link(&response, hop.relation_name())?.ok_or_else(|| {
                HalError::RelationNotFound {
                    relation: hop.relation_name().to_string(),
                    uri: response.uri.clone(),
                }
            })?;
            let expanded = uri_template::expand(&href, hop.parameters());
            target_uri = uri_template::resolve(&response.uri, &expanded);
            debug!(relation = %hop.relation_name(), target = %target_uri, "Followed relation");
        }
        Ok(target_uri)
    }
}

/// Href of relation `rel` in the `_links` of a HAL body
pub fn find_link(response: &HttpResponse, rel: &str) -> HalResult<Option<String>> {
    let body: Value = response.json()?;
    Ok(body
        .get("_links")
        .and_then(|links| links.get(rel))
        .and_then(link_href))
}
