use reqwest::{Method, StatusCode};
use std::sync::Arc;
use tracing::{debug, info};

use super::form::Form;
use super::traversal::HalClient;
use crate::domain::template::{HalFormsDocument, TemplateRepresentation};
use crate::domain::{uri_template, HttpExecutor, HttpRequest, HttpResponse, HAL_FORMS_JSON};
use crate::error::{HalError, HalResult};

/// The templates advertised by one HAL-FORMS resource
pub struct Templates {
    executor: Arc<dyn HttpExecutor>,
    document: HalFormsDocument,
}

impl Templates {
    /// Interpret the response of a GET on a HAL-FORMS resource
    pub fn from_response(
        executor: Arc<dyn HttpExecutor>,
        response: &HttpResponse,
    ) -> HalResult<Self> {
        if !(response.status.is_success() || response.status.is_redirection()) {
            return Err(HalError::UnexpectedResponse {
                method: "GET".to_string(),
                uri: response.uri.clone(),
                status: response.status.as_u16(),
                body: response.text(),
            });
        }
        if !response.has_media_type(HAL_FORMS_JSON) {
            return Err(HalError::IncompatibleContentType {
                uri: response.uri.clone(),
                content_type: response.content_type().map(str::to_string),
                expected: HAL_FORMS_JSON.to_string(),
            });
        }

        let mut document = HalFormsDocument::from_slice(&response.body)?;
        document.self_href = uri_template::resolve(&response.uri, &document.self_href);
        debug!(
            uri = %response.uri,
            templates = document.templates.len(),
            "Parsed HAL-FORMS document"
        );
        Ok(Self { executor, document })
    }

    /// Href of the resource's self link
    pub fn self_href(&self) -> &str {
        &self.document.self_href
    }

    pub fn by_optional_key(&self, key: &str) -> Option<Template> {
        self.document
            .templates
            .get(key)
            .map(|representation| self.template(key, representation))
    }

    pub fn by_key(&self, key: &str) -> HalResult<Template> {
        self.by_optional_key(key)
            .ok_or_else(|| HalError::TemplateNotFound(key.to_string()))
    }

    /// Every template, ordered by key
    pub fn list(&self) -> Vec<Template> {
        self.document
            .templates
            .iter()
            .map(|(key, representation)| self.template(key, representation))
            .collect()
    }

    fn template(&self, key: &str, representation: &TemplateRepresentation) -> Template {
        Template::new(
            self.executor.clone(),
            &self.document.self_href,
            key,
            Arc::new(representation.clone()),
        )
    }
}

/// One submittable template
#[derive(Clone)]
pub struct Template {
    executor: Arc<dyn HttpExecutor>,
    key: String,
    representation: Arc<TemplateRepresentation>,
    target: String,
}

impl Template {
    pub fn new(
        executor: Arc<dyn HttpExecutor>,
        base_uri: &str,
        key: &str,
        representation: Arc<TemplateRepresentation>,
    ) -> Self {
        let target = match representation.target() {
            Some(target) => uri_template::resolve(base_uri, target),
            None => base_uri.to_string(),
        };
        Self {
            executor,
            key: key.to_string(),
            representation,
            target,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn representation(&self) -> &TemplateRepresentation {
        &self.representation
    }

    /// Template target, or the resource's own URI when none is declared
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn method(&self) -> &str {
        self.representation.method()
    }

    pub(crate) fn executor(&self) -> Arc<dyn HttpExecutor> {
        self.executor.clone()
    }

    pub fn create_form(&self) -> Form {
        Form::new(self.clone())
    }

    /// Send `content`, if any, with the template's method, target and content type
    pub async fn submit(&self, content: Option<String>) -> HalResult<HttpResponse> {
        let method = Method::from_bytes(self.method().as_bytes()).map_err(|_| {
            HalError::MalformedTemplate(format!("Unknown HTTP method '{}'", self.method()))
        })?;

        let mut request = HttpRequest::new(method, self.target.clone());
        if let Some(content) = content {
            request = request.content(self.representation.content_type(), content);
        }

        info!(
            template = %self.key,
            method = %self.method(),
            target = %self.target,
            "Submitting template"
        );
        self.executor.execute(request).await
    }

    /// Submit, expect `201 Created`, then start a traversal at `Location`
    pub async fn create_and_shift(&self, content: Option<String>) -> HalResult<HalClient> {
        let response = self.submit(content).await?;
        HalClient::shift_to_created(self.executor.clone(), self.method(), &response)
    }
}

/// Expect `201 Created` and return its `Location`
pub(crate) fn created_location(method: &str, response: &HttpResponse) -> HalResult<String> {
    if response.status != StatusCode::CREATED {
        return Err(HalError::UnexpectedResponse {
            method: method.to_string(),
            uri: response.uri.clone(),
            status: response.status.as_u16(),
            body: response.text(),
        });
    }
    response
        .location()
        .map(str::to_string)
        .ok_or(HalError::MissingLocation)
}
