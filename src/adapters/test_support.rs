use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, LOCATION};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::template::{TemplatePropertyRepresentation, TemplateRepresentation};
use crate::domain::{HttpExecutor, HttpRequest, HttpResponse, HAL_FORMS_JSON};
use crate::error::{HalError, HalResult};

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    content_type: Option<String>,
    location: Option<String>,
    body: String,
}

/// In-memory executor answering canned responses keyed by method and URI
#[derive(Default)]
pub struct StubExecutor {
    responses: Mutex<HashMap<(Method, String), Canned>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        &self,
        method: Method,
        uri: &str,
        status: u16,
        content_type: Option<&str>,
        body: &str,
    ) -> &Self {
        self.insert(method, uri, status, content_type, None, body)
    }

    pub fn json(&self, method: Method, uri: &str, status: u16, body: Value) -> &Self {
        self.on(method, uri, status, Some("application/json"), &body.to_string())
    }

    pub fn hal_forms(&self, uri: &str, body: Value) -> &Self {
        self.on(Method::GET, uri, 200, Some(HAL_FORMS_JSON), &body.to_string())
    }

    pub fn created(&self, method: Method, uri: &str, location: &str) -> &Self {
        self.insert(method, uri, 201, None, Some(location), "")
    }

    fn insert(
        &self,
        method: Method,
        uri: &str,
        status: u16,
        content_type: Option<&str>,
        location: Option<&str>,
        body: &str,
    ) -> &Self {
        let canned = Canned {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: content_type.map(str::to_string),
            location: location.map(str::to_string),
            body: body.to_string(),
        };
        self.responses
            .lock()
            .unwrap()
            .insert((method, uri.to_string()), canned);
        self
    }

    pub async fn execute_get(&self, uri: &str) -> HttpResponse {
        self.execute(HttpRequest::get(uri)).await.unwrap()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().last().cloned().unwrap()
    }

    pub fn last_body(&self) -> Value {
        serde_json::from_str(self.last_request().body.as_deref().unwrap()).unwrap()
    }
}

#[async_trait]
impl HttpExecutor for StubExecutor {
    async fn execute(&self, request: HttpRequest) -> HalResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let canned = self
            .responses
            .lock()
            .unwrap()
            .get(&(request.method.clone(), request.uri.clone()))
            .cloned()
            .ok_or_else(|| {
                HalError::InvalidUri(format!("{} {} not stubbed", request.method, request.uri))
            })?;

        let mut headers = HeaderMap::new();
        if let Some(content_type) = canned.content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_str(&content_type).unwrap());
        }
        if let Some(location) = canned.location {
            headers.insert(LOCATION, HeaderValue::from_str(&location).unwrap());
        }
        Ok(HttpResponse {
            uri: request.uri,
            status: canned.status,
            headers,
            body: Bytes::from(canned.body),
        })
    }
}

pub fn stub() -> Arc<StubExecutor> {
    Arc::new(StubExecutor::new())
}

pub fn property(json: Value) -> TemplatePropertyRepresentation {
    serde_json::from_value(json).unwrap()
}

pub fn template(json: Value) -> TemplateRepresentation {
    serde_json::from_value(json).unwrap()
}
