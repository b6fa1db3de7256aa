use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;

pub const HAL_JSON: &str = "application/hal+json";
pub const HAL_FORMS_JSON: &str = "application/prs.hal-forms+json";

const CARRIERS: &[&str] = &["ups", "dhl"];

/// Order API enforcing the same constraints its templates advertise.
///
/// `/lenient` accepts anything, so predictions of failure can be proven wrong.
pub struct TestServer {
    pub addr: SocketAddr,
    pub base_url: String,
}

impl TestServer {
    pub async fn new() -> Self {
        let app = Router::new()
            .route("/", get(root))
            .route("/orders", get(orders).post(create_order))
            .route("/orders/:id", get(order))
            .route("/carriers", get(carriers))
            .route("/lenient", post(lenient));

        // Start server on random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer { addr, base_url }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn document(media_type: &'static str, body: Value) -> Response {
    ([(header::CONTENT_TYPE, media_type)], body.to_string()).into_response()
}

async fn root() -> Response {
    document(
        HAL_JSON,
        json!({
            "_links": {
                "self": {"href": "/"},
                "orders": {"href": "/orders"},
                "order": {"href": "/orders/{id}", "templated": true}
            }
        }),
    )
}

async fn orders() -> Response {
    document(
        HAL_FORMS_JSON,
        json!({
            "_links": {"self": {"href": "/orders"}},
            "_templates": {
                "default": {
                    "title": "Create an order",
                    "method": "POST",
                    "contentType": "application/json",
                    "properties": [
                        {"name": "name", "prompt": "Name", "required": true, "maxLength": 10},
                        {"name": "quantity", "type": "number", "min": 1, "max": 100},
                        {"name": "email", "type": "email", "regex": "[^@]+@[^@]+"},
                        {"name": "status", "value": "draft"},
                        {"name": "id", "readOnly": true},
                        {
                            "name": "carrier",
                            "options": {
                                "link": {"href": "/carriers"},
                                "maxItems": 1,
                                "promptField": "prompt"
                            }
                        }
                    ]
                },
                "lenient": {
                    "method": "POST",
                    "target": "/lenient",
                    "properties": [{"name": "name", "required": true, "maxLength": 10}]
                }
            }
        }),
    )
}

async fn order() -> Response {
    document(
        HAL_FORMS_JSON,
        json!({"_links": {"self": {"href": "/orders/1"}}}),
    )
}

async fn carriers() -> Json<Value> {
    Json(json!([
        {"value": "ups", "prompt": "UPS"},
        {"value": "dhl", "prompt": "DHL"}
    ]))
}

async fn create_order(Json(body): Json<Value>) -> Response {
    let name_ok = body["name"]
        .as_str()
        .map(|name| !name.is_empty() && name.chars().count() <= 10)
        .unwrap_or(false);
    let quantity_ok = match &body["quantity"] {
        Value::Null => true,
        quantity => quantity
            .as_f64()
            .map(|q| (1.0..=100.0).contains(&q))
            .unwrap_or(false),
    };
    let email_ok = match &body["email"] {
        Value::Null => true,
        email => email
            .as_str()
            .map(|e| e.split('@').count() == 2)
            .unwrap_or(false),
    };
    let carrier_ok = match &body["carrier"] {
        Value::Null => true,
        carrier => carrier
            .as_str()
            .map(|c| CARRIERS.contains(&c))
            .unwrap_or(false),
    };

    if name_ok && quantity_ok && email_ok && carrier_ok {
        (StatusCode::CREATED, [(header::LOCATION, "/orders/1")]).into_response()
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid order"}))).into_response()
    }
}

async fn lenient() -> StatusCode {
    StatusCode::NO_CONTENT
}
