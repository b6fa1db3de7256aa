use super::common;

use common::test_server::TestServer;
use halcheck::adapters::http_client::ReqwestExecutor;
use halcheck::adapters::templates::Templates;
use halcheck::adapters::traversal::HalClient;
use halcheck::domain::property::{FormProperty, PropertyValidationOption};
use halcheck::HalError;
use std::sync::Arc;

async fn templates(server: &TestServer) -> Templates {
    let executor = Arc::new(ReqwestExecutor::new(&server.url("/")).unwrap());
    HalClient::new(executor, server.url("/"))
        .follow(["orders"])
        .templates()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_valid_form_is_accepted() {
    let server = TestServer::new().await;
    let templates = templates(&server).await;

    let mut form = templates.by_key("default").unwrap().create_form();
    form.with_string("name", Some("john"))
        .await
        .unwrap()
        .with_long("quantity", Some(3))
        .await
        .unwrap()
        .with_string("email", Some("john@example.org"))
        .await
        .unwrap()
        .with_string("carrier", Some("ups"))
        .await
        .unwrap();

    let response = form.submit().await.unwrap();
    assert_eq!(response.status.as_u16(), 201);
    assert_eq!(response.location(), Some("/orders/1"));
}

#[tokio::test]
async fn test_predicted_rejection_is_confirmed_by_server() {
    let server = TestServer::new().await;
    let templates = templates(&server).await;

    let mut form = templates.by_key("default").unwrap().create_form();
    form.with_string("name", Some("a name that is too long"))
        .await
        .unwrap()
        .with_long("quantity", Some(500))
        .await
        .unwrap();

    let (_, reasons) = form.build_payload();
    assert_eq!(reasons.len(), 2);

    let response = form.submit().await.unwrap();
    assert_eq!(response.status.as_u16(), 400);
}

#[tokio::test]
async fn test_missing_required_property_is_confirmed_by_server() {
    let server = TestServer::new().await;
    let templates = templates(&server).await;

    let form = templates.by_key("default").unwrap().create_form();
    let response = form.submit().await.unwrap();
    assert_eq!(response.status.as_u16(), 400);
}

#[tokio::test]
async fn test_remote_options_are_enforced() {
    let server = TestServer::new().await;
    let templates = templates(&server).await;

    let mut form = templates.by_key("default").unwrap().create_form();
    form.with_string("name", Some("john"))
        .await
        .unwrap()
        .with_string("carrier", Some("fedex"))
        .await
        .unwrap();

    let invalid = &form.properties()[1];
    assert_eq!(
        invalid.deferrable_reason(),
        Some("Value 'fedex' didn't match any inline option of property 'carrier' among [{prompt=UPS, value=ups}, {prompt=DHL, value=dhl}]")
    );
    assert_eq!(form.submit().await.unwrap().status.as_u16(), 400);
}

#[tokio::test]
async fn test_lenient_server_breaks_prediction() {
    let server = TestServer::new().await;
    let templates = templates(&server).await;

    let mut form = templates.by_key("lenient").unwrap().create_form();
    form.with_string("name", Some("a name that is too long"))
        .await
        .unwrap();

    let error = form.submit().await.unwrap_err();
    assert!(matches!(
        error,
        HalError::ExpectedClientError { status: 204, ref reasons } if reasons.len() == 1
    ));
}

#[tokio::test]
async fn test_skipped_validation_probes_server_enforcement() {
    let server = TestServer::new().await;
    let templates = templates(&server).await;

    let mut form = templates.by_key("default").unwrap().create_form();
    let property = FormProperty::string("name", Some("a name that is too long")).unwrap();
    form.with_property(property, PropertyValidationOption::SkipIfNotValid.into())
        .await
        .unwrap();

    let response = form.submit().await.unwrap();
    assert_eq!(response.status.as_u16(), 400);
}

#[tokio::test]
async fn test_create_and_shift_to_new_order() {
    let server = TestServer::new().await;
    let templates = templates(&server).await;

    let created = templates
        .by_key("default")
        .unwrap()
        .create_and_shift(Some(r#"{"name":"john"}"#.to_string()))
        .await
        .unwrap();
    assert_eq!(created.base_uri(), server.url("/orders/1"));

    let order = created.follow(Vec::<String>::new()).templates().await.unwrap();
    assert_eq!(order.self_href(), server.url("/orders/1"));
    assert!(order.list().is_empty());
}
