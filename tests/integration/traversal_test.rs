use super::common;

use common::test_server::TestServer;
use halcheck::adapters::http_client::ReqwestExecutor;
use halcheck::adapters::traversal::{HalClient, Hop};
use halcheck::cli::describe_templates;
use halcheck::HalError;
use std::sync::Arc;

fn client(server: &TestServer) -> HalClient {
    let executor = Arc::new(ReqwestExecutor::new(&server.url("/")).unwrap());
    HalClient::new(executor, server.url("/"))
}

#[tokio::test]
async fn test_follow_templated_relation() {
    let server = TestServer::new().await;

    let target = client(&server)
        .follow([Hop::relation("order").with_parameter("id", 1)])
        .target_uri()
        .await
        .unwrap();

    assert_eq!(target, server.url("/orders/1"));
}

#[tokio::test]
async fn test_unknown_relation() {
    let server = TestServer::new().await;

    let result = client(&server).follow(["invoices"]).get().await;

    assert!(matches!(
        result,
        Err(HalError::RelationNotFound { relation, .. }) if relation == "invoices"
    ));
}

#[tokio::test]
async fn test_root_is_not_a_hal_forms_document() {
    let server = TestServer::new().await;

    let result = client(&server).follow(Vec::<Hop>::new()).templates().await;

    assert!(matches!(result, Err(HalError::IncompatibleContentType { .. })));
}

#[tokio::test]
async fn test_describe_templates_resolves_remote_options() {
    let server = TestServer::new().await;
    let templates = client(&server).follow(["orders"]).templates().await.unwrap();

    let description = describe_templates(&templates).await.unwrap();

    assert!(description.contains(&format!(
        "default: POST {} (application/json)",
        server.url("/orders")
    )));
    assert!(description.contains("  title: Create an order"));
    assert!(description.contains("  - name \"Name\" [type=text, required, maxLength=10]"));
    assert!(description.contains("      options: ups (UPS), dhl (DHL)"));
    assert!(description.contains(&format!(
        "lenient: POST {} (application/json)",
        server.url("/lenient")
    )));
}
