use httpmock::prelude::*;
use small_crm::domain::ports::GraphqlTransport;
use small_crm::{
    build_schema, run_now, CrmSchema, CrmService, FileSink, HttpGraphqlClient, JobKind,
    MemoryStore,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

struct TestServer {
    endpoint: String,
    schema: CrmSchema,
    shutdown: CancellationToken,
    handle: tokio::task::JoinHandle<small_crm::Result<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let schema = build_schema(CrmService::new(Arc::new(MemoryStore::new())));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/graphql", listener.local_addr().unwrap());
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(small_crm::api::serve(
            listener,
            schema.clone(),
            shutdown.clone(),
        ));

        Self {
            endpoint,
            schema,
            shutdown,
            handle,
        }
    }

    fn client(&self) -> HttpGraphqlClient {
        HttpGraphqlClient::new(self.endpoint.clone()).with_timeout(Duration::from_secs(2))
    }

    async fn seed(&self, query: &str) {
        let response = self.schema.execute(query).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
    }

    async fn stop(self) {
        self.shutdown.cancel();
        self.handle.await.unwrap().unwrap();
    }
}

async fn run_job(kind: JobKind, transport: &dyn GraphqlTransport, dir: &TempDir) -> Vec<String> {
    let path = dir.path().join("logs").join(format!("{}.txt", kind.name()));
    let sink = FileSink::new(&path);
    run_now(kind.job().as_ref(), transport, &sink).await;

    tokio::fs::read_to_string(&path)
        .await
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_heartbeat_against_live_server() {
    let server = TestServer::start().await;
    let dir = TempDir::new().unwrap();

    let lines = run_job(JobKind::Heartbeat, &server.client(), &dir).await;

    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" CRM is alive"));
    assert!(lines[1].ends_with(r#" GraphQL hello response: {"hello":"Hello, GraphQL!"}"#));
    server.stop().await;
}

#[tokio::test]
async fn test_low_stock_restocks_through_http() {
    let server = TestServer::start().await;
    server
        .seed(r#"mutation { createProduct(name: "Cable", price: 4.5, stock: 2) { errors } }"#)
        .await;
    server
        .seed(r#"mutation { createProduct(name: "Dock", price: 80, stock: 30) { errors } }"#)
        .await;
    let dir = TempDir::new().unwrap();

    let lines = run_job(JobKind::LowStock, &server.client(), &dir).await;

    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" Low stock products successfully updated."));
    assert!(lines[1].ends_with(" Updated Cable → stock: 12"));
    server.stop().await;
}

#[tokio::test]
async fn test_reminders_and_report_share_the_live_data() {
    let server = TestServer::start().await;
    server
        .seed(r#"mutation { createCustomer(name: "Alice", email: "alice@example.com") { errors } }"#)
        .await;
    server
        .seed(r#"mutation { createProduct(name: "Desk", price: 250, stock: 3) { errors } }"#)
        .await;
    server
        .seed(r#"mutation { createOrder(customerId: "1", productIds: ["1"]) { errors } }"#)
        .await;
    server
        .seed(r#"mutation { createOrder(customerId: "1", productIds: ["1"], orderDate: "2001-01-01T00:00:00Z") { errors } }"#)
        .await;
    let dir = TempDir::new().unwrap();
    let client = server.client();

    let reminders = run_job(JobKind::OrderReminders, &client, &dir).await;
    assert_eq!(reminders.len(), 1);
    assert!(reminders[0].ends_with(" - Order ID: 1, Customer Email: alice@example.com"));

    let report = run_job(JobKind::Report, &client, &dir).await;
    assert_eq!(report.len(), 1);
    assert!(report[0].contains(" - Report: 1 customers, 2 orders, 500"));
    assert!(report[0].ends_with(" revenue"));
    server.stop().await;
}

#[tokio::test]
async fn test_job_lines_are_appended_across_runs() {
    let server = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let client = server.client();

    run_job(JobKind::Report, &client, &dir).await;
    let lines = run_job(JobKind::Report, &client, &dir).await;

    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.ends_with("Report: 0 customers, 0 orders, 0 revenue")));
    server.stop().await;
}

#[tokio::test]
async fn test_unreachable_endpoint_is_logged_not_raised() {
    let mock = MockServer::start();
    let api_mock = mock.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(502);
    });
    let client = HttpGraphqlClient::new(mock.url("/graphql")).with_retry_attempts(1);
    let dir = TempDir::new().unwrap();

    let lines = run_job(JobKind::Heartbeat, &client, &dir).await;

    api_mock.assert_hits(2);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("Error querying GraphQL: API responded with status 502"));
}
