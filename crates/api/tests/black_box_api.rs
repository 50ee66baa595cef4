use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use storefront_api::app::{self, services};
use storefront_infra::{AppConfig, BootstrapReport};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// In-memory store, seeded before the listener accepts traffic.
    async fn spawn() -> Self {
        let srv_services = Arc::new(services::build_services(&AppConfig::default()).unwrap());
        let report = srv_services.run_bootstrap().await;
        assert_eq!(report, BootstrapReport::Seeded { items: 3, attempts: 1 });
        Self::serve(srv_services).await
    }

    /// In-memory store that was never provisioned.
    async fn spawn_unprovisioned() -> Self {
        let srv_services = Arc::new(services::build_services(&AppConfig::default()).unwrap());
        Self::serve(srv_services).await
    }

    async fn serve(srv_services: Arc<services::AppServices>) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = app::build_app(srv_services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    async fn buy(&self, client: &reqwest::Client, id: &str) -> (StatusCode, serde_json::Value) {
        let res = client
            .post(format!("{}/api/buy/{}", self.base_url, id))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn phones(&self, client: &reqwest::Client) -> (StatusCode, serde_json::Value) {
        let res = client
            .get(format!("{}/api/phones", self.base_url))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_reports_store_state() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "in_memory");
    assert_eq!(body["bootstrapped"], true);
}

#[tokio::test]
async fn lists_seed_catalog_in_id_order() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = srv.phones(&client).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": 1, "brand": "Google", "model": "Pixel 8 Pro", "price": 999, "stock": 5},
            {"id": 2, "brand": "Apple", "model": "iPhone 15 Pro", "price": 1099, "stock": 3},
            {"id": 3, "brand": "Samsung", "model": "Galaxy S24 Ultra", "price": 1299, "stock": 10},
        ])
    );
}

#[tokio::test]
async fn purchase_lifecycle_drains_stock_then_conflicts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for expected in [2, 1, 0] {
        let (status, body) = srv.buy(&client, "2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Purchase successful!");
        assert_eq!(body["phone"]["model"], "iPhone 15 Pro");
        assert_eq!(body["phone"]["stock"], expected);
    }

    let (status, body) = srv.buy(&client, "2").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "out_of_stock");

    let (_, phones) = srv.phones(&client).await;
    assert_eq!(phones[1]["stock"], 0);
    assert_eq!(phones[0]["stock"], 5);
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = srv.buy(&client, "999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    for bad in ["0", "-1", "pixel"] {
        let (status, body) = srv.buy(&client, bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "id {bad}");
        assert_eq!(body["error"], "invalid_id");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_buyers_never_oversell() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // 20 buyers race for the 5 Pixels.
    let mut tasks = Vec::new();
    for _ in 0..20 {
        let client = client.clone();
        let url = format!("{}/api/buy/1", srv.base_url);
        tasks.push(tokio::spawn(async move {
            client.post(url).send().await.unwrap().status()
        }));
    }

    let mut ok = 0;
    let mut conflict = 0;
    for task in tasks {
        match task.await.unwrap() {
            StatusCode::OK => ok += 1,
            StatusCode::CONFLICT => conflict += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(ok, 5);
    assert_eq!(conflict, 15);

    let (_, phones) = srv.phones(&client).await;
    assert_eq!(phones[0]["stock"], 0);

    let res = client
        .get(format!("{}/metrics", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let text = res.text().await.unwrap();
    assert!(text.contains("storefront_purchase_outcomes_total{status=\"purchased\"} 5"));
    assert!(text.contains("storefront_purchase_outcomes_total{status=\"out_of_stock\"} 15"));
    assert!(text.contains("storefront_purchase_attempts_in_flight 0"));
}

#[tokio::test]
async fn metrics_are_served_in_prometheus_text_format() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, _) = srv.buy(&client, "1").await;
    assert_eq!(status, StatusCode::OK);

    let res = client
        .get(format!("{}/metrics", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()["content-type"].to_str().unwrap().to_owned();
    assert!(content_type.starts_with("text/plain"), "{content_type}");

    let text = res.text().await.unwrap();
    assert!(text.contains("# TYPE storefront_purchase_outcomes_total counter"));
    assert!(text.contains("storefront_purchase_outcomes_total{status=\"purchased\"} 1"));
    assert!(text.contains(
        "storefront_purchase_attempt_duration_seconds_count{status=\"purchased\"} 1"
    ));

    let legacy = client
        .get(format!("{}/api/metrics", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(legacy.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requests_before_bootstrap_are_unavailable() {
    let srv = TestServer::spawn_unprovisioned().await;
    let client = reqwest::Client::new();

    let (status, body) = srv.phones(&client).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "store_unavailable");

    let res = client
        .post(format!("{}/api/buy/1", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.headers()["retry-after"], "1");
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "transaction_failed");

    let health: serde_json::Value = reqwest::get(format!("{}/health", srv.base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["bootstrapped"], false);
}
