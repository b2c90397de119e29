use std::sync::Arc;
use std::time::Duration;

use budgetwatch_api::app::services::AppServices;
use budgetwatch_api::config::ApiConfig;
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    async fn spawn_with(config: ApiConfig) -> Self {
        // Same router as prod, but bound to an ephemeral port.
        let services = Arc::new(AppServices::new(config));
        let app = budgetwatch_api::app::router_with(services.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn test_config() -> ApiConfig {
    ApiConfig {
        sse_keep_alive: Duration::from_millis(100),
        ..ApiConfig::default()
    }
}

async fn create_budget(client: &reqwest::Client, server: &TestServer, name: &str, total: f64) -> String {
    let res = client
        .post(server.url("/budgets"))
        .json(&json!({ "name": name, "total": total }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

/// Read one `event:`/`data:` frame off an SSE response.
async fn next_frame(res: &mut reqwest::Response, buf: &mut String) -> (String, serde_json::Value) {
    loop {
        if let Some(end) = buf.find("\n\n") {
            let frame: String = buf.drain(..end + 2).collect();
            let mut event = None;
            let mut data = None;
            for line in frame.lines() {
                if let Some(v) = line.strip_prefix("event:") {
                    event = Some(v.trim().to_string());
                } else if let Some(v) = line.strip_prefix("data:") {
                    data = Some(v.trim().to_string());
                }
            }
            // Keep-alive comments carry neither field.
            if let (Some(event), Some(data)) = (event, data) {
                return (event, serde_json::from_str(&data).unwrap());
            }
            continue;
        }

        let chunk = tokio::time::timeout(Duration::from_secs(5), res.chunk())
            .await
            .expect("timed out waiting for SSE frame")
            .unwrap()
            .expect("SSE stream ended");
        buf.push_str(std::str::from_utf8(&chunk).unwrap());
    }
}

#[tokio::test]
async fn healthz_is_ok() {
    let server = TestServer::spawn().await;
    let res = reqwest::get(server.url("/healthz")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn create_get_and_list_budgets() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let id = create_budget(&client, &server, "Engineering hiring", 2000.0).await;

    let res = client.get(server.url(&format!("/budgets/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Engineering hiring");
    assert_eq!(body["total"], 2000.0);
    assert_eq!(body["spent"], 0.0);
    assert!(body["createdAt"].is_string());

    create_budget(&client, &server, "Sales hiring", 500.0).await;
    let res = client.get(server.url("/budgets")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], id.as_str());
}

#[tokio::test]
async fn create_budget_validation() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for body in [
        json!({ "total": 100 }),
        json!({ "name": "  ", "total": 100 }),
        json!({ "name": "Ops" }),
        json!({ "name": "Ops", "total": 0 }),
        json!({ "name": "Ops", "total": -10 }),
        json!({ "name": "Ops", "total": "abc" }),
    ] {
        let res = client.post(server.url("/budgets")).json(&body).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{body}");
        let err: serde_json::Value = res.json().await.unwrap();
        assert_eq!(err["error"], "invalid_input", "{body}");
    }

    // Numeric strings are accepted.
    let res = client
        .post(server.url("/budgets"))
        .json(&json!({ "name": "Ops", "total": "750" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(server.url("/budgets"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let missing = uuid_like();

    let res = client.get(server.url(&format!("/budgets/{missing}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "not_found");

    let res = client
        .post(server.url(&format!("/budgets/{missing}/spend")))
        .json(&json!({ "amount": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(server.url(&format!("/forecast/{missing}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(server.url("/budgets/not-a-uuid")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_id");
}

#[tokio::test]
async fn spend_crosses_threshold() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let id = create_budget(&client, &server, "Contractors", 1000.0).await;
    let spend_url = server.url(&format!("/budgets/{id}/spend"));

    let res = client.post(&spend_url).json(&json!({ "amount": 500 })).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["spent"], 500.0);
    assert_eq!(body["percentUsed"], 50.0);
    assert_eq!(body["name"], "Contractors");

    let res = client.post(&spend_url).json(&json!({ "amount": 400 })).send().await.unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["spent"], 900.0);
    assert_eq!(body["percentUsed"], 90.0);

    for bad in [json!({}), json!({ "amount": 0 }), json!({ "amount": -5 }), json!({ "amount": "x" })] {
        let res = client.post(&spend_url).json(&bad).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{bad}");
    }
}

#[tokio::test]
async fn ad_hoc_forecast() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/forecast"))
        .json(&json!({ "base": 1000, "variabilityPct": 0, "runs": 100 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "min": 1000, "likely": 1000, "max": 1000, "samplesCount": 100 }));

    let res = client
        .post(server.url("/forecast"))
        .json(&json!({ "base": 500 }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["samplesCount"], 10_000);
    let (min, likely, max) = (
        body["min"].as_i64().unwrap(),
        body["likely"].as_i64().unwrap(),
        body["max"].as_i64().unwrap(),
    );
    assert!(0 <= min && min <= likely && likely <= max);

    for bad in [
        json!({ "base": 0 }),
        json!({ "base": -5 }),
        json!({}),
        json!({ "base": 100, "runs": 0 }),
        json!({ "base": 100, "runs": 1_000_000 }),
    ] {
        let res = client.post(server.url("/forecast")).json(&bad).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{bad}");
        let err: serde_json::Value = res.json().await.unwrap();
        assert_eq!(err["error"], "invalid_input");
    }
}

#[tokio::test]
async fn forecast_for_stored_budget_stays_within_cap() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let id = create_budget(&client, &server, "Training", 2000.0).await;
    client
        .post(server.url(&format!("/budgets/{id}/spend")))
        .json(&json!({ "amount": 500 }))
        .send()
        .await
        .unwrap();

    let res = client.get(server.url(&format!("/forecast/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["budgetId"], id.as_str());
    assert_eq!(body["budgetName"], "Training");
    assert_eq!(body["currentTotal"], 2000.0);
    assert_eq!(body["currentSpent"], 500.0);

    let f = &body["forecast"];
    let (min, likely, max) = (
        f["min"].as_i64().unwrap(),
        f["likely"].as_i64().unwrap(),
        f["max"].as_i64().unwrap(),
    );
    assert!(0 <= min && min <= likely && likely <= max && max <= 3000);
    assert_eq!(f["samplesCount"], 1000);
}

#[tokio::test]
async fn forecast_timeout_is_503() {
    let server = TestServer::spawn_with(ApiConfig {
        forecast_timeout: Duration::ZERO,
        ..test_config()
    })
    .await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/forecast"))
        .json(&json!({ "base": 1000, "runs": 100_000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "forecast_timeout");
}

#[tokio::test]
async fn alert_stream_pushes_state_and_spend_updates() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let id = create_budget(&client, &server, "Benefits", 1000.0).await;

    let mut res = client.get(server.url(&format!("/budgets/{id}/alert"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/event-stream"));
    let mut buf = String::new();

    let (event, data) = next_frame(&mut res, &mut buf).await;
    assert_eq!(event, "ok");
    assert_eq!(data["percentUsed"], 0.0);
    assert_eq!(data["total"], 1000.0);

    client
        .post(server.url(&format!("/budgets/{id}/spend")))
        .json(&json!({ "amount": 950 }))
        .send()
        .await
        .unwrap();

    let (event, data) = next_frame(&mut res, &mut buf).await;
    assert_eq!(event, "threshold");
    assert_eq!(data["percentUsed"], 95.0);
    assert_eq!(data["spent"], 950.0);

    let budget_id: budgetwatch_core::BudgetId = id.parse().unwrap();
    assert_eq!(server.services.broker().subscriber_count(budget_id), 1);

    drop(res);

    // Disconnect is noticed on the next keep-alive write.
    for _ in 0..100 {
        if server.services.broker().entity_count() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("subscriber was not removed after disconnect");
}

#[tokio::test]
async fn alert_stream_for_unknown_budget_sends_error_and_ends() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in [format!("/budgets/{}/alert", uuid_like()), "/budgets/nope/alert".to_string()] {
        let mut res = client.get(server.url(&path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let mut buf = String::new();

        let (event, data) = next_frame(&mut res, &mut buf).await;
        assert_eq!(event, "error");
        assert_eq!(data, json!({ "message": "Budget not found" }));

        let rest = tokio::time::timeout(Duration::from_secs(5), res.chunk())
            .await
            .expect("stream did not end")
            .unwrap();
        assert!(rest.is_none(), "{path}");
    }
    assert_eq!(server.services.broker().entity_count(), 0);
}

fn uuid_like() -> String {
    budgetwatch_core::BudgetId::new().to_string()
}
