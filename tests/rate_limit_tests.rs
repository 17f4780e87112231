
use reqwest::StatusCode;
use serde_json::Value;
use test_utils::*;

#[actix_rt::test]
async fn requests_over_the_limit_get_429() {
    let mut config = test_config();
    config.rate_limit_max_requests = 5;
    let app = TestApp::spawn_with(config).await;

    // Startup health polling already spent part of the budget.
    let mut limited = None;
    for _ in 0..6 {
        let response = app.get("/categories").await;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            limited = Some(response);
            break;
        }
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = limited.expect("limit was never reached");
    assert!(response.headers().contains_key("retry-after"));
    assert_eq!(response.headers()["x-ratelimit-limit"], "5");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}
