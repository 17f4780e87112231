
use reqwest::StatusCode;
use serde_json::{json, Value};
use test_utils::*;

#[actix_rt::test]
async fn login_returns_token_pair_and_principal() {
    let app = TestApp::spawn().await;

    let body = app.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    assert_eq!(body["success"], true);
    assert!(!body["data"]["accessToken"].as_str().unwrap().is_empty());
    assert!(!body["data"]["refreshToken"].as_str().unwrap().is_empty());
    assert_eq!(body["data"]["tokenType"], "Bearer");
    assert_eq!(body["data"]["user"]["username"], ADMIN_USERNAME);
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert!(body["data"]["user"].get("passwordHash").is_none());
}

#[actix_rt::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "username": ADMIN_USERNAME, "password": "not-the-password" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn login_with_unknown_user_is_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "username": "ghost", "password": ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn me_returns_current_principal() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["username"], ADMIN_USERNAME);
}

#[actix_rt::test]
async fn protected_endpoints_require_a_token() {
    let app = TestApp::spawn().await;

    let me = app.get("/auth/me").await;
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);

    let create = app
        .client
        .post(app.url("/categories"))
        .json(&json!({ "name": "DeFi", "description": "Decentralized finance", "icon": "coin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::UNAUTHORIZED);
    let body: Value = create.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn garbage_token_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth("definitely.not.ajwt")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn non_admin_cannot_mutate_catalog() {
    let app = TestApp::spawn().await;
    let token = app.viewer_token().await;

    let response = app
        .post_json(
            &token,
            "/categories",
            &json!({ "name": "DeFi", "description": "Decentralized finance", "icon": "coin" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let dashboard = app
        .client
        .get(app.url("/admin/dashboard"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(dashboard.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn catalog_reads_are_public() {
    let app = TestApp::spawn().await;

    for path in ["/categories", "/projects", "/videos", "/projects/featured", "/health"] {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {} should be public", path);
    }
}

#[actix_rt::test]
async fn refresh_issues_a_new_token_pair() {
    let app = TestApp::spawn().await;
    let login = app.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let refresh_token = login["data"]["refreshToken"].as_str().unwrap();

    let response = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "refreshToken": refresh_token }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let access = body["data"]["accessToken"].as_str().unwrap();

    let me = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(access)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn access_token_cannot_be_used_as_refresh_token() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "refreshToken": token }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn logout_without_redis_succeeds() {
    let app = TestApp::spawn().await;
    let login = app.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let access = login["data"]["accessToken"].as_str().unwrap();
    let refresh = login["data"]["refreshToken"].as_str().unwrap();

    let response = app
        .post_json(access, "/auth/logout", &json!({ "refreshToken": refresh }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Logged out successfully");
}

#[actix_rt::test]
async fn admin_dashboard_reports_totals() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;
    app.create_category(&token, "Gaming").await;
    app.create_simple_project(&token, "Alpha", &["DeFi"], false).await;

    let response = app
        .client
        .get(app.url("/admin/dashboard"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["totals"]["projects"], 1);
    assert_eq!(data["totals"]["categories"], 2);
    assert_eq!(data["totals"]["videos"], 0);
    assert_eq!(data["recentProjects"][0]["name"], "Alpha");
    assert_eq!(data["topCategories"][0]["name"], "DeFi");
}

#[actix_rt::test]
async fn unknown_route_returns_envelope_404() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .client
        .get(app.url("/does-not-exist"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}
