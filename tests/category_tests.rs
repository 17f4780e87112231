
use reqwest::StatusCode;
use serde_json::{json, Value};
use test_utils::*;

#[actix_rt::test]
async fn create_category_returns_201_with_defaults() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let category = app.create_category(&token, "DeFi").await;

    assert_eq!(category["name"], "DeFi");
    assert_eq!(category["icon"], "star");
    assert_eq!(category["featured"], false);
    assert_eq!(category["projectCount"], 0);
}

#[actix_rt::test]
async fn duplicate_category_name_conflicts() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;

    let response = app
        .post_json(
            &token,
            "/categories",
            &json!({ "name": "DeFi", "description": "Another DeFi category", "icon": "coin" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn invalid_category_payload_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .post_json(
            &token,
            "/categories",
            &json!({ "name": "", "description": "short", "icon": "" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation failed");
}

#[actix_rt::test]
async fn malformed_json_returns_envelope() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .client
        .post(app.url("/categories"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn categories_are_listed_by_name() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    for name in ["Gaming", "AI", "DeFi"] {
        app.create_category(&token, name).await;
    }

    let body: Value = app.get("/categories").await.json().await.unwrap();

    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["AI", "DeFi", "Gaming"]);
}

#[actix_rt::test]
async fn featured_categories_only_include_featured() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;
    let response = app
        .post_json(
            &token,
            "/categories",
            &json!({ "name": "Gaming", "description": "Games on chain", "icon": "joystick", "featured": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = app.get("/categories/featured").await.json().await.unwrap();

    let featured = body["data"].as_array().unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0]["name"], "Gaming");
}

#[actix_rt::test]
async fn get_unknown_category_is_404() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/categories/5f0c6a1e-8a53-4c55-9f5e-2f4a0b7f0e11")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let malformed = app.get("/categories/not-a-uuid").await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn partial_update_changes_only_supplied_fields() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let category = app.create_category(&token, "DeFi").await;
    let id = category["id"].as_str().unwrap();

    let response = app
        .put_json(&token, &format!("/categories/{}", id), &json!({ "icon": "bank" }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["icon"], "bank");
    assert_eq!(body["data"]["name"], "DeFi");
    assert_eq!(body["data"]["description"], category["description"]);
}

#[actix_rt::test]
async fn renaming_onto_an_existing_name_conflicts() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;
    let gaming = app.create_category(&token, "Gaming").await;

    let response = app
        .put_json(
            &token,
            &format!("/categories/{}", gaming["id"].as_str().unwrap()),
            &json!({ "name": "DeFi" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn deleting_category_in_use_is_blocked() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let category = app.create_category(&token, "DeFi").await;
    let project = app.create_simple_project(&token, "Alpha", &["DeFi"], false).await;
    let id = category["id"].as_str().unwrap();

    let response = app.delete(&token, &format!("/categories/{}", id)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let still_there = app.get(&format!("/categories/{}", id)).await;
    assert_eq!(still_there.status(), StatusCode::OK);
    let body: Value = still_there.json().await.unwrap();
    assert_eq!(body["data"]["projectCount"], 1);

    let project_body: Value = app
        .get(&format!("/projects/{}", project["id"].as_str().unwrap()))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(project_body["data"]["categories"], json!(["DeFi"]));
}

#[actix_rt::test]
async fn deleting_unused_category_succeeds() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let category = app.create_category(&token, "DeFi").await;
    let id = category["id"].as_str().unwrap();

    let response = app.delete(&token, &format!("/categories/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let gone = app.get(&format!("/categories/{}", id)).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let again = app.delete(&token, &format!("/categories/{}", id)).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}
