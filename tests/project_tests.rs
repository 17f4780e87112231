
use reqwest::StatusCode;
use serde_json::{json, Value};
use test_utils::*;

async fn project_count(app: &TestApp, category: &str) -> i64 {
    app.category_by_name(category).await["projectCount"].as_i64().unwrap()
}

async fn featured_total(app: &TestApp) -> usize {
    let body: Value = app.get("/projects/featured").await.json().await.unwrap();
    body["data"].as_array().unwrap().len()
}

#[actix_rt::test]
async fn create_then_get_round_trips_with_defaults() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;

    let created = app.create_simple_project(&token, "Alpha", &["DeFi"], false).await;
    let id = created["id"].as_str().unwrap();

    let response = app.get(&format!("/projects/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let project = &body["data"];
    assert_eq!(project["name"], "Alpha");
    assert_eq!(project["categories"], json!(["DeFi"]));
    assert_eq!(project["featured"], false);
    assert_eq!(project["status"], "unpublished");
    assert_eq!(project["images"], json!([]));
    assert_eq!(project["videos"], json!([]));
    assert_eq!(project_count(&app, "DeFi").await, 1);
}

#[actix_rt::test]
async fn create_with_links_images_and_status() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;

    let response = app
        .create_project(
            &token,
            json!({
                "name": "Beta",
                "tagline": "Lending for everyone",
                "description": "Beta is a lending protocol",
                "categories": ["DeFi"],
                "status": "PUBLISHED",
                "website": "https://beta.example.com",
                "images": ["https://cdn.example.com/1.png", "https://cdn.example.com/2.png"],
                "socialLinks": { "twitter": "https://twitter.com/beta" }
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    let project = &body["data"];
    assert_eq!(project["status"], "published");
    assert_eq!(
        project["images"],
        json!(["https://cdn.example.com/1.png", "https://cdn.example.com/2.png"])
    );
    assert_eq!(project["socialLinks"]["twitter"], "https://twitter.com/beta");
    assert_eq!(project["website"], "https://beta.example.com");
}

#[actix_rt::test]
async fn unrecognized_status_defaults_to_unpublished() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;

    let mut body = project_body("Gamma", &["DeFi"], false);
    body["status"] = json!("coming-soon");
    let response = app.create_project(&token, body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["status"], "unpublished");
}

#[actix_rt::test]
async fn create_with_unknown_category_fails_without_side_effects() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;

    let response = app
        .create_project(&token, project_body("Alpha", &["DeFi", "Nope"], false))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let list: Value = app.get("/projects").await.json().await.unwrap();
    assert_eq!(list["pagination"]["total"], 0);
    assert_eq!(project_count(&app, "DeFi").await, 0);
}

#[actix_rt::test]
async fn create_without_categories_is_a_validation_error() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .create_project(
            &token,
            json!({ "name": "Alpha", "description": "A project without categories", "categories": [] }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation failed");
}

#[actix_rt::test]
async fn fourth_featured_project_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;
    for name in ["One", "Two", "Three"] {
        app.create_simple_project(&token, name, &["DeFi"], true).await;
    }

    let response = app
        .create_project(&token, project_body("Four", &["DeFi"], true))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Maximum of 3 featured projects"));
    assert_eq!(featured_total(&app).await, 3);
    let list: Value = app.get("/projects").await.json().await.unwrap();
    assert_eq!(list["pagination"]["total"], 3);
}

#[actix_rt::test]
async fn featuring_via_update_respects_cap() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;
    let mut featured = Vec::new();
    for name in ["One", "Two", "Three"] {
        featured.push(app.create_simple_project(&token, name, &["DeFi"], true).await);
    }
    let plain = app.create_simple_project(&token, "Four", &["DeFi"], false).await;
    let plain_path = format!("/projects/{}", plain["id"].as_str().unwrap());

    let blocked = app.put_json(&token, &plain_path, &json!({ "featured": true })).await;
    assert_eq!(blocked.status(), StatusCode::BAD_REQUEST);
    assert_eq!(featured_total(&app).await, 3);

    // Re-saving an already featured project is not a new feature.
    let resave = app
        .put_json(
            &token,
            &format!("/projects/{}", featured[0]["id"].as_str().unwrap()),
            &json!({ "featured": true, "tagline": "Still featured" }),
        )
        .await;
    assert_eq!(resave.status(), StatusCode::OK);

    let unfeature = app
        .put_json(
            &token,
            &format!("/projects/{}", featured[1]["id"].as_str().unwrap()),
            &json!({ "featured": false }),
        )
        .await;
    assert_eq!(unfeature.status(), StatusCode::OK);

    let promoted = app.put_json(&token, &plain_path, &json!({ "featured": true })).await;
    assert_eq!(promoted.status(), StatusCode::OK);
    let body: Value = promoted.json().await.unwrap();
    assert_eq!(body["data"]["featured"], true);
    assert_eq!(featured_total(&app).await, 3);
}

#[actix_rt::test]
async fn category_counts_follow_membership_edits() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    for name in ["DeFi", "AI", "Gaming"] {
        app.create_category(&token, name).await;
    }
    let project = app.create_simple_project(&token, "Alpha", &["DeFi", "AI"], false).await;
    let path = format!("/projects/{}", project["id"].as_str().unwrap());
    assert_eq!(project_count(&app, "DeFi").await, 1);
    assert_eq!(project_count(&app, "AI").await, 1);
    assert_eq!(project_count(&app, "Gaming").await, 0);

    let response = app
        .put_json(&token, &path, &json!({ "categories": ["AI", "Gaming"] }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let mut categories: Vec<String> = serde_json::from_value(body["data"]["categories"].clone()).unwrap();
    categories.sort();
    assert_eq!(categories, vec!["AI", "Gaming"]);
    assert_eq!(project_count(&app, "DeFi").await, 0);
    assert_eq!(project_count(&app, "AI").await, 1);
    assert_eq!(project_count(&app, "Gaming").await, 1);

    // Same set again is idempotent.
    let again = app
        .put_json(&token, &path, &json!({ "categories": ["Gaming", "AI"] }))
        .await;
    assert_eq!(again.status(), StatusCode::OK);
    assert_eq!(project_count(&app, "AI").await, 1);
    assert_eq!(project_count(&app, "Gaming").await, 1);

    app.create_simple_project(&token, "Beta", &["AI"], false).await;
    assert_eq!(project_count(&app, "AI").await, 2);
}

#[actix_rt::test]
async fn update_applies_only_supplied_fields() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;
    let response = app
        .create_project(
            &token,
            json!({
                "name": "Alpha",
                "description": "Alpha is a DeFi protocol",
                "categories": ["DeFi"],
                "website": "https://alpha.example.com",
                "socialLinks": { "twitter": "https://twitter.com/alpha", "discord": "https://discord.gg/alpha" }
            }),
        )
        .await;
    let created: Value = response.json().await.unwrap();
    let path = format!("/projects/{}", created["data"]["id"].as_str().unwrap());

    let response = app
        .client
        .patch(app.url(&path))
        .bearer_auth(&token)
        .json(&json!({
            "tagline": "Now with a tagline",
            "website": null,
            "images": ["https://cdn.example.com/a.png"],
            "socialLinks": { "discord": "https://discord.gg/alpha-v2" }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let project = &body["data"];
    assert_eq!(project["name"], "Alpha");
    assert_eq!(project["tagline"], "Now with a tagline");
    assert_eq!(project["description"], "Alpha is a DeFi protocol");
    assert!(project["website"].is_null());
    assert_eq!(project["images"], json!(["https://cdn.example.com/a.png"]));
    assert_eq!(project["socialLinks"]["twitter"], "https://twitter.com/alpha");
    assert_eq!(project["socialLinks"]["discord"], "https://discord.gg/alpha-v2");
    assert_eq!(project["categories"], json!(["DeFi"]));
}

#[actix_rt::test]
async fn update_unknown_project_is_404() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .put_json(
            &token,
            "/projects/5f0c6a1e-8a53-4c55-9f5e-2f4a0b7f0e11",
            &json!({ "tagline": "nobody home" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn delete_cascades_and_decrements_counts() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;
    app.create_category(&token, "AI").await;
    let project = app.create_simple_project(&token, "Alpha", &["DeFi", "AI"], false).await;
    let keep = app.create_simple_project(&token, "Beta", &["AI"], false).await;
    let id = project["id"].as_str().unwrap();

    let video = app
        .post_json(
            &token,
            "/videos",
            &json!({ "projectId": id, "title": "Launch", "playbackId": "alpha-launch" }),
        )
        .await;
    assert_eq!(video.status(), StatusCode::CREATED);
    let video: Value = video.json().await.unwrap();
    let video_id = video["data"]["id"].as_str().unwrap().to_string();

    let response = app.delete(&token, &format!("/projects/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(app.get(&format!("/projects/{}", id)).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get(&format!("/videos/{}", video_id)).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(project_count(&app, "DeFi").await, 0);
    assert_eq!(project_count(&app, "AI").await, 1);

    let survivor = app.get(&format!("/projects/{}", keep["id"].as_str().unwrap())).await;
    assert_eq!(survivor.status(), StatusCode::OK);

    // Freed playback id can be reused.
    let reuse = app
        .post_json(
            &token,
            "/videos",
            &json!({ "projectId": keep["id"], "title": "Launch", "playbackId": "alpha-launch" }),
        )
        .await;
    assert_eq!(reuse.status(), StatusCode::CREATED);

    let again = app.delete(&token, &format!("/projects/{}", id)).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn pagination_reports_totals() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;
    for i in 0..25 {
        app.create_simple_project(&token, &format!("Project {:02}", i), &["DeFi"], false)
            .await;
    }

    let body: Value = app.get("/projects?page=2&limit=10").await.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["pagination"]["total"], 25);
    assert_eq!(body["pagination"]["totalPages"], 3);

    let last: Value = app.get("/projects?page=3&limit=10").await.json().await.unwrap();
    assert_eq!(last["data"].as_array().unwrap().len(), 5);

    let sorted: Value = app
        .get("/projects?limit=3&sortBy=name&sortOrder=asc")
        .await
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = sorted["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Project 00", "Project 01", "Project 02"]);
}

#[actix_rt::test]
async fn search_matches_category_names_case_insensitively() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;
    app.create_category(&token, "DeFi Lending").await;
    app.create_category(&token, "Gaming").await;
    app.create_simple_project(&token, "Alpha", &["DeFi"], false).await;
    app.create_simple_project(&token, "Beta", &["DeFi Lending"], false).await;
    app.create_simple_project(&token, "Gamma", &["Gaming"], false).await;

    let body: Value = app.get("/projects/search?q=defi").await.json().await.unwrap();
    let mut names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Alpha", "Beta"]);

    let listed: Value = app.get("/projects?search=DEFI").await.json().await.unwrap();
    assert_eq!(listed["pagination"]["total"], 2);

    let blank = app.get("/projects/search?q=").await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn search_treats_wildcards_literally() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;
    app.create_simple_project(&token, "Alpha", &["DeFi"], false).await;

    let body: Value = app.get("/projects/search?q=%25").await.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[actix_rt::test]
async fn list_filters_by_category_featured_and_status() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;
    app.create_category(&token, "Gaming").await;
    app.create_simple_project(&token, "Alpha", &["DeFi"], true).await;
    app.create_simple_project(&token, "Beta", &["Gaming"], false).await;
    let mut published = project_body("Gamma", &["Gaming"], false);
    published["status"] = json!("published");
    assert_eq!(app.create_project(&token, published).await.status(), StatusCode::CREATED);

    let by_category: Value = app.get("/projects?category=Gaming").await.json().await.unwrap();
    assert_eq!(by_category["pagination"]["total"], 2);

    let featured: Value = app.get("/projects?featured=true").await.json().await.unwrap();
    assert_eq!(featured["pagination"]["total"], 1);
    assert_eq!(featured["data"][0]["name"], "Alpha");

    let status: Value = app.get("/projects?status=published").await.json().await.unwrap();
    assert_eq!(status["pagination"]["total"], 1);
    assert_eq!(status["data"][0]["name"], "Gamma");

    let by_path: Value = app.get("/projects/category/DeFi").await.json().await.unwrap();
    assert_eq!(by_path["data"].as_array().unwrap().len(), 1);
}
