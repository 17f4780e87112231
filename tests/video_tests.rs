
use futures_util::future::join;
use reqwest::StatusCode;
use serde_json::{json, Value};
use test_utils::*;

struct Fixture {
    app: TestApp,
    token: String,
    project_id: String,
}

async fn fixture() -> Fixture {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_category(&token, "DeFi").await;
    let project = app.create_simple_project(&token, "Alpha", &["DeFi"], false).await;
    let project_id = project["id"].as_str().unwrap().to_string();
    Fixture { app, token, project_id }
}

async fn create_video(f: &Fixture, title: &str, playback_id: &str, featured: bool) -> reqwest::Response {
    f.app
        .post_json(
            &f.token,
            "/videos",
            &json!({
                "projectId": f.project_id,
                "title": title,
                "playbackId": playback_id,
                "featured": featured
            }),
        )
        .await
}

async fn created_video(f: &Fixture, title: &str, playback_id: &str) -> Value {
    let response = create_video(f, title, playback_id, false).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    body["data"].clone()
}

#[actix_rt::test]
async fn created_video_inherits_project_name_and_categories() {
    let f = fixture().await;

    let video = created_video(&f, "Launch day", "abc123").await;

    assert_eq!(video["projectId"], f.project_id.as_str());
    assert_eq!(video["projectName"], "Alpha");
    assert_eq!(video["categories"], json!(["DeFi"]));
    assert_eq!(video["featured"], false);

    let project: Value = f
        .app
        .get(&format!("/projects/{}", f.project_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(project["data"]["videos"][0]["playbackId"], "abc123");
}

#[actix_rt::test]
async fn categories_are_read_through_the_project() {
    let f = fixture().await;
    f.app.create_category(&f.token, "Gaming").await;
    let video = created_video(&f, "Launch day", "abc123").await;

    let response = f
        .app
        .put_json(
            &f.token,
            &format!("/projects/{}", f.project_id),
            &json!({ "categories": ["Gaming"] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = f
        .app
        .get(&format!("/videos/{}", video["id"].as_str().unwrap()))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["categories"], json!(["Gaming"]));
}

#[actix_rt::test]
async fn duplicate_playback_id_conflicts() {
    let f = fixture().await;
    created_video(&f, "First", "same-id").await;

    let response = create_video(&f, "Second", "same-id", false).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let list: Value = f.app.get("/videos").await.json().await.unwrap();
    assert_eq!(list["pagination"]["total"], 1);
}

#[actix_rt::test]
async fn concurrent_duplicate_playback_ids_yield_one_winner() {
    let f = fixture().await;

    let (a, b) = join(
        create_video(&f, "Racer A", "race-id", false),
        create_video(&f, "Racer B", "race-id", false),
    )
    .await;

    let mut statuses = vec![a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let list: Value = f.app.get("/videos").await.json().await.unwrap();
    assert_eq!(list["pagination"]["total"], 1);
}

#[actix_rt::test]
async fn create_for_unknown_project_is_404() {
    let f = fixture().await;

    let response = f
        .app
        .post_json(
            &f.token,
            "/videos",
            &json!({
                "projectId": "5f0c6a1e-8a53-4c55-9f5e-2f4a0b7f0e11",
                "title": "Orphan",
                "playbackId": "orphan"
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn create_requires_a_project_id() {
    let f = fixture().await;

    let response = f
        .app
        .post_json(&f.token, "/videos", &json!({ "title": "Loose", "playbackId": "loose" }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn create_under_project_path() {
    let f = fixture().await;

    let response = f
        .app
        .post_json(
            &f.token,
            &format!("/videos/project/{}", f.project_id),
            &json!({ "title": "Nested", "playbackId": "nested-1" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = f
        .app
        .get(&format!("/videos/project/{}", f.project_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["title"], "Nested");

    let missing = f
        .app
        .get("/videos/project/5f0c6a1e-8a53-4c55-9f5e-2f4a0b7f0e11")
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn playback_id_with_whitespace_is_rejected() {
    let f = fixture().await;

    let response = create_video(&f, "Spaced", "has space", false).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn updating_playback_id_to_itself_is_not_a_conflict() {
    let f = fixture().await;
    let video = created_video(&f, "Launch", "self-id").await;
    let path = format!("/videos/{}", video["id"].as_str().unwrap());

    let response = f
        .app
        .put_json(&f.token, &path, &json!({ "playbackId": "self-id", "title": "Launch v2" }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Launch v2");
    assert_eq!(body["data"]["playbackId"], "self-id");
}

#[actix_rt::test]
async fn updating_playback_id_onto_another_video_conflicts() {
    let f = fixture().await;
    created_video(&f, "First", "first-id").await;
    let second = created_video(&f, "Second", "second-id").await;

    let response = f
        .app
        .put_json(
            &f.token,
            &format!("/videos/{}", second["id"].as_str().unwrap()),
            &json!({ "playbackId": "first-id" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn update_and_delete_unknown_video_are_404() {
    let f = fixture().await;
    let path = "/videos/5f0c6a1e-8a53-4c55-9f5e-2f4a0b7f0e11";

    let update = f.app.put_json(&f.token, path, &json!({ "title": "Ghost" })).await;
    assert_eq!(update.status(), StatusCode::NOT_FOUND);

    let delete = f.app.delete(&f.token, path).await;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn delete_removes_the_video() {
    let f = fixture().await;
    let video = created_video(&f, "Short lived", "gone-id").await;
    let path = format!("/videos/{}", video["id"].as_str().unwrap());

    let response = f.app.delete(&f.token, &path).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(f.app.get(&path).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn featured_category_and_search_listings() {
    let f = fixture().await;
    f.app.create_category(&f.token, "Gaming").await;
    let other = f
        .app
        .create_simple_project(&f.token, "Arcade", &["Gaming"], false)
        .await;

    assert_eq!(create_video(&f, "Keynote", "keynote-1", true).await.status(), StatusCode::CREATED);
    created_video(&f, "Tutorial", "tutorial-1").await;
    let response = f
        .app
        .post_json(
            &f.token,
            "/videos",
            &json!({ "projectId": other["id"], "title": "Speedrun", "playbackId": "speedrun-1" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let featured: Value = f.app.get("/videos/featured").await.json().await.unwrap();
    assert_eq!(featured["data"].as_array().unwrap().len(), 1);
    assert_eq!(featured["data"][0]["title"], "Keynote");

    let gaming: Value = f.app.get("/videos/category/Gaming").await.json().await.unwrap();
    assert_eq!(gaming["data"].as_array().unwrap().len(), 1);
    assert_eq!(gaming["data"][0]["projectName"], "Arcade");

    // Project name is part of the searchable text.
    let by_project: Value = f.app.get("/videos/search?q=arcade").await.json().await.unwrap();
    assert_eq!(by_project["data"].as_array().unwrap().len(), 1);

    let by_title: Value = f.app.get("/videos?search=TUTORIAL").await.json().await.unwrap();
    assert_eq!(by_title["pagination"]["total"], 1);

    let sorted: Value = f
        .app
        .get("/videos?sortBy=title&sortOrder=asc&limit=2")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(sorted["data"][0]["title"], "Keynote");
    assert_eq!(sorted["data"][1]["title"], "Speedrun");
    assert_eq!(sorted["pagination"]["totalPages"], 2);

    let blank = f.app.get("/videos/search?q=%20").await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}
