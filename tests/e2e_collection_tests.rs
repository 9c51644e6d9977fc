//! End-to-end tests for the collection cache HTTP API.

mod common;

use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use common::{collection_body, release_json, TestServer};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn old_date(day: u32) -> String {
    format!("2020-01-{:02}T12:00:00-08:00", day)
}

async fn preload_and_wait(server: &TestServer) -> Value {
    let response = server.post("/v1/collection/alice/preload").await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json: Value = response.json().await.unwrap();
    let job_id = json["data"]["jobId"].as_str().unwrap().to_string();
    server.wait_for_job(&job_id).await
}

#[tokio::test]
async fn test_preload_then_serve_from_cache() {
    let server = TestServer::spawn().await;
    let page1 = server
        .discogs
        .mock_page(
            1,
            50,
            collection_body(
                1,
                2,
                50,
                3,
                vec![
                    release_json(1, &old_date(3), "Mezzanine", "Massive Attack"),
                    release_json(2, &old_date(2), "Dummy", "Portishead (2)"),
                ],
            ),
        )
        .await;
    let page2 = server
        .discogs
        .mock_page(
            2,
            50,
            collection_body(
                2,
                2,
                50,
                3,
                vec![release_json(3, &old_date(1), "Endtroducing", "DJ Shadow")],
            ),
        )
        .await;

    let job = preload_and_wait(&server).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["kind"], "preload");
    assert_eq!(page1.hits_async().await, 1);
    assert_eq!(page2.hits_async().await, 1);
    assert!(server.collections_dir().join("alice-page-1.json").exists());
    assert!(server.collections_dir().join("alice-page-2.json").exists());
    assert!(server.collections_dir().join("alice-progress.json").exists());

    // Fresh pages are served without contacting the remote.
    let json = server.get_json("/v1/collection/alice/page/1").await;
    assert_eq!(json["success"], true);
    assert_eq!(page1.hits_async().await, 1);

    let item = &json["data"]["data"][1];
    assert_eq!(item["id"], 2);
    assert_eq!(item["dateAdded"], old_date(2));
    assert_eq!(item["rating"], Value::Null);
    assert_eq!(item["release"]["artist"], "Portishead");
    assert_eq!(item["release"]["catalogNumber"], "CAT-2");
    assert_eq!(item["release"]["coverImage"], "https://img.example/2.jpg");
    assert_eq!(item["release"]["formats"], json!(["Vinyl"]));

    let json = server.get_json("/v1/collection/alice/all").await;
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 3);
    assert_eq!(json["data"]["needsRefresh"], false);

    let json = server.get_json("/v1/collection/alice/search?q=shadow").await;
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["items"][0]["release"]["title"], "Endtroducing");

    let json = server.get_json("/v1/collection/alice/progress").await;
    assert_eq!(json["data"]["status"], "completed");
    assert_eq!(json["data"]["totalPages"], 2);

    // A second preload is skipped while the first is warm.
    let job = preload_and_wait(&server).await;
    assert_eq!(job["message"], "Cache is still warm");
    assert_eq!(page1.hits_async().await, 1);
}

#[tokio::test]
async fn test_incremental_update_merges_new_items() {
    let server = TestServer::spawn().await;
    let mut preload_page = server
        .discogs
        .mock_page(
            1,
            50,
            collection_body(
                1,
                1,
                50,
                2,
                vec![
                    release_json(1, &old_date(2), "Mezzanine", "Massive Attack"),
                    release_json(2, &old_date(1), "Dummy", "Portishead"),
                ],
            ),
        )
        .await;
    preload_and_wait(&server).await;
    preload_page.delete_async().await;

    let added = (Utc::now() + ChronoDuration::hours(1)).to_rfc3339_opts(SecondsFormat::Secs, false);
    let new_release = release_json(9, &added, "Blue Lines", "Massive Attack");
    server
        .discogs
        .mock_newest_first(1, 1, collection_body(1, 3, 1, 3, vec![new_release.clone()]))
        .await;
    let scan = server
        .discogs
        .mock_newest_first(
            1,
            50,
            collection_body(
                1,
                1,
                50,
                3,
                vec![
                    new_release,
                    release_json(1, &old_date(2), "Mezzanine", "Massive Attack"),
                    release_json(2, &old_date(1), "Dummy", "Portishead"),
                ],
            ),
        )
        .await;

    let json = server.get_json("/v1/collection/alice/new-items").await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["newItemsCount"], 1);
    assert_eq!(json["data"]["pagesScanned"], 1);
    assert_eq!(json["data"]["latestDiscogsDate"], added);

    let response = server.post("/v1/collection/alice/update").await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: Value = response.json().await.unwrap();
    let job = server
        .wait_for_job(body["data"]["jobId"].as_str().unwrap())
        .await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["kind"], "update");
    assert_eq!(scan.hits_async().await, 2);

    let json = server.get_json("/v1/collection/alice/page/1").await;
    let ids: Vec<u64> = json["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![9, 1, 2]);
    assert_eq!(json["data"]["pagination"]["items"], 3);
    assert!(server
        .collections_dir()
        .join("alice-page-1.json.bak")
        .exists());
}

#[tokio::test]
async fn test_new_items_without_cache_is_not_found() {
    let server = TestServer::spawn().await;

    let response = server.get("/v1/collection/alice/new-items").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json, json!({"success": false, "error": "No cached data found"}));
}

#[tokio::test]
async fn test_stale_search_answers_and_refreshes_in_background() {
    let server = TestServer::spawn().await;
    std::fs::create_dir_all(server.collections_dir()).unwrap();
    let stale_timestamp = Utc::now().timestamp_millis() - 48 * 60 * 60 * 1000;
    let stale_page = json!({
        "success": true,
        "data": [{
            "id": 5,
            "dateAdded": old_date(5),
            "release": {"id": 6, "title": "Protection", "artist": "Massive Attack"}
        }],
        "pagination": {"page": 1, "pages": 1, "per_page": 50, "items": 1},
        "timestamp": stale_timestamp
    });
    std::fs::write(
        server.collections_dir().join("alice-page-1.json"),
        serde_json::to_vec(&stale_page).unwrap(),
    )
    .unwrap();
    let refresh = server
        .discogs
        .mock_page(
            1,
            50,
            collection_body(
                1,
                1,
                50,
                1,
                vec![release_json(5, &old_date(5), "Protection", "Massive Attack")],
            ),
        )
        .await;

    let json = server.get_json("/v1/collection/alice/search?q=protection").await;
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["needsRefresh"], true);

    let jobs = server.get_json("/v1/jobs").await;
    let job_id = jobs["data"][0]["id"].as_str().unwrap().to_string();
    let job = server.wait_for_job(&job_id).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(refresh.hits_async().await, 1);

    let json = server.get_json("/v1/collection/alice/all").await;
    assert_eq!(json["data"]["needsRefresh"], false);
}

#[tokio::test]
async fn test_clear_cache_keeps_progress() {
    let server = TestServer::spawn().await;
    server
        .discogs
        .mock_page(
            1,
            50,
            collection_body(
                1,
                1,
                50,
                1,
                vec![release_json(1, &old_date(1), "Mezzanine", "Massive Attack")],
            ),
        )
        .await;
    preload_and_wait(&server).await;

    let response = server.delete("/v1/collection/alice/cache").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"]["pagesDeleted"], 1);
    assert!(!server.collections_dir().join("alice-page-1.json").exists());
    assert!(server.collections_dir().join("alice-progress.json").exists());
}

#[tokio::test]
async fn test_invalid_subject_is_rejected() {
    let server = TestServer::spawn().await;

    let response = server.post("/v1/collection/bad%20subject/preload").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
