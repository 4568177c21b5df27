// ============================================================================
// REST API Message Tests
// ============================================================================
//
// - Send / list / recent / search / count over HTTP
// - Authentication (401) and membership (403) enforcement
// - Author-only soft delete
//
// ============================================================================

use serde_json::{json, Value};
use serial_test::serial;
use uuid::Uuid;

use test_utils::spawn_app;

async fn post_message(
    client: &reqwest::Client,
    url: &str,
    token: &str,
    content: &str,
) -> reqwest::Response {
    client
        .post(url)
        .bearer_auth(token)
        .json(&json!({ "content": content }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn test_member_send_then_list() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (project_id, _, members) = app.seed_project("Owner", &["Member"]).await;
    let token = app.token_for(members[0]);

    let response = post_message(&client, &app.messages_url(project_id), &token, "Hello").await;
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["content"], "Hello");
    assert_eq!(created["senderName"], "Member");
    assert_eq!(created["messageType"], "text");

    let listed: Value = client
        .get(app.messages_url(project_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let messages = listed["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], created["id"]);
    assert_eq!(messages[0]["content"], "Hello");
    assert_eq!(messages[0]["senderId"], members[0].to_string());
    assert_eq!(listed["limit"], 50);
    assert_eq!(listed["offset"], 0);
}

#[tokio::test]
#[serial]
async fn test_oversized_message_is_rejected_and_not_persisted() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (project_id, owner, _) = app.seed_project("Owner", &[]).await;
    let token = app.token_for(owner);

    let response = post_message(
        &client,
        &app.messages_url(project_id),
        &token,
        &"a".repeat(2001),
    )
    .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error_code"], "VALIDATION_ERROR");

    let response = post_message(&client, &app.messages_url(project_id), &token, "   ").await;
    assert_eq!(response.status().as_u16(), 400);

    let count: Value = client
        .get(format!("{}/count", app.messages_url(project_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["count"], 0);
}

#[tokio::test]
#[serial]
async fn test_missing_or_bad_token_is_401() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (project_id, _, _) = app.seed_project("Owner", &[]).await;

    let response = client.get(app.messages_url(project_id)).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(app.messages_url(project_id))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error_code"], "AUTH_ERROR");
}

#[tokio::test]
#[serial]
async fn test_non_member_is_forbidden() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (project_id, owner, _) = app.seed_project("Owner", &[]).await;
    let outsider = app.directory.add_user("Outsider").await;

    post_message(
        &client,
        &app.messages_url(project_id),
        &app.token_for(owner),
        "private",
    )
    .await;

    let token = app.token_for(outsider);
    let response = client
        .get(app.messages_url(project_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = post_message(&client, &app.messages_url(project_id), &token, "hi").await;
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .get(format!("{}/search?q=private", app.messages_url(project_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
#[serial]
async fn test_only_author_can_delete() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (project_id, owner, members) = app.seed_project("Owner", &["Member"]).await;
    let member_token = app.token_for(members[0]);
    let owner_token = app.token_for(owner);

    let created: Value = post_message(&client, &app.messages_url(project_id), &member_token, "mine")
        .await
        .json()
        .await
        .unwrap();
    let message_url = format!(
        "{}/{}",
        app.messages_url(project_id),
        created["id"].as_str().unwrap()
    );

    // Project owner is not the author
    let response = client
        .delete(&message_url)
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let listed: Value = client
        .get(app.messages_url(project_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["messages"].as_array().unwrap().len(), 1);

    let response = client
        .delete(&message_url)
        .bearer_auth(&member_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["messageId"], created["id"]);

    let listed: Value = client
        .get(app.messages_url(project_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_delete_unknown_message_is_404() {
    let app = spawn_app().await;
    let (project_id, owner, _) = app.seed_project("Owner", &[]).await;

    let response = reqwest::Client::new()
        .delete(format!("{}/{}", app.messages_url(project_id), Uuid::new_v4()))
        .bearer_auth(app.token_for(owner))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[serial]
async fn test_recent_search_and_paging() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (project_id, owner, _) = app.seed_project("Owner", &[]).await;
    let token = app.token_for(owner);
    let url = app.messages_url(project_id);

    for content in ["Build green", "lunch?", "build red", "100% done"] {
        let response = post_message(&client, &url, &token, content).await;
        assert_eq!(response.status().as_u16(), 201);
    }

    let get = |path: String| {
        let client = client.clone();
        let token = token.clone();
        async move {
            client
                .get(path)
                .bearer_auth(token)
                .send()
                .await
                .unwrap()
                .json::<Value>()
                .await
                .unwrap()
        }
    };

    let contents = |body: &Value| -> Vec<String> {
        body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap().to_string())
            .collect()
    };

    let recent = get(format!("{}/recent?limit=2", url)).await;
    assert_eq!(contents(&recent), vec!["100% done", "build red"]);

    let page = get(format!("{}?limit=2&offset=1", url)).await;
    assert_eq!(contents(&page), vec!["lunch?", "build red"]);

    let hits = get(format!("{}/search?q=BUILD", url)).await;
    assert_eq!(contents(&hits), vec!["build red", "Build green"]);

    // `%` is matched literally
    let hits = get(format!("{}/search?q=%25", url)).await;
    assert_eq!(contents(&hits), vec!["100% done"]);

    let response = client
        .get(format!("{}/search?q=", url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[serial]
async fn test_owner_announcement_is_a_system_message() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (project_id, owner, members) = app.seed_project("Owner", &["Member"]).await;
    let url = format!("{}/announcements", app.messages_url(project_id));

    let response = post_message(&client, &url, &app.token_for(members[0]), "not mine").await;
    assert_eq!(response.status().as_u16(), 403);

    let response = post_message(&client, &url, &app.token_for(owner), "Retro at 3pm").await;
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["messageType"], "system");

    let listed: Value = client
        .get(app.messages_url(project_id))
        .bearer_auth(app.token_for(members[0]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let messages = listed["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["messageType"], "system");
    assert_eq!(messages[0]["content"], "Retro at 3pm");
}

#[tokio::test]
#[serial]
async fn test_health_and_metrics() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", app.http_address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(format!("{}/metrics", app.http_address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}
