// ============================================================================
// Chat Gateway Tests
// ============================================================================
//
// - Handshake authentication (header, query, rejection)
// - Room join / leave acknowledgements
// - Fan-out of new_message and message_deleted to project rooms
// - Room isolation
//
// ============================================================================

use project_chat::message::{ClientMessage, ServerMessage};
use project_chat::models::RoomId;
use std::time::Duration;
use serial_test::serial;
use tokio_tungstenite::tungstenite::Error as WsError;
use uuid::Uuid;

use test_utils::{spawn_app, spawn_app_with, test_config, TestClient};

#[tokio::test]
#[serial]
async fn test_unauthenticated_connect_is_rejected_with_401() {
    let app = spawn_app().await;

    let url = format!("ws://{}/", app.ws_address);
    let result = tokio_tungstenite::connect_async(url).await;

    match result {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 401),
        other => panic!("Expected HTTP 401 rejection, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
#[serial]
async fn test_invalid_token_is_rejected() {
    let app = spawn_app().await;

    let result = TestClient::connect_with_header(&app.ws_address, "not-a-jwt").await;
    assert!(result.is_err());

    let result = TestClient::connect_with_query(&app.ws_address, "not-a-jwt").await;
    assert!(result.is_err());
}

#[tokio::test]
#[serial]
async fn test_query_token_is_accepted() {
    let app = spawn_app().await;
    let (project_id, owner, _) = app.seed_project("Owner", &[]).await;

    let mut client = TestClient::connect_with_query(&app.ws_address, &app.token_for(owner))
        .await
        .expect("Query-token connect failed");
    client.join(project_id).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_two_connections_receive_rest_message() {
    let app = spawn_app().await;
    let (project_id, owner, members) = app.seed_project("Owner", &["Member"]).await;
    let member = members[0];

    let mut owner_ws = app.connect(owner).await;
    let mut member_ws = app.connect(member).await;
    owner_ws.join(project_id).await.unwrap();
    member_ws.join(project_id).await.unwrap();

    let response = reqwest::Client::new()
        .post(app.messages_url(project_id))
        .bearer_auth(app.token_for(member))
        .json(&serde_json::json!({ "content": "Hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    for ws in [&mut owner_ws, &mut member_ws] {
        match ws.recv_within(2000).await {
            Some(ServerMessage::NewMessage(view)) => {
                assert_eq!(view.content, "Hello");
                assert_eq!(view.sender_id, member);
                assert_eq!(view.sender_name, "Member");
                assert_eq!(view.project_id, project_id);
            }
            other => panic!("Expected new_message, got {:?}", other),
        }
    }
}

#[tokio::test]
#[serial]
async fn test_other_rooms_receive_nothing() {
    let app = spawn_app().await;
    let (project_a, owner_a, _) = app.seed_project("Alice", &[]).await;
    let (project_b, owner_b, _) = app.seed_project("Bob", &[]).await;

    let mut alice = app.connect(owner_a).await;
    let mut bob = app.connect(owner_b).await;
    alice.join(project_a).await.unwrap();
    bob.join(project_b).await.unwrap();

    alice
        .send(&ClientMessage::SendMessage {
            project_id: project_a,
            content: "only for A".to_string(),
        })
        .await
        .unwrap();

    assert!(matches!(
        alice.recv_within(2000).await,
        Some(ServerMessage::NewMessage(_))
    ));
    assert_eq!(bob.recv_within(300).await, None);
}

#[tokio::test]
#[serial]
async fn test_send_message_command_persists_and_broadcasts() {
    let app = spawn_app().await;
    let (project_id, owner, _) = app.seed_project("Owner", &[]).await;

    let mut ws = app.connect(owner).await;
    ws.join(project_id).await.unwrap();

    ws.send(&ClientMessage::SendMessage {
        project_id,
        content: "  via socket  ".to_string(),
    })
    .await
    .unwrap();

    match ws.recv_within(2000).await {
        Some(ServerMessage::NewMessage(view)) => assert_eq!(view.content, "via socket"),
        other => panic!("Expected new_message, got {:?}", other),
    }

    let count: serde_json::Value = reqwest::Client::new()
        .get(format!("{}/count", app.messages_url(project_id)))
        .bearer_auth(app.token_for(owner))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["count"], 1);
}

#[tokio::test]
#[serial]
async fn test_send_message_command_errors_stay_on_connection() {
    let app = spawn_app().await;
    let (project_id, owner, _) = app.seed_project("Owner", &[]).await;
    let (foreign_project, _, _) = app.seed_project("Stranger", &[]).await;

    let mut ws = app.connect(owner).await;

    ws.send(&ClientMessage::SendMessage {
        project_id: foreign_project,
        content: "intrusion".to_string(),
    })
    .await
    .unwrap();
    assert!(matches!(
        ws.recv_within(2000).await,
        Some(ServerMessage::Error { .. })
    ));

    ws.send(&ClientMessage::SendMessage {
        project_id,
        content: "x".repeat(2001),
    })
    .await
    .unwrap();
    assert!(matches!(
        ws.recv_within(2000).await,
        Some(ServerMessage::Error { .. })
    ));

    // Connection is still usable
    ws.join(project_id).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_malformed_frame_gets_error_reply() {
    let app = spawn_app().await;
    let (_, owner, _) = app.seed_project("Owner", &[]).await;
    let mut ws = app.connect(owner).await;

    use futures_util::SinkExt;
    ws.ws
        .send(tokio_tungstenite::tungstenite::Message::Text(
            "{\"type\":\"dance\"}".to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(
        ws.recv_within(2000).await,
        Some(ServerMessage::error("Invalid message format"))
    );
}

#[tokio::test]
#[serial]
async fn test_leave_stops_delivery_and_is_always_acknowledged() {
    let app = spawn_app().await;
    let (project_id, owner, members) = app.seed_project("Owner", &["Member"]).await;

    let mut listener = app.connect(owner).await;
    let mut sender = app.connect(members[0]).await;
    listener.join(project_id).await.unwrap();
    sender.join(project_id).await.unwrap();

    // Leaving a room we are not in is a no-op but still acked
    let unrelated = Uuid::new_v4();
    listener
        .send(&ClientMessage::LeaveProject { project_id: unrelated })
        .await
        .unwrap();
    assert_eq!(
        listener.recv_within(2000).await,
        Some(ServerMessage::LeftProject { project_id: unrelated })
    );

    listener
        .send(&ClientMessage::LeaveProject { project_id })
        .await
        .unwrap();
    assert_eq!(
        listener.recv_within(2000).await,
        Some(ServerMessage::LeftProject { project_id })
    );

    sender
        .send(&ClientMessage::SendMessage {
            project_id,
            content: "anyone left?".to_string(),
        })
        .await
        .unwrap();
    assert!(matches!(
        sender.recv_within(2000).await,
        Some(ServerMessage::NewMessage(_))
    ));
    assert_eq!(listener.recv_within(300).await, None);
}

#[tokio::test]
#[serial]
async fn test_joining_new_room_leaves_previous() {
    let app = spawn_app().await;
    let (project_a, owner, _) = app.seed_project("Owner", &[]).await;
    let project_b = app.directory.add_project(owner, vec![]).await;

    let mut ws = app.connect(owner).await;
    ws.join(project_a).await.unwrap();
    ws.join(project_b).await.unwrap();

    app.context
        .messages
        .send(owner, project_a, "to A")
        .await
        .unwrap();
    assert_eq!(ws.recv_within(300).await, None);

    app.context
        .messages
        .send(owner, project_b, "to B")
        .await
        .unwrap();
    assert!(matches!(
        ws.recv_within(2000).await,
        Some(ServerMessage::NewMessage(view)) if view.content == "to B"
    ));
}

#[tokio::test]
#[serial]
async fn test_delete_broadcasts_message_deleted() {
    let app = spawn_app().await;
    let (project_id, owner, _) = app.seed_project("Owner", &[]).await;

    let mut ws = app.connect(owner).await;
    ws.join(project_id).await.unwrap();

    let message = app
        .context
        .messages
        .send(owner, project_id, "short-lived")
        .await
        .unwrap();
    assert!(matches!(
        ws.recv_within(2000).await,
        Some(ServerMessage::NewMessage(_))
    ));

    let response = reqwest::Client::new()
        .delete(format!("{}/{}", app.messages_url(project_id), message.id))
        .bearer_auth(app.token_for(owner))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    assert_eq!(
        ws.recv_within(2000).await,
        Some(ServerMessage::MessageDeleted {
            message_id: message.id
        })
    );
}

#[tokio::test]
#[serial]
async fn test_strict_join_denies_non_members() {
    let mut config = test_config();
    config.strict_room_join = true;
    let app = spawn_app_with(config).await;

    let (project_id, _, _) = app.seed_project("Owner", &[]).await;
    let outsider = app.directory.add_user("Outsider").await;

    let mut ws = app.connect(outsider).await;
    ws.send(&ClientMessage::JoinProject { project_id })
        .await
        .unwrap();

    assert!(matches!(
        ws.recv_within(2000).await,
        Some(ServerMessage::Error { .. })
    ));
    assert_eq!(
        app.context
            .rooms
            .member_count(RoomId::for_project(project_id))
            .await,
        0
    );
}

#[tokio::test]
#[serial]
async fn test_closed_connection_leaves_its_room() {
    let app = spawn_app().await;
    let (project_id, owner, _) = app.seed_project("Owner", &[]).await;
    let room = RoomId::for_project(project_id);

    let mut ws = app.connect(owner).await;
    ws.join(project_id).await.unwrap();
    assert_eq!(app.context.rooms.member_count(room).await, 1);

    ws.ws.close(None).await.unwrap();

    let mut remaining = 1;
    for _ in 0..40 {
        remaining = app.context.rooms.member_count(room).await;
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(remaining, 0);

    assert_eq!(
        app.context
            .rooms
            .broadcast(room, ServerMessage::error("nobody home"))
            .await,
        0
    );

    // Persisting still works with nobody listening
    assert!(app
        .context
        .messages
        .send(owner, project_id, "into the void")
        .await
        .is_ok());
}
