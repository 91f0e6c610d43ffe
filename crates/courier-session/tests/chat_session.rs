//! ChatSession wired to a real dispatcher, with events injected directly
//! instead of through a socket.

use std::time::Duration;

use courier_api::ApiClient;
use courier_common::models::{DeliveryStatus, Message, MessageContent, UserProfile};
use courier_common::SessionHandle;
use courier_realtime::{EventKind, RealtimeClient, RealtimeConfig, ServerEvent};
use courier_session::{ChatSession, ChatTuning, MessageTimeline};

fn test_session() -> SessionHandle {
    let session = SessionHandle::new();
    session.authenticate(
        UserProfile {
            id: "u1".into(),
            email: None,
            tel: None,
            name: None,
            bio: None,
            username: None,
            avatar: None,
            status: None,
        },
        "tok".into(),
    );
    session
}

fn offline_client(session: &SessionHandle) -> (ApiClient, RealtimeClient) {
    // Nothing listens on this port; the socket is never opened.
    let base_url = "http://127.0.0.1:19".to_string();
    let api = ApiClient::new(base_url.clone(), session.clone());
    let realtime = RealtimeClient::new(
        RealtimeConfig { base_url, ..Default::default() },
        session.clone(),
    );
    (api, realtime)
}

fn chat(session: &SessionHandle, realtime: &RealtimeClient, api: &ApiClient) -> ChatSession {
    let timeline = MessageTimeline::new("conv1", "u1");
    ChatSession::resume(api.clone(), realtime.clone(), session, timeline, ChatTuning::default())
        .unwrap()
}

fn server_message(id: &str, conversation_id: &str, sender_id: &str, text: &str) -> Message {
    Message {
        id: id.into(),
        conversation_id: conversation_id.into(),
        content: MessageContent::text(text),
        reaction: vec![],
        sender_id: sender_id.into(),
        created_at: "2024-05-01T12:00:00Z".parse().unwrap(),
        updated_at: None,
        sender_name: None,
        sender_avatar: None,
    }
}

#[tokio::test]
async fn send_while_disconnected_keeps_the_placeholder() {
    let session = test_session();
    let (api, realtime) = offline_client(&session);
    let chat = chat(&session, &realtime, &api);

    // No socket is open; the frame is dropped but nothing breaks.
    let temp_id = chat.send_message("hi").await;

    let entries = chat.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message.id, temp_id);
    assert_eq!(entries[0].status, DeliveryStatus::Sending);
}

#[tokio::test]
async fn inbound_events_flow_into_the_timeline() {
    let session = test_session();
    let (api, realtime) = offline_client(&session);
    let chat = chat(&session, &realtime, &api);

    let temp_id = chat.send_message("hi").await;
    realtime.dispatcher().dispatch(&ServerEvent::Ack {
        temp_id: temp_id.clone(),
        message: server_message("m1", "conv1", "u1", "hi"),
    });
    realtime
        .dispatcher()
        .dispatch(&ServerEvent::NewMessage { message: server_message("m2", "conv1", "u2", "yo") });
    // An echo of the acked message must not appear twice.
    realtime
        .dispatcher()
        .dispatch(&ServerEvent::NewMessage { message: server_message("m1", "conv1", "u1", "hi") });

    let entries = chat.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].message.id, "m1");
    assert_eq!(entries[0].status, DeliveryStatus::Sent);
    assert_eq!(entries[1].message.id, "m2");
    assert!(!entries[1].mine);
}

#[tokio::test]
async fn read_receipt_from_the_peer_flips_own_messages() {
    let session = test_session();
    let (api, realtime) = offline_client(&session);
    let chat = chat(&session, &realtime, &api);

    let temp_id = chat.send_message("hi").await;
    realtime.dispatcher().dispatch(&ServerEvent::Ack {
        temp_id,
        message: server_message("m1", "conv1", "u1", "hi"),
    });

    // Our own receipt (another device) is ignored.
    realtime.dispatcher().dispatch(&ServerEvent::Read {
        conversation_id: "conv1".into(),
        reader_id: "u1".into(),
    });
    assert_eq!(chat.entries()[0].status, DeliveryStatus::Sent);

    realtime.dispatcher().dispatch(&ServerEvent::Read {
        conversation_id: "conv1".into(),
        reader_id: "u2".into(),
    });
    assert_eq!(chat.entries()[0].status, DeliveryStatus::Read);
}

#[tokio::test]
async fn edits_and_deletes_apply_via_broadcast() {
    let session = test_session();
    let (api, realtime) = offline_client(&session);
    let chat = chat(&session, &realtime, &api);

    realtime
        .dispatcher()
        .dispatch(&ServerEvent::NewMessage { message: server_message("m1", "conv1", "u1", "helo") });

    // Offline, the requests are dropped; only broadcasts mutate state.
    chat.edit_message("m1", "hello", "u2");
    chat.delete_message("m1", "u2");
    assert_eq!(chat.entries()[0].message.content.content, "helo");

    realtime.dispatcher().dispatch(&ServerEvent::MessageUpdated {
        message: server_message("m1", "conv1", "u1", "hello"),
    });
    assert_eq!(chat.entries()[0].message.content.content, "hello");

    realtime
        .dispatcher()
        .dispatch(&ServerEvent::MessageDeleted { message_id: "m1".into() });
    assert!(chat.entries().is_empty());
}

#[tokio::test]
async fn typing_event_sets_the_peer_indicator() {
    let session = test_session();
    let (api, realtime) = offline_client(&session);
    let chat = chat(&session, &realtime, &api);

    assert!(!chat.peer_typing());
    realtime
        .dispatcher()
        .dispatch(&ServerEvent::UserTyping { conversation_id: "conv1".into() });
    assert!(chat.peer_typing());

    // A typing event for another conversation changes nothing here.
    realtime
        .dispatcher()
        .dispatch(&ServerEvent::UserTyping { conversation_id: "conv9".into() });
    assert!(chat.peer_typing());
}

#[tokio::test]
async fn dropping_the_session_releases_its_subscriptions() {
    let session = test_session();
    let (api, realtime) = offline_client(&session);

    let chat = chat(&session, &realtime, &api);
    assert_eq!(realtime.dispatcher().subscriber_count(EventKind::NewMessage), 1);
    assert_eq!(realtime.dispatcher().subscriber_count(EventKind::Ack), 1);

    drop(chat);
    assert_eq!(realtime.dispatcher().subscriber_count(EventKind::NewMessage), 0);
    assert_eq!(realtime.dispatcher().subscriber_count(EventKind::Ack), 0);
    assert_eq!(realtime.dispatcher().subscriber_count(EventKind::UserTyping), 0);
}

#[tokio::test]
async fn failed_draft_creation_marks_the_placeholder_failed() {
    let session = test_session();
    let (api, realtime) = offline_client(&session);
    let chat =
        ChatSession::draft(api, realtime, &session, "u2", ChatTuning::default()).unwrap();

    // The REST call cannot reach a server, so creation fails.
    let temp_id = tokio::time::timeout(Duration::from_secs(15), chat.send_message("hi"))
        .await
        .expect("draft send did not finish");

    let entries = chat.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message.id, temp_id);
    assert_eq!(entries[0].status, DeliveryStatus::Failed);
    assert_eq!(chat.conversation_id(), None);
}
