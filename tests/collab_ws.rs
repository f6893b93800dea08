//! End-to-end tests: a real server, real WebSocket clients.

mod common;

use common::{start_test_server, test_state};
use doc_collab::models::{EditMessage, MessageKind};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(port: u16, doc_id: &str) -> Client {
    let url = format!("ws://127.0.0.1:{port}/v1/ws?docID={doc_id}");
    let (ws, _) = connect_async(url.as_str()).await.expect("Should connect to server");
    ws
}

async fn next_sync(ws: &mut Client) -> EditMessage {
    loop {
        let frame = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for sync")
            .expect("stream ended")
            .expect("transport error");
        if let Message::Text(text) = frame {
            let msg: EditMessage = serde_json::from_str(text.as_str()).unwrap();
            assert_eq!(msg.kind, MessageKind::Sync);
            return msg;
        }
    }
}

async fn send_update(ws: &mut Client, doc_id: &str, text: &str, user: &str) {
    let json = serde_json::to_string(&EditMessage::update(doc_id, text, user)).unwrap();
    ws.send(Message::Text(json.into())).await.unwrap();
}

#[tokio::test]
async fn two_clients_converge_on_last_write() {
    let port = start_test_server(test_state()).await;

    let mut a = connect(port, "doc1").await;
    let join = next_sync(&mut a).await;
    assert_eq!(join.text, "");
    assert_eq!(join.user_id, "server");
    assert_eq!(join.doc_id, "doc1");

    let mut b = connect(port, "doc1").await;
    assert_eq!(next_sync(&mut b).await.text, "");

    send_update(&mut a, "doc1", "hello", "A").await;
    for client in [&mut a, &mut b] {
        let sync = next_sync(client).await;
        assert_eq!(sync.text, "hello");
        assert_eq!(sync.user_id, "A");
        assert_eq!(sync.position, 0);
    }

    send_update(&mut b, "doc1", "hello world", "B").await;
    for client in [&mut a, &mut b] {
        let sync = next_sync(client).await;
        assert_eq!(sync.text, "hello world");
        assert_eq!(sync.user_id, "B");
    }
}

#[tokio::test]
async fn late_joiner_receives_latest_text() {
    let port = start_test_server(test_state()).await;

    let mut a = connect(port, "notes").await;
    next_sync(&mut a).await;
    send_update(&mut a, "notes", "draft 2", "A").await;
    next_sync(&mut a).await;

    let mut c = connect(port, "notes").await;
    let join = next_sync(&mut c).await;
    assert_eq!(join.text, "draft 2");
    assert_eq!(join.user_id, "server");
}

#[tokio::test]
async fn rooms_are_isolated() {
    let port = start_test_server(test_state()).await;

    let mut a = connect(port, "left").await;
    let mut b = connect(port, "right").await;
    next_sync(&mut a).await;
    next_sync(&mut b).await;

    send_update(&mut a, "left", "only left", "A").await;
    assert_eq!(next_sync(&mut a).await.text, "only left");

    let nothing = timeout(Duration::from_millis(200), b.next()).await;
    assert!(nothing.is_err(), "other room must not see the edit");
}

#[tokio::test]
async fn malformed_and_unknown_messages_keep_the_connection() {
    let port = start_test_server(test_state()).await;

    let mut a = connect(port, "doc1").await;
    next_sync(&mut a).await;

    a.send(Message::Text("garbage".into())).await.unwrap();
    a.send(Message::Text(r#"{"type":"cursor","docID":"doc1","text":"x"}"#.into()))
        .await
        .unwrap();
    send_update(&mut a, "doc1", "still here", "A").await;

    assert_eq!(next_sync(&mut a).await.text, "still here");
}

#[tokio::test]
async fn disconnect_removes_member_but_keeps_room() {
    let state = test_state();
    let port = start_test_server(state.clone()).await;

    let mut a = connect(port, "doc1").await;
    next_sync(&mut a).await;
    send_update(&mut a, "doc1", "persisted in room", "A").await;
    next_sync(&mut a).await;
    a.close(None).await.unwrap();

    let room = state.hub.get("doc1").expect("room should stay resident");
    timeout(Duration::from_secs(2), async {
        while room.inspect().await.unwrap().stats.members != 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("member was never removed");

    let snapshot = room.inspect().await.unwrap();
    assert_eq!(snapshot.text, "persisted in room");
    assert_eq!(state.hub.room_count(), 1);
}

#[tokio::test]
async fn missing_doc_id_is_rejected() {
    let port = start_test_server(test_state()).await;

    let url = format!("ws://127.0.0.1:{port}/v1/ws");
    match connect_async(url.as_str()).await {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 400),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("upgrade without docID should fail"),
    }
}
