//! Integration tests for the treasure hunt server
//!
//! These tests run a real server on an ephemeral port and talk to it over
//! WebSocket connections, the same way browser clients do.

use futures_util::{SinkExt, StreamExt};
use server::config::Config;
use server::network::GameServer;
use shared::{ClientMessage, Direction, ServerMessage};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

async fn start_server() -> SocketAddr {
    let config = Config {
        port: 0,
        ..Config::default()
    };
    let server = GameServer::bind(config).await.expect("Failed to bind server");
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{}", addr))
        .await
        .expect("Failed to connect");
    client
}

async fn send(client: &mut Client, message: &ClientMessage) {
    let text = serde_json::to_string(message).unwrap();
    client.send(Message::Text(text)).await.unwrap();
}

async fn send_raw(client: &mut Client, text: &str) {
    client.send(Message::Text(text.to_string())).await.unwrap();
}

async fn next_message(client: &mut Client) -> ServerMessage {
    loop {
        let frame = timeout(RECEIVE_TIMEOUT, client.next())
            .await
            .expect("Timed out waiting for server message")
            .expect("Connection closed")
            .expect("WebSocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("Server sent invalid JSON");
        }
    }
}

async fn join(client: &mut Client, name: &str) -> ServerMessage {
    send(client, &ClientMessage::join(name)).await;
    next_message(client).await
}

/// CONNECTION LIFECYCLE TESTS
mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn join_broadcasts_state_with_treasure() {
        let addr = start_server().await;
        let mut alice = connect(addr).await;

        match join(&mut alice, "alice").await {
            ServerMessage::State { players, treasures } => {
                let player = &players["alice"];
                assert!(player.x < 10 && player.y < 10);
                assert_eq!(player.score, 0);
                assert_eq!(treasures.len(), 1);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_privately() {
        let addr = start_server().await;
        let mut alice = connect(addr).await;
        join(&mut alice, "alice").await;

        let mut impostor = connect(addr).await;
        let reply = join(&mut impostor, "alice").await;
        assert_eq!(
            reply,
            ServerMessage::Error {
                message: "Name 'alice' is already taken".to_string()
            }
        );

        // The impostor's connection stays usable
        match join(&mut impostor, "bob").await {
            ServerMessage::State { players, .. } => {
                assert_eq!(players.len(), 2);
                assert!(players.contains_key("bob"));
            }
            other => panic!("Unexpected message: {:?}", other),
        }

        // Alice only ever saw successful joins
        match next_message(&mut alice).await {
            ServerMessage::State { players, .. } => assert_eq!(players.len(), 2),
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn disconnect_removes_player_and_frees_name() {
        let addr = start_server().await;
        let mut alice = connect(addr).await;
        join(&mut alice, "alice").await;
        let mut bob = connect(addr).await;
        join(&mut bob, "bob").await;

        alice.close(None).await.unwrap();

        match next_message(&mut bob).await {
            ServerMessage::State { players, treasures } => {
                assert_eq!(players.len(), 1);
                assert!(players.contains_key("bob"));
                assert_eq!(treasures.len(), 1);
            }
            other => panic!("Unexpected message: {:?}", other),
        }

        let mut returning = connect(addr).await;
        match join(&mut returning, "alice").await {
            ServerMessage::State { players, .. } => {
                assert_eq!(players.len(), 2);
                assert_eq!(players["alice"].score, 0);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn closing_without_joining_is_silent() {
        let addr = start_server().await;
        let mut alice = connect(addr).await;
        join(&mut alice, "alice").await;

        let mut lurker = connect(addr).await;
        lurker.close(None).await.unwrap();

        // The next broadcast alice sees is the one for her own move
        send(&mut alice, &ClientMessage::movement("alice", Direction::Up)).await;
        match next_message(&mut alice).await {
            ServerMessage::State { players, .. } => assert_eq!(players.len(), 1),
            other => panic!("Unexpected message: {:?}", other),
        }
    }
}

/// MESSAGE HANDLING TESTS
mod message_tests {
    use super::*;

    #[tokio::test]
    async fn invalid_frames_are_ignored() {
        let addr = start_server().await;
        let mut client = connect(addr).await;

        send_raw(&mut client, "definitely not json").await;
        send_raw(&mut client, r#"{"type":"dance","playerName":"alice"}"#).await;
        send_raw(&mut client, r#"{"type":"join"}"#).await;

        // Nothing was answered, the first reply belongs to the valid join
        match join(&mut client, "alice").await {
            ServerMessage::State { players, .. } => assert_eq!(players.len(), 1),
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn move_is_broadcast_to_everyone() {
        let addr = start_server().await;
        let mut alice = connect(addr).await;
        let start = match join(&mut alice, "alice").await {
            ServerMessage::State { players, .. } => players["alice"].clone(),
            other => panic!("Unexpected message: {:?}", other),
        };

        let mut bob = connect(addr).await;
        join(&mut bob, "bob").await;
        next_message(&mut alice).await;

        let direction = if start.y > 0 { Direction::Up } else { Direction::Down };
        send(&mut alice, &ClientMessage::movement("alice", direction)).await;

        for client in [&mut alice, &mut bob] {
            match next_message(client).await {
                ServerMessage::State { players, treasures } => {
                    let moved = &players["alice"];
                    assert_eq!(moved.x, start.x);
                    assert_eq!((moved.y as i64 - start.y as i64).abs(), 1);
                    assert_eq!(treasures.len(), 1);
                }
                other => panic!("Unexpected message: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn move_for_unknown_player_still_broadcasts() {
        let addr = start_server().await;
        let mut client = connect(addr).await;

        send(&mut client, &ClientMessage::movement("nobody", Direction::Left)).await;

        match next_message(&mut client).await {
            ServerMessage::State { players, treasures } => {
                assert!(players.is_empty());
                assert_eq!(treasures.len(), 1);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn walking_the_board_keeps_one_treasure() {
        let addr = start_server().await;
        let mut client = connect(addr).await;
        join(&mut client, "walker").await;

        let mut total_score = 0;
        for step in 0..60 {
            let direction = Direction::ALL[(step / 5) % 4];
            send(&mut client, &ClientMessage::movement("walker", direction)).await;
            match next_message(&mut client).await {
                ServerMessage::State { players, treasures } => {
                    let walker = &players["walker"];
                    assert!(walker.x < 10 && walker.y < 10);
                    assert!(walker.score >= total_score);
                    total_score = walker.score;
                    assert_eq!(treasures.len(), 1);
                    assert!(treasures[0].x < 10 && treasures[0].y < 10);
                }
                other => panic!("Unexpected message: {:?}", other),
            }
        }
    }
}
