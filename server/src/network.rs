//! WebSocket transport feeding the dispatcher

use crate::config::Config;
use crate::dispatcher::{Dispatcher, NetworkEvent};
use crate::session::ConnectionId;
use crate::world::World;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Accepts WebSocket connections and runs the dispatcher task.
///
/// Each connection gets a reader loop forwarding frames to the dispatcher and
/// a writer task draining its outbound queue. All game state lives in the one
/// dispatcher task, which processes events in arrival order.
pub struct GameServer {
    listener: TcpListener,
    config: Config,
}

impl GameServer {
    pub async fn bind(config: Config) -> Result<Self, BoxError> {
        let listener = TcpListener::bind(config.address()).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs until the dispatcher stops.
    pub async fn run(self) -> Result<(), BoxError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(World::new(self.config.grid_size));
        let mut dispatcher_handle = tokio::spawn(run_dispatcher(dispatcher, event_rx));

        let outbound_buffer = self.config.outbound_buffer as usize;
        let mut next_connection = 1;

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let connection = ConnectionId(next_connection);
                        next_connection += 1;
                        tokio::spawn(handle_connection(
                            stream,
                            addr,
                            connection,
                            event_tx.clone(),
                            outbound_buffer,
                        ));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                },
                result = &mut dispatcher_handle => {
                    return match result {
                        Ok(()) => Err("dispatcher stopped".into()),
                        Err(e) => Err(e.into()),
                    };
                }
            }
        }
    }
}

async fn run_dispatcher(
    mut dispatcher: Dispatcher,
    mut events: mpsc::UnboundedReceiver<NetworkEvent>,
) {
    while let Some(event) = events.recv().await {
        dispatcher.handle_event(event);
    }
    info!("Dispatcher shutting down");
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    connection: ConnectionId,
    events: mpsc::UnboundedSender<NetworkEvent>,
    outbound_buffer: usize,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    info!("Connection {} opened from {}", connection, addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (outbound, mut outbound_rx) = mpsc::channel::<String>(outbound_buffer);

    if events
        .send(NetworkEvent::Connected {
            connection,
            outbound,
        })
        .is_err()
    {
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = ws_sender.send(Message::Text(frame)).await {
                debug!("Failed to write to connection {}: {}", connection, e);
                break;
            }
        }
    });

    while let Some(frame) = ws_receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if events
                    .send(NetworkEvent::Message { connection, text })
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Read error on connection {}: {}", connection, e);
                break;
            }
        }
    }

    info!("Connection {} closed", connection);
    let _ = events.send(NetworkEvent::Disconnected { connection });
    writer.abort();
}
