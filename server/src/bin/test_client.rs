//! Scripted client for smoke testing a running server.
//!
//! Joins under the given name, sends random moves at a fixed interval and
//! logs every message the server pushes back.

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use rand::seq::SliceRandom;
use shared::{ClientMessage, Direction, ServerMessage};
use tokio::time::{interval, Duration};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scripted treasure hunt client")]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:4520")]
    server: String,
    /// Player name to join with
    #[arg(short, long, default_value = "bot")]
    name: String,
    /// Number of moves before disconnecting
    #[arg(short, long, default_value = "20")]
    moves: u32,
    /// Delay between moves in milliseconds
    #[arg(short, long, default_value = "250")]
    delay: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();
    let args = Args::parse();

    let url = format!("ws://{}", args.server);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    info!("Connected to {}", url);
    let (mut sender, mut receiver) = ws_stream.split();

    let join = serde_json::to_string(&ClientMessage::join(args.name.as_str()))?;
    sender.send(Message::Text(join)).await?;

    let mut ticker = interval(Duration::from_millis(args.delay));
    let mut remaining = args.moves;

    while remaining > 0 {
        tokio::select! {
            _ = ticker.tick() => {
                let direction = *Direction::ALL
                    .choose(&mut rand::thread_rng())
                    .unwrap_or(&Direction::Up);
                let message = ClientMessage::movement(args.name.as_str(), direction);
                sender.send(Message::Text(serde_json::to_string(&message)?)).await?;
                remaining -= 1;
            }
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => report(&args.name, &text),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => {
                    warn!("Server closed the connection");
                    return Ok(());
                }
            },
        }
    }

    sender.send(Message::Close(None)).await?;
    info!("Finished after {} moves", args.moves);
    Ok(())
}

fn report(name: &str, text: &str) {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(ServerMessage::State { players, treasures }) => {
            let own = players
                .get(name)
                .map(|p| format!("({}, {}) score {}", p.x, p.y, p.score))
                .unwrap_or_else(|| "not joined".to_string());
            println!(
                "{} players, treasures {:?}, {} at {}",
                players.len(),
                treasures,
                name,
                own
            );
        }
        Ok(ServerMessage::Error { message }) => warn!("Server error: {}", message),
        Err(e) => warn!("Undecodable frame: {}", e),
    }
}
