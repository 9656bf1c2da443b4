//! Plays interactively: each line typed on stdin is sent as-is.

use minesweeper_client::{MinesweeperClient, Response};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "localhost:4444".to_string());
    let mut client = MinesweeperClient::connect(addr.as_str()).await?;
    println!("🎮 {}", client.welcome());

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = input.next_line().await? {
        if line.trim() == "bye" {
            break;
        }

        match client.send_raw(&line).await? {
            Response::Board(view) => print!("{view}"),
            Response::Boom => println!("💣 BOOM!"),
            Response::Help(text) => print!("{text}"),
        }
    }

    client.bye().await?;
    println!("👋 Bye");
    Ok(())
}
