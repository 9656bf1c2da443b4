//! Minesweeper Client Library
//!
//! An async client for the minesweeper multiplayer server's line protocol.
//!
//! ```rust,no_run
//! use minesweeper_client::{MinesweeperClient, Response};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut client = MinesweeperClient::connect("localhost:4444").await?;
//!     println!("{} players online", client.welcome().players);
//!
//!     client.flag(1, 1).await?;
//!     match client.dig(0, 0).await? {
//!         Response::Boom => println!("BOOM!"),
//!         Response::Board(view) => print!("{view}"),
//!         Response::Help(text) => print!("{text}"),
//!     }
//!
//!     client.bye().await?;
//!     Ok(())
//! }
//! ```

mod client;

pub use client::{MinesweeperClient, Response};

// Re-export common types for convenience
pub use minesweeper_common::{models::*, protocol::*};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
