//! Multiplayer minesweeper server.
//!
//! Every connected player shares one [`logic::Board`]. A [`server::GameServer`]
//! accepts TCP connections and runs a [`session::Session`] per player; each
//! session reads one command per line and writes back the rendered board.
//!
//! ```rust,no_run
//! use minesweeper_common::models::BoardSize;
//! use minesweeper_server::{logic::Board, server::GameServer};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let board = Board::random(BoardSize::new(12, 12)).expect("non-empty board");
//!     let server = GameServer::bind("127.0.0.1:4444".parse().unwrap(), board).await?;
//!     server.serve().await
//! }
//! ```

pub mod config;
pub mod data;
pub mod layout;
pub mod logic;
pub mod server;
pub mod session;
