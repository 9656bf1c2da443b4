//! Types shared between the minesweeper server and its clients.
//!
//! `models` holds board geometry, `protocol` holds the line-oriented command
//! grammar and the fixed server replies.

pub mod models;
pub mod protocol;
