use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use clap::Parser;
use minesweeper_common::models::BoardSize;
use thiserror::Error;
use tracing::info;

use crate::{
    layout::{Layout, LayoutError},
    logic::{Board, BoardError},
};

pub const DEFAULT_PORT: u16 = 4444;
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Multiplayer minesweeper over a line-oriented text protocol.
#[derive(Parser, Debug, Clone)]
#[command(name = "minesweeper-server", version, about)]
pub struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, env = "MINESWEEPER_HOST", default_value_t = DEFAULT_HOST)]
    pub host: IpAddr,
    /// Port to listen on
    #[arg(short, long, env = "MINESWEEPER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Start with a random board of this size
    #[arg(long, value_name = "WIDTH,HEIGHT", conflicts_with = "file")]
    pub size: Option<BoardSize>,
    /// Start with the board stored in this file
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

impl Args {
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// A board file, else an explicit size, else the default random board.
    /// Both at once is rejected; clap enforces this when parsing too.
    pub fn board_source(&self) -> Result<BoardSource, ConfigError> {
        match (&self.file, self.size) {
            (Some(_), Some(_)) => Err(ConfigError::Conflict),
            (Some(path), None) => Ok(BoardSource::File(path.clone())),
            (None, Some(size)) => Ok(BoardSource::Random(size)),
            (None, None) => Ok(BoardSource::Random(BoardSize::default())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--file and --size cannot be used together")]
    Conflict,
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Board(#[from] BoardError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardSource {
    File(PathBuf),
    Random(BoardSize),
}

impl BoardSource {
    pub fn build(&self) -> Result<Board, ConfigError> {
        let board = match self {
            Self::File(path) => {
                info!("Loading board from {}", path.display());
                Board::from_layout(Layout::load(path)?)?
            }
            Self::Random(size) => {
                info!("Generating random {} board", size);
                Board::random(*size)?
            }
        };
        Ok(board)
    }
}
