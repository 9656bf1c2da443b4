use minesweeper_common::protocol::{BOOM, Command, HELP, Welcome};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info};

use crate::Result;

/// One reply from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The rendered board, one `\n`-terminated line per row.
    Board(String),
    /// A dig hit a bomb.
    Boom,
    /// Usage text, sent for `help` and for malformed lines.
    Help(String),
}

impl Response {
    /// The board view, or an error if the server answered something else.
    pub fn into_board(self) -> Result<String> {
        match self {
            Self::Board(view) => Ok(view),
            other => Err(format!("expected a board, got {other:?}").into()),
        }
    }
}

/// Connection to a minesweeper server.
///
/// Replies carry no length prefix, so a board reply is framed by reading as
/// many lines as the board has rows, taken from the welcome line.
pub struct MinesweeperClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    welcome: Welcome,
}

impl MinesweeperClient {
    /// Connect and read the welcome line.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let peer = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err("server closed the connection before greeting".into());
        }
        let welcome: Welcome = line.parse()?;
        info!(
            "Connected to {}: {}x{} board, {} players",
            peer, welcome.columns, welcome.rows, welcome.players
        );

        Ok(Self {
            reader,
            writer,
            welcome,
        })
    }

    pub fn welcome(&self) -> &Welcome {
        &self.welcome
    }

    pub async fn look(&mut self) -> Result<String> {
        self.send(Command::Look).await?.into_board()
    }

    pub async fn help(&mut self) -> Result<String> {
        match self.send(Command::Help).await? {
            Response::Help(text) => Ok(text),
            other => Err(format!("expected help, got {other:?}").into()),
        }
    }

    pub async fn dig(&mut self, x: i64, y: i64) -> Result<Response> {
        self.send(Command::Dig { x, y }).await
    }

    pub async fn flag(&mut self, x: i64, y: i64) -> Result<String> {
        self.send(Command::Flag { x, y }).await?.into_board()
    }

    pub async fn deflag(&mut self, x: i64, y: i64) -> Result<String> {
        self.send(Command::Deflag { x, y }).await?.into_board()
    }

    /// Send any command except `bye`, which has no reply; use [`Self::bye`].
    pub async fn send(&mut self, command: Command) -> Result<Response> {
        if command == Command::Bye {
            return Err("bye has no reply, use MinesweeperClient::bye".into());
        }
        self.send_raw(&command.to_string()).await
    }

    /// Send an arbitrary line, valid or not, and read the reply.
    pub async fn send_raw(&mut self, line: &str) -> Result<Response> {
        debug!("Sending {:?}", line);
        self.writer.write_all(format!("{line}\n").as_bytes()).await?;
        self.writer.flush().await?;
        self.read_response().await
    }

    /// Say goodbye and wait for the server to hang up.
    pub async fn bye(mut self) -> Result<()> {
        self.writer.write_all(b"bye\n").await?;
        self.writer.flush().await?;

        let mut line = String::new();
        match self.reader.read_line(&mut line).await? {
            0 => Ok(()),
            _ => Err(format!("unexpected reply to bye: {line:?}").into()),
        }
    }

    async fn read_response(&mut self) -> Result<Response> {
        let mut first = self.read_line().await?;

        if first == BOOM {
            return Ok(Response::Boom);
        }
        if first == HELP {
            return Ok(Response::Help(first));
        }

        for _ in 1..self.welcome.rows {
            let line = self.read_line().await?;
            first.push_str(&line);
        }
        Ok(Response::Board(first))
    }

    async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err("connection closed by server".into());
        }
        Ok(line)
    }
}
