//! One player's connection: greet, then answer one command per line until
//! `bye`, end of stream, or an I/O error.

use std::io;

use minesweeper_common::protocol::{Command, MAX_LINE_LEN, Welcome};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::logic::{Board, SharedBoard};

pub struct Session {
    id: Uuid,
    board: SharedBoard,
}

impl Session {
    pub fn new(board: SharedBoard) -> Self {
        Self {
            id: Uuid::new_v4(),
            board,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Drives the protocol over `stream`. `players` is the live player count
    /// reported in the welcome line.
    #[instrument(level = "debug", skip(self, stream), fields(session = %self.id))]
    pub async fn run<S>(&self, stream: S, players: usize) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);

        let welcome = {
            let board = self.board.lock().await;
            Welcome {
                players,
                columns: board.columns(),
                rows: board.rows(),
            }
        };
        writer.write_all(format!("{welcome}\n").as_bytes()).await?;
        writer.flush().await?;

        let mut buffer = Vec::with_capacity(MAX_LINE_LEN + 1);
        loop {
            let response = match read_line(&mut reader, &mut buffer).await? {
                Line::Eof => {
                    debug!("Session {} reached end of stream", self.id);
                    break;
                }
                Line::Overlong => {
                    warn!("Session {} sent a line over {} bytes", self.id, MAX_LINE_LEN);
                    Board::help().to_string()
                }
                Line::Complete => {
                    let line = String::from_utf8_lossy(strip_terminator(&buffer));
                    let Some(response) = self.handle_line(&line).await else {
                        info!("Session {} said bye", self.id);
                        break;
                    };
                    response
                }
            };

            writer.write_all(response.as_bytes()).await?;
            writer.flush().await?;
        }

        writer.shutdown().await
    }

    /// Answers one line. `None` means the session should end.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        match Command::parse(line) {
            Some(command) => {
                debug!("Session {} sent {}", self.id, command);
                self.execute(command).await
            }
            None => {
                debug!("Session {} sent malformed line {:?}", self.id, line);
                Some(Board::help().to_string())
            }
        }
    }

    async fn execute(&self, command: Command) -> Option<String> {
        let response = match command {
            Command::Bye => return None,
            Command::Help => Board::help().to_string(),
            Command::Look => self.board.lock().await.render(),
            Command::Dig { x, y } => self.board.lock().await.reveal(x, y),
            Command::Flag { x, y } => self.board.lock().await.flag(x, y),
            Command::Deflag { x, y } => self.board.lock().await.deflag(x, y),
        };
        Some(response)
    }
}

enum Line {
    Eof,
    /// `buffer` holds the line, terminator included if there was one.
    Complete,
    /// The line was longer than [`MAX_LINE_LEN`] and has been skipped.
    Overlong,
}

/// Reads one line into `buffer` without ever holding more than
/// `MAX_LINE_LEN` bytes plus the terminator.
async fn read_line<R>(reader: &mut R, buffer: &mut Vec<u8>) -> io::Result<Line>
where
    R: AsyncBufRead + Unpin,
{
    let limit = MAX_LINE_LEN as u64 + 1;

    buffer.clear();
    if (&mut *reader).take(limit).read_until(b'\n', buffer).await? == 0 {
        return Ok(Line::Eof);
    }
    if buffer.len() <= MAX_LINE_LEN || buffer.ends_with(b"\n") {
        return Ok(Line::Complete);
    }

    // Drop the rest of the line chunk by chunk.
    loop {
        buffer.clear();
        let read = (&mut *reader).take(limit).read_until(b'\n', buffer).await?;
        if read == 0 || buffer.ends_with(b"\n") {
            break;
        }
    }
    buffer.clear();
    Ok(Line::Overlong)
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use minesweeper_common::{
        models::BoardSize,
        protocol::{BOOM, HELP},
    };
    use tokio::{
        io::{AsyncReadExt, DuplexStream},
        sync::Mutex,
    };

    use super::*;

    fn shared(board: Board) -> SharedBoard {
        Arc::new(Mutex::new(board))
    }

    fn empty_board(width: usize, height: usize) -> SharedBoard {
        shared(Board::empty(BoardSize::new(width, height)).unwrap())
    }

    /// Runs a session over an in-memory pipe, feeds it `input` and returns
    /// everything the server wrote.
    async fn converse(board: SharedBoard, input: &str) -> String {
        let (mut client, server): (DuplexStream, DuplexStream) = tokio::io::duplex(64 * 1024);
        let session = Session::new(board);
        let task = tokio::spawn(async move { session.run(server, 1).await });

        client.write_all(input.as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        task.await.unwrap().unwrap();
        output
    }

    fn welcome(columns: usize, rows: usize) -> String {
        format!(
            "{}\n",
            Welcome {
                players: 1,
                columns,
                rows
            }
        )
    }

    #[tokio::test]
    async fn greets_with_dimensions() {
        let output = converse(empty_board(4, 2), "").await;
        assert_eq!(
            output,
            "Welcome to Minesweeper. Players: 1 including you. Board: 4 columns by 2 rows. Type 'help' for help.\n"
        );
    }

    #[tokio::test]
    async fn malformed_line_gets_help() {
        let output = converse(empty_board(2, 2), "digg 1 1\n").await;
        assert_eq!(output, welcome(2, 2) + HELP);
    }

    #[tokio::test]
    async fn flag_then_look_then_dig_flagged() {
        let output = converse(empty_board(3, 2), "flag 1 1\nlook\ndig 1 1\n").await;
        let flagged = "- - -\n- F -\n";
        assert_eq!(output, welcome(3, 2) + flagged + flagged + flagged);
    }

    #[tokio::test]
    async fn bye_ends_session_without_reply() {
        let output = converse(empty_board(2, 1), "help\nbye\nlook\n").await;
        assert_eq!(output, welcome(2, 1) + HELP);
    }

    #[tokio::test]
    async fn crlf_lines_and_unterminated_last_line() {
        let output = converse(empty_board(2, 1), "look\r\nflag 0 0").await;
        assert_eq!(output, welcome(2, 1) + "- -\n" + "F -\n");
    }

    #[tokio::test]
    async fn dig_on_bomb_booms_and_game_continues() {
        let board = shared(Board::with_bombs(BoardSize::new(2, 1), vec![true, false]).unwrap());
        let output = converse(board.clone(), "dig 0 0\nlook\n").await;

        assert_eq!(output, welcome(2, 1) + BOOM + "   \n");
        assert_eq!(board.lock().await.revealed_count(), 2);
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_noops() {
        let output = converse(empty_board(2, 1), "dig -1 0\nflag 5 5\ndeflag 0 -7\n").await;
        assert_eq!(output, welcome(2, 1) + "- -\n- -\n- -\n");
    }

    #[tokio::test]
    async fn invalid_utf8_is_treated_as_malformed() {
        let (mut client, server) = tokio::io::duplex(1024);
        let session = Session::new(empty_board(1, 1));
        let task = tokio::spawn(async move { session.run(server, 1).await });

        client.write_all(b"lo\xffok\n").await.unwrap();
        client.shutdown().await.unwrap();
        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        task.await.unwrap().unwrap();

        assert_eq!(output, welcome(1, 1) + HELP);
    }

    #[tokio::test]
    async fn overlong_line_gets_help_and_session_resyncs() {
        let mut input = "a".repeat(1024 * 1024);
        input.push_str("\nlook\n");
        let output = converse(empty_board(2, 1), &input).await;
        assert_eq!(output, welcome(2, 1) + HELP + "- -\n");
    }

    #[tokio::test]
    async fn overlong_line_is_not_parsed_from_its_prefix() {
        let input = format!("look{}\nbye\n", " ".repeat(MAX_LINE_LEN));
        let output = converse(empty_board(1, 1), &input).await;
        assert_eq!(output, welcome(1, 1) + HELP);
    }

    #[tokio::test]
    async fn longest_allowed_line_is_read_whole() {
        let padded = format!("{}\n", "x".repeat(MAX_LINE_LEN));
        let output = converse(empty_board(1, 1), &(padded + "look\n")).await;
        assert_eq!(output, welcome(1, 1) + HELP + "-\n");
    }

    #[tokio::test]
    async fn unterminated_overlong_line_at_eof() {
        let output = converse(empty_board(1, 1), &"z".repeat(10 * MAX_LINE_LEN)).await;
        assert_eq!(output, welcome(1, 1) + HELP);
    }

    #[tokio::test]
    async fn read_line_never_buffers_past_the_limit() {
        let data = format!("{}\nhelp\n", "q".repeat(50 * MAX_LINE_LEN));
        let mut reader = BufReader::new(data.as_bytes());
        let mut buffer = Vec::new();

        assert!(matches!(
            read_line(&mut reader, &mut buffer).await.unwrap(),
            Line::Overlong
        ));
        assert!(buffer.capacity() <= 2 * (MAX_LINE_LEN + 1));
        assert!(matches!(
            read_line(&mut reader, &mut buffer).await.unwrap(),
            Line::Complete
        ));
        assert_eq!(buffer, b"help\n");
        assert!(matches!(
            read_line(&mut reader, &mut buffer).await.unwrap(),
            Line::Eof
        ));
    }

    #[tokio::test]
    async fn handle_line_dispatches() {
        let session = Session::new(empty_board(2, 2));
        assert_eq!(session.handle_line("bye").await, None);
        assert_eq!(session.handle_line("help").await.as_deref(), Some(HELP));
        assert_eq!(
            session.handle_line("dig 0 0").await.as_deref(),
            Some("   \n   \n")
        );
    }
}
