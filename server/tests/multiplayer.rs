//! End-to-end tests: a real server on a loopback port, driven through
//! `minesweeper-client`.

use std::{io::Write, net::SocketAddr, sync::Arc, time::Duration};

use minesweeper_client::{BoardSize, HELP, MinesweeperClient, Response};
use minesweeper_server::{
    config::BoardSource,
    logic::{Board, SharedBoard},
    server::GameServer,
};
use rand::{SeedableRng, rngs::StdRng};

async fn start(board: Board) -> (SharedBoard, SocketAddr) {
    let server = GameServer::bind("127.0.0.1:0".parse().unwrap(), board)
        .await
        .expect("bind loopback");
    let addr = server.local_addr().unwrap();
    let board = server.board();
    tokio::spawn(async move { server.serve().await });
    (board, addr)
}

fn untouched_row(columns: usize) -> String {
    vec!["-"; columns].join(" ")
}

#[tokio::test]
async fn flag_look_and_dig_on_flagged_cell() {
    let (_, addr) = start(Board::empty(BoardSize::new(10, 10)).unwrap()).await;
    let mut client = MinesweeperClient::connect(addr).await.unwrap();

    let flagged = client.flag(1, 1).await.unwrap();
    let view = client.look().await.unwrap();
    assert_eq!(view, flagged);

    for (y, row) in view.lines().enumerate() {
        if y == 1 {
            assert_eq!(row, "- F - - - - - - - -");
        } else {
            assert_eq!(row, untouched_row(10));
        }
    }

    assert_eq!(client.dig(1, 1).await.unwrap(), Response::Board(view));
    client.bye().await.unwrap();
}

#[tokio::test]
async fn dig_on_safe_board_opens_everything() {
    let (board, addr) = start(Board::empty(BoardSize::new(6, 4)).unwrap()).await;
    let mut client = MinesweeperClient::connect(addr).await.unwrap();

    let view = client.dig(2, 3).await.unwrap().into_board().unwrap();

    assert_eq!(view, "           \n".repeat(4));
    assert_eq!(board.lock().await.revealed_count(), 24);
}

#[tokio::test]
async fn malformed_line_returns_exactly_help() {
    let (_, addr) = start(Board::empty(BoardSize::new(3, 3)).unwrap()).await;
    let mut client = MinesweeperClient::connect(addr).await.unwrap();

    assert_eq!(
        client.send_raw("digg 1 1").await.unwrap(),
        Response::Help(HELP.to_string())
    );
    assert_eq!(client.help().await.unwrap(), HELP);
    // Still usable afterwards.
    assert_eq!(client.look().await.unwrap(), "- - -\n".repeat(3));
}

#[tokio::test]
async fn file_board_explodes_then_recounts() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "3 3\n1 1 0\n0 0 0\n0 0 0\n").unwrap();
    let board = BoardSource::File(file.path().to_path_buf()).build().unwrap();
    let (_, addr) = start(board).await;

    let mut client = MinesweeperClient::connect(addr).await.unwrap();
    assert_eq!(client.welcome().columns, 3);
    assert_eq!(client.welcome().rows, 3);

    assert_eq!(client.dig(0, 0).await.unwrap(), Response::Boom);
    // (0, 0) now only touches the bomb at (1, 0).
    assert_eq!(client.look().await.unwrap(), "1 - -\n- - -\n- - -\n");

    // Digging the remaining bomb clears the board around it.
    assert_eq!(client.dig(1, 0).await.unwrap(), Response::Boom);
    assert_eq!(client.look().await.unwrap(), "     \n     \n     \n");
}

#[tokio::test]
async fn out_of_range_commands_change_nothing() {
    let (board, addr) = start(Board::empty(BoardSize::new(2, 2)).unwrap()).await;
    let mut client = MinesweeperClient::connect(addr).await.unwrap();
    let fresh = "- -\n- -\n";

    assert_eq!(client.dig(-1, 0).await.unwrap(), Response::Board(fresh.into()));
    assert_eq!(client.dig(2, 2).await.unwrap(), Response::Board(fresh.into()));
    assert_eq!(client.flag(0, 9).await.unwrap(), fresh);
    assert_eq!(client.deflag(-5, -5).await.unwrap(), fresh);
    assert_eq!(board.lock().await.revealed_count(), 0);
}

#[tokio::test]
async fn players_see_each_others_moves() {
    let (_, addr) = start(Board::empty(BoardSize::new(3, 1)).unwrap()).await;
    let mut alice = MinesweeperClient::connect(addr).await.unwrap();
    let mut bob = MinesweeperClient::connect(addr).await.unwrap();
    assert_eq!(bob.welcome().players, 2);

    alice.flag(2, 0).await.unwrap();
    assert_eq!(bob.look().await.unwrap(), "- - F\n");

    // Bob cannot dig under Alice's flag, but can lift it.
    assert_eq!(bob.dig(2, 0).await.unwrap(), Response::Board("- - F\n".into()));
    bob.deflag(2, 0).await.unwrap();
    assert_eq!(alice.look().await.unwrap(), "- - -\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_players_keep_the_board_consistent() {
    const PLAYERS: i64 = 8;
    const SIZE: usize = 16;

    let mut rng = StdRng::seed_from_u64(2024);
    let board = Board::random_with(BoardSize::new(SIZE, SIZE), &mut rng).unwrap();
    let (shared, addr) = start(board).await;

    // Sample the revealed count while players move; it must never go down.
    let watcher = {
        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            let mut samples = Vec::new();
            for _ in 0..200 {
                samples.push(shared.lock().await.revealed_count());
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            samples
        })
    };

    let players: Vec<_> = (0..PLAYERS)
        .map(|player| {
            tokio::spawn(async move {
                let mut client = MinesweeperClient::connect(addr).await.unwrap();
                // Each player owns the columns congruent to its index.
                let mut views = Vec::new();
                for y in 0..SIZE as i64 {
                    for x in (player..SIZE as i64).step_by(PLAYERS as usize) {
                        client.flag(x, y).await.unwrap();
                        views.push(client.deflag(x, y).await.unwrap());
                        if let Response::Board(view) = client.dig(x, y).await.unwrap() {
                            views.push(view);
                        }
                    }
                }
                client.bye().await.unwrap();
                views
            })
        })
        .collect();

    for player in players {
        for view in player.await.unwrap() {
            let rows: Vec<&str> = view.lines().collect();
            assert_eq!(rows.len(), SIZE);
            for row in rows {
                assert_eq!(row.len(), SIZE * 2 - 1);
                assert!(
                    row.chars()
                        .all(|c| matches!(c, '-' | 'F' | ' ' | '1'..='8')),
                    "bad row {row:?}"
                );
            }
        }
    }

    let samples = watcher.await.unwrap();
    assert!(samples.windows(2).all(|pair| pair[0] <= pair[1]));

    // Every cell was dug by its owner, so nothing is left hidden.
    let board = shared.lock().await;
    assert_eq!(board.revealed_count(), SIZE * SIZE);
    assert_eq!((board.columns(), board.rows()), (SIZE, SIZE));
}
