use std::{
    io,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use tokio::{net::TcpListener, sync::Mutex};
use tracing::{error, info, instrument, warn};

use crate::{
    logic::{Board, SharedBoard},
    session::Session,
};

/// Accepts players and hands each one a [`Session`] on the shared board.
pub struct GameServer {
    listener: TcpListener,
    board: SharedBoard,
    players: Arc<AtomicUsize>,
}

/// Holds one slot in the live player count until dropped.
struct PlayerSlot(Arc<AtomicUsize>);

impl PlayerSlot {
    fn claim(players: &Arc<AtomicUsize>) -> (Self, usize) {
        let count = players.fetch_add(1, Ordering::SeqCst) + 1;
        (Self(Arc::clone(players)), count)
    }
}

impl Drop for PlayerSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl GameServer {
    pub async fn bind(addr: SocketAddr, board: Board) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(
            "Listening on {} with a {}x{} board",
            listener.local_addr()?,
            board.columns(),
            board.rows()
        );

        Ok(Self {
            listener,
            board: Arc::new(Mutex::new(board)),
            players: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn board(&self) -> SharedBoard {
        Arc::clone(&self.board)
    }

    /// Players currently connected.
    pub fn players(&self) -> usize {
        self.players.load(Ordering::SeqCst)
    }

    /// Accepts connections forever. Only a failing `accept` ends the loop;
    /// errors inside a session stay inside that session's task.
    #[instrument(level = "debug", skip(self))]
    pub async fn serve(&self) -> io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await.inspect_err(|e| {
                error!("Failed to accept connection: {}", e);
            })?;

            let (slot, players) = PlayerSlot::claim(&self.players);
            let session = Session::new(self.board());
            info!(
                "Player {} connected from {} ({} online)",
                session.id(),
                peer,
                players
            );

            tokio::spawn(async move {
                let _slot = slot;
                if let Err(e) = session.run(stream, players).await {
                    warn!("Session {} with {} failed: {}", session.id(), peer, e);
                }
                info!("Player {} disconnected", session.id());
            });
        }
    }
}
