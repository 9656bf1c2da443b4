use minesweeper_client::{MinesweeperClient, Response};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "localhost:4444".to_string());
    let mut client = MinesweeperClient::connect(addr.as_str()).await?;

    let welcome = *client.welcome();
    println!(
        "Joined a {}x{} board with {} players",
        welcome.columns, welcome.rows, welcome.players
    );

    print!("{}", client.look().await?);

    // Flag a corner, then change our mind
    print!("{}", client.flag(0, 0).await?);
    print!("{}", client.deflag(0, 0).await?);

    // Dig in the middle of the board
    let (x, y) = ((welcome.columns / 2) as i64, (welcome.rows / 2) as i64);
    match client.dig(x, y).await? {
        Response::Boom => println!("💣 Hit a bomb at ({x}, {y})"),
        Response::Board(view) => print!("{view}"),
        Response::Help(text) => print!("{text}"),
    }

    client.bye().await?;
    Ok(())
}
