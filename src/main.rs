//! frame-watch - 5-minute frame price alerts for Binance perpetuals

use anyhow::Result;

use frame_watch::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (FRAME_WATCH_* overrides can live there)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
