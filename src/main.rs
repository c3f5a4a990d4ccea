#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists; it must be read before the configuration
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    kvtree::cli::run_cli().await
}
