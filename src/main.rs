use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    notewire::cli::run().await
}
