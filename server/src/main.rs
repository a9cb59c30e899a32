use clap::Parser;
use server::{config::Config, logging::init_logging, start_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_logging(config.verbose);

    start_server(config).await?;
    Ok(())
}
