//! `fixture` drives a Hardhat node through a single session: it resolves
//! configuration, connects, runs one command and prints the result.

mod cli;
mod telemetry;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    cli::run().await
}
