//! Metrond CLI entry point.

use metrond_lib::cli::{self, Cli};
use metrond_lib::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    cli::execute(cli).await
}
