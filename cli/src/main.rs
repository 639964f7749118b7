use clap::Parser;
use reglens_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    reglens_cli::run_main(cli).await
}
