use clap::Parser;
use handler_chain::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run => cli::sequence::run().await,
        Command::FanOut(args) => cli::fan_out::run(args).await,
        Command::Deep(args) => cli::deep::run(args).await,
        Command::Delegate(args) => cli::delegate::run(args).await,
    }
}
