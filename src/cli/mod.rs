//! CLI module for handler-chain
//!
//! Each subcommand builds a demo chain, invokes it and prints the settled result:
//! - `run`: synchronous arithmetic pipeline
//! - `fan-out`: concurrent `proceed_async` continuations joined by one handler
//! - `deep`: a long pass-through chain
//! - `delegate`: one chain delegating into another

pub mod deep;
pub mod delegate;
pub mod fan_out;
pub mod sequence;

use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::config::AppConfig;
use crate::domain::execution::Invocation;
use crate::infrastructure::logging;

/// handler-chain - composable handler pipelines with sync and async continuations
#[derive(Parser)]
#[command(name = "handler-chain")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the arithmetic chain `1 + 2 * 3`
    Run,

    /// Fan out over `proceed_async` and join the pending results
    FanOut(fan_out::FanOutArgs),

    /// Run a chain of pass-through handlers ending in a literal
    Deep(deep::DeepArgs),

    /// Delegate from one chain into another
    Delegate(delegate::DelegateArgs),
}

/// Load `.env`, configuration and logging shared by every subcommand
fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);
    config
}

/// `x` field of a JSON context
fn x(invocation: &Invocation<Value, i64>) -> i64 {
    invocation.context()["x"].as_i64().unwrap_or_default()
}
