//! Delegate command - a chain handing its work to another chain

use clap::Args;
use serde_json::{json, Value};
use tracing::info;

use crate::domain::chain::{chain, Chain};
use crate::domain::execution::{Flow, Invocation};
use crate::domain::ChainError;

use super::x;

/// Arguments for the delegate command
#[derive(Args, Clone)]
pub struct DelegateArgs {
    /// Starting value of `x` (overrides config)
    #[arg(long)]
    pub x: Option<i64>,
}

pub async fn run(args: DelegateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let x = args.x.unwrap_or(config.demo.seed);

    let chain = delegating_chain()?;
    let result = chain.invoke(json!({ "x": x }))?.settle().await?;

    info!(chain = %chain.id(), x, result, "Chain finished");
    println!("{}", result);
    Ok(())
}

/// `outer` delegates with `{y: x * 2}` to `inner`, whose only handler returns `y + 1`
pub fn delegating_chain() -> Result<Chain<Value, i64>, ChainError> {
    let inner = chain("inner")
        .append("h1", |inv: Invocation<Value, i64>| {
            Flow::value(inv.context()["y"].as_i64().unwrap_or_default() + 1)
        })
        .build()?;

    chain("outer")
        .append("h1", move |inv: Invocation<Value, i64>| {
            inv.delegate(&inner, json!({ "y": x(&inv) * 2 })).into_flow()
        })
        .build()
}
