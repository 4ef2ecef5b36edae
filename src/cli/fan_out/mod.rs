//! Fan-out command - concurrent continuations joined by the first handler

use clap::Args;
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::info;

use crate::domain::chain::{chain, Chain};
use crate::domain::execution::{Flow, Invocation, MaybeAsync};
use crate::domain::ChainError;

use super::x;

/// Arguments for the fan-out command
#[derive(Args, Clone)]
pub struct FanOutArgs {
    /// Number of `proceed_async` calls (overrides config)
    #[arg(long)]
    pub fan_out: Option<usize>,

    /// Starting value of `x` (overrides config)
    #[arg(long)]
    pub x: Option<i64>,
}

/// Run the fan-out chain and wait for the joined result
pub async fn run(args: FanOutArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();

    let fan_out = args.fan_out.unwrap_or(config.demo.fan_out);
    let x = args.x.unwrap_or(config.demo.seed);

    let chain = fan_out_chain(fan_out)?;
    let result = chain.invoke(json!({ "x": x }))?.settle().await?;

    info!(chain = %chain.id(), fan_out, x, result, "Chain finished");
    println!("{}", result);
    Ok(())
}

/// `h1` proceeds asynchronously with `x + i` for `i` in `1..=fan_out` and sums
/// the results; `h2` proceeds with a pending `x * 2`; `h3` returns `x + 1`.
pub fn fan_out_chain(fan_out: usize) -> Result<Chain<Value, i64>, ChainError> {
    chain("fan-out")
        .append("h1", move |inv: Invocation<Value, i64>| {
            gather(inv, 1, fan_out as i64, Vec::with_capacity(fan_out))
        })
        .append("h2", |inv: Invocation<Value, i64>| {
            let next = json!({ "x": x(&inv) * 2 });
            inv.proceed_with(MaybeAsync::pending(async move {
                tokio::task::yield_now().await;
                Ok(next)
            }))
            .into_flow()
        })
        .append("h3", |inv: Invocation<Value, i64>| Flow::value(x(&inv) + 1))
        .build()
}

fn gather(
    inv: Invocation<Value, i64>,
    i: i64,
    last: i64,
    mut results: Vec<MaybeAsync<i64>>,
) -> Flow<Value, i64> {
    if i > last {
        return Flow::pending(async move {
            join_all(results.into_iter().map(MaybeAsync::settle))
                .await
                .into_iter()
                .sum::<Result<i64, ChainError>>()
        });
    }

    let next = inv.clone();
    inv.proceed_async_with(json!({ "x": x(&inv) + i }))
        .and_then(move |result| {
            results.push(result);
            gather(next, i + 1, last, results)
        })
}
