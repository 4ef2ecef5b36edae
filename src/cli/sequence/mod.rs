//! Run command - the synchronous arithmetic chain

use serde_json::{json, Value};
use tracing::info;

use crate::domain::chain::{chain, Chain};
use crate::domain::execution::{Flow, Invocation};
use crate::domain::ChainError;

/// Run `h1 -> h2 -> h3`, computing `1 + 2 * 3`
pub async fn run() -> anyhow::Result<()> {
    super::bootstrap();

    let chain = arithmetic_chain()?;
    let result = chain.invoke(json!({}))?.settle().await?;

    info!(chain = %chain.id(), result, "Chain finished");
    println!("{}", result);
    Ok(())
}

pub fn arithmetic_chain() -> Result<Chain<Value, i64>, ChainError> {
    chain("arithmetic")
        .append("h1", |inv: Invocation<Value, i64>| inv.proceed().map(|v| 1 + v))
        .append("h2", |inv: Invocation<Value, i64>| inv.proceed().map(|v| 2 * v))
        .append("h3", |_inv: Invocation<Value, i64>| Flow::value(3))
        .build()
}
