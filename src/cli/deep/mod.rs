//! Deep command - a long chain of pass-through handlers

use clap::Args;
use serde_json::{json, Value};
use tracing::info;

use crate::domain::chain::{chain, Chain};
use crate::domain::execution::{Flow, Invocation};
use crate::domain::ChainError;

/// Arguments for the deep command
#[derive(Args, Clone)]
pub struct DeepArgs {
    /// Number of handlers (overrides config)
    #[arg(long)]
    pub handlers: Option<usize>,
}

/// Value returned by the last handler
pub const LITERAL: i64 = 123;

pub async fn run(args: DeepArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let handlers = args.handlers.unwrap_or(config.demo.handlers);

    let chain = deep_chain(handlers)?;
    let result = chain.invoke(json!({}))?.settle().await?;

    info!(chain = %chain.id(), handlers, result, "Chain finished");
    println!("{}", result);
    Ok(())
}

/// `handlers` handlers where every one but the last proceeds
pub fn deep_chain(handlers: usize) -> Result<Chain<Value, i64>, ChainError> {
    (0..handlers)
        .fold(chain("deep"), |builder, i| {
            builder.append(format!("h{}", i), move |inv: Invocation<Value, i64>| {
                if i + 1 == handlers {
                    Flow::value(LITERAL)
                } else {
                    inv.proceed().into_flow()
                }
            })
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_chain() {
        let chain = deep_chain(1_000).unwrap();
        assert_eq!(chain.len(), 1_000);
        assert_eq!(chain.invoke(json!({})).unwrap().ready(), Some(LITERAL));
    }

    #[test]
    fn test_empty_deep_chain_fails() {
        let error = deep_chain(0).unwrap().invoke(json!({})).err().unwrap();
        assert_eq!(error.to_string(), "No handlers registered.");
    }
}
