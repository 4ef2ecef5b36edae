//! Domain layer - chains, the execution engine and its errors

pub mod chain;
pub mod error;
pub mod execution;

pub use chain::{chain, Chain, ChainBuilder, Interceptor, InterceptorRegistry, NamedHandler};
pub use error::ChainError;
pub use execution::{
    ExecutionId, Flow, Handler, HandlerRef, Invocation, MaybeAsync, Request, RequestKind, Suspend,
};
