//! handler-chain
//!
//! A composable handler-chain execution engine:
//! - Ordered, named handlers that proceed to the next handler or delegate to another chain
//! - Interceptors inserted in front of a handler without touching its registration
//! - Synchronous chains run as plain nested calls; pending contexts, pending
//!   results and async proceed/delegate split off independent continuations
//! - Forking a fresh execution from the current position
//!
//! ```
//! use handler_chain::{chain, Flow, Invocation};
//!
//! let chain = chain("example")
//!     .append("h1", |inv: Invocation<i32, i32>| inv.proceed_with(*inv.context() * 2).into_flow())
//!     .append("h2", |inv: Invocation<i32, i32>| Flow::value(*inv.context() + 1))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(chain.invoke(3).unwrap().ready(), Some(7));
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{
    chain, Chain, ChainBuilder, ChainError, ExecutionId, Flow, Handler, HandlerRef, Interceptor,
    InterceptorRegistry, Invocation, MaybeAsync, NamedHandler, Suspend,
};
