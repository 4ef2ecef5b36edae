//! Execution engine - invocations, the handler protocol and the stack machinery
//!
//! A top-level `Chain::invoke` mints an [`ExecutionId`], builds an execution
//! stack and drives it with an executor. Synchronous chains run to completion
//! within that call. Whenever a control request carries a pending context, a
//! handler returns a pending value, or a handler asks for an async
//! proceed/delegate, the current frame is split off into an independent
//! continuation that resumes once the value settles.

mod activation;
mod executor;
mod frame;
mod handler;
mod id;
mod invocation;
mod pending;
mod stack;

pub(crate) use executor::execute;
pub use handler::{Continuation, Flow, Handler, HandlerRef, Request, RequestKind, Suspend};
pub use id::ExecutionId;
pub use invocation::Invocation;
pub use pending::{MaybeAsync, PendingValue};
