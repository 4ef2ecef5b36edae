//! Per-step invocation handed to each handler

use crate::domain::chain::Chain;
use crate::domain::ChainError;

use super::executor;
use super::handler::{settled, unsettled, Request, Suspend};
use super::id::ExecutionId;
use super::pending::MaybeAsync;

/// The object a handler receives for one step of a chain
///
/// Carries the context visible at this step, the execution identity shared by
/// the whole top-level invoke, and the offset of the handler that proceeding
/// from here resolves to.
pub struct Invocation<C, T> {
    execution_id: ExecutionId,
    chain: Chain<C, T>,
    context: C,
    offset: usize,
}

impl<C: Clone, T> Clone for Invocation<C, T> {
    fn clone(&self) -> Self {
        Self {
            execution_id: self.execution_id,
            chain: self.chain.clone(),
            context: self.context.clone(),
            offset: self.offset,
        }
    }
}

impl<C, T> Invocation<C, T>
where
    C: Clone + Send + 'static,
    T: Send + 'static,
{
    pub(crate) fn new(execution_id: ExecutionId, chain: Chain<C, T>, context: C, offset: usize) -> Self {
        Self {
            execution_id,
            chain,
            context,
            offset,
        }
    }

    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    /// Chain this invocation belongs to
    pub fn chain(&self) -> &Chain<C, T> {
        &self.chain
    }

    /// Index of the handler that proceeding from here runs next
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Run the next handler with this invocation's context
    pub fn proceed(&self) -> Suspend<C, T, T> {
        self.proceed_with(self.context.clone())
    }

    /// Run the next handler with a new (possibly pending) context
    pub fn proceed_with(&self, context: impl Into<MaybeAsync<C>>) -> Suspend<C, T, T> {
        Suspend::new(Request::proceed(context.into(), false), settled)
    }

    /// Like `proceed` but resumes with a handle to the result instead of waiting for it
    pub fn proceed_async(&self) -> Suspend<C, T, MaybeAsync<T>> {
        self.proceed_async_with(self.context.clone())
    }

    pub fn proceed_async_with(&self, context: impl Into<MaybeAsync<C>>) -> Suspend<C, T, MaybeAsync<T>> {
        Suspend::new(Request::proceed(context.into(), true), unsettled)
    }

    /// Run `chain` from its first handler, nested inside the current frame
    pub fn delegate(&self, chain: &Chain<C, T>, context: impl Into<MaybeAsync<C>>) -> Suspend<C, T, T> {
        Suspend::new(Request::delegate(chain.clone(), context.into(), false), settled)
    }

    pub fn delegate_async(
        &self,
        chain: &Chain<C, T>,
        context: impl Into<MaybeAsync<C>>,
    ) -> Suspend<C, T, MaybeAsync<T>> {
        Suspend::new(Request::delegate(chain.clone(), context.into(), true), unsettled)
    }

    /// Start an independent execution of this chain from the next handler
    ///
    /// The result comes back directly instead of through a suspension, so the
    /// calling handler keeps its own position.
    pub fn fork(&self, context: C) -> Result<MaybeAsync<T>, ChainError> {
        executor::execute(self.execution_id, self.chain.clone(), self.offset, context)
    }
}

impl<C: std::fmt::Debug, T> std::fmt::Debug for Invocation<C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("execution_id", &self.execution_id)
            .field("chain", &self.chain.id())
            .field("context", &self.context)
            .field("offset", &self.offset)
            .finish()
    }
}
