//! Chain builder

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::domain::execution::{Flow, HandlerRef, Invocation};
use crate::domain::ChainError;

use super::entity::{Chain, NamedHandler};

/// Start building the chain `id`
pub fn chain<C, T>(id: impl Into<String>) -> ChainBuilder<C, T>
where
    C: Clone + Send + 'static,
    T: Send + 'static,
{
    ChainBuilder::new(id)
}

/// Collects named handlers in execution order
pub struct ChainBuilder<C, T> {
    id: String,
    handlers: Vec<NamedHandler<C, T>>,
}

impl<C, T> ChainBuilder<C, T>
where
    C: Clone + Send + 'static,
    T: Send + 'static,
{
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handlers: Vec::new(),
        }
    }

    /// Register `handler` under `name`; handlers run in append order
    pub fn append<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Invocation<C, T>) -> Flow<C, T> + Send + Sync + 'static,
    {
        self.append_handler(name, Arc::new(handler))
    }

    /// Register an already shared handler, e.g. a `Handler` trait object
    pub fn append_handler(mut self, name: impl Into<String>, handler: HandlerRef<C, T>) -> Self {
        self.handlers.push(NamedHandler::new(name.into(), handler));
        self
    }

    /// Finish the chain
    ///
    /// Fails when two handlers share a name, since interceptors address
    /// handlers by name. A chain without handlers builds but cannot be invoked.
    pub fn build(self) -> Result<Chain<C, T>, ChainError> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = self.handlers.iter().find(|h| !seen.insert(h.name())) {
            return Err(ChainError::duplicate_handler(duplicate.name()));
        }

        debug!(chain = %self.id, handlers = self.handlers.len(), "Chain built");
        Ok(Chain::new(self.id, self.handlers))
    }
}
