//! Interceptors - handlers inserted in front of a registered handler

use std::sync::Arc;

use tracing::debug;

use crate::domain::execution::{Flow, HandlerRef, Invocation};
use crate::domain::ChainError;

use super::entity::{Chain, NamedHandler};

/// A handler tagged with a display name, attachable in front of another handler
pub struct Interceptor<C, T> {
    name: Arc<str>,
    handler: HandlerRef<C, T>,
}

impl<C, T> Interceptor<C, T>
where
    C: Clone + Send + 'static,
    T: Send + 'static,
{
    pub fn new<F>(name: impl Into<Arc<str>>, handler: F) -> Self
    where
        F: Fn(Invocation<C, T>) -> Flow<C, T> + Send + Sync + 'static,
    {
        Self::from_handler(name, Arc::new(handler))
    }

    pub fn from_handler(name: impl Into<Arc<str>>, handler: HandlerRef<C, T>) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<C, T> Interceptor<C, T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &HandlerRef<C, T> {
        &self.handler
    }
}

impl<C, T> Clone for Interceptor<C, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<C, T> std::fmt::Debug for Interceptor<C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor").field("name", &self.name).finish()
    }
}

/// Interceptor operations for one registered handler
///
/// Positions are resolved against the target's current index on every call,
/// so each added interceptor lands immediately before the target: adding `I`
/// then `J` runs `[I, J, target]`.
pub struct InterceptorRegistry<C, T> {
    chain: Chain<C, T>,
    target_name: String,
    target: HandlerRef<C, T>,
}

impl<C, T> InterceptorRegistry<C, T>
where
    C: Clone + Send + 'static,
    T: Send + 'static,
{
    pub(crate) fn new(chain: Chain<C, T>, target_name: &str, target: HandlerRef<C, T>) -> Self {
        Self {
            chain,
            target_name: target_name.to_string(),
            target,
        }
    }

    /// Name of the handler these interceptors wrap
    pub fn target(&self) -> &str {
        &self.target_name
    }

    pub fn add(&self, interceptor: &Interceptor<C, T>) -> Result<(), ChainError> {
        let named = NamedHandler::new(interceptor.name.clone(), interceptor.handler.clone());
        let index = self.chain.insert_before(&self.target, named)?;

        debug!(
            chain = %self.chain.id(),
            target = %self.target_name,
            interceptor = %interceptor.name(),
            index,
            "Interceptor added"
        );
        Ok(())
    }

    /// Detach `interceptor`; fails with "Handler not found." when it is not attached
    pub fn remove(&self, interceptor: &Interceptor<C, T>) -> Result<(), ChainError> {
        self.chain.remove_handler(&interceptor.handler)?;

        debug!(
            chain = %self.chain.id(),
            target = %self.target_name,
            interceptor = %interceptor.name(),
            "Interceptor removed"
        );
        Ok(())
    }
}
