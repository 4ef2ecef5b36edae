//! Chain entity - named, ordered handlers plus their interceptor registries

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::execution::{self, ExecutionId, HandlerRef, MaybeAsync};
use crate::domain::ChainError;

use super::interceptor::InterceptorRegistry;

/// A handler together with the name it was registered under
pub struct NamedHandler<C, T> {
    name: Arc<str>,
    handler: HandlerRef<C, T>,
}

impl<C, T> NamedHandler<C, T> {
    pub fn new(name: impl Into<Arc<str>>, handler: HandlerRef<C, T>) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &HandlerRef<C, T> {
        &self.handler
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }

    /// Whether this entry holds exactly `handler`
    pub fn is(&self, handler: &HandlerRef<C, T>) -> bool {
        same_handler(&self.handler, handler)
    }
}

impl<C, T> Clone for NamedHandler<C, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<C, T> std::fmt::Debug for NamedHandler<C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedHandler").field("name", &self.name).finish()
    }
}

/// Handlers compare by identity of the shared allocation
pub(crate) fn same_handler<C, T>(a: &HandlerRef<C, T>, b: &HandlerRef<C, T>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

struct ChainInner<C, T> {
    id: String,
    handlers: RwLock<Vec<NamedHandler<C, T>>>,
    /// Handlers as registered by the builder, keyed by name
    originals: HashMap<String, HandlerRef<C, T>>,
}

/// An ordered, named pipeline of handlers
///
/// Cloning a chain is cheap and yields a handle to the same pipeline: the
/// identity is fixed at build time while the handler list stays mutable
/// through interceptors. Running executions read the list lazily, one handler
/// at a time, so an interceptor added or removed mid-flight is observed by
/// every step not yet resolved.
///
/// A chain captured by one of its own handlers (directly or through another
/// chain) forms a reference cycle and is never freed.
pub struct Chain<C, T> {
    inner: Arc<ChainInner<C, T>>,
}

impl<C, T> Clone for Chain<C, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C, T> Chain<C, T>
where
    C: Clone + Send + 'static,
    T: Send + 'static,
{
    pub(crate) fn new(id: String, handlers: Vec<NamedHandler<C, T>>) -> Self {
        let originals = handlers
            .iter()
            .map(|named| (named.name().to_string(), named.handler().clone()))
            .collect();

        Self {
            inner: Arc::new(ChainInner {
                id,
                handlers: RwLock::new(handlers),
                originals,
            }),
        }
    }

    /// Run the chain from its first handler
    ///
    /// Returns `Ready` when the whole execution settles synchronously and
    /// `Pending` when some handler left an asynchronous continuation behind.
    /// Errors raised on the synchronous path come back as `Err`; errors raised
    /// later reject the pending value.
    pub fn invoke(&self, context: C) -> Result<MaybeAsync<T>, ChainError> {
        execution::execute(ExecutionId::next(), self.clone(), 0, context)
    }

    /// Registry of interceptors wrapping the handler registered as `name`
    pub fn interceptors(&self, name: &str) -> Result<InterceptorRegistry<C, T>, ChainError> {
        let target = self
            .inner
            .originals
            .get(name)
            .ok_or_else(|| ChainError::unknown_handler(name))?;

        Ok(InterceptorRegistry::new(self.clone(), name, target.clone()))
    }

    /// Insert `named` directly before the current position of `target`
    pub(crate) fn insert_before(
        &self,
        target: &HandlerRef<C, T>,
        named: NamedHandler<C, T>,
    ) -> Result<usize, ChainError> {
        let mut handlers = self
            .inner
            .handlers
            .write()
            .map_err(|_| ChainError::internal("Failed to acquire lock"))?;

        let index = find_handler(&handlers, target)?;
        handlers.insert(index, named);
        Ok(index)
    }

    /// Remove the first entry holding `target`
    pub(crate) fn remove_handler(&self, target: &HandlerRef<C, T>) -> Result<NamedHandler<C, T>, ChainError> {
        let mut handlers = self
            .inner
            .handlers
            .write()
            .map_err(|_| ChainError::internal("Failed to acquire lock"))?;

        let index = find_handler(&handlers, target)?;
        Ok(handlers.remove(index))
    }
}

impl<C, T> Chain<C, T> {
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn len(&self) -> usize {
        self.read_handlers(|handlers| handlers.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current handler names in execution order, interceptors included
    pub fn handler_names(&self) -> Vec<String> {
        self.read_handlers(|handlers| handlers.iter().map(|h| h.name().to_string()).collect())
    }

    /// Handler currently at `index`, if any
    pub fn handler_at(&self, index: usize) -> Option<NamedHandler<C, T>> {
        self.read_handlers(|handlers| handlers.get(index).cloned())
    }

    /// Whether both handles refer to the same chain
    pub fn same_as(&self, other: &Chain<C, T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn read_handlers<R>(&self, f: impl FnOnce(&[NamedHandler<C, T>]) -> R) -> R {
        let handlers = self
            .inner
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&handlers)
    }
}

fn find_handler<C, T>(handlers: &[NamedHandler<C, T>], target: &HandlerRef<C, T>) -> Result<usize, ChainError> {
    handlers
        .iter()
        .position(|named| named.is(target))
        .ok_or(ChainError::HandlerNotFound)
}

impl<C, T> std::fmt::Debug for Chain<C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("id", &self.id())
            .field("handlers", &self.handler_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::ChainBuilder;
    use crate::domain::execution::{Flow, Invocation};

    fn handler(value: i32) -> HandlerRef<i32, i32> {
        Arc::new(move |_inv: Invocation<i32, i32>| Flow::value(value))
    }

    fn chain() -> Chain<i32, i32> {
        ChainBuilder::new("testChain")
            .append("h1", |inv: Invocation<i32, i32>| inv.proceed().into_flow())
            .append("h2", |inv: Invocation<i32, i32>| Flow::value(*inv.context()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_accessors() {
        let chain = chain();
        assert_eq!(chain.id(), "testChain");
        assert_eq!(chain.len(), 2);
        assert!(!chain.is_empty());
        assert_eq!(chain.handler_names(), vec!["h1", "h2"]);
        assert_eq!(chain.handler_at(1).unwrap().name(), "h2");
        assert!(chain.handler_at(2).is_none());
    }

    #[test]
    fn test_clone_shares_identity() {
        let chain = chain();
        let other = chain.clone();
        assert!(chain.same_as(&other));
        assert!(!chain.same_as(&self::chain()));
    }

    #[test]
    fn test_invoke() {
        let result = chain().invoke(5).unwrap();
        assert_eq!(result.ready(), Some(5));
    }

    #[test]
    fn test_handler_identity() {
        let a = handler(1);
        let b = handler(1);
        let named = NamedHandler::new("a", a.clone());

        assert!(named.is(&a));
        assert!(!named.is(&b));
        assert!(same_handler(&a, &a.clone()));
    }

    #[test]
    fn test_insert_before_and_remove() {
        let chain = chain();
        let target = chain.handler_at(1).unwrap().handler().clone();
        let extra = handler(9);

        let index = chain
            .insert_before(&target, NamedHandler::new("extra", extra.clone()))
            .unwrap();
        assert_eq!(index, 1);
        assert_eq!(chain.handler_names(), vec!["h1", "extra", "h2"]);
        assert_eq!(chain.invoke(5).unwrap().ready(), Some(9));

        let removed = chain.remove_handler(&extra).unwrap();
        assert_eq!(removed.name(), "extra");
        assert_eq!(chain.handler_names(), vec!["h1", "h2"]);
    }

    #[test]
    fn test_missing_handler() {
        let chain = chain();
        let error = chain.remove_handler(&handler(1)).err().unwrap();
        assert_eq!(error.to_string(), "Handler not found.");

        let error = chain
            .insert_before(&handler(1), NamedHandler::new("x", handler(2)))
            .err()
            .unwrap();
        assert_eq!(error.to_string(), "Handler not found.");
    }

    #[test]
    fn test_unknown_interceptor_target() {
        let error = chain().interceptors("nope").err().unwrap();
        assert_eq!(error.to_string(), "No handler named 'nope' is registered");
    }

    #[test]
    fn test_debug_lists_handlers() {
        let output = format!("{:?}", chain());
        assert!(output.contains("testChain"));
        assert!(output.contains("h2"));
    }
}
