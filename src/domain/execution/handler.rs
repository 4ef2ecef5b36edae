//! Handler protocol - the suspendable computation a handler hands to the executor
//!
//! A handler turns an [`Invocation`] into a [`Flow`]. A flow either finishes
//! (with a value, a pending value or an error) or yields a [`Request`] together
//! with the continuation that receives whatever the executor resumes it with.

use std::sync::Arc;

use crate::domain::chain::Chain;
use crate::domain::ChainError;

use super::invocation::Invocation;
use super::pending::MaybeAsync;

/// Continuation of a suspended handler
///
/// Called with `Ok` when the executor resumes the handler with a value and with
/// `Err` when an error is injected at the suspension point.
pub type Continuation<C, T> =
    Box<dyn FnOnce(Result<MaybeAsync<T>, ChainError>) -> Flow<C, T> + Send>;

/// Shared, identity-comparable handler reference
pub type HandlerRef<C, T> = Arc<dyn Handler<C, T>>;

/// A handler registered in a chain
pub trait Handler<C, T>: Send + Sync {
    fn handle(&self, invocation: Invocation<C, T>) -> Flow<C, T>;
}

impl<C, T, F> Handler<C, T> for F
where
    F: Fn(Invocation<C, T>) -> Flow<C, T> + Send + Sync,
{
    fn handle(&self, invocation: Invocation<C, T>) -> Flow<C, T> {
        self(invocation)
    }
}

/// What a request asks the executor to do
pub enum RequestKind<C, T> {
    /// Continue with the next handler of the current delegation level
    Proceed,
    /// Run another chain nested inside the current frame
    Delegate(Chain<C, T>),
}

/// Control request yielded by a suspended handler
pub struct Request<C, T> {
    kind: RequestKind<C, T>,
    context: MaybeAsync<C>,
    is_async: bool,
}

impl<C, T> Request<C, T> {
    pub fn proceed(context: MaybeAsync<C>, is_async: bool) -> Self {
        Self {
            kind: RequestKind::Proceed,
            context,
            is_async,
        }
    }

    pub fn delegate(chain: Chain<C, T>, context: MaybeAsync<C>, is_async: bool) -> Self {
        Self {
            kind: RequestKind::Delegate(chain),
            context,
            is_async,
        }
    }

    pub fn kind(&self) -> &RequestKind<C, T> {
        &self.kind
    }

    pub fn context(&self) -> &MaybeAsync<C> {
        &self.context
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    pub(crate) fn into_parts(self) -> (RequestKind<C, T>, MaybeAsync<C>, bool) {
        (self.kind, self.context, self.is_async)
    }
}

impl<C, T> std::fmt::Debug for Request<C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            RequestKind::Proceed => "Proceed".to_string(),
            RequestKind::Delegate(chain) => format!("Delegate({})", chain.id()),
        };
        f.debug_struct("Request")
            .field("kind", &kind)
            .field("pending_context", &self.context.is_pending())
            .field("is_async", &self.is_async)
            .finish()
    }
}

/// A handler's suspendable computation
pub enum Flow<C, T> {
    Return(MaybeAsync<T>),
    Throw(ChainError),
    Yield(Request<C, T>, Continuation<C, T>),
}

impl<C, T> Flow<C, T>
where
    C: Send + 'static,
    T: Send + 'static,
{
    /// Finish with a value
    pub fn value(value: T) -> Self {
        Self::Return(MaybeAsync::Ready(value))
    }

    /// Finish with a value that settles later
    pub fn pending<F>(future: F) -> Self
    where
        F: std::future::Future<Output = Result<T, ChainError>> + Send + 'static,
    {
        Self::Return(MaybeAsync::pending(future))
    }

    /// Finish by raising an error
    pub fn error(error: impl Into<ChainError>) -> Self {
        Self::Throw(error.into())
    }

    pub fn from_result(result: Result<T, ChainError>) -> Self {
        match result {
            Ok(value) => Self::value(value),
            Err(error) => Self::Throw(error),
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::Yield(..))
    }
}

impl<C, T> From<MaybeAsync<T>> for Flow<C, T> {
    fn from(value: MaybeAsync<T>) -> Self {
        Self::Return(value)
    }
}

/// A control request waiting for the code that runs once it is answered
///
/// `R` is what the handler sees on resumption: the settled result for
/// `proceed`/`delegate`, the possibly pending result for the async variants.
pub struct Suspend<C, T, R> {
    request: Request<C, T>,
    extract: fn(MaybeAsync<T>) -> Result<R, ChainError>,
}

impl<C, T, R> Suspend<C, T, R>
where
    C: Send + 'static,
    T: Send + 'static,
    R: Send + 'static,
{
    pub(crate) fn new(
        request: Request<C, T>,
        extract: fn(MaybeAsync<T>) -> Result<R, ChainError>,
    ) -> Self {
        Self { request, extract }
    }

    pub fn request(&self) -> &Request<C, T> {
        &self.request
    }

    /// Resume with the outcome, errors included, so the handler can recover
    pub fn then<F>(self, f: F) -> Flow<C, T>
    where
        F: FnOnce(Result<R, ChainError>) -> Flow<C, T> + Send + 'static,
    {
        let extract = self.extract;
        Flow::Yield(
            self.request,
            Box::new(move |resumed| f(resumed.and_then(extract))),
        )
    }

    /// Resume with the value; injected errors propagate out of the handler
    pub fn and_then<F>(self, f: F) -> Flow<C, T>
    where
        F: FnOnce(R) -> Flow<C, T> + Send + 'static,
    {
        self.then(|resumed| match resumed {
            Ok(value) => f(value),
            Err(error) => Flow::Throw(error),
        })
    }

    pub fn map<F>(self, f: F) -> Flow<C, T>
    where
        F: FnOnce(R) -> T + Send + 'static,
    {
        self.and_then(|value| Flow::value(f(value)))
    }

    /// Return whatever the request resumes with
    pub fn into_flow(self) -> Flow<C, T>
    where
        R: Into<MaybeAsync<T>>,
    {
        self.and_then(|value| Flow::Return(value.into()))
    }
}

pub(crate) fn settled<T>(value: MaybeAsync<T>) -> Result<T, ChainError> {
    match value {
        MaybeAsync::Ready(value) => Ok(value),
        MaybeAsync::Pending(_) => Err(ChainError::unsupported_yield(
            "pending value delivered to a synchronous request",
        )),
    }
}

pub(crate) fn unsettled<T>(value: MaybeAsync<T>) -> Result<MaybeAsync<T>, ChainError> {
    Ok(value)
}
